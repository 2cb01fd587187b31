//! Recursive-descent parser producing the expression tree.
//!
//! Precedence, lowest first:
//! `?:` → `||` → `&&` → equality → relational → additive → multiplicative
//! → unary → member/call → primary.

use crate::expr::lexer::{tokenize, Spanned, Token};
use crate::expr::value::Value;
use crate::expr::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Ident(String),
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    Call {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

/// Parse a complete expression. Trailing tokens are an error.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let expr = parser.conditional()?;
    match parser.peek() {
        None => Ok(expr),
        Some(spanned) => Err(ParseError::new(
            format!("unexpected token {}", describe(&spanned.token)),
            spanned.offset,
        )),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn offset(&self) -> usize {
        self.peek().map(|s| s.offset).unwrap_or(self.end)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        match self.peek() {
            Some(Spanned { token: Token::Punct(p), .. }) if *p == punct => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.eat(punct) {
            Ok(())
        } else {
            let found = self
                .peek()
                .map(|s| describe(&s.token))
                .unwrap_or_else(|| "end of input".to_string());
            Err(ParseError::new(
                format!("expected '{}' but found {}", punct, found),
                self.offset(),
            ))
        }
    }

    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.logical_or()?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.conditional()?;
        self.expect(":")?;
        let alternate = self.conditional()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical_and()?;
        while self.eat("||") {
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.binary_level(0)?;
        while self.eat("&&") {
            let right = self.binary_level(0)?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Left-associative binary operators, one table row per precedence level.
    fn binary_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        const LEVELS: &[&[(&str, BinaryOp)]] = &[
            &[
                ("===", BinaryOp::StrictEq),
                ("!==", BinaryOp::StrictNe),
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::Ne),
            ],
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
        ];

        let Some(operators) = LEVELS.get(level) else {
            return self.unary();
        };

        let mut left = self.binary_level(level + 1)?;
        'outer: loop {
            for (punct, op) in operators.iter() {
                if self.eat(punct) {
                    let right = self.binary_level(level + 1)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().map(|s| &s.token) {
            Some(Token::Punct("!")) => Some(UnaryOp::Not),
            Some(Token::Punct("-")) => Some(UnaryOp::Neg),
            Some(Token::Punct("+")) => Some(UnaryOp::Plus),
            Some(Token::Ident(name)) if name == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let offset = self.offset();
                match self.next() {
                    Some(Spanned { token: Token::Ident(name), .. }) => {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property: Box::new(Expr::Literal(Value::String(name))),
                        };
                    }
                    _ => return Err(ParseError::new("expected property name after '.'", offset)),
                }
            } else if self.eat("[") {
                let property = self.conditional()?;
                self.expect("]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(property),
                };
            } else if self.eat("(") {
                let offset = self.offset();
                let args = self.arguments(")")?;
                expr = match expr {
                    Expr::Member { object, property } => match *property {
                        Expr::Literal(Value::String(method)) => Expr::Call {
                            object,
                            method,
                            args,
                        },
                        _ => {
                            return Err(ParseError::new(
                                "computed method names are not supported",
                                offset,
                            ))
                        }
                    },
                    _ => return Err(ParseError::new("only method calls are supported", offset)),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn arguments(&mut self, close: &str) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.conditional()?);
            if self.eat(close) {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        let Some(spanned) = self.next() else {
            return Err(ParseError::new("unexpected end of expression", offset));
        };

        match spanned.token {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Literal(Value::Undefined),
                _ => Expr::Ident(name),
            }),
            Token::Punct("(") => {
                let inner = self.conditional()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Punct("[") => Ok(Expr::Array(self.arguments("]")?)),
            other => Err(ParseError::new(
                format!("unexpected token {}", describe(&other)),
                spanned.offset,
            )),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Str(s) => format!("string '{}'", s),
        Token::Ident(name) => format!("identifier {}", name),
        Token::Punct(p) => format!("'{}'", p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = parse("a || b && c").unwrap();
        match expr {
            Expr::Logical { op: LogicalOp::Or, right, .. } => {
                assert!(matches!(*right, Expr::Logical { op: LogicalOp::And, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }

        let expr = parse("1 + 2 * 3 === 7").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::StrictEq, .. }));
    }

    #[test]
    fn test_member_and_call() {
        let expr = parse("event.type.startsWith('com.')").unwrap();
        match expr {
            Expr::Call { method, args, .. } => {
                assert_eq!(method, "startsWith");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected tree {:?}", other),
        }
        assert!(parse("event['type']").is_ok());
        assert!(parse("['a', 'b'].includes(event.kind)").is_ok());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse("").is_err());
        assert!(parse("event.").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("foo()").is_err());
        assert!(parse("a ? b").is_err());
    }

    #[test]
    fn test_error_offset_points_at_token() {
        let err = parse("event.type === ").unwrap_err();
        assert_eq!(err.offset, 15);
    }
}
