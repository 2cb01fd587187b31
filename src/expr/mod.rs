//! Expression evaluation subsystem.
//!
//! # Data Flow
//! ```text
//! Expression text (startup)
//!     → lexer.rs (tokens with byte offsets)
//!     → parser.rs (expression tree)
//!     → Expression / SwitchProgram (compiled, immutable)
//!
//! Per request:
//!     Scope { event, env, caseNumber }
//!     → eval.rs (tree-walking interpreter)
//!     → Value or EvaluationError
//! ```
//!
//! # Design Decisions
//! - Restricted JavaScript-like grammar: no assignment, no function definitions,
//!   only a fixed set of string/array methods
//! - The interpreter sees nothing but the bindings in its Scope
//! - Parse failures abort startup; evaluation failures are per-request values

pub mod eval;
pub mod lexer;
pub mod parser;
pub mod switch;
pub mod value;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use switch::{SwitchError, SwitchProgram};
pub use value::Value;

/// Syntax error in an expression, with the byte offset where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Runtime failure while evaluating an expression against a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// An identifier with no binding in the scope.
    #[error("{0} is not defined")]
    Reference(String),

    /// An operation applied to a value of the wrong type.
    #[error("{0}")]
    Type(String),
}

/// Named bindings visible to an expression.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing any previous one with the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// Something that can be evaluated against a scope.
pub trait Evaluator: Send + Sync + fmt::Debug {
    fn evaluate(&self, scope: &Scope) -> Result<Value, EvaluationError>;
}

/// A parsed expression, ready to be evaluated any number of times.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    tree: parser::Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            source: source.to_string(),
            tree: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Evaluator for Expression {
    fn evaluate(&self, scope: &Scope) -> Result<Value, EvaluationError> {
        eval::eval(&self.tree, scope)
    }
}
