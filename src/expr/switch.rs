//! N-way case selection.
//!
//! A switch program evaluates its discriminant once and compares it with the
//! configured case literals using `===`. Only the first matching case counts,
//! and it is active only when its index equals the `caseNumber` binding.

use crate::expr::{EvaluationError, Evaluator, Expression, ParseError, Scope, Value};

#[derive(Debug, Clone)]
pub struct SwitchProgram {
    discriminant: Expression,
    cases: Vec<Value>,
}

impl SwitchProgram {
    /// Compile a discriminant and its case literals.
    ///
    /// Cases must be scalars; the error carries the offending index.
    pub fn compile(expression: &str, cases: &[serde_json::Value]) -> Result<Self, SwitchError> {
        let discriminant = Expression::parse(expression)?;
        let cases = cases
            .iter()
            .enumerate()
            .map(|(index, case)| match case {
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    Err(SwitchError::InvalidCase(index))
                }
                scalar => Ok(Value::from(scalar.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            discriminant,
            cases,
        })
    }

    pub fn cases(&self) -> &[Value] {
        &self.cases
    }

    /// Index of the first case strictly equal to `value`.
    pub fn matching_case(&self, value: &Value) -> Option<usize> {
        self.cases.iter().position(|case| case.strict_equals(value))
    }
}

impl Evaluator for SwitchProgram {
    fn evaluate(&self, scope: &Scope) -> Result<Value, EvaluationError> {
        let value = self.discriminant.evaluate(scope)?;
        let selected = match (self.matching_case(&value), scope.get("caseNumber")) {
            (Some(index), Some(Value::Number(n))) => index as f64 == *n,
            _ => false,
        };

        if selected {
            Ok(scope.get("event").cloned().unwrap_or_default())
        } else {
            Ok(Value::Null)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("case {0} must be a string, number, boolean or null")]
    InvalidCase(usize),
}
