//! Filter and switch decisions.

use crate::event::Event;
use crate::expr::{Scope, Value};
use crate::routing::{EntryKind, RoutingEntry};

/// What to do with an event after evaluating its routing entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Forward,
    Suppress,
    Failed(String),
}

/// Evaluate `entry` against an event.
///
/// Filters forward on a truthy result; switches forward on any non-null result.
/// `case_number` is bound as `caseNumber` when present.
pub fn decide(entry: &RoutingEntry, event: &Event, case_number: Option<f64>, env: &Value) -> Decision {
    let mut scope = Scope::new()
        .with("event", event.to_json())
        .with("env", env.clone());
    if let Some(case_number) = case_number {
        scope = scope.with("caseNumber", case_number);
    }

    match entry.evaluator().evaluate(&scope) {
        Ok(value) => {
            let forward = match entry.kind() {
                EntryKind::Filter => value.is_truthy(),
                EntryKind::Switch => !value.is_nullish(),
            };
            if forward {
                Decision::Forward
            } else {
                Decision::Suppress
            }
        }
        Err(e) => Decision::Failed(e.to_string()),
    }
}
