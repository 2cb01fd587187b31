//! Routing table lookup.
//!
//! # Responsibilities
//! - Store compiled routing entries
//! - Look up the entry for a request's host key
//! - Return the matched entry or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(labels) host lookup via HashMap plus suffix fallback
//! - Single-tenant tables answer every host

use std::collections::HashMap;

use serde_json::Value;

use crate::config::loader::parse_json_object;
use crate::config::validation::validate_routes;
use crate::config::ConfigError;
use crate::expr::{Evaluator, Expression, SwitchError, SwitchProgram};
use crate::routing::matcher::suffix_lookup;

/// Which decision an entry makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Filter,
    Switch,
}

/// One configured destination.
#[derive(Debug)]
pub enum RoutingEntry {
    /// Boolean gate: forward when the expression is truthy.
    Filter(Box<dyn Evaluator>),

    /// Case selection: forward when the program yields a non-null value.
    Switch(Box<dyn Evaluator>),
}

impl RoutingEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            RoutingEntry::Filter(_) => EntryKind::Filter,
            RoutingEntry::Switch(_) => EntryKind::Switch,
        }
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        match self {
            RoutingEntry::Filter(e) | RoutingEntry::Switch(e) => e.as_ref(),
        }
    }
}

#[derive(Debug)]
pub enum RoutingTable {
    /// One entry for every request (single-tenant deployments).
    Single(RoutingEntry),

    /// Entries keyed by host name (dispatcher deployments).
    ByHost(HashMap<String, RoutingEntry>),
}

impl RoutingTable {
    /// Single-tenant filter from the `FILTER` setting.
    pub fn filter(expression: &str) -> Result<Self, ConfigError> {
        let expression = Expression::parse(expression).map_err(|e| ConfigError::InvalidSetting {
            name: "FILTER",
            reason: e.to_string(),
        })?;
        Ok(RoutingTable::Single(RoutingEntry::Filter(Box::new(expression))))
    }

    /// Single-tenant switch from the `EXPRESSION` and `CASES` settings.
    pub fn switch(expression: &str, cases: &str) -> Result<Self, ConfigError> {
        let cases: Value = serde_json::from_str(cases).map_err(|e| ConfigError::InvalidSetting {
            name: "CASES",
            reason: e.to_string(),
        })?;
        let Value::Array(cases) = cases else {
            return Err(ConfigError::InvalidSetting {
                name: "CASES",
                reason: "expected a JSON array".to_string(),
            });
        };

        let program = SwitchProgram::compile(expression, &cases).map_err(|e| match e {
            SwitchError::Parse(e) => ConfigError::InvalidSetting {
                name: "EXPRESSION",
                reason: e.to_string(),
            },
            invalid => ConfigError::InvalidSetting {
                name: "CASES",
                reason: invalid.to_string(),
            },
        })?;
        Ok(RoutingTable::Single(RoutingEntry::Switch(Box::new(program))))
    }

    /// Host-keyed table from a dispatcher document.
    ///
    /// Every entry is validated; any invalid entry fails the whole table.
    pub fn from_dispatcher_json(raw: &str, kind: EntryKind) -> Result<Self, ConfigError> {
        let document = parse_json_object(raw, "the routing configuration")?;
        let entries = validate_routes(document, kind).map_err(ConfigError::Validation)?;
        Ok(RoutingTable::ByHost(entries))
    }

    /// Entry for a host key, using host-suffix fallback.
    pub fn lookup(&self, host: Option<&str>) -> Option<&RoutingEntry> {
        match self {
            RoutingTable::Single(entry) => Some(entry),
            RoutingTable::ByHost(entries) => host.and_then(|h| suffix_lookup(entries, h)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RoutingTable::Single(_) => 1,
            RoutingTable::ByHost(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
