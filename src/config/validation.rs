//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the gateway config (serde handles syntactic)
//! - Validate and compile every routing entry of a dispatcher document
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before any listener is bound; a partially valid document is never served

use std::collections::HashMap;
use std::net::SocketAddr;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::expr::{Expression, ParseError, SwitchError, SwitchProgram};
use crate::routing::{EntryKind, RoutingEntry};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("error parsing {host} configuration: {source}")]
    MalformedEntry {
        host: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{host} configuration must be a JSON object")]
    NotAnObject { host: String },

    #[error("missing expression in {host} configuration")]
    MissingExpression { host: String },

    #[error("missing cases in {host} configuration")]
    MissingCases { host: String },

    #[error("invalid cases type in {host} configuration. Must be an array")]
    InvalidCases { host: String },

    #[error("invalid expression in {host} configuration: {source}")]
    InvalidExpression {
        host: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid case {index} in {host} configuration: cases must be strings, numbers, booleans or null")]
    InvalidCase { host: String, index: usize },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Check the process-wide settings.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and compile every entry of a dispatcher document.
pub fn validate_routes(
    document: Map<String, Value>,
    kind: EntryKind,
) -> Result<HashMap<String, RoutingEntry>, Vec<ValidationError>> {
    let mut entries = HashMap::with_capacity(document.len());
    let mut errors = Vec::new();

    for (host, raw) in document {
        match validate_entry(&host, raw, kind) {
            Ok(entry) => {
                tracing::info!(host = %host, kind = ?kind, "Adding route");
                entries.insert(host, entry);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(entries)
    } else {
        Err(errors)
    }
}

/// Validate one dispatcher entry.
///
/// The entry is normally a JSON-encoded string; an already-decoded object is
/// accepted as well.
pub fn validate_entry(host: &str, raw: Value, kind: EntryKind) -> Result<RoutingEntry, ValidationError> {
    let entry = match raw {
        Value::String(text) => serde_json::from_str::<Value>(&text).map_err(|source| {
            ValidationError::MalformedEntry {
                host: host.to_string(),
                source,
            }
        })?,
        other => other,
    };

    let Value::Object(mut fields) = entry else {
        return Err(ValidationError::NotAnObject {
            host: host.to_string(),
        });
    };

    let expression = match fields.remove("expression") {
        Some(Value::String(expression)) => expression,
        Some(other) => other.to_string(),
        None => {
            return Err(ValidationError::MissingExpression {
                host: host.to_string(),
            })
        }
    };

    match kind {
        EntryKind::Filter => {
            let expression = Expression::parse(&expression).map_err(|source| {
                ValidationError::InvalidExpression {
                    host: host.to_string(),
                    source,
                }
            })?;
            Ok(RoutingEntry::Filter(Box::new(expression)))
        }
        EntryKind::Switch => {
            let cases = match fields.remove("cases") {
                Some(Value::Array(cases)) => cases,
                Some(_) => {
                    return Err(ValidationError::InvalidCases {
                        host: host.to_string(),
                    })
                }
                None => {
                    return Err(ValidationError::MissingCases {
                        host: host.to_string(),
                    })
                }
            };
            let program = SwitchProgram::compile(&expression, &cases).map_err(|e| match e {
                SwitchError::Parse(source) => ValidationError::InvalidExpression {
                    host: host.to_string(),
                    source,
                },
                SwitchError::InvalidCase(index) => ValidationError::InvalidCase {
                    host: host.to_string(),
                    index,
                },
            })?;
            Ok(RoutingEntry::Switch(Box::new(program)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_config_problem() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.limits.max_body_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_entry_as_encoded_string() {
        let entry = validate_entry(
            "a.example.com",
            json!(r#"{"expression": "event.type === 'x'"}"#),
            EntryKind::Filter,
        )
        .unwrap();
        assert!(matches!(entry, RoutingEntry::Filter(_)));
    }

    #[test]
    fn test_entry_as_object() {
        let entry = validate_entry(
            "h",
            json!({"expression": "event.kind", "cases": ["a", "b"]}),
            EntryKind::Switch,
        )
        .unwrap();
        assert!(matches!(entry, RoutingEntry::Switch(_)));
    }

    #[test]
    fn test_entry_errors() {
        assert!(matches!(
            validate_entry("h", json!("{not json"), EntryKind::Filter),
            Err(ValidationError::MalformedEntry { .. })
        ));
        assert!(matches!(
            validate_entry("h", json!(r#"{"cases": []}"#), EntryKind::Filter),
            Err(ValidationError::MissingExpression { .. })
        ));
        assert!(matches!(
            validate_entry("h", json!({"expression": "event.kind"}), EntryKind::Switch),
            Err(ValidationError::MissingCases { .. })
        ));
        assert!(matches!(
            validate_entry("h", json!({"expression": "event.kind", "cases": "a"}), EntryKind::Switch),
            Err(ValidationError::InvalidCases { .. })
        ));
        assert!(matches!(
            validate_entry("h", json!({"expression": "event.kind ==="}), EntryKind::Filter),
            Err(ValidationError::InvalidExpression { .. })
        ));
        assert!(matches!(
            validate_entry("h", json!({"expression": "event.kind", "cases": [[1]]}), EntryKind::Switch),
            Err(ValidationError::InvalidCase { index: 0, .. })
        ));
    }

    #[test]
    fn test_filter_entries_ignore_cases() {
        let entry = validate_entry(
            "h",
            json!({"expression": "true", "cases": "not an array"}),
            EntryKind::Filter,
        );
        assert!(entry.is_ok());
    }

    #[test]
    fn test_collects_all_route_errors() {
        let document = json!({
            "good.example.com": r#"{"expression": "true"}"#,
            "bad.example.com": r#"{}"#,
            "worse.example.com": "{",
        });
        let Value::Object(document) = document else { unreachable!() };

        let errors = validate_routes(document, EntryKind::Filter).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
