//! Parameter resolution for handler contexts.
//!
//! # Data Flow
//! ```text
//! P_* environment variables ─┐  (lowest precedence)
//! static per-host file ──────┼─→ resolve() → ParamMap → Context.params
//! request query string ──────┘  (highest precedence)
//! ```
//!
//! # Design Decisions
//! - Later sources shadow earlier ones key by key; nothing is merged deeply
//! - Static parameters use the same host-suffix fallback as routing
//! - Defaults and static parameters are loaded once and never change

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use crate::config::loader::parse_json_object;
use crate::config::ConfigError;
use crate::routing::suffix_lookup;

/// Resolved parameters, keyed by name.
pub type ParamMap = BTreeMap<String, Value>;

/// Default parameters from environment-style variables.
///
/// `P_SECONDS=3` becomes `seconds = "3"` with the default `P_` prefix.
pub fn defaults_from_env<I>(vars: I, prefix: &str) -> ParamMap
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| {
            name.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest.to_lowercase(), Value::String(value)))
        })
        .collect()
}

/// Per-host static parameters.
#[derive(Debug, Clone, Default)]
pub struct StaticParams {
    by_host: HashMap<String, ParamMap>,
}

impl StaticParams {
    pub fn new(by_host: HashMap<String, ParamMap>) -> Self {
        Self { by_host }
    }

    /// Parse a `{ host: { name: value } }` document.
    ///
    /// Members that are not objects are skipped.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let document = parse_json_object(raw, "the static parameter file")?;
        let mut by_host = HashMap::with_capacity(document.len());
        for (host, params) in document {
            match params {
                Value::Object(params) => {
                    by_host.insert(host, params.into_iter().collect());
                }
                _ => {
                    tracing::warn!(host = %host, "Ignoring static parameters that are not an object");
                }
            }
        }
        Ok(Self { by_host })
    }

    /// Parameters for a host, using host-suffix fallback.
    pub fn for_host(&self, host: &str) -> Option<&ParamMap> {
        suffix_lookup(&self.by_host, host)
    }

    pub fn len(&self) -> usize {
        self.by_host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_host.is_empty()
    }
}

/// Parameters from a URL query string. A repeated key yields an array.
pub fn from_query(query: Option<&str>) -> ParamMap {
    let mut params = ParamMap::new();
    let Some(query) = query else {
        return params;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match params.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(key.into_owned(), value);
            }
        }
    }
    params
}

/// Merge the three sources; later sources win on key collisions.
pub fn resolve(
    defaults: &ParamMap,
    static_params: &StaticParams,
    host: Option<&str>,
    query: Option<&str>,
) -> ParamMap {
    let mut params = defaults.clone();
    if let Some(host_params) = host.and_then(|h| static_params.for_host(h)) {
        params.extend(host_params.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    params.extend(from_query(query));
    params
}

/// JSON object view of a parameter map.
pub fn to_json(params: &ParamMap) -> Value {
    Value::Object(params.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Map<_, _>>())
}
