//! Event codec for the CloudEvents HTTP binary content mode.
//!
//! # Responsibilities
//! - Map `ce-*` headers to event attributes and back
//! - Parse the request body into the event's `data`
//! - Serialize a handler's reply into headers and a JSON body

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::{Map, Value};
use thiserror::Error;

/// Header-name prefix marking CloudEvents context attributes.
pub const ATTRIBUTE_PREFIX: &str = "ce-";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Errors produced while translating between HTTP and events.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The body is non-empty but not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// A JSON value cannot be interpreted as an event.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

/// A CloudEvent: context attributes plus an optional payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    attributes: BTreeMap<String, String>,
    data: Option<Value>,
}

impl Event {
    /// Create an event with no attributes and no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style data setter.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set an attribute. Names are normalized to lower-case.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The event `id` attribute, if present.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }

    /// JSON object form: every attribute as a string member, plus `data` when present.
    pub fn to_json(&self) -> Value {
        let mut object: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        if let Some(data) = &self.data {
            object.insert("data".to_string(), data.clone());
        }
        Value::Object(object)
    }

    /// Rebuild an event from its JSON object form.
    ///
    /// Scalars outside `data` are stringified, `null` attributes are dropped,
    /// nested structures outside `data` are rejected.
    pub fn from_json(value: Value) -> Result<Self, CodecError> {
        let Value::Object(object) = value else {
            return Err(CodecError::InvalidEvent("expected a JSON object".to_string()));
        };

        let mut event = Event::new();
        for (name, value) in object {
            if name == "data" {
                event.data = Some(value);
                continue;
            }
            match value {
                Value::Null => {}
                Value::String(s) => event.set_attribute(name, s),
                Value::Bool(b) => event.set_attribute(name, b.to_string()),
                Value::Number(n) => event.set_attribute(name, n.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(CodecError::InvalidEvent(format!(
                        "attribute {} must be a scalar",
                        name
                    )));
                }
            }
        }
        Ok(event)
    }
}

/// Collect the `ce-*` headers into an event without data.
pub fn decode_headers(headers: &HeaderMap) -> Event {
    let mut event = Event::new();
    for (name, value) in headers {
        if let Some(attribute) = name.as_str().strip_prefix(ATTRIBUTE_PREFIX) {
            if attribute.is_empty() {
                continue;
            }
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            event.set_attribute(attribute, value);
        }
    }
    event
}

/// Decode a request, rejecting a non-empty body that is not JSON.
pub fn decode(headers: &HeaderMap, body: &[u8]) -> Result<Event, CodecError> {
    let mut event = decode_headers(headers);
    if !body.is_empty() {
        event.data = Some(serde_json::from_slice(body)?);
    }
    Ok(event)
}

/// Decode a request, keeping a non-JSON body as a raw string payload.
pub fn decode_lenient(headers: &HeaderMap, body: &[u8]) -> Event {
    let mut event = decode_headers(headers);
    if !body.is_empty() {
        let data = serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        event.data = Some(data);
    }
    event
}

/// Headers and body produced by [`encode`].
#[derive(Debug, Clone, Default)]
pub struct Encoded {
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Encode an event into `ce-*` headers and a JSON body.
///
/// Attributes that cannot form a valid header are skipped.
pub fn encode(event: &Event) -> Encoded {
    let mut headers = HeaderMap::new();
    for (name, value) in &event.attributes {
        let header_name = format!("{}{}", ATTRIBUTE_PREFIX, name);
        match (
            HeaderName::from_bytes(header_name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                tracing::warn!(attribute = %name, "Skipping attribute that is not a valid header");
            }
        }
    }

    let body = match &event.data {
        Some(data) if !data.is_null() => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
            Bytes::from(data.to_string())
        }
        _ => Bytes::new(),
    };

    Encoded { headers, body }
}
