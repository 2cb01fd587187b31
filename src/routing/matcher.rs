//! Host key extraction and host-suffix fallback search.
//!
//! # Responsibilities
//! - Derive the lookup key from the request (Host header, port removed)
//! - Enumerate fallback keys by stripping trailing `.`-labels
//! - Look a key up in any host-keyed map using that fallback
//!
//! # Design Decisions
//! - Host matching is case-sensitive (keys are compared as configured)
//! - `"a.b.c."` falls back to `"a.b.c"`; `"z.a.b.c"` never reaches `"a.b.c"`

use std::collections::HashMap;
use std::str::FromStr;

use axum::http::header::HOST;
use axum::http::uri::Authority;
use axum::http::{HeaderMap, Uri};

/// The routing key for a request: the Host header without its port,
/// falling back to the URI authority.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let raw = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))?;

    match Authority::from_str(&raw) {
        Ok(authority) => Some(authority.host().to_string()),
        Err(_) => Some(raw),
    }
}

/// Iterator over a key and its successively shorter prefixes.
#[derive(Debug, Clone)]
pub struct HostCandidates<'a> {
    next: Option<&'a str>,
}

impl<'a> Iterator for HostCandidates<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current
            .rfind('.')
            .map(|i| &current[..i])
            .filter(|rest| !rest.is_empty());
        Some(current)
    }
}

/// `"a.b.c"` yields `"a.b.c"`, `"a.b"`, `"a"`.
pub fn host_candidates(host: &str) -> HostCandidates<'_> {
    HostCandidates {
        next: Some(host).filter(|h| !h.is_empty()),
    }
}

/// First value whose key matches a candidate of `host`.
pub fn suffix_lookup<'m, V>(map: &'m HashMap<String, V>, host: &str) -> Option<&'m V> {
    host_candidates(host).find_map(|candidate| map.get(candidate))
}
