//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_events_total` (counter): events handled, by mode and outcome
//! - `gateway_event_duration_seconds` (histogram): time from body read to response
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for mode and outcome only; hosts and handler names are unbounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled event.
pub fn record_event(mode: &'static str, outcome: &'static str, start: Instant) {
    ::metrics::counter!("gateway_events_total", "mode" => mode, "outcome" => outcome).increment(1);
    ::metrics::histogram!("gateway_event_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder() {
        record_event("filter", "forwarded", Instant::now());
    }
}
