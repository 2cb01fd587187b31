//! Shutdown coordination for the gateway.
//!
//! One coordinator, any number of listeners. The first trigger records why
//! the gateway is stopping; later triggers are ignored. A listener created
//! after the trigger still observes it.

use std::fmt;

use tokio::sync::watch;

/// Why the gateway stopped accepting traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An OS signal, by name.
    Signal(&'static str),
    /// Stopped from code, or the coordinator went away.
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Signal(name) => f.write_str(name),
            StopReason::Requested => f.write_str("requested"),
        }
    }
}

pub struct Shutdown {
    tx: watch::Sender<Option<StopReason>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Record `reason` and wake every listener. Returns false if already triggered.
    pub fn trigger(&self, reason: StopReason) -> bool {
        let first = self.tx.send_if_modified(|current| match current {
            Some(_) => false,
            None => {
                *current = Some(reason);
                true
            }
        });
        if first {
            tracing::info!(reason = %reason, listeners = self.tx.receiver_count(), "Shutdown triggered");
        }
        first
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the owning [`Shutdown`] fires.
pub struct ShutdownListener {
    rx: watch::Receiver<Option<StopReason>>,
}

impl ShutdownListener {
    pub async fn stopped(mut self) -> StopReason {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => reason.unwrap_or(StopReason::Requested),
            Err(_) => StopReason::Requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_listeners() {
        let shutdown = Shutdown::new();
        let a = shutdown.listener();
        let b = shutdown.listener();

        assert!(shutdown.trigger(StopReason::Signal("SIGTERM")));
        assert_eq!(a.stopped().await, StopReason::Signal("SIGTERM"));
        assert_eq!(b.stopped().await, StopReason::Signal("SIGTERM"));
    }

    #[tokio::test]
    async fn test_first_trigger_wins() {
        let shutdown = Shutdown::default();
        assert_eq!(shutdown.reason(), None);

        assert!(shutdown.trigger(StopReason::Requested));
        assert!(!shutdown.trigger(StopReason::Signal("SIGINT")));
        assert_eq!(shutdown.reason(), Some(StopReason::Requested));

        let late = shutdown.listener();
        assert_eq!(late.stopped().await, StopReason::Requested);
    }

    #[tokio::test]
    async fn test_listener_waits_for_trigger() {
        let shutdown = Shutdown::new();
        let pending = tokio::time::timeout(Duration::from_millis(20), shutdown.listener().stopped()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_listeners() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        drop(shutdown);
        assert_eq!(listener.stopped().await, StopReason::Requested);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(StopReason::Signal("SIGTERM").to_string(), "SIGTERM");
        assert_eq!(StopReason::Requested.to_string(), "requested");
    }
}
