use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::errors::{DeliveryError, DeliveryResult};
use super::registry::ConnectionRegistry;
use super::subscriber::SubscriberHandle;
use crate::agents::AgentEvent;

/// Outcome of one broadcast pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers whose send succeeded
    pub delivered: usize,
    /// Subscribers whose send failed and were removed from the registry
    pub dropped: usize,
}

/// Fans validated events out to every registered subscriber
///
/// Delivery is best-effort and at-most-once: each subscriber gets one send
/// attempt per event, bounded by `send_timeout`. A subscriber that fails is
/// unregistered and told to close; the others are unaffected.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Delivers `event` to every subscriber registered when the pass starts
    pub async fn broadcast(&self, event: &AgentEvent) -> DeliveryReport {
        if self.registry.is_empty() {
            tracing::debug!("No clients connected, skipping broadcast");
            return DeliveryReport::default();
        }

        let payload = event.to_json();
        let handles = self.registry.snapshot();

        let outcomes = join_all(handles.iter().map(|handle| self.deliver(handle, &payload))).await;

        let mut report = DeliveryReport::default();
        for (handle, outcome) in handles.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(subscriber = %handle.id(), error = %e, "Failed to send to client, dropping it");
                    self.registry.unregister(handle);
                    handle.close();
                    report.dropped += 1;
                }
            }
        }

        tracing::debug!(
            kind = %event.kind(),
            agent_id = event.agent_id(),
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast complete"
        );

        report
    }

    /// One bounded send attempt; a timeout counts as a failed send
    pub async fn deliver(&self, handle: &SubscriberHandle, payload: &str) -> DeliveryResult<()> {
        match tokio::time::timeout(self.send_timeout, handle.send(payload)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimedOut(self.send_timeout)),
        }
    }
}
