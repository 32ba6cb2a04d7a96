use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::DeliveryResult;

/// Write side of one live observer connection
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Sends one serialized event. An error means the channel is unusable.
    async fn send(&self, payload: &str) -> DeliveryResult<()>;

    /// Asks the owning connection to shut down. Called once the subscriber
    /// has been dropped from the registry.
    fn close(&self) {}
}

/// Registry entry for a subscriber
///
/// Each handle gets a fresh id when created; two handles are equal only if
/// they share that id, so a reconnecting client never aliases its old entry.
#[derive(Clone)]
pub struct SubscriberHandle {
    id: Uuid,
    inner: Arc<dyn Subscriber>,
}

impl SubscriberHandle {
    pub fn new(subscriber: impl Subscriber + 'static) -> Self {
        Self::from_arc(Arc::new(subscriber))
    }

    /// Wraps a subscriber the caller also keeps a typed reference to
    pub fn from_arc(subscriber: Arc<dyn Subscriber>) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: subscriber,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn send(&self, payload: &str) -> DeliveryResult<()> {
        self.inner.send(payload).await
    }

    pub fn close(&self) {
        self.inner.close()
    }
}

impl PartialEq for SubscriberHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SubscriberHandle {}

impl std::hash::Hash for SubscriberHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberHandle").field("id", &self.id).finish()
    }
}
