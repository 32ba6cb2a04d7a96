use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::subscriber::SubscriberHandle;

/// The set of live subscribers
///
/// Every operation takes the lock for a single map access and never holds it
/// across an await, so a slow subscriber cannot stall registration or a
/// concurrent broadcast.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use commanddeck_api::relay::{
///     ConnectionRegistry, DeliveryResult, Subscriber, SubscriberHandle,
/// };
///
/// struct Sink;
///
/// #[async_trait]
/// impl Subscriber for Sink {
///     async fn send(&self, _payload: &str) -> DeliveryResult<()> {
///         Ok(())
///     }
/// }
///
/// let registry = ConnectionRegistry::new();
/// let handle = SubscriberHandle::new(Sink);
///
/// assert!(registry.register(handle.clone()));
/// assert_eq!(registry.count(), 1);
/// assert!(registry.unregister(&handle));
/// assert!(!registry.unregister(&handle));
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    handles: RwLock<HashMap<Uuid, SubscriberHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handle; returns `false` if it was already registered
    pub fn register(&self, handle: SubscriberHandle) -> bool {
        match self.write().entry(handle.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Removes a handle; returns `false` if it was not registered
    pub fn unregister(&self, handle: &SubscriberHandle) -> bool {
        self.write().remove(&handle.id()).is_some()
    }

    /// Handles registered at the moment of the call, in no particular order
    pub fn snapshot(&self) -> Vec<SubscriberHandle> {
        self.read().values().cloned().collect()
    }

    pub fn contains(&self, handle: &SubscriberHandle) -> bool {
        self.read().contains_key(&handle.id())
    }

    /// Live handle count, for status reporting
    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Critical sections are single map operations, so a panic elsewhere cannot
    // leave the map half-updated; keep serving from a poisoned lock.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, SubscriberHandle>> {
        self.handles.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, SubscriberHandle>> {
        self.handles.write().unwrap_or_else(PoisonError::into_inner)
    }
}
