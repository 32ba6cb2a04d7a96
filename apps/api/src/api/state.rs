use std::sync::Arc;
use std::time::Duration;

use crate::relay::{Broadcaster, ConnectionRegistry};

/// Shared state handed to every handler
///
/// Holds the single registry instance for the process; the broadcaster
/// points at the same registry.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Broadcaster,
}

impl AppState {
    pub fn new(send_timeout: Duration) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone(), send_timeout);

        Self {
            registry,
            broadcaster,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Broadcaster::DEFAULT_SEND_TIMEOUT)
    }
}
