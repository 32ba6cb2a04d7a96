// Connection registry and broadcast fanout
//
// The registry is the only shared mutable state in the relay. It is built
// once at startup and handed to the ingress adapters through the router state.

pub mod broadcast;
pub mod errors;
pub mod registry;
pub mod subscriber;

pub use broadcast::{Broadcaster, DeliveryReport};
pub use errors::{DeliveryError, DeliveryResult};
pub use registry::ConnectionRegistry;
pub use subscriber::{Subscriber, SubscriberHandle};
