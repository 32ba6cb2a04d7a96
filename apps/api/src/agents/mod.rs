// Agent event model
//
// Schema and validation for the events agents publish to the relay.

pub mod errors;
pub mod events;
pub mod types;

// Re-export main types
pub use errors::{FieldViolation, ValidationError, ValidationResult};
pub use events::AgentEvent;
pub use types::{AgentType, EventKind};
