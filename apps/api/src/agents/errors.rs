use thiserror::Error;

/// A single schema violation, tied to the field that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Errors raised while turning a raw payload into an agent event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("Event must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Invalid event: {}", join_violations(.0))]
    Fields(Vec<FieldViolation>),
}

impl ValidationError {
    /// Field-level violations, empty for payloads that were not objects
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ValidationError::Fields(violations) => violations,
            _ => &[],
        }
    }

    /// Whether any violation concerns `field`
    pub fn mentions(&self, field: &str) -> bool {
        self.violations().iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ValidationResult<T> = Result<T, ValidationError>;
