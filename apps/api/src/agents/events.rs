use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{FieldViolation, ValidationError, ValidationResult};
use super::types::{AgentType, EventKind};

/// A validated agent event, as relayed to observers
///
/// Instances only come out of [`AgentEvent::from_value`] (and the text/bytes
/// variants) or [`AgentEvent::new`], so the closed-set fields always hold a
/// known value and `agent_id` is never empty. There are no setters; the
/// `with_*` methods consume the event and return a new one.
///
/// # Example
/// ```
/// use commanddeck_api::agents::{AgentEvent, AgentType, EventKind};
/// use serde_json::json;
///
/// let event = AgentEvent::from_value(&json!({
///     "type": "spawn",
///     "agent_id": "agent-001",
///     "agent_type": "scout",
///     "target_pos": [0.0, 0.0, 0.0],
/// }))
/// .expect("valid event");
///
/// assert_eq!(event.kind(), EventKind::Spawn);
/// assert_eq!(event.agent_type(), AgentType::Scout);
/// assert!(event.timestamp() > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    agent_id: String,
    agent_type: AgentType,
    target: Option<String>,
    target_pos: Option<[f64; 3]>,
    progress: Option<i64>,
    message: Option<String>,
    timestamp: f64,
}

impl AgentEvent {
    /// Creates an event with no optional fields, stamped with the current time
    pub fn new(
        kind: EventKind,
        agent_id: impl Into<String>,
        agent_type: AgentType,
    ) -> ValidationResult<Self> {
        let agent_id = agent_id.into();
        if agent_id.is_empty() {
            return Err(ValidationError::Fields(vec![FieldViolation::new(
                "agent_id",
                "must not be empty",
            )]));
        }

        Ok(Self {
            kind,
            agent_id,
            agent_type,
            target: None,
            target_pos: None,
            progress: None,
            message: None,
            timestamp: now_seconds(),
        })
    }

    pub fn with_target(self, target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..self
        }
    }

    /// Sets the target position; every coordinate must be finite
    pub fn with_target_pos(self, target_pos: [f64; 3]) -> ValidationResult<Self> {
        if let Some(index) = target_pos.iter().position(|c| !c.is_finite()) {
            return Err(ValidationError::Fields(vec![FieldViolation::new(
                "target_pos",
                format!("element {} is not a finite number", index),
            )]));
        }

        Ok(Self {
            target_pos: Some(target_pos),
            ..self
        })
    }

    pub fn with_progress(self, progress: i64) -> Self {
        Self {
            progress: Some(progress),
            ..self
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Sets the timestamp; it must be finite
    pub fn with_timestamp(self, timestamp: f64) -> ValidationResult<Self> {
        if !timestamp.is_finite() {
            return Err(ValidationError::Fields(vec![FieldViolation::new(
                "timestamp",
                "must be a finite number",
            )]));
        }

        Ok(Self { timestamp, ..self })
    }

    /// Validates a parsed JSON payload
    ///
    /// All violations are collected before failing, so the error names every
    /// offending field. Unknown fields are ignored. A missing or null
    /// `timestamp` is replaced by the current time.
    pub fn from_value(raw: &Value) -> ValidationResult<Self> {
        let fields = raw
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(json_type_name(raw)))?;

        let mut checker = Checker::new(fields);

        let kind = checker
            .required_str("type")
            .and_then(|value| checker.closed_set("type", value, EventKind::from_wire, &EventKind::ALL));
        let agent_id = checker.required_str("agent_id").map(str::to_owned);
        let agent_type = checker.required_str("agent_type").and_then(|value| {
            checker.closed_set("agent_type", value, AgentType::from_wire, &AgentType::ALL)
        });
        let target = checker.optional_str("target");
        let target_pos = checker.optional_position("target_pos");
        let progress = checker.optional_integer("progress");
        let message = checker.optional_str("message");
        let timestamp = checker.optional_number("timestamp");

        match (kind, agent_id, agent_type) {
            (Some(kind), Some(agent_id), Some(agent_type)) if checker.is_clean() => Ok(Self {
                kind,
                agent_id,
                agent_type,
                target,
                target_pos,
                progress,
                message,
                timestamp: timestamp.unwrap_or_else(now_seconds),
            }),
            _ => Err(checker.into_error()),
        }
    }

    /// Parses and validates a JSON text frame
    pub fn from_json(text: &str) -> ValidationResult<Self> {
        let raw: Value =
            serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::from_value(&raw)
    }

    /// Parses and validates a JSON request body
    pub fn from_slice(bytes: &[u8]) -> ValidationResult<Self> {
        let raw: Value =
            serde_json::from_slice(bytes).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::from_value(&raw)
    }

    /// Wire form of the event: a flat JSON object, absent fields as `null`
    pub fn to_json(&self) -> String {
        // Floats are finite by construction, so writing cannot fail or emit nulls.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn target_pos(&self) -> Option<[f64; 3]> {
        self.target_pos
    }

    /// Reported progress; conventionally 0-100 but not range-checked
    pub fn progress(&self) -> Option<i64> {
        self.progress
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Seconds since the Unix epoch
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Current time as fractional seconds since the Unix epoch
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accumulates field violations while reading a payload
struct Checker<'a> {
    fields: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl<'a> Checker<'a> {
    fn new(fields: &'a Map<String, Value>) -> Self {
        Self {
            fields,
            violations: Vec::new(),
        }
    }

    fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn into_error(self) -> ValidationError {
        ValidationError::Fields(self.violations)
    }

    fn reject(&mut self, field: &'static str, reason: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, reason));
    }

    /// Present, non-null value of `field`
    fn present(&self, field: &str) -> Option<&'a Value> {
        let fields: &'a Map<String, Value> = self.fields;
        fields.get(field).filter(|value| !value.is_null())
    }

    fn required_str(&mut self, field: &'static str) -> Option<&'a str> {
        match self.present(field) {
            None => {
                self.reject(field, "field required");
                None
            }
            Some(Value::String(value)) if value.is_empty() => {
                self.reject(field, "must not be empty");
                None
            }
            Some(Value::String(value)) => Some(value.as_str()),
            Some(other) => {
                self.reject(field, format!("expected a string, got {}", json_type_name(other)));
                None
            }
        }
    }

    fn closed_set<T: std::fmt::Display>(
        &mut self,
        field: &'static str,
        value: &str,
        lookup: fn(&str) -> Option<T>,
        allowed: &[T],
    ) -> Option<T> {
        let found = lookup(value);
        if found.is_none() {
            let expected = allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            self.reject(
                field,
                format!("unknown value '{}', expected one of: {}", value, expected),
            );
        }
        found
    }

    fn optional_str(&mut self, field: &'static str) -> Option<String> {
        match self.present(field)? {
            Value::String(value) => Some(value.clone()),
            other => {
                self.reject(field, format!("expected a string, got {}", json_type_name(other)));
                None
            }
        }
    }

    fn optional_number(&mut self, field: &'static str) -> Option<f64> {
        let value = self.present(field)?;
        let number = value.as_f64();
        if number.is_none() {
            self.reject(field, format!("expected a number, got {}", json_type_name(value)));
        }
        number
    }

    fn optional_integer(&mut self, field: &'static str) -> Option<i64> {
        let value = self.present(field)?;
        let integer = match value {
            Value::Number(number) => number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            _ => None,
        };
        if integer.is_none() {
            self.reject(field, format!("expected an integer, got {}", describe(value)));
        }
        integer
    }

    fn optional_position(&mut self, field: &'static str) -> Option<[f64; 3]> {
        let value = self.present(field)?;
        let items = match value {
            Value::Array(items) if items.len() == 3 => items,
            _ => {
                self.reject(
                    field,
                    format!("expected an array of exactly 3 numbers, got {}", describe(value)),
                );
                return None;
            }
        };

        let mut coords = [0.0; 3];
        for (index, item) in items.iter().enumerate() {
            match item.as_f64() {
                Some(coord) => coords[index] = coord,
                None => {
                    self.reject(
                        field,
                        format!("element {} is {}, expected a number", index, describe(item)),
                    );
                    return None;
                }
            }
        }
        Some(coords)
    }
}

/// Short description of a JSON value for error messages
fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array of length {}", items.len()),
        Value::Number(number) => format!("number {}", number),
        other => json_type_name(other).to_string(),
    }
}
