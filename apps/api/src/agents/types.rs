use serde::{Deserialize, Serialize};

/// Kind of activity an agent event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Spawn,
    Move,
    Work,
    Progress,
    Complete,
    Error,
    Idle,
}

impl EventKind {
    /// Every accepted event kind, in wire order
    pub const ALL: [EventKind; 7] = [
        EventKind::Spawn,
        EventKind::Move,
        EventKind::Work,
        EventKind::Progress,
        EventKind::Complete,
        EventKind::Error,
        EventKind::Idle,
    ];

    /// Wire spelling of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Spawn => "spawn",
            EventKind::Move => "move",
            EventKind::Work => "work",
            EventKind::Progress => "progress",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
            EventKind::Idle => "idle",
        }
    }

    /// Looks up a kind by its wire spelling (case-sensitive)
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of the agent that emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Scout,
    Worker,
    Coder,
    Architect,
    Debugger,
}

impl AgentType {
    pub const ALL: [AgentType; 5] = [
        AgentType::Scout,
        AgentType::Worker,
        AgentType::Coder,
        AgentType::Architect,
        AgentType::Debugger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Scout => "scout",
            AgentType::Worker => "worker",
            AgentType::Coder => "coder",
            AgentType::Architect => "architect",
            AgentType::Debugger => "debugger",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|agent_type| agent_type.as_str() == value)
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
