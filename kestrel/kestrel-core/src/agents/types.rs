//! Core Agent Types and Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::tasks::TaskId;

/// Unique identifier for an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new unique agent ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from string (for deserialization/testing)
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current status of an agent
///
/// The busy variant carries the task the agent is working on, so an agent has
/// a current task exactly when it is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Agent is idle and available for work
    Idle,

    /// Agent is executing the given task
    Busy(TaskId),

    /// Reserved for a future learning policy; never entered by the engine
    Learning,

    /// Reserved for a future optimization policy; never entered by the engine
    Optimizing,
}

impl AgentStatus {
    /// Task currently held by the agent, if any
    pub fn current_task(&self) -> Option<TaskId> {
        match self {
            AgentStatus::Busy(task_id) => Some(*task_id),
            AgentStatus::Idle | AgentStatus::Learning | AgentStatus::Optimizing => None,
        }
    }

    /// Whether the agent can be offered to the assignment engine
    pub fn is_idle(&self) -> bool {
        matches!(self, AgentStatus::Idle)
    }

    /// Lowercase label used in snapshots and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy(_) => "busy",
            AgentStatus::Learning => "learning",
            AgentStatus::Optimizing => "optimizing",
        }
    }
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Binary result of executing a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Task finished successfully
    Success,

    /// Task failed
    Failure,
}

impl Outcome {
    /// Map a success flag onto an outcome
    pub fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }

    /// Numeric target used by the confidence update (1 or 0)
    pub fn as_bit(&self) -> u8 {
        match self {
            Outcome::Success => 1,
            Outcome::Failure => 0,
        }
    }

    /// Whether this outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// One finished task in an agent's performance history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Task that was executed
    pub task_id: TaskId,

    /// Whether it succeeded
    pub success: bool,

    /// Actual duration in minutes
    pub duration: f64,

    /// Task complexity (1-10)
    pub complexity: f64,

    /// Capabilities the task required
    pub capabilities: Vec<String>,

    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
}
