//! Task entity and lifecycle
//!
//! `Pending -> InProgress -> {Completed, Failed}`. The assignment engine is the
//! only caller of [`Task::start`], the completion processor the only caller of
//! [`Task::finish`]. Forced agent removal uses [`Task::revert_to_pending`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::agents::{AgentId, Outcome};

// ============================================================================
// Identity
// ============================================================================

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for an agent
    Pending,

    /// Assigned and executing
    InProgress,

    /// Finished successfully
    Completed,

    /// Finished unsuccessfully
    Failed,
}

impl TaskStatus {
    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// An attempted task transition that the lifecycle does not allow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task transition: cannot {action} task {task_id} in state {state}")]
pub struct TransitionError {
    /// Task the transition was attempted on
    pub task_id: TaskId,

    /// State the task was in
    pub state: TaskStatus,

    /// Transition that was attempted
    pub action: &'static str,
}

// ============================================================================
// Task
// ============================================================================

/// A unit of work with capability requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: TaskId,

    /// Short name
    pub name: String,

    /// Free-text description
    pub description: String,

    /// Required capabilities, deduplicated, first occurrence kept
    pub required_capabilities: Vec<String>,

    /// 1.0 (trivial) to 10.0 (hardest)
    pub complexity: f64,

    /// 1.0 (lowest) to 10.0 (highest)
    pub priority: f64,

    /// Estimated duration in minutes
    pub estimated_duration: f64,

    /// Creation order within the owning controller, used to break priority ties
    pub(crate) seq: u64,

    status: TaskStatus,
    assigned_agent: Option<AgentId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    actual_duration: Option<f64>,
    success_score: Option<f64>,
}

impl Task {
    /// Create a pending task.
    ///
    /// Values outside the documented ranges and empty capability lists are
    /// accepted; such tasks are simply never matched.
    pub fn new<I, S>(name: impl Into<String>, description: impl Into<String>, required_capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut required: Vec<String> = Vec::new();
        for capability in required_capabilities {
            let capability = capability.into();
            if !required.contains(&capability) {
                required.push(capability);
            }
        }

        Self {
            id: TaskId::new(),
            name: name.into(),
            description: description.into(),
            required_capabilities: required,
            complexity: 1.0,
            priority: 1.0,
            estimated_duration: 1.0,
            seq: 0,
            status: TaskStatus::Pending,
            assigned_agent: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            actual_duration: None,
            success_score: None,
        }
    }

    /// Set complexity
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity;
        self
    }

    /// Set priority
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Set estimated duration in minutes
    pub fn with_estimated_duration(mut self, minutes: f64) -> Self {
        self.estimated_duration = minutes;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Agent bound to the task; retained after completion
    pub fn assigned_agent(&self) -> Option<&AgentId> {
        self.assigned_agent.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Actual duration in minutes, set on completion
    pub fn actual_duration(&self) -> Option<f64> {
        self.actual_duration
    }

    /// 1.0 on success, 0.0 on failure, unset until finished
    pub fn success_score(&self) -> Option<f64> {
        self.success_score
    }

    /// Minutes elapsed since the task started, if it has
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        self.started_at
            .map(|started| (now - started).num_milliseconds() as f64 / 60_000.0)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Pending -> InProgress, binding the agent
    pub(crate) fn start(&mut self, agent_id: AgentId, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::InProgress;
                self.assigned_agent = Some(agent_id);
                self.started_at = Some(now);
                Ok(())
            }
            TaskStatus::InProgress | TaskStatus::Completed | TaskStatus::Failed => {
                Err(self.rejected("start"))
            }
        }
    }

    /// InProgress -> Completed | Failed
    pub(crate) fn finish(
        &mut self,
        outcome: Outcome,
        actual_duration: f64,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::InProgress => {
                let (status, score) = match outcome {
                    Outcome::Success => (TaskStatus::Completed, 1.0),
                    Outcome::Failure => (TaskStatus::Failed, 0.0),
                };
                self.status = status;
                self.completed_at = Some(now);
                self.actual_duration = Some(actual_duration);
                self.success_score = Some(score);
                Ok(())
            }
            TaskStatus::Pending | TaskStatus::Completed | TaskStatus::Failed => {
                Err(self.rejected("finish"))
            }
        }
    }

    /// InProgress -> Pending with no assignee, used when the agent is removed
    pub(crate) fn revert_to_pending(&mut self) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::InProgress => {
                self.status = TaskStatus::Pending;
                self.assigned_agent = None;
                self.started_at = None;
                Ok(())
            }
            TaskStatus::Pending | TaskStatus::Completed | TaskStatus::Failed => {
                Err(self.rejected("revert"))
            }
        }
    }

    fn rejected(&self, action: &'static str) -> TransitionError {
        TransitionError {
            task_id: self.id,
            state: self.status,
            action,
        }
    }
}
