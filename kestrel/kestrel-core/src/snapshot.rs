//! Read-only views of controller state for presentation layers.
//!
//! Snapshots are owned copies; holding one never blocks the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agents::{Agent, AgentId, AgentStatus};
use crate::error::Result;
use crate::orchestration::SystemMetrics;
use crate::tasks::{Task, TaskId, TaskStatus};

/// Full controller state at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub agents: BTreeMap<AgentId, AgentSnapshot>,
    pub tasks: BTreeMap<TaskId, TaskSnapshot>,
    pub metrics: SystemMetrics,
    pub simulation_active: bool,
    pub simulation_start_time: Option<DateTime<Utc>>,
    pub training_mode: bool,
    pub assignments_made: usize,
    pub timestamp: DateTime<Utc>,
}

impl SystemSnapshot {
    /// Pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Tasks currently in the given state
    pub fn count_tasks(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }
}

/// One agent's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub name: String,
    pub status: AgentStatus,
    pub current_task: Option<TaskId>,

    /// Capability -> confidence
    pub capabilities: BTreeMap<String, f64>,

    /// Capability -> retained outcomes, oldest first
    pub success_history: BTreeMap<String, Vec<u8>>,

    pub total_tasks_completed: u64,
    pub total_tasks_failed: u64,
    pub average_success_rate: f64,
    pub adaptability_score: f64,
    pub learning_rate: f64,
    pub overall_score: f64,
    pub last_activity: DateTime<Utc>,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            status: agent.status(),
            current_task: agent.current_task(),
            capabilities: agent.ledger().confidences().into_iter().collect(),
            success_history: agent.ledger().histories().into_iter().collect(),
            total_tasks_completed: agent.total_tasks_completed(),
            total_tasks_failed: agent.total_tasks_failed(),
            average_success_rate: agent.average_success_rate(),
            adaptability_score: agent.adaptability_score(),
            learning_rate: agent.learning_rate(),
            overall_score: agent.overall_score(),
            last_activity: agent.last_activity,
        }
    }
}

/// One task's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub required_capabilities: Vec<String>,
    pub complexity: f64,
    pub priority: f64,
    pub estimated_duration: f64,
    pub status: TaskStatus,
    pub assigned_agent: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_duration: Option<f64>,
    pub success_score: Option<f64>,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            required_capabilities: task.required_capabilities.clone(),
            complexity: task.complexity,
            priority: task.priority,
            estimated_duration: task.estimated_duration,
            status: task.status(),
            assigned_agent: task.assigned_agent().cloned(),
            created_at: task.created_at,
            started_at: task.started_at(),
            completed_at: task.completed_at(),
            actual_duration: task.actual_duration(),
            success_score: task.success_score(),
        }
    }
}

/// Confidence-only view of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfidence {
    pub name: String,
    pub capabilities: BTreeMap<String, f64>,
    pub adaptability_score: f64,
    pub learning_rate: f64,
}

impl From<&Agent> for AgentConfidence {
    fn from(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            capabilities: agent.ledger().confidences().into_iter().collect(),
            adaptability_score: agent.adaptability_score(),
            learning_rate: agent.learning_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Outcome;

    #[test]
    fn test_agent_snapshot_copies_ledger() {
        let mut agent = Agent::new("Analyst", ["x", "y"]);
        agent.update_confidence("x", Outcome::Success);

        let snapshot = AgentSnapshot::from(&agent);
        assert_eq!(snapshot.capabilities.len(), 2);
        assert!((snapshot.capabilities["x"] - 0.55).abs() < 1e-12);
        assert_eq!(snapshot.success_history["x"], vec![1]);
        assert!(snapshot.success_history["y"].is_empty());
        assert_eq!(snapshot.status, AgentStatus::Idle);
    }

    #[test]
    fn test_task_snapshot_serializes_status() {
        let task = Task::new("t", "d", ["x"]).with_priority(4.0);
        let snapshot = TaskSnapshot::from(&task);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["priority"], 4.0);
        assert!(json["assigned_agent"].is_null());
    }
}
