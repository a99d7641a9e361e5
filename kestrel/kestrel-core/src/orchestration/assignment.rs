//! Greedy per-task assignment
//!
//! Pending tasks are visited in priority order (highest first, creation order
//! on ties). Each task takes the best-scoring agent still available in this
//! cycle, provided the score clears [`ACCEPTANCE_THRESHOLD`]. An agent taken
//! by a higher-priority task is never reconsidered within the same cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scoring::score;
use crate::agents::{Agent, AgentId};
use crate::tasks::{Task, TaskId};

/// A best score must exceed this value for the assignment to be committed
pub const ACCEPTANCE_THRESHOLD: f64 = 0.1;

/// Audit entry appended on every committed assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

/// A matched pair chosen by [`plan_assignments`], not yet committed
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAssignment {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub score: f64,
}

/// Choose one agent per pending task, at most one task per idle agent.
///
/// Non-pending tasks and non-idle agents are filtered out here, so callers may
/// pass whole collections.
pub fn plan_assignments<'a, T, A>(tasks: T, agents: A) -> Vec<PlannedAssignment>
where
    T: IntoIterator<Item = &'a Task>,
    A: IntoIterator<Item = &'a Agent>,
{
    let mut pending: Vec<&Task> = tasks.into_iter().filter(|t| t.is_pending()).collect();
    let mut available: Vec<&Agent> = agents.into_iter().filter(|a| a.is_idle()).collect();

    if pending.is_empty() || available.is_empty() {
        return Vec::new();
    }

    pending.sort_by(|a, b| b.priority.total_cmp(&a.priority).then(a.seq.cmp(&b.seq)));
    available.sort_by_key(|agent| agent.seq);

    let mut planned = Vec::new();

    for task in pending {
        if available.is_empty() {
            break;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, agent) in available.iter().enumerate() {
            let candidate = score(agent, task);
            debug!(task_id = %task.id, agent_id = %agent.id, score = candidate, "scored candidate");
            if candidate > best.map_or(0.0, |(_, s)| s) {
                best = Some((index, candidate));
            }
        }

        match best {
            Some((index, best_score)) if best_score > ACCEPTANCE_THRESHOLD => {
                let agent = available.remove(index);
                planned.push(PlannedAssignment {
                    task_id: task.id,
                    agent_id: agent.id.clone(),
                    score: best_score,
                });
            }
            _ => {
                debug!(task_id = %task.id, "no agent above acceptance threshold, task stays pending");
            }
        }
    }

    planned
}
