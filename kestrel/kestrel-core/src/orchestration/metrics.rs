//! System-wide metrics
//!
//! Running counters plus ratios derived from them. The ratios are refreshed by
//! the controller after every state change that can move them.

use serde::{Deserialize, Serialize};

use crate::agents::Agent;

/// Aggregate counters and derived ratios for one controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Monotonic count of created tasks
    pub total_tasks_created: u64,

    /// Tasks finished successfully
    pub total_tasks_completed: u64,

    /// Tasks finished unsuccessfully
    pub total_tasks_failed: u64,

    /// Mean actual duration (minutes) over all finished tasks
    pub average_completion_time: f64,

    /// completed / (completed + failed), 0 when nothing has finished
    pub system_efficiency: f64,

    /// Non-idle agents / all agents, 0 when there are no agents
    pub agent_utilization: f64,
}

impl SystemMetrics {
    /// Count a newly created task
    pub(crate) fn record_created(&mut self) {
        self.total_tasks_created += 1;
    }

    /// Count a finished task and fold its duration into the average
    pub(crate) fn record_finished(&mut self, success: bool, actual_duration: f64) {
        let previous = self.total_tasks_completed + self.total_tasks_failed;
        if success {
            self.total_tasks_completed += 1;
        } else {
            self.total_tasks_failed += 1;
        }
        let finished = previous + 1;
        self.average_completion_time =
            (self.average_completion_time * previous as f64 + actual_duration) / finished as f64;
    }

    /// Recompute efficiency and utilization
    pub(crate) fn refresh<'a>(&mut self, agents: impl IntoIterator<Item = &'a Agent>) {
        let finished = self.total_tasks_completed + self.total_tasks_failed;
        self.system_efficiency = if finished > 0 {
            self.total_tasks_completed as f64 / finished as f64
        } else {
            0.0
        };

        let (busy, total) = agents
            .into_iter()
            .fold((0usize, 0usize), |(busy, total), agent| {
                (busy + usize::from(!agent.is_idle()), total + 1)
            });
        self.agent_utilization = if total > 0 {
            busy as f64 / total as f64
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskId;

    #[test]
    fn test_defaults_are_zero() {
        let mut metrics = SystemMetrics::default();
        metrics.refresh(std::iter::empty());
        assert_eq!(metrics.system_efficiency, 0.0);
        assert_eq!(metrics.agent_utilization, 0.0);
    }

    #[test]
    fn test_efficiency_and_average_time() {
        let mut metrics = SystemMetrics::default();
        metrics.record_finished(true, 4.0);
        metrics.record_finished(true, 6.0);
        metrics.record_finished(false, 8.0);
        metrics.refresh(std::iter::empty());

        assert!((metrics.system_efficiency - 2.0 / 3.0).abs() < 1e-12);
        assert!((metrics.average_completion_time - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_utilization_counts_busy_agents() {
        let mut busy = Agent::new("busy", ["x"]);
        busy.occupy(TaskId::new());
        let idle = Agent::new("idle", ["x"]);
        let agents = [busy, idle];

        let mut metrics = SystemMetrics::default();
        metrics.refresh(agents.iter());
        assert_eq!(metrics.agent_utilization, 0.5);
    }
}
