//! Agent-task desirability scoring
//!
//! The score is a fixed-weight blend of four signals, each normalized to
//! [0, 1]:
//!
//! | Signal | Weight |
//! |---|---|
//! | Capability coverage of the task's requirements | 0.40 |
//! | Mean confidence over matched requirements | 0.35 |
//! | Mean recent success rate over matched requirements | 0.15 |
//! | Availability (1.0 idle, 0.3 otherwise) | 0.10 |

use serde::{Deserialize, Serialize};

use crate::agents::Agent;
use crate::tasks::Task;

pub const CAPABILITY_MATCH_WEIGHT: f64 = 0.40;
pub const CONFIDENCE_WEIGHT: f64 = 0.35;
pub const SUCCESS_RATE_WEIGHT: f64 = 0.15;
pub const AVAILABILITY_WEIGHT: f64 = 0.10;

/// Availability signal for an agent that is not idle
pub const BUSY_AVAILABILITY: f64 = 0.3;

/// Individual signals and their weighted total
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Fraction of required capabilities the agent declares
    pub capability_match: f64,

    /// Mean confidence over matched capabilities
    pub confidence: f64,

    /// Mean retained success rate over matched capabilities
    pub success_rate: f64,

    /// 1.0 when idle, 0.3 otherwise
    pub availability: f64,

    /// Weighted sum of the four signals
    pub total: f64,
}

/// Score how desirable it is to give `task` to `agent`
pub fn score(agent: &Agent, task: &Task) -> f64 {
    score_breakdown(agent, task).total
}

/// Score with each signal exposed
pub fn score_breakdown(agent: &Agent, task: &Task) -> ScoreBreakdown {
    if agent.capabilities().is_empty() || task.required_capabilities.is_empty() {
        return ScoreBreakdown::default();
    }

    let matched: Vec<&str> = task
        .required_capabilities
        .iter()
        .map(String::as_str)
        .filter(|capability| agent.has_capability(capability))
        .collect();

    let capability_match = matched.len() as f64 / task.required_capabilities.len() as f64;
    let (confidence, success_rate) = if matched.is_empty() {
        (0.0, 0.0)
    } else {
        let n = matched.len() as f64;
        (
            matched.iter().map(|c| agent.confidence(c)).sum::<f64>() / n,
            matched.iter().map(|c| agent.success_rate(c)).sum::<f64>() / n,
        )
    };
    let availability = if agent.is_idle() { 1.0 } else { BUSY_AVAILABILITY };

    let total = capability_match * CAPABILITY_MATCH_WEIGHT
        + confidence * CONFIDENCE_WEIGHT
        + success_rate * SUCCESS_RATE_WEIGHT
        + availability * AVAILABILITY_WEIGHT;

    ScoreBreakdown {
        capability_match,
        confidence,
        success_rate,
        availability,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Outcome;
    use crate::tasks::TaskId;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_weights_sum_to_one() {
        let sum = CAPABILITY_MATCH_WEIGHT + CONFIDENCE_WEIGHT + SUCCESS_RATE_WEIGHT + AVAILABILITY_WEIGHT;
        assert!((sum - 1.0).abs() < EPS);
    }

    #[test]
    fn test_fresh_full_match() {
        let agent = Agent::new("a", ["x", "y"]);
        let task = Task::new("t", "", ["x", "y"]);
        // 1.0*0.4 + 0.5*0.35 + 0.5*0.15 + 1.0*0.1
        assert!((score(&agent, &task) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_partial_match() {
        let agent = Agent::new("a", ["x"]);
        let task = Task::new("t", "", ["x", "y"]);
        let breakdown = score_breakdown(&agent, &task);
        assert_eq!(breakdown.capability_match, 0.5);
        assert_eq!(breakdown.confidence, 0.5);
        assert!((breakdown.total - 0.55).abs() < EPS);
    }

    #[test]
    fn test_no_match_only_availability() {
        let agent = Agent::new("a", ["z"]);
        let task = Task::new("t", "", ["x"]);
        let breakdown = score_breakdown(&agent, &task);
        assert_eq!(breakdown.confidence, 0.0);
        assert_eq!(breakdown.success_rate, 0.0);
        assert!((breakdown.total - 0.1).abs() < EPS);
    }

    #[test]
    fn test_empty_sides_score_zero() {
        let agent = Agent::new("a", Vec::<String>::new());
        let task = Task::new("t", "", ["x"]);
        assert_eq!(score(&agent, &task), 0.0);

        let agent = Agent::new("a", ["x"]);
        let task = Task::new("t", "", Vec::<String>::new());
        assert_eq!(score(&agent, &task), 0.0);
    }

    #[test]
    fn test_busy_agent_is_penalized() {
        let mut agent = Agent::new("a", ["x"]);
        let task = Task::new("t", "", ["x"]);
        let idle = score(&agent, &task);
        agent.occupy(TaskId::new());
        let busy = score(&agent, &task);
        assert!((idle - busy - 0.07).abs() < EPS);
    }

    #[test]
    fn test_learned_confidence_breaks_ties() {
        let mut veteran = Agent::new("veteran", ["x"]);
        let rookie = Agent::new("rookie", ["x"]);
        for _ in 0..3 {
            veteran.update_confidence("x", Outcome::Success);
        }
        let task = Task::new("t", "", ["x"]);
        assert!(score(&veteran, &task) > score(&rookie, &task));
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let mut agent = Agent::new("a", ["x"]).with_learning_rate(1.0);
        agent.update_confidence("x", Outcome::Success);
        let task = Task::new("t", "", ["x"]);
        let total = score(&agent, &task);
        assert!((0.0..=1.0).contains(&total));
        assert!((total - 1.0).abs() < EPS);
    }
}
