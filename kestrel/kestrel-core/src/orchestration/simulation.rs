//! Stochastic task execution
//!
//! Stands in for real workers: once an in-progress task has run for its
//! estimated duration, its outcome is drawn from a probability derived from the
//! agent's confidences and the task's complexity.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::agents::{Agent, Outcome};
use crate::tasks::{Task, TaskStatus};

/// Fraction of success probability lost per complexity point
pub const COMPLEXITY_PENALTY: f64 = 0.1;

/// Probability that `agent` finishes `task` successfully.
///
/// Confidences of the required capabilities the agent declares are summed and
/// divided by the full requirement count, so missing capabilities drag the
/// probability down. The result is clamped to [0, 1].
pub fn success_probability(agent: &Agent, task: &Task) -> f64 {
    if task.required_capabilities.is_empty() {
        return 0.0;
    }

    let confidence_sum: f64 = task
        .required_capabilities
        .iter()
        .filter(|capability| agent.has_capability(capability))
        .map(|capability| agent.confidence(capability))
        .sum();
    let base = confidence_sum / task.required_capabilities.len() as f64;
    let complexity_factor = 1.0 - task.complexity * COMPLEXITY_PENALTY;

    (base * complexity_factor).clamp(0.0, 1.0)
}

/// Draw an outcome with the given success probability
pub fn draw_outcome<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> Outcome {
    Outcome::from_success(rng.random::<f64>() < probability)
}

/// Minutes the task has run, if it is in progress and has reached its
/// estimated duration
pub fn due_elapsed(task: &Task, now: DateTime<Utc>) -> Option<f64> {
    if task.status() != TaskStatus::InProgress {
        return None;
    }
    task.elapsed_minutes(now)
        .filter(|elapsed| *elapsed >= task.estimated_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_probability_scales_with_complexity() {
        let agent = Agent::new("a", ["x", "y"]);
        let task = Task::new("t", "", ["x", "y"]).with_complexity(5.0);
        // mean confidence 0.5, factor 0.5
        assert!((success_probability(&agent, &task) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_missing_capabilities_lower_probability() {
        let agent = Agent::new("a", ["x"]);
        let task = Task::new("t", "", ["x", "y"]).with_complexity(0.0);
        assert!((success_probability(&agent, &task) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_probability_is_clamped() {
        let agent = Agent::new("a", ["x"]);
        let hard = Task::new("t", "", ["x"]).with_complexity(12.0);
        assert_eq!(success_probability(&agent, &hard), 0.0);

        let easy = Task::new("t", "", ["x"]).with_complexity(-30.0);
        assert_eq!(success_probability(&agent, &easy), 1.0);
    }

    #[test]
    fn test_draw_outcome_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(draw_outcome(&mut rng, 1.0), Outcome::Success);
            assert_eq!(draw_outcome(&mut rng, 0.0), Outcome::Failure);
        }
    }

    #[test]
    fn test_due_elapsed() {
        let mut task = Task::new("t", "", ["x"]).with_estimated_duration(2.0);
        let start = Utc::now();
        assert_eq!(due_elapsed(&task, start), None);

        task.start(AgentId::new(), start).unwrap();
        assert_eq!(due_elapsed(&task, start + chrono::Duration::seconds(60)), None);
        assert_eq!(
            due_elapsed(&task, start + chrono::Duration::seconds(180)),
            Some(3.0)
        );
    }
}
