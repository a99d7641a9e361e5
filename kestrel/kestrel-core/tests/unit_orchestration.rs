//! Unit tests for the controller's assignment and completion cycle
//!
//! Tests cover:
//! - Assignment ordering, threshold and conflict freedom
//! - Completion round trip and learning
//! - Removal of agents and tasks
//! - Metrics aggregation
//! - Snapshots

use chrono::Utc;
use kestrel_core::orchestration::score;
use kestrel_core::*;
use std::collections::HashSet;

fn controller_with(agents: &[(&str, &[&str])]) -> (Controller, Vec<AgentId>) {
    let mut controller = Controller::new();
    let ids = agents
        .iter()
        .map(|(name, caps)| controller.add_agent(*name, caps.iter().copied()))
        .collect();
    (controller, ids)
}

// ============================================================================
// Assignment Tests
// ============================================================================

#[test]
fn test_assign_with_no_agents_or_tasks() {
    let mut controller = Controller::new();
    assert!(controller.assign_tasks().is_empty());

    controller.create_task(Task::new("t", "", ["x"]));
    assert!(controller.assign_tasks().is_empty());
    assert!(controller.assignment_history().is_empty());
}

#[test]
fn test_priority_nine_beats_priority_three() {
    let (mut controller, agents) = controller_with(&[("solo", &["x"])]);
    let low = controller.create_task(Task::new("low", "", ["x"]).with_priority(3.0));
    let high = controller.create_task(Task::new("high", "", ["x"]).with_priority(9.0));

    let records = controller.assign_tasks();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].task_id, high);
    assert_eq!(records[0].agent_id, agents[0]);
    assert_eq!(controller.task(&low).unwrap().status(), TaskStatus::Pending);
    assert_eq!(controller.task(&high).unwrap().status(), TaskStatus::InProgress);
}

#[test]
fn test_no_double_booking() {
    let (mut controller, _) = controller_with(&[("a", &["x"]), ("b", &["x"]), ("c", &["x", "y"])]);
    for i in 0..6 {
        controller.create_task(Task::new(format!("t{}", i), "", ["x"]).with_priority(i as f64));
    }

    let records = controller.assign_tasks();
    assert_eq!(records.len(), 3);
    let agents: HashSet<_> = records.iter().map(|r| r.agent_id.clone()).collect();
    assert_eq!(agents.len(), 3);

    // Every agent is busy, so the next cycle assigns nothing
    assert!(controller.assign_tasks().is_empty());
    assert_eq!(controller.assignment_history().len(), 3);
}

#[test]
fn test_busy_agent_never_used() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let first = controller.create_task(Task::new("first", "", ["x"]));
    controller.assign_tasks();
    let second = controller.create_task(Task::new("second", "", ["x"]).with_priority(10.0));

    assert!(controller.assign_tasks().is_empty());
    assert_eq!(controller.agent(&agents[0]).unwrap().current_task(), Some(first));
    assert!(controller.task(&second).unwrap().is_pending());
}

#[test]
fn test_assignment_binds_both_sides() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    let records = controller.assign_tasks();

    let task = controller.task(&task_id).unwrap();
    let agent = controller.agent(&agents[0]).unwrap();
    assert_eq!(task.assigned_agent(), Some(&agents[0]));
    assert!(task.started_at().is_some());
    assert_eq!(agent.status(), AgentStatus::Busy(task_id));
    assert!((records[0].score - 0.75).abs() < 1e-12);
}

#[test]
fn test_threshold_then_grant() {
    let (mut controller, agents) = controller_with(&[("outsider", &["z"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));

    let agent = controller.agent(&agents[0]).unwrap();
    let task = controller.task(&task_id).unwrap();
    assert!((score(agent, task) - ACCEPTANCE_THRESHOLD).abs() < 1e-12);

    assert!(controller.assign_tasks().is_empty());
    assert!(controller.task(&task_id).unwrap().is_pending());

    assert!(controller.grant_capability(&agents[0], "x"));
    let records = controller.assign_tasks();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].task_id, task_id);
}

#[test]
fn test_task_without_requirements_never_assigned() {
    let (mut controller, _) = controller_with(&[("a", &["x"])]);
    let inert = controller.create_task(Task::new("inert", "", Vec::<String>::new()));
    assert!(controller.assign_tasks().is_empty());
    assert!(controller.task(&inert).unwrap().is_pending());
}

// ============================================================================
// Completion Tests
// ============================================================================

#[test]
fn test_round_trip() {
    let (mut controller, agents) = controller_with(&[("a", &["x", "y"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]).with_complexity(4.0));
    controller.assign_tasks();

    let outcome = controller.complete_task(&task_id, true, 7.5);
    let report = outcome.report().expect("completion applied");
    assert_eq!(report.agent_id, agents[0]);
    assert_eq!(report.confidence_changes.len(), 1);
    assert_eq!(report.confidence_changes[0].capability, "x");
    assert!((report.confidence_changes[0].after - 0.55).abs() < 1e-12);

    let task = controller.task(&task_id).unwrap();
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.assigned_agent(), Some(&agents[0]));
    assert_eq!(task.success_score(), Some(1.0));
    assert_eq!(task.actual_duration(), Some(7.5));
    assert!(task.completed_at().is_some());

    let agent = controller.agent(&agents[0]).unwrap();
    assert!(agent.is_idle());
    assert_eq!(agent.current_task(), None);
    assert_eq!(agent.total_tasks_completed(), 1);
    assert_eq!(agent.average_success_rate(), 1.0);
    assert_eq!(agent.confidence("y"), 0.5);
    assert_eq!(agent.performance_history()[0].complexity, 4.0);
}

#[test]
fn test_failure_lowers_confidence() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    controller.assign_tasks();
    controller.complete_task(&task_id, false, 1.0);

    let agent = controller.agent(&agents[0]).unwrap();
    assert!((agent.confidence("x") - 0.45).abs() < 1e-12);
    assert_eq!(controller.task(&task_id).unwrap().status(), TaskStatus::Failed);
    assert_eq!(controller.task(&task_id).unwrap().success_score(), Some(0.0));
}

#[test]
fn test_training_mode_learns_faster() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    controller.set_training_mode(true);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    controller.assign_tasks();
    controller.complete_task(&task_id, true, 1.0);

    let agent = controller.agent(&agents[0]).unwrap();
    assert!((agent.confidence("x") - 0.65).abs() < 1e-12);
}

#[test]
fn test_completion_for_removed_agent_ignored() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    controller.assign_tasks();
    controller.remove_agent(&agents[0]);

    // The task was reverted, so there is no assignee left
    assert_eq!(
        controller.complete_task(&task_id, true, 1.0),
        CompletionOutcome::Ignored(IgnoreReason::Unassigned)
    );
}

// ============================================================================
// Removal Tests
// ============================================================================

#[test]
fn test_remove_busy_agent_reverts_task() {
    let (mut controller, agents) = controller_with(&[("a", &["x"]), ("b", &["q"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    controller.assign_tasks();

    let removal = controller.remove_agent(&agents[0]);
    assert_eq!(removal, Removal::Removed { released: Some(task_id) });

    let task = controller.task(&task_id).unwrap();
    assert!(task.is_pending());
    assert!(task.assigned_agent().is_none());
    assert!(task.started_at().is_none());
    assert_eq!(controller.metrics().agent_utilization, 0.0);
}

#[test]
fn test_remove_in_progress_task_releases_agent() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    controller.assign_tasks();

    let removal = controller.remove_task(&task_id);
    assert_eq!(removal, Removal::Removed { released: Some(agents[0].clone()) });
    assert!(controller.agent(&agents[0]).unwrap().is_idle());
    assert!(controller.task(&task_id).is_none());
}

#[test]
fn test_remove_finished_task_leaves_agent_alone() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let done = controller.create_task(Task::new("done", "", ["x"]).with_priority(9.0));
    let next = controller.create_task(Task::new("next", "", ["x"]));
    controller.assign_tasks();
    controller.complete_task(&done, true, 1.0);
    controller.assign_tasks();

    assert_eq!(controller.remove_task(&done), Removal::Removed { released: None });
    assert_eq!(controller.agent(&agents[0]).unwrap().current_task(), Some(next));
}

// ============================================================================
// Metrics Tests
// ============================================================================

#[test]
fn test_metrics_two_successes_one_failure() {
    let (mut controller, _) = controller_with(&[("a", &["x"]), ("b", &["x"]), ("c", &["x"])]);
    let ids: Vec<TaskId> = (0..3)
        .map(|i| controller.create_task(Task::new(format!("t{}", i), "", ["x"])))
        .collect();
    controller.assign_tasks();
    assert_eq!(controller.metrics().agent_utilization, 1.0);

    controller.complete_task(&ids[0], true, 2.0);
    controller.complete_task(&ids[1], true, 4.0);
    controller.complete_task(&ids[2], false, 6.0);

    let metrics = controller.metrics();
    assert_eq!(metrics.total_tasks_created, 3);
    assert_eq!(metrics.total_tasks_completed, 2);
    assert_eq!(metrics.total_tasks_failed, 1);
    assert!((metrics.system_efficiency - 2.0 / 3.0).abs() < 1e-12);
    assert!((metrics.average_completion_time - 4.0).abs() < 1e-12);
    assert_eq!(metrics.agent_utilization, 0.0);
}

#[test]
fn test_utilization_counts_only_busy() {
    let (mut controller, _) = controller_with(&[("a", &["x"]), ("b", &["y"]), ("c", &["z"]), ("d", &["w"])]);
    controller.create_task(Task::new("t", "", ["x"]));
    controller.assign_tasks();
    assert_eq!(controller.metrics().agent_utilization, 0.25);
}

// ============================================================================
// Snapshot Tests
// ============================================================================

#[test]
fn test_snapshot_reflects_state() {
    let (mut controller, agents) = controller_with(&[("a", &["x"])]);
    let task_id = controller.create_task(Task::new("t", "", ["x"]));
    controller.set_training_mode(true);
    controller.assign_tasks_at(Utc::now());

    let snapshot = controller.snapshot();
    assert!(snapshot.training_mode);
    assert!(!snapshot.simulation_active);
    assert_eq!(snapshot.assignments_made, 1);
    assert_eq!(snapshot.count_tasks(TaskStatus::InProgress), 1);
    assert_eq!(snapshot.agents[&agents[0]].current_task, Some(task_id));
    assert_eq!(snapshot.agents[&agents[0]].learning_rate, 0.3);

    let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(json["tasks"][task_id.to_string()]["status"], "in_progress");
    assert_eq!(json["metrics"]["total_tasks_created"], 1);
}

#[test]
fn test_confidence_view() {
    let (mut controller, agents) = controller_with(&[("a", &["x", "y"]), ("b", &["z"])]);
    let task_id = controller.create_task(Task::new("t", "", ["y"]));
    controller.assign_tasks();
    controller.complete_task(&task_id, true, 1.0);

    let view = controller.all_agents_confidence();
    assert_eq!(view.len(), 2);
    assert!((view[&agents[0]].capabilities["y"] - 0.55).abs() < 1e-12);
    assert_eq!(view[&agents[1]].capabilities["z"], 0.5);

    assert!(controller.agent_status(&AgentId::new()).is_none());
    assert_eq!(controller.agent_status(&agents[1]).unwrap().name, "b");
}

#[test]
fn test_shared_controller() {
    let shared = SharedController::new(Controller::new());
    let worker = shared.clone();
    let handle = std::thread::spawn(move || {
        worker.lock().add_agent("threaded", ["x"]);
    });
    handle.join().unwrap();
    assert_eq!(shared.snapshot().agents.len(), 1);
}
