//! Controller - owner of all engine state
//!
//! Holds the agent and task collections, the assignment audit trail, system
//! metrics, training and simulation flags, and the optional device registry.
//! Every mutation of agents and tasks goes through here so the lifecycle
//! invariants between the two hold after each call:
//!
//! - an agent is `Busy(t)` exactly when task `t` is `InProgress` and assigned
//!   to it
//! - utilization and efficiency reflect the state after the last call
//!
//! Lookups by unknown id are reported through return values, never as errors.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agents::{Agent, AgentId, LedgerUpdate, Outcome};
use crate::config::{KestrelConfig, LearningConfig};
use crate::devices::{DeviceId, DeviceInfo, DeviceRegistry, Reading};
use crate::orchestration::simulation::{draw_outcome, due_elapsed, success_probability};
use crate::orchestration::{AssignmentRecord, SystemMetrics, plan_assignments};
use crate::snapshot::{AgentConfidence, AgentSnapshot, SystemSnapshot, TaskSnapshot};
use crate::tasks::{Task, TaskId, TaskStatus};

// ============================================================================
// Outcome types
// ============================================================================

/// Result of removing an agent or a task
#[derive(Debug, Clone, PartialEq)]
pub enum Removal<T> {
    /// Entity removed. `released` is the counterpart that was freed: the task
    /// reverted to pending when removing an agent, the agent set idle when
    /// removing a task.
    Removed { released: Option<T> },

    /// No entity with that id
    NotFound,
}

impl<T> Removal<T> {
    pub fn is_removed(&self) -> bool {
        matches!(self, Removal::Removed { .. })
    }
}

/// Confidence movement of one capability during a completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceChange {
    pub capability: String,
    pub before: f64,
    pub after: f64,
}

/// Details of an applied completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub outcome: Outcome,
    pub actual_duration: f64,

    /// Only capabilities the agent declares appear here
    pub confidence_changes: Vec<ConfidenceChange>,
}

/// Why a completion request changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    UnknownTask,
    Unassigned,
    NotInProgress(TaskStatus),
    UnknownAgent,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::UnknownTask => f.write_str("unknown task"),
            IgnoreReason::Unassigned => f.write_str("task has no assigned agent"),
            IgnoreReason::NotInProgress(status) => write!(f, "task is {}", status),
            IgnoreReason::UnknownAgent => f.write_str("assigned agent no longer exists"),
        }
    }
}

/// Result of [`Controller::complete_task`]
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Applied(CompletionReport),
    Ignored(IgnoreReason),
}

impl CompletionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CompletionOutcome::Applied(_))
    }

    pub fn report(&self) -> Option<&CompletionReport> {
        match self {
            CompletionOutcome::Applied(report) => Some(report),
            CompletionOutcome::Ignored(_) => None,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Assignment and learning engine state
pub struct Controller {
    agents: HashMap<AgentId, Agent>,
    tasks: HashMap<TaskId, Task>,

    /// Creation counter shared by agents and tasks
    next_seq: u64,

    assignment_history: Vec<AssignmentRecord>,
    metrics: SystemMetrics,

    simulation_active: bool,
    simulation_start_time: Option<DateTime<Utc>>,

    training_mode: bool,
    learning: LearningConfig,

    devices: Option<Box<dyn DeviceRegistry>>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("agents", &self.agents.len())
            .field("tasks", &self.tasks.len())
            .field("metrics", &self.metrics)
            .field("simulation_active", &self.simulation_active)
            .field("training_mode", &self.training_mode)
            .field("devices", &self.devices.is_some())
            .finish()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Empty controller with default learning rates
    pub fn new() -> Self {
        Self::with_learning(LearningConfig::default())
    }

    /// Empty controller using the configured learning rates
    pub fn from_config(config: &KestrelConfig) -> Self {
        Self::with_learning(config.learning.clone())
    }

    pub fn with_learning(learning: LearningConfig) -> Self {
        Self {
            agents: HashMap::new(),
            tasks: HashMap::new(),
            next_seq: 0,
            assignment_history: Vec::new(),
            metrics: SystemMetrics::default(),
            simulation_active: false,
            simulation_start_time: None,
            training_mode: false,
            learning,
            devices: None,
        }
    }

    /// Attach a device registry
    pub fn with_device_registry(mut self, registry: Box<dyn DeviceRegistry>) -> Self {
        self.devices = Some(registry);
        self
    }

    pub fn set_device_registry(&mut self, registry: Box<dyn DeviceRegistry>) {
        self.devices = Some(registry);
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn refresh_metrics(&mut self) {
        self.metrics.refresh(self.agents.values());
    }

    // ------------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------------

    /// Create an idle agent. It learns at the rate of the current mode.
    pub fn add_agent<I, S>(&mut self, name: impl Into<String>, capabilities: I) -> AgentId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut agent = Agent::new(name, capabilities).with_learning_rate(self.current_learning_rate());
        agent.seq = self.next_seq();
        let id = agent.id.clone();

        info!(agent_id = %id, name = %agent.name, capabilities = ?agent.capabilities(), "agent added");
        self.agents.insert(id.clone(), agent);
        self.refresh_metrics();
        id
    }

    /// Remove an agent, reverting its current task to pending
    pub fn remove_agent(&mut self, agent_id: &AgentId) -> Removal<TaskId> {
        let Some(agent) = self.agents.remove(agent_id) else {
            return Removal::NotFound;
        };

        let mut released = None;
        if let Some(task_id) = agent.current_task() {
            match self.tasks.get_mut(&task_id).map(Task::revert_to_pending) {
                Some(Ok(())) => {
                    info!(agent_id = %agent_id, task_id = %task_id, "task reverted to pending after agent removal");
                    released = Some(task_id);
                }
                Some(Err(e)) => warn!(agent_id = %agent_id, error = %e, "could not revert task of removed agent"),
                None => warn!(agent_id = %agent_id, task_id = %task_id, "removed agent held a task that no longer exists"),
            }
        }

        info!(agent_id = %agent_id, name = %agent.name, "agent removed");
        self.refresh_metrics();
        Removal::Removed { released }
    }

    /// Declare an additional capability on an agent, seeded at 0.5
    pub fn grant_capability(&mut self, agent_id: &AgentId, capability: impl Into<String>) -> bool {
        let capability = capability.into();
        match self.agents.get_mut(agent_id) {
            Some(agent) => {
                let granted = agent.grant_capability(capability.clone());
                if granted {
                    info!(agent_id = %agent_id, capability = %capability, "capability granted");
                }
                granted
            }
            None => false,
        }
    }

    pub fn agent(&self, agent_id: &AgentId) -> Option<&Agent> {
        self.agents.get(agent_id)
    }

    /// Agents in creation order
    pub fn agents(&self) -> Vec<&Agent> {
        let mut agents: Vec<&Agent> = self.agents.values().collect();
        agents.sort_by_key(|agent| agent.seq);
        agents
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    /// Register a pending task
    pub fn create_task(&mut self, mut task: Task) -> TaskId {
        task.seq = self.next_seq();
        let id = task.id;

        info!(task_id = %id, name = %task.name, priority = task.priority, "task created");
        self.tasks.insert(id, task);
        self.metrics.record_created();
        id
    }

    /// Remove a task in any state. Its agent is released only if the agent is
    /// still working on this task.
    pub fn remove_task(&mut self, task_id: &TaskId) -> Removal<AgentId> {
        let Some(task) = self.tasks.remove(task_id) else {
            return Removal::NotFound;
        };

        let mut released = None;
        if let Some(agent_id) = task.assigned_agent() {
            if let Some(agent) = self.agents.get_mut(agent_id) {
                if agent.current_task() == Some(*task_id) {
                    agent.release();
                    released = Some(agent_id.clone());
                }
            }
        }

        info!(task_id = %task_id, status = %task.status(), "task removed");
        self.refresh_metrics();
        Removal::Removed { released }
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    /// Tasks in creation order
    pub fn tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by_key(|task| task.seq);
        tasks
    }

    // ------------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------------

    /// Run one assignment cycle
    pub fn assign_tasks(&mut self) -> Vec<AssignmentRecord> {
        self.assign_tasks_at(Utc::now())
    }

    /// Run one assignment cycle, stamping starts with `now`
    pub fn assign_tasks_at(&mut self, now: DateTime<Utc>) -> Vec<AssignmentRecord> {
        let plan = plan_assignments(self.tasks.values(), self.agents.values());
        let mut committed = Vec::with_capacity(plan.len());

        for planned in plan {
            let (Some(task), Some(agent)) = (
                self.tasks.get_mut(&planned.task_id),
                self.agents.get_mut(&planned.agent_id),
            ) else {
                continue;
            };

            if !agent.is_idle() {
                warn!(agent_id = %agent.id, "planned agent is no longer idle, skipping");
                continue;
            }
            if let Err(e) = task.start(agent.id.clone(), now) {
                warn!(error = %e, "skipping planned assignment");
                continue;
            }
            agent.occupy(task.id);

            info!(
                task_id = %task.id,
                task = %task.name,
                agent_id = %agent.id,
                agent = %agent.name,
                score = planned.score,
                "task assigned"
            );

            let record = AssignmentRecord {
                task_id: planned.task_id,
                agent_id: planned.agent_id,
                score: planned.score,
                timestamp: now,
            };
            self.assignment_history.push(record.clone());
            committed.push(record);
        }

        if !committed.is_empty() {
            self.refresh_metrics();
        }
        committed
    }

    /// Append-only audit of every committed assignment
    pub fn assignment_history(&self) -> &[AssignmentRecord] {
        &self.assignment_history
    }

    // ------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------

    /// Apply an outcome to an in-progress task and learn from it
    pub fn complete_task(&mut self, task_id: &TaskId, success: bool, actual_duration: f64) -> CompletionOutcome {
        self.complete_task_at(task_id, success, actual_duration, Utc::now())
    }

    pub fn complete_task_at(
        &mut self,
        task_id: &TaskId,
        success: bool,
        actual_duration: f64,
        now: DateTime<Utc>,
    ) -> CompletionOutcome {
        let outcome = match self.apply_completion(task_id, Outcome::from_success(success), actual_duration, now) {
            Ok(report) => CompletionOutcome::Applied(report),
            Err(reason) => {
                debug!(task_id = %task_id, reason = %reason, "completion ignored");
                CompletionOutcome::Ignored(reason)
            }
        };
        if outcome.is_applied() {
            self.refresh_metrics();
        }
        outcome
    }

    fn apply_completion(
        &mut self,
        task_id: &TaskId,
        outcome: Outcome,
        actual_duration: f64,
        now: DateTime<Utc>,
    ) -> Result<CompletionReport, IgnoreReason> {
        let task = self.tasks.get_mut(task_id).ok_or(IgnoreReason::UnknownTask)?;
        let agent_id = task.assigned_agent().cloned().ok_or(IgnoreReason::Unassigned)?;
        if task.status() != TaskStatus::InProgress {
            return Err(IgnoreReason::NotInProgress(task.status()));
        }
        let agent = self.agents.get_mut(&agent_id).ok_or(IgnoreReason::UnknownAgent)?;

        if let Err(e) = task.finish(outcome, actual_duration, now) {
            warn!(error = %e, "completion rejected by task lifecycle");
            return Err(IgnoreReason::NotInProgress(task.status()));
        }

        let mut confidence_changes = Vec::new();
        for capability in &task.required_capabilities {
            if let LedgerUpdate::Applied { capability, before, after } = agent.update_confidence(capability, outcome) {
                confidence_changes.push(ConfidenceChange { capability, before, after });
            }
        }

        agent.record_performance(
            *task_id,
            outcome.is_success(),
            actual_duration,
            task.complexity,
            &task.required_capabilities,
        );

        if agent.current_task() == Some(*task_id) {
            agent.release();
        } else {
            warn!(agent_id = %agent_id, task_id = %task_id, "completed task was not the agent's current task");
        }

        for change in &confidence_changes {
            info!(
                agent_id = %agent_id,
                capability = %change.capability,
                before = change.before,
                after = change.after,
                "confidence updated"
            );
        }
        info!(
            task_id = %task_id,
            agent_id = %agent_id,
            success = outcome.is_success(),
            duration = actual_duration,
            "task finished"
        );

        self.metrics.record_finished(outcome.is_success(), actual_duration);

        Ok(CompletionReport {
            task_id: *task_id,
            agent_id,
            outcome,
            actual_duration,
            confidence_changes,
        })
    }

    // ------------------------------------------------------------------------
    // Training mode
    // ------------------------------------------------------------------------

    pub fn training_mode(&self) -> bool {
        self.training_mode
    }

    /// Rate applied to every agent in the current mode
    pub fn current_learning_rate(&self) -> f64 {
        if self.training_mode {
            self.learning.training_rate
        } else {
            self.learning.normal_rate
        }
    }

    /// Switch training mode and apply the matching rate to every agent
    pub fn set_training_mode(&mut self, enabled: bool) {
        self.training_mode = enabled;
        let rate = self.current_learning_rate();
        for agent in self.agents.values_mut() {
            agent.set_learning_rate(rate);
        }
        info!(training_mode = enabled, learning_rate = rate, "training mode changed");
    }

    /// Flip training mode, returning the new state
    pub fn toggle_training_mode(&mut self) -> bool {
        let enabled = !self.training_mode;
        self.set_training_mode(enabled);
        enabled
    }

    /// Override one agent's learning rate until the next mode change
    pub fn set_learning_rate(&mut self, agent_id: &AgentId, learning_rate: f64) -> bool {
        match self.agents.get_mut(agent_id) {
            Some(agent) => {
                agent.set_learning_rate(learning_rate);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------------

    pub fn start_simulation(&mut self) {
        self.start_simulation_at(Utc::now());
    }

    pub fn start_simulation_at(&mut self, now: DateTime<Utc>) {
        if !self.simulation_active {
            self.simulation_active = true;
            self.simulation_start_time = Some(now);
            info!("simulation started");
        }
    }

    pub fn stop_simulation(&mut self) {
        if self.simulation_active {
            self.simulation_active = false;
            info!("simulation stopped");
        }
    }

    pub fn is_simulation_active(&self) -> bool {
        self.simulation_active
    }

    /// Complete every in-progress task that has reached its estimated duration
    pub fn simulate_tick(&mut self, now: DateTime<Utc>) -> Vec<CompletionOutcome> {
        self.simulate_tick_with_rng(now, &mut rand::rng())
    }

    pub fn simulate_tick_with_rng<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Vec<CompletionOutcome> {
        if !self.simulation_active {
            return Vec::new();
        }

        let mut due: Vec<(u64, TaskId, f64, f64)> = self
            .tasks
            .values()
            .filter_map(|task| {
                let elapsed = due_elapsed(task, now)?;
                let agent = self.agents.get(task.assigned_agent()?)?;
                Some((task.seq, task.id, success_probability(agent, task), elapsed))
            })
            .collect();
        due.sort_by_key(|(seq, ..)| *seq);

        due.into_iter()
            .map(|(_, task_id, probability, elapsed)| {
                let outcome = draw_outcome(&mut *rng, probability);
                debug!(task_id = %task_id, probability, success = outcome.is_success(), "simulated outcome");
                self.complete_task_at(&task_id, outcome.is_success(), elapsed, now)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn metrics(&self) -> &SystemMetrics {
        &self.metrics
    }

    /// Owned copy of the full state
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            agents: self
                .agents
                .iter()
                .map(|(id, agent)| (id.clone(), AgentSnapshot::from(agent)))
                .collect(),
            tasks: self
                .tasks
                .iter()
                .map(|(id, task)| (*id, TaskSnapshot::from(task)))
                .collect(),
            metrics: self.metrics.clone(),
            simulation_active: self.simulation_active,
            simulation_start_time: self.simulation_start_time,
            training_mode: self.training_mode,
            assignments_made: self.assignment_history.len(),
            timestamp: Utc::now(),
        }
    }

    pub fn agent_status(&self, agent_id: &AgentId) -> Option<AgentSnapshot> {
        self.agents.get(agent_id).map(AgentSnapshot::from)
    }

    pub fn all_agents_confidence(&self) -> BTreeMap<AgentId, AgentConfidence> {
        self.agents
            .iter()
            .map(|(id, agent)| (id.clone(), AgentConfidence::from(agent)))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------------

    pub fn has_device_registry(&self) -> bool {
        self.devices.is_some()
    }

    /// Available devices, empty without a registry
    pub fn available_devices(&self, capability: Option<&str>) -> Vec<DeviceInfo> {
        self.devices
            .as_ref()
            .map(|registry| registry.list_available(capability))
            .unwrap_or_default()
    }

    /// All devices, empty without a registry
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.devices
            .as_ref()
            .map(|registry| registry.devices())
            .unwrap_or_default()
    }

    pub fn assign_task_to_device(&mut self, task_id: TaskId, device_id: &DeviceId) -> bool {
        let Some(registry) = self.devices.as_mut() else {
            return false;
        };
        let assigned = registry.assign(task_id, device_id);
        if assigned {
            info!(task_id = %task_id, device_id = %device_id, "task assigned to device");
        }
        assigned
    }

    /// Bind the task to the first available device matching the capability
    pub fn assign_task_to_best_device(&mut self, task_id: TaskId, capability: &str) -> Option<DeviceId> {
        let device = self.available_devices(Some(capability)).into_iter().next()?;
        self.assign_task_to_device(task_id, &device.id)
            .then_some(device.id)
    }

    /// Release the device holding the task
    pub fn complete_device_task(&mut self, task_id: TaskId) -> bool {
        let released = self
            .devices
            .as_mut()
            .is_some_and(|registry| registry.release(task_id));
        if released {
            info!(task_id = %task_id, "device task completed");
        }
        released
    }

    pub fn device_readings(&mut self, device_id: &DeviceId, limit: usize) -> Vec<Reading> {
        self.devices
            .as_mut()
            .map(|registry| registry.readings(device_id, limit))
            .unwrap_or_default()
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Controller behind a single mutex, for drivers running on several tasks
#[derive(Debug, Clone, Default)]
pub struct SharedController(Arc<Mutex<Controller>>);

impl SharedController {
    pub fn new(controller: Controller) -> Self {
        Self(Arc::new(Mutex::new(controller)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Controller> {
        self.0.lock()
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        self.lock().snapshot()
    }
}
