//! Agent entity: declared capabilities, status, capability ledger and
//! aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ledger::{CapabilityLedger, DEFAULT_CONFIDENCE, LedgerUpdate};
use super::{AgentId, AgentStatus, Outcome, PerformanceRecord};
use crate::tasks::TaskId;

/// Learning rate used outside training mode
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// History success rate above which a capability counts as expertise
pub const EXPERTISE_THRESHOLD: f64 = 0.9;

/// A worker that executes tasks and learns from their outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent ID
    pub id: AgentId,

    /// Display name
    pub name: String,

    /// Creation order within the owning controller
    pub(crate) seq: u64,

    ledger: CapabilityLedger,
    status: AgentStatus,
    performance_history: Vec<PerformanceRecord>,
    total_tasks_completed: u64,
    total_tasks_failed: u64,
    average_success_rate: f64,
    learning_rate: f64,
    adaptability_score: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last time an outcome was recorded
    pub last_activity: DateTime<Utc>,
}

impl Agent {
    /// Create an idle agent with its ledger seeded for every capability
    pub fn new<I, S>(name: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        Self {
            id: AgentId::new(),
            name: name.into(),
            seq: 0,
            ledger: CapabilityLedger::new(capabilities),
            status: AgentStatus::Idle,
            performance_history: Vec::new(),
            total_tasks_completed: 0,
            total_tasks_failed: 0,
            average_success_rate: 0.0,
            learning_rate: DEFAULT_LEARNING_RATE,
            adaptability_score: DEFAULT_CONFIDENCE,
            created_at: now,
            last_activity: now,
        }
    }

    /// Builder-style learning rate override
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Declared capabilities
    pub fn capabilities(&self) -> &[String] {
        self.ledger.capabilities()
    }

    /// Whether the agent declares a capability
    pub fn has_capability(&self, capability: &str) -> bool {
        self.ledger.declares(capability)
    }

    /// Capability ledger
    pub fn ledger(&self) -> &CapabilityLedger {
        &self.ledger
    }

    /// Confidence for a capability, 0.5 if never recorded
    pub fn confidence(&self, capability: &str) -> f64 {
        self.ledger.confidence(capability)
    }

    /// Success rate for a capability over its retained history, 0.5 if empty
    pub fn success_rate(&self, capability: &str) -> f64 {
        self.ledger.success_rate(capability)
    }

    /// Current status
    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Task the agent is working on, if busy
    pub fn current_task(&self) -> Option<TaskId> {
        self.status.current_task()
    }

    /// Whether the agent is idle
    pub fn is_idle(&self) -> bool {
        self.status.is_idle()
    }

    /// Per-agent learning rate
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Set the per-agent learning rate
    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    /// Mean of all declared confidences, recomputed after every update
    pub fn adaptability_score(&self) -> f64 {
        self.adaptability_score
    }

    /// Lifetime successful completions
    pub fn total_tasks_completed(&self) -> u64 {
        self.total_tasks_completed
    }

    /// Lifetime failures
    pub fn total_tasks_failed(&self) -> u64 {
        self.total_tasks_failed
    }

    /// completed / (completed + failed), 0 before any outcome
    pub fn average_success_rate(&self) -> f64 {
        self.average_success_rate
    }

    /// Finished tasks, oldest first
    pub fn performance_history(&self) -> &[PerformanceRecord] {
        &self.performance_history
    }

    /// Blend of lifetime success rate (60%) and mean confidence (40%)
    pub fn overall_score(&self) -> f64 {
        match self.ledger.mean_confidence() {
            Some(mean_confidence) => self.average_success_rate * 0.6 + mean_confidence * 0.4,
            None => 0.0,
        }
    }

    // ------------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------------

    /// Idle -> Busy(task). Returns `false` if the agent was not idle.
    pub(crate) fn occupy(&mut self, task_id: TaskId) -> bool {
        match self.status {
            AgentStatus::Idle => {
                self.status = AgentStatus::Busy(task_id);
                true
            }
            AgentStatus::Busy(_) | AgentStatus::Learning | AgentStatus::Optimizing => false,
        }
    }

    /// Busy -> Idle. Returns the task that was released, if any.
    pub(crate) fn release(&mut self) -> Option<TaskId> {
        match self.status {
            AgentStatus::Busy(task_id) => {
                self.status = AgentStatus::Idle;
                Some(task_id)
            }
            AgentStatus::Idle | AgentStatus::Learning | AgentStatus::Optimizing => None,
        }
    }

    // ------------------------------------------------------------------------
    // Learning
    // ------------------------------------------------------------------------

    /// Update one capability's confidence and refresh the adaptability score
    pub fn update_confidence(&mut self, capability: &str, outcome: Outcome) -> LedgerUpdate {
        let update = self.ledger.update(capability, outcome, self.learning_rate);
        if update.is_applied() {
            self.refresh_adaptability();
        }
        update
    }

    /// Declare a new capability at default confidence. Returns `false` if it
    /// was already declared.
    pub fn grant_capability(&mut self, capability: impl Into<String>) -> bool {
        let granted = self.ledger.grant(capability);
        if granted {
            self.refresh_adaptability();
        }
        granted
    }

    /// Append a performance record and update lifetime counters
    pub fn record_performance(
        &mut self,
        task_id: TaskId,
        success: bool,
        duration: f64,
        complexity: f64,
        capabilities_used: &[String],
    ) {
        let now = Utc::now();
        self.performance_history.push(PerformanceRecord {
            task_id,
            success,
            duration,
            complexity,
            capabilities: capabilities_used.to_vec(),
            timestamp: now,
        });

        if success {
            self.total_tasks_completed += 1;
        } else {
            self.total_tasks_failed += 1;
        }

        let total = self.total_tasks_completed + self.total_tasks_failed;
        self.average_success_rate = self.total_tasks_completed as f64 / total as f64;
        self.last_activity = now;
    }

    fn refresh_adaptability(&mut self) {
        if let Some(mean) = self.ledger.mean_confidence() {
            self.adaptability_score = mean;
        }
    }

    /// Per-capability view of learned state
    pub fn adaptivity_profile(&self) -> AdaptivityProfile {
        let mut history = HashMap::new();
        let mut expertise = Vec::new();

        for capability in self.capabilities() {
            let outcomes = self.ledger.history(capability);
            let success = outcomes.iter().filter(|&&o| o == 1).count();
            let success_rate = self.ledger.success_rate(capability);
            if success_rate > EXPERTISE_THRESHOLD {
                expertise.push(capability.clone());
            }
            history.insert(
                capability.clone(),
                CapabilityHistory {
                    success,
                    fail: outcomes.len() - success,
                    total: outcomes.len(),
                    success_rate,
                },
            );
        }

        AdaptivityProfile {
            capabilities: self.ledger.confidences(),
            success_history: self.ledger.histories(),
            history,
            expertise,
            total_tasks: self.performance_history.len(),
            adaptability_score: self.adaptability_score,
            learning_rate: self.learning_rate,
        }
    }
}

/// Outcome counts over the retained history of one capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityHistory {
    pub success: usize,
    pub fail: usize,
    pub total: usize,
    pub success_rate: f64,
}

/// Learned state of an agent across all of its capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptivityProfile {
    /// Capability -> confidence
    pub capabilities: HashMap<String, f64>,

    /// Capability -> retained outcomes
    pub success_history: HashMap<String, Vec<u8>>,

    /// Capability -> outcome counts
    pub history: HashMap<String, CapabilityHistory>,

    /// Capabilities whose retained success rate exceeds 0.9
    pub expertise: Vec<String>,

    /// Number of finished tasks
    pub total_tasks: usize,

    pub adaptability_score: f64,
    pub learning_rate: f64,
}
