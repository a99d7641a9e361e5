//! Capability Ledger
//!
//! Per-capability confidence scores and bounded outcome history for a single
//! agent. Confidence moves by an exponential moving average toward 1 on
//! success and toward 0 on failure; this module is the only place it changes.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::Outcome;

/// Confidence assumed for a capability with no recorded updates
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Success rate assumed for a capability with an empty history
pub const DEFAULT_SUCCESS_RATE: f64 = 0.5;

/// Number of recent outcomes retained per capability
pub const HISTORY_LIMIT: usize = 10;

/// Result of a ledger update
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerUpdate {
    /// The capability is declared and its confidence was updated
    Applied {
        /// Capability that was updated
        capability: String,
        /// Confidence before the update
        before: f64,
        /// Confidence after the update
        after: f64,
    },

    /// The capability is not declared by the agent; nothing changed
    Ignored,
}

impl LedgerUpdate {
    /// Whether the update changed the ledger
    pub fn is_applied(&self) -> bool {
        matches!(self, LedgerUpdate::Applied { .. })
    }
}

/// Confidence and outcome history keyed by declared capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityLedger {
    /// Declared capabilities in declaration order, without duplicates
    capabilities: Vec<String>,

    /// Capability -> confidence in [0, 1]
    confidence: HashMap<String, f64>,

    /// Capability -> most recent outcomes (1 or 0), oldest first
    history: HashMap<String, VecDeque<u8>>,
}

impl CapabilityLedger {
    /// Seed a ledger for the given capabilities at default confidence
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ledger = Self::default();
        for capability in capabilities {
            ledger.grant(capability);
        }
        ledger
    }

    /// Declare a capability, seeding it at default confidence with an empty
    /// history. Returns `false` if it was already declared.
    pub fn grant(&mut self, capability: impl Into<String>) -> bool {
        let capability = capability.into();
        if self.declares(&capability) {
            return false;
        }
        self.confidence.insert(capability.clone(), DEFAULT_CONFIDENCE);
        self.history
            .insert(capability.clone(), VecDeque::with_capacity(HISTORY_LIMIT));
        self.capabilities.push(capability);
        true
    }

    /// Declared capabilities in declaration order
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Whether the capability is declared
    pub fn declares(&self, capability: &str) -> bool {
        self.confidence.contains_key(capability)
    }

    /// Whether no capability is declared
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Confidence for a capability, 0.5 if never recorded
    pub fn confidence(&self, capability: &str) -> f64 {
        self.confidence
            .get(capability)
            .copied()
            .unwrap_or(DEFAULT_CONFIDENCE)
    }

    /// Success rate over the retained history, 0.5 if empty
    pub fn success_rate(&self, capability: &str) -> f64 {
        match self.history.get(capability) {
            Some(outcomes) if !outcomes.is_empty() => {
                let successes: u32 = outcomes.iter().map(|&o| u32::from(o)).sum();
                f64::from(successes) / outcomes.len() as f64
            }
            _ => DEFAULT_SUCCESS_RATE,
        }
    }

    /// Retained outcomes for a capability, oldest first
    pub fn history(&self, capability: &str) -> Vec<u8> {
        self.history
            .get(capability)
            .map(|outcomes| outcomes.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Copy of every declared confidence
    pub fn confidences(&self) -> HashMap<String, f64> {
        self.confidence.clone()
    }

    /// Copy of every retained history
    pub fn histories(&self) -> HashMap<String, Vec<u8>> {
        self.history
            .iter()
            .map(|(capability, outcomes)| (capability.clone(), outcomes.iter().copied().collect()))
            .collect()
    }

    /// Mean confidence over all declared capabilities
    pub fn mean_confidence(&self) -> Option<f64> {
        if self.confidence.is_empty() {
            return None;
        }
        Some(self.confidence.values().sum::<f64>() / self.confidence.len() as f64)
    }

    /// Apply one outcome to a declared capability.
    ///
    /// `new = clamp01(old + learning_rate * (outcome - old))`, then the outcome
    /// is pushed onto the bounded history, evicting the oldest entry past
    /// [`HISTORY_LIMIT`].
    pub fn update(&mut self, capability: &str, outcome: Outcome, learning_rate: f64) -> LedgerUpdate {
        let Some(confidence) = self.confidence.get_mut(capability) else {
            debug!(capability, "ignoring update for undeclared capability");
            return LedgerUpdate::Ignored;
        };

        let before = *confidence;
        let target = f64::from(outcome.as_bit());
        let after = (before + learning_rate * (target - before)).clamp(0.0, 1.0);
        *confidence = after;

        let outcomes = self
            .history
            .entry(capability.to_string())
            .or_insert_with(|| VecDeque::with_capacity(HISTORY_LIMIT));
        outcomes.push_back(outcome.as_bit());
        while outcomes.len() > HISTORY_LIMIT {
            outcomes.pop_front();
        }

        LedgerUpdate::Applied {
            capability: capability.to_string(),
            before,
            after,
        }
    }
}
