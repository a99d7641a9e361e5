//! Agents and their capability ledgers
//!
//! An agent declares a fixed set of capabilities at creation. Each declared
//! capability carries a learned confidence and a bounded history of recent
//! outcomes, which the scoring function reads and the completion path updates.

pub mod agent;
pub mod ledger;
pub mod types;

pub use agent::{AdaptivityProfile, Agent, CapabilityHistory, DEFAULT_LEARNING_RATE};
pub use ledger::{CapabilityLedger, LedgerUpdate, HISTORY_LIMIT};
pub use types::*;
