//! Kestrel - capability-based task assignment with learned confidence
//!
//! Kestrel matches tasks to agents by declared capabilities and adapts each
//! agent's per-capability confidence from observed outcomes.
//!
//! # Architecture
//!
//! - `agents` - Agent entity, status machine and capability ledger
//! - `tasks` - Task entity and lifecycle
//! - `orchestration` - Scoring, greedy assignment, metrics and simulated execution
//! - `controller` - Owner of all state; the entry point for drivers
//! - `snapshot` - Read-only serializable views for presentation layers
//! - `devices` - Boundary to a device registry used as a fallback target
//! - `config` - TOML configuration with environment overrides
//!
//! # Example
//!
//! ```
//! use kestrel_core::{Controller, Task};
//!
//! let mut controller = Controller::new();
//! let analyst = controller.add_agent("Analyst", ["data_analysis"]);
//! let task = controller.create_task(Task::new("Report", "weekly numbers", ["data_analysis"]));
//!
//! let assigned = controller.assign_tasks();
//! assert_eq!(assigned[0].agent_id, analyst);
//!
//! let outcome = controller.complete_task(&task, true, 5.0);
//! assert!(outcome.is_applied());
//! assert!((controller.agent(&analyst).unwrap().confidence("data_analysis") - 0.55).abs() < 1e-9);
//! ```

pub mod agents;
pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod orchestration;
pub mod snapshot;
pub mod tasks;

pub use agents::{Agent, AgentId, AgentStatus, CapabilityLedger, LedgerUpdate, Outcome};
pub use config::KestrelConfig;
pub use controller::{
    CompletionOutcome, CompletionReport, ConfidenceChange, Controller, IgnoreReason, Removal,
    SharedController,
};
pub use devices::{DeviceId, DeviceInfo, DeviceRegistry, DeviceStatus, Location, Reading};
pub use error::{KestrelError, Result};
pub use orchestration::{ACCEPTANCE_THRESHOLD, AssignmentRecord, ScoreBreakdown, SystemMetrics};
pub use snapshot::{AgentConfidence, AgentSnapshot, SystemSnapshot, TaskSnapshot};
pub use tasks::{Task, TaskId, TaskStatus, TransitionError};

/// Kestrel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
