//! Scoring, assignment, metrics and simulated execution.
//!
//! Everything here is a pure function over agents and tasks; the
//! [`Controller`](crate::Controller) owns the collections and commits results.

pub mod assignment;
pub mod metrics;
pub mod scoring;
pub mod simulation;

pub use assignment::{ACCEPTANCE_THRESHOLD, AssignmentRecord, PlannedAssignment, plan_assignments};
pub use metrics::SystemMetrics;
pub use scoring::{ScoreBreakdown, score, score_breakdown};
pub use simulation::{draw_outcome, success_probability};
