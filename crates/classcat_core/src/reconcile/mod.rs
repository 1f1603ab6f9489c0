//! Catalog reconciliation: converge one owner's class types and exercises to
//! a canonical spec in a single atomic run.
//!
//! # Responsibility
//! - Snapshot current state, plan explicit actions, execute them in
//!   dependency-safe order.
//! - Report per-entity created/kept/removed counts.
//!
//! # Invariants
//! - Planning is pure; all mutation happens in [`coordinator::execute_plan`].
//! - A second run with the same inputs is a no-op.

pub mod cascade;
pub mod coordinator;
pub mod creator;
pub mod error;
pub mod planner;
pub mod report;
pub mod snapshot;

pub use coordinator::{preview, reconcile, ReconcileRun, RunPhase};
pub use error::{ReconcileError, ReconcileResult};
pub use planner::{ReconcileOptions, ReconciliationPlan};
pub use report::{EntityCounts, ReconciliationReport};
pub use snapshot::{read_snapshot, CatalogSnapshot};
