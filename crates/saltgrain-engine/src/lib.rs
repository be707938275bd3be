//! Saltgrain Engine - grain reconciliation and convergence
//!
//! `GrainEngine` is the entry point: it gates on inventory acceptance, hands
//! the grain to the scalar or list reconciler, then optionally converges.

pub mod converge;
pub mod engine;
pub mod list;
pub mod scalar;

pub use converge::{BusyWait, ConvergenceTrigger};
pub use engine::{ConvergenceReport, GrainEngine, Outcome};
pub use list::{ListDiff, ListReconciler};
pub use scalar::ScalarReconciler;
