//! saltgrain - Salt grain reconciliation over SSH, gated on inventory acceptance

pub mod app;
pub mod logging;

pub use app::{build_engine, desired_state, GrainArgs, Operation};
