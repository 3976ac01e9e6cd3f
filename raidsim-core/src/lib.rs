// vim: tw=80
//! Capacity and performance modeling for RAID arrays
//!
//! Pure formulas live in `disk` and `raid`.  A `workload::WorkloadModel`
//! describes what will be stored, a `simulation::Simulator` evaluates it
//! against one array configuration, and a `run_log::RunLog` accumulates the
//! results.

pub mod config;
pub mod disk;
pub mod raid;
pub mod run_log;
pub mod simulation;
pub mod types;
pub mod workload;

pub use crate::types::*;
