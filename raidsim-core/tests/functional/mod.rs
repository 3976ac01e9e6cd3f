// vim: tw=80
//! End-to-end tests of raidsim-core's public API

mod run_log;
mod simulation;
