//! Pacemaker Sim - Simulation harness for the temporal module
//!
//! This crate provides:
//! - A cooperative scheduler resuming tick runs at (or after) their event times
//! - Scripted clears and late-resumption models
//! - Interval-timing trials with scalar-variability statistics

pub mod scheduler;
pub mod trials;

pub use scheduler::*;
pub use trials::*;
