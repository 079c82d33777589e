//! Parallel search execution.
//!
//! This module provides:
//! - `SearchUnit`: one unit's fixed attempt quantum for one pass
//! - `SearchScheduler`: pass fan-out, barrier, ordered merge and budgets
//!
//! Units share nothing mutable during a pass; all counters live in the
//! scheduler and are touched only between passes.

mod scheduler;
mod unit;

pub use scheduler::{
    AbortFlag, PassSummary, RunFailure, RunReport, RunState, SchedulerState, SearchError,
    SearchScheduler, Termination,
};
pub use unit::{Match, MatchRecord, SearchUnit, UnitReport};

/// Number of search units the machine can run concurrently.
pub fn hardware_concurrency() -> usize {
    num_cpus::get().max(1)
}
