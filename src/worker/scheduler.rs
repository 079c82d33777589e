//! Pass scheduling, result merging and budget enforcement.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{ConfigError, SearchConfig};
use crate::crypto::{DeriveError, Ed25519Deriver, KeyDeriver};

use super::unit::{Match, SearchUnit, UnitReport};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("key derivation failed in unit {unit}, pass {pass}, attempt {attempt}: {source}")]
    Derivation {
        unit: u64,
        pass: u64,
        attempt: u64,
        #[source]
        source: DeriveError,
    },

    #[error("unit {unit} failed during pass {pass}: {reason}")]
    UnitFailed { unit: u64, pass: u64, reason: String },

    #[error("scheduler is {0}, no further passes can run")]
    NotRunning(SchedulerState),
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    /// Found budget reached
    Satisfied,
    /// Iteration budget used up
    Exhausted,
    /// Stopped between passes by request
    Aborted,
    /// A pass failed; its results were discarded
    Failed,
    Done,
}

impl SchedulerState {
    /// True once no further pass will be launched.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SchedulerState::Idle | SchedulerState::Running)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Satisfied => "satisfied",
            SchedulerState::Exhausted => "exhausted",
            SchedulerState::Aborted => "aborted",
            SchedulerState::Failed => "failed",
            SchedulerState::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Satisfied,
    Exhausted,
    Aborted,
    Failed,
}

/// Run-wide counters, owned by the scheduler and updated once per pass.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    total_attempts: u64,
    total_found: u64,
    current_pass: u64,
    elapsed: Duration,
}

impl RunState {
    /// Candidates examined in completed passes.
    pub fn total_attempts(&self) -> u64 {
        self.total_attempts
    }

    /// Matches merged from completed passes.
    pub fn total_found(&self) -> u64 {
        self.total_found
    }

    /// Number of completed passes (also the number of the next pass).
    pub fn current_pass(&self) -> u64 {
        self.current_pass
    }

    /// Wall time spent inside passes.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the generation rate (keys per second).
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Outcome of one completed pass.
#[derive(Debug)]
pub struct PassSummary<'a> {
    /// Pass number
    pub pass: u64,
    /// Candidates examined across all units
    pub attempts: u64,
    /// This pass's matches, in merge order
    pub matches: &'a [Match],
    /// Wall time of the pass
    pub elapsed: Duration,
    /// State after merging
    pub state: SchedulerState,
}

/// Final result of a run.
#[derive(Debug)]
pub struct RunReport {
    pub termination: Termination,
    pub state: RunState,
    /// Every merged match, ordered by (pass, unit, attempt)
    pub matches: Vec<Match>,
}

/// A failed run together with what earlier passes produced.
#[derive(Debug, thiserror::Error)]
#[error("search run failed: {error}")]
pub struct RunFailure {
    #[source]
    pub error: SearchError,
    pub report: RunReport,
}

/// Shared flag asking the scheduler to stop at the next pass boundary.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an abort. Safe to call from a signal handler.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives passes of parallel search units until a budget is met.
pub struct SearchScheduler<D = Ed25519Deriver> {
    config: SearchConfig,
    deriver: D,
    pool: ThreadPool,
    state: SchedulerState,
    run_state: RunState,
    matches: Vec<Match>,
}

impl SearchScheduler<Ed25519Deriver> {
    /// Creates a scheduler using the Ed25519 key scheme.
    pub fn ed25519(config: SearchConfig, workers: usize) -> Result<Self, SearchError> {
        Self::new(config, Ed25519Deriver, workers)
    }
}

impl<D: KeyDeriver> SearchScheduler<D> {
    /// Creates an idle scheduler running units on `workers` threads.
    pub fn new(config: SearchConfig, deriver: D, workers: usize) -> Result<Self, SearchError> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("vanity-unit-{}", i))
            .build()?;

        Ok(Self {
            config,
            deriver,
            pool,
            state: SchedulerState::Idle,
            run_state: RunState::default(),
            matches: Vec::new(),
        })
    }

    /// Runs one pass: fan out, wait for every unit, merge, update counters.
    ///
    /// A failed pass contributes nothing and moves the scheduler to `Failed`.
    pub fn step(&mut self) -> Result<PassSummary<'_>, SearchError> {
        match self.state {
            SchedulerState::Idle => {
                log::debug!("starting run with {} pattern(s)", self.config.patterns.len());
                self.run_state = RunState::default();
                self.state = SchedulerState::Running;
            }
            SchedulerState::Running => {}
            state => return Err(SearchError::NotRunning(state)),
        }

        let pass = self.run_state.current_pass;
        log::debug!(
            "launching pass {} ({} units x {} attempts)",
            pass,
            self.config.units_per_pass,
            self.config.attempts_per_execution
        );

        let started = Instant::now();
        let reports = match self.launch_pass(pass) {
            Ok(reports) => reports,
            Err(e) => {
                log::warn!("pass {} failed: {}", pass, e);
                self.state = SchedulerState::Failed;
                return Err(e);
            }
        };
        let elapsed = started.elapsed();

        let first_new = self.matches.len();
        let mut attempts = 0u64;
        for report in reports {
            attempts = attempts.saturating_add(report.attempts);
            self.matches.extend(report.matches);
        }
        // Reports arrive in unit order already; sorting pins the contract.
        self.matches[first_new..].sort_by_key(Match::provenance);
        let found = (self.matches.len() - first_new) as u64;

        let rs = &mut self.run_state;
        rs.total_attempts = rs.total_attempts.saturating_add(attempts);
        rs.total_found = rs.total_found.saturating_add(found);
        rs.current_pass += 1;
        rs.elapsed += elapsed;

        if rs.total_found >= self.config.stop_after_keys_found {
            self.state = SchedulerState::Satisfied;
        } else if rs.current_pass >= self.config.max_iterations {
            self.state = SchedulerState::Exhausted;
        }

        log::info!(
            "pass {} done: {} attempts, {} found ({} total) in {:.2}s",
            pass,
            attempts,
            found,
            rs.total_found,
            elapsed.as_secs_f64()
        );

        Ok(PassSummary {
            pass,
            attempts,
            matches: &self.matches[first_new..],
            elapsed,
            state: self.state,
        })
    }

    fn launch_pass(&self, pass: u64) -> Result<Vec<UnitReport>, SearchError> {
        let config = &self.config;
        let deriver = &self.deriver;

        // Indexed collect keeps unit order whatever the completion order.
        let reports: Vec<Result<UnitReport, SearchError>> = self.pool.install(|| {
            (0..config.units_per_pass)
                .into_par_iter()
                .map(|unit| {
                    let unit = unit as u64;
                    let search = SearchUnit::new(unit, pass, config, deriver);
                    panic::catch_unwind(AssertUnwindSafe(|| search.run())).unwrap_or_else(
                        |payload| {
                            Err(SearchError::UnitFailed {
                                unit,
                                pass,
                                reason: panic_message(payload.as_ref()),
                            })
                        },
                    )
                })
                .collect()
        });

        reports.into_iter().collect()
    }

    /// Stops the run before the next pass. No effect once terminal.
    pub fn abort(&mut self) {
        if !self.state.is_terminal() {
            log::warn!(
                "aborting after {} completed pass(es)",
                self.run_state.current_pass
            );
            self.state = SchedulerState::Aborted;
        }
    }

    /// Runs passes until a budget is met, `abort` is raised, or a pass fails.
    pub fn run(mut self, abort: &AbortFlag) -> Result<RunReport, RunFailure> {
        while !self.state.is_terminal() {
            if abort.is_raised() {
                self.abort();
                break;
            }
            let outcome = self.step().map(|_| ());
            if let Err(error) = outcome {
                return Err(RunFailure {
                    error,
                    report: self.finish(),
                });
            }
        }
        Ok(self.finish())
    }

    /// Hands over the merged matches and final counters.
    pub fn finish(mut self) -> RunReport {
        let termination = match self.state {
            SchedulerState::Satisfied => Termination::Satisfied,
            SchedulerState::Exhausted => Termination::Exhausted,
            SchedulerState::Failed => Termination::Failed,
            _ => Termination::Aborted,
        };
        self.state = SchedulerState::Done;

        RunReport {
            termination,
            state: self.run_state,
            matches: self.matches,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// Matches merged so far.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Upper bound on candidates this run may examine.
    pub fn attempt_budget(&self) -> u64 {
        self.config.attempt_budget()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unit panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::PatternSet;

    fn config(patterns: &[&str]) -> SearchConfig {
        SearchConfig::new(PatternSet::parse(patterns).unwrap())
            .with_max_iterations(3)
            .with_stop_after_keys_found(5)
            .with_attempts_per_execution(4)
            .with_units_per_pass(3)
            .with_run_seed([1u8; 32])
    }

    #[test]
    fn test_starts_idle() {
        let scheduler = SearchScheduler::ed25519(config(&["?"]), 2).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.run_state().current_pass(), 0);
    }

    #[test]
    fn test_exhausts_iteration_budget() {
        let mut scheduler = SearchScheduler::ed25519(config(&["zzzzzzzzzzzz"]), 2).unwrap();
        for pass in 0..3 {
            let summary = scheduler.step().unwrap();
            assert_eq!(summary.pass, pass);
            assert_eq!(summary.attempts, 12);
        }
        assert_eq!(scheduler.state(), SchedulerState::Exhausted);
        assert!(matches!(
            scheduler.step(),
            Err(SearchError::NotRunning(SchedulerState::Exhausted))
        ));

        let report = scheduler.finish();
        assert_eq!(report.termination, Termination::Exhausted);
        assert_eq!(report.state.total_attempts(), 3 * 4 * 3);
        assert_eq!(report.state.total_found(), 0);
    }

    #[test]
    fn test_found_budget_checked_at_pass_boundary() {
        let mut scheduler = SearchScheduler::ed25519(config(&["?"]), 2).unwrap();
        let summary = scheduler.step().unwrap();

        // Whole pass is kept even though the budget was hit mid-pass.
        assert_eq!(summary.matches.len(), 12);
        assert_eq!(summary.state, SchedulerState::Satisfied);
        assert_eq!(scheduler.run_state().total_found(), 12);
    }

    #[test]
    fn test_abort_between_passes() {
        let mut scheduler = SearchScheduler::ed25519(config(&["zzzzzzzzzzzz"]), 1).unwrap();
        scheduler.step().unwrap();
        scheduler.abort();
        assert_eq!(scheduler.state(), SchedulerState::Aborted);

        let report = scheduler.finish();
        assert_eq!(report.termination, Termination::Aborted);
        assert_eq!(report.state.current_pass(), 1);
    }

    #[test]
    fn test_raised_flag_aborts_before_first_pass() {
        let abort = AbortFlag::new();
        abort.raise();
        let report = SearchScheduler::ed25519(config(&["?"]), 1)
            .unwrap()
            .run(&abort)
            .unwrap();
        assert_eq!(report.termination, Termination::Aborted);
        assert_eq!(report.state.total_attempts(), 0);
        assert!(report.matches.is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = config(&["?"]).with_attempts_per_execution(0);
        assert!(matches!(
            SearchScheduler::ed25519(bad, 1),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unit panicked");
    }
}
