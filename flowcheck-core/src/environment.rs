//! The test execution environment.
//!
//! A [`TestEnvironment`] owns every pipeline registered for one test case,
//! the shared stop signal, and the watchdog. [`run`](TestEnvironment::run)
//! executes all pipelines, blocks until they reach a terminal state, and
//! assembles exactly one [`RunOutcome`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, ensure};

use crate::control::{StopReason, StopSignal, Watchdog};
use crate::pipeline::{self, PipelineHandle, PipelineLauncher, SinkReport};
use crate::sink::VerificationSink;
use crate::types::StreamData;
use crate::verifier::VerifyError;

/// Default number of parallel subtasks per sink.
pub const DEFAULT_PARALLELISM: usize = 2;

/// Default watchdog timeout for one run.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(4);

/// Lifecycle of one environment.
///
/// `Idle → Running → {Completed, ForcedStopped} → Reported`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    ForcedStopped,
    Reported,
}

/// The single result of one run.
///
/// `ForcedStop` is distinguishable from `Failed` even when both stem from the
/// same failed evaluation: a forced stop means the environment was killed
/// before it could determine whether termination was legitimate.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every sink's verifier passed on a naturally completed run.
    Passed,
    /// A verifier failed on a naturally completed run.
    Failed(VerifyError),
    /// The run was forcibly stopped before a trustworthy verdict, carrying
    /// whatever mismatch was observed on the truncated output.
    ForcedStop { mismatch: Option<VerifyError> },
}

/// Execution environment for one test case.
///
/// Created fresh per test and released at its end; nothing is shared across
/// test cases.
pub struct TestEnvironment {
    parallelism: usize,
    run_timeout: Duration,
    pipelines: Vec<PipelineLauncher>,
    stop: Arc<StopSignal>,
    state: RunState,
}

impl TestEnvironment {
    /// Create a new environment with the given sink parallelism.
    pub fn create(parallelism: usize) -> Self {
        Self {
            parallelism,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            pipelines: Vec::new(),
            stop: Arc::new(StopSignal::new()),
            state: RunState::Idle,
        }
    }

    pub fn set_parallelism(&mut self, parallelism: usize) {
        self.parallelism = parallelism;
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Set the watchdog timeout for the next run.
    pub fn set_run_timeout(&mut self, timeout: Duration) {
        self.run_timeout = timeout;
    }

    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Submit a source and attach its verification sink as one pipeline.
    pub fn add_pipeline<T>(
        &mut self,
        source: Box<dyn Iterator<Item = T> + Send>,
        sink: VerificationSink<T>,
    ) where
        T: StreamData,
    {
        self.pipelines.push(Box::new(move |parallelism, stop| {
            pipeline::launch(source, sink, parallelism, stop)
        }));
    }

    /// Forcibly stop the run. Idempotent: calling this twice has the same
    /// observable effect as calling it once.
    pub fn force_stop(&self) {
        if self.stop.request_stop(StopReason::Forced) {
            tracing::warn!("run forcibly stopped on request");
        }
    }

    /// Whether the run has been forcibly stopped (watchdog or explicit).
    pub fn has_been_stopped(&self) -> bool {
        self.stop.is_forced()
    }

    /// Execute every registered pipeline and block until the run reaches a
    /// terminal state, naturally or by forced stop.
    ///
    /// Engine failures (thread panics, broken channels) propagate as errors;
    /// verification results are carried in the returned [`RunOutcome`].
    pub fn run(&mut self) -> Result<RunOutcome> {
        ensure!(
            self.state == RunState::Idle,
            "environment has already run (state {:?})",
            self.state
        );
        self.state = RunState::Running;
        tracing::info!(
            "starting run: {} pipeline(s), parallelism {}, timeout {:?}",
            self.pipelines.len(),
            self.parallelism,
            self.run_timeout
        );

        let watchdog = Watchdog::arm(Arc::clone(&self.stop), self.run_timeout);
        let parallelism = self.parallelism;
        let stop = Arc::clone(&self.stop);
        let handles: Vec<PipelineHandle> = self
            .pipelines
            .drain(..)
            .map(|launch| launch(parallelism, Arc::clone(&stop)))
            .collect();

        let mut reports: Vec<SinkReport> = Vec::with_capacity(handles.len());
        let mut run_error: Option<anyhow::Error> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(err)) => {
                    if run_error.is_none() {
                        run_error = Some(err);
                    }
                }
                Err(_) => {
                    if run_error.is_none() {
                        run_error = Some(anyhow!("pipeline thread panicked"));
                    }
                }
            }
        }
        watchdog.disarm();

        let forced = self.stop.is_forced();
        self.state = if forced {
            RunState::ForcedStopped
        } else {
            RunState::Completed
        };

        if let Some(err) = run_error {
            tracing::warn!("run failed: {err:#}");
            return Err(err);
        }

        let records_total: usize = reports.iter().map(|r| r.records_seen).sum();
        let mismatch = reports
            .iter()
            .find_map(|r| r.verdict.as_ref().err().cloned());

        let outcome = if forced {
            RunOutcome::ForcedStop { mismatch }
        } else if let Some(err) = mismatch {
            RunOutcome::Failed(err)
        } else {
            RunOutcome::Passed
        };
        tracing::info!(
            "run reached {:?} after {} record(s): {:?}",
            self.state,
            records_total,
            outcome
        );
        Ok(outcome)
    }

    /// Mark the outcome as surfaced to the calling test framework.
    pub fn mark_reported(&mut self) {
        if matches!(self.state, RunState::Completed | RunState::ForcedStopped) {
            self.state = RunState::Reported;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::CountTrigger;

    fn accept_anything() -> impl Fn(&[i64]) -> Result<(), VerifyError> + Send {
        |_: &[i64]| Ok(())
    }

    fn contains_sum(expected: i64) -> impl Fn(&[i64]) -> Result<(), VerifyError> + Send {
        move |records: &[i64]| {
            let sum: i64 = records.iter().sum();
            if sum == expected {
                Ok(())
            } else {
                Err(VerifyError::new(format!(
                    "expected sum {}, saw {}",
                    expected, sum
                )))
            }
        }
    }

    #[test]
    fn test_run_passes_on_natural_completion() {
        let mut env = TestEnvironment::create(2);
        env.add_pipeline(
            Box::new(vec![1i64, 2, 3].into_iter()),
            VerificationSink::new(contains_sum(6)),
        );

        let outcome = env.run().unwrap();
        assert!(matches!(outcome, RunOutcome::Passed));
        assert_eq!(env.state(), RunState::Completed);
        assert!(!env.has_been_stopped());
    }

    #[test]
    fn test_run_reports_mismatch() {
        let mut env = TestEnvironment::create(2);
        env.add_pipeline(
            Box::new(vec![1i64, 2].into_iter()),
            VerificationSink::new(contains_sum(6)),
        );

        match env.run().unwrap() {
            RunOutcome::Failed(err) => {
                assert_eq!(err.description(), "expected sum 6, saw 3");
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(env.state(), RunState::Completed);
    }

    #[test]
    fn test_trigger_stop_is_not_forced() {
        let mut env = TestEnvironment::create(2);
        env.add_pipeline(
            Box::new(0i64..),
            VerificationSink::with_trigger(accept_anything(), CountTrigger::new(5)),
        );

        let outcome = env.run().unwrap();
        assert!(matches!(outcome, RunOutcome::Passed));
        assert!(!env.has_been_stopped());
        assert_eq!(env.state(), RunState::Completed);
    }

    #[test]
    fn test_watchdog_forces_stop_of_unbounded_source() {
        let mut env = TestEnvironment::create(2);
        env.set_run_timeout(Duration::from_millis(100));
        env.add_pipeline(Box::new(0i64..), VerificationSink::new(accept_anything()));

        match env.run().unwrap() {
            RunOutcome::ForcedStop { mismatch } => assert!(mismatch.is_none()),
            other => panic!("expected ForcedStop, got {:?}", other),
        }
        assert!(env.has_been_stopped());
        assert_eq!(env.state(), RunState::ForcedStopped);
    }

    #[test]
    fn test_force_stop_is_idempotent() {
        let mut env = TestEnvironment::create(2);
        env.add_pipeline(Box::new(0i64..), VerificationSink::new(accept_anything()));

        env.force_stop();
        env.force_stop();
        assert!(env.has_been_stopped());

        match env.run().unwrap() {
            RunOutcome::ForcedStop { .. } => {}
            other => panic!("expected ForcedStop, got {:?}", other),
        }
    }

    #[test]
    fn test_run_twice_is_an_error() {
        let mut env = TestEnvironment::create(1);
        env.add_pipeline(
            Box::new(std::iter::empty::<i64>()),
            VerificationSink::new(accept_anything()),
        );
        env.run().unwrap();
        assert!(env.run().is_err());
    }

    #[test]
    fn test_mark_reported_transitions_state() {
        let mut env = TestEnvironment::create(1);
        env.mark_reported();
        // Not terminal yet, nothing to report.
        assert_eq!(env.state(), RunState::Idle);

        env.run().unwrap();
        env.mark_reported();
        assert_eq!(env.state(), RunState::Reported);
    }
}
