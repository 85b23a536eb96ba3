//! The per-test harness: lifecycle, assertion registration, and reporting.
//!
//! One [`TestHarness`] spans one test case. Construction is the set-up hook
//! (it owns a fresh [`TestEnvironment`] — nothing leaks across tests);
//! [`execute`](TestHarness::execute) is the tear-down hook that runs every
//! registered assertion and reports. `execute` consumes the harness, so a
//! finished harness cannot be reused by construction.

use std::time::Duration;

use thiserror::Error;

use flowcheck_core::environment::{DEFAULT_PARALLELISM, RunOutcome, TestEnvironment};
use flowcheck_core::sink::VerificationSink;
use flowcheck_core::trigger::FinishTrigger;
use flowcheck_core::types::StreamData;
use flowcheck_core::verifier::{OutputVerifier, VerifyError};

use crate::datastream::TestStream;

/// How a test run failed.
///
/// A forced stop is a tagged variant, not a string to be fished out of an
/// error message: a run killed by the watchdog is never conflated with a
/// plain assertion failure, and never silently passes.
#[derive(Debug, Error)]
pub enum TestFailure {
    /// A verifier evaluated and failed on a naturally completed run.
    /// The description is propagated verbatim.
    #[error("{0}")]
    AssertionMismatch(VerifyError),

    /// The run was forcibly stopped before reaching a determinable pass
    /// state, carrying whatever mismatch was observed on the truncated
    /// output. Either the test needs a longer timeout, or the source needs
    /// a finish trigger.
    #[error("test terminated due to timeout after {after:?}{}", mismatch_annotation(.mismatch))]
    Timeout {
        mismatch: Option<VerifyError>,
        after: Duration,
    },

    /// Environment construction or execution failed; propagated unmodified.
    #[error(transparent)]
    Environment(#[from] anyhow::Error),
}

fn mismatch_annotation(mismatch: &Option<VerifyError>) -> String {
    match mismatch {
        Some(err) => format!(": {err}"),
        None => String::new(),
    }
}

/// Harness for one test case over the in-process execution environment.
pub struct TestHarness {
    env: TestEnvironment,
}

impl TestHarness {
    /// Set up a harness with the default parallelism of
    /// [`DEFAULT_PARALLELISM`] subtasks per sink.
    pub fn new() -> Self {
        Self::with_parallelism(DEFAULT_PARALLELISM)
    }

    /// Set up a harness with explicit sink parallelism.
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            env: TestEnvironment::create(parallelism),
        }
    }

    pub fn set_parallelism(&mut self, parallelism: usize) {
        self.env.set_parallelism(parallelism);
    }

    /// Set the watchdog timeout for the run.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.env.set_run_timeout(timeout);
    }

    /// Create a test dataset from a collection.
    pub fn create_dataset<T: StreamData>(&self, values: Vec<T>) -> TestStream<T> {
        TestStream::from_values(values)
    }

    /// Create a test dataset from any iterator, including an unbounded one.
    pub fn create_dataset_from_iter<T, I>(&self, iter: I) -> TestStream<T>
    where
        T: StreamData,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        TestStream::from_iter(iter)
    }

    /// Create a verification sink that runs to natural source exhaustion.
    pub fn create_verified_sink<T: StreamData>(
        &self,
        verifier: impl OutputVerifier<T> + 'static,
    ) -> VerificationSink<T> {
        VerificationSink::new(verifier)
    }

    /// Create a verification sink with an explicit finish trigger.
    pub fn create_verified_sink_with_trigger<T: StreamData>(
        &self,
        verifier: impl OutputVerifier<T> + 'static,
        trigger: impl FinishTrigger<T> + 'static,
    ) -> VerificationSink<T> {
        VerificationSink::with_trigger(verifier, trigger)
    }

    /// Attach a previously created sink to a stream.
    pub fn attach_sink<T: StreamData>(&mut self, stream: TestStream<T>, sink: VerificationSink<T>) {
        self.env.add_pipeline(stream.source, sink);
    }

    /// Assert the stream's output against a verifier, running the source to
    /// natural exhaustion.
    pub fn assert_output<T: StreamData>(
        &mut self,
        stream: TestStream<T>,
        verifier: impl OutputVerifier<T> + 'static,
    ) {
        let sink = self.create_verified_sink(verifier);
        self.attach_sink(stream, sink);
    }

    /// Assert the stream's output against a verifier, finishing early once
    /// the trigger requests it — required for unbounded sources.
    pub fn assert_output_with_trigger<T: StreamData>(
        &mut self,
        stream: TestStream<T>,
        verifier: impl OutputVerifier<T> + 'static,
        trigger: impl FinishTrigger<T> + 'static,
    ) {
        let sink = self.create_verified_sink_with_trigger(verifier, trigger);
        self.attach_sink(stream, sink);
    }

    /// Forcibly stop the run. Idempotent.
    pub fn force_stop(&self) {
        self.env.force_stop();
    }

    /// Whether the run has been forcibly stopped.
    pub fn has_been_stopped(&self) -> bool {
        self.env.has_been_stopped()
    }

    /// Execute every registered assertion and report the outcome.
    ///
    /// Blocks until the run completes naturally or the watchdog stops it.
    /// Every run ends in `Ok(())` or a descriptively-messaged
    /// [`TestFailure`]; there is no silent inconclusive state.
    pub fn execute(mut self) -> Result<(), TestFailure> {
        let after = self.env.run_timeout();
        let outcome = self.env.run()?;
        let result = match outcome {
            RunOutcome::Passed => Ok(()),
            RunOutcome::Failed(mismatch) => Err(TestFailure::AssertionMismatch(mismatch)),
            RunOutcome::ForcedStop { mismatch } => Err(TestFailure::Timeout { mismatch, after }),
        };
        self.env.mark_reported();
        if let Err(failure) = &result {
            tracing::debug!("reporting failure: {failure}");
        }
        result
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
