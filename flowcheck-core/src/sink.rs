//! The verification sink: buffer everything, judge once.
//!
//! A [`VerificationSink`] owns the record batch for one run. Records are
//! appended as they arrive; the finish trigger is polled per record; when the
//! run reaches a terminal state the verifier is evaluated over the full batch
//! exactly once.

use crate::trigger::{FinishTrigger, RunToCompletion};
use crate::verifier::{OutputVerifier, VerifyError};

/// Buffers arriving records and, when finished, evaluates a verifier over
/// everything observed.
///
/// The batch is owned exclusively by this sink for the duration of one run
/// and is only read after the run terminated, so no synchronization is
/// needed around it.
pub struct VerificationSink<T> {
    records: Vec<T>,
    verifier: Box<dyn OutputVerifier<T>>,
    trigger: Box<dyn FinishTrigger<T>>,
    trigger_fired: bool,
    finished: bool,
}

impl<T> VerificationSink<T> {
    /// Create a sink that runs to natural source exhaustion.
    pub fn new(verifier: impl OutputVerifier<T> + 'static) -> Self {
        Self::with_trigger(verifier, RunToCompletion)
    }

    /// Create a sink with an explicit finish trigger.
    pub fn with_trigger(
        verifier: impl OutputVerifier<T> + 'static,
        trigger: impl FinishTrigger<T> + 'static,
    ) -> Self {
        Self {
            records: Vec::new(),
            verifier: Box::new(verifier),
            trigger: Box::new(trigger),
            trigger_fired: false,
            finished: false,
        }
    }

    /// Accept one record into the batch. Side-effect only, never fails.
    ///
    /// Returns true once the finish trigger has requested completion; the
    /// latch is monotonic — after the first `true` the trigger is no longer
    /// consulted. Records arriving after a stop request are still accepted
    /// (cancellation is cooperative); records arriving after [`finish`](Self::finish)
    /// are a precondition violation and are ignored.
    pub fn accept(&mut self, record: T) -> bool {
        if self.finished {
            return self.trigger_fired;
        }
        if !self.trigger_fired && self.trigger.on_record(&record) {
            self.trigger_fired = true;
            tracing::debug!(
                "finish trigger fired after {} record(s)",
                self.records.len() + 1
            );
        }
        self.records.push(record);
        self.trigger_fired
    }

    /// Evaluate the verifier over the full batch.
    ///
    /// Evaluates exactly once; a second call is a no-op that reports success
    /// without re-evaluating. A failed predicate is the only raising path.
    pub fn finish(&mut self) -> Result<(), VerifyError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.verifier.verify(&self.records)
    }

    /// Number of records observed so far.
    pub fn records_seen(&self) -> usize {
        self.records.len()
    }

    /// Whether the finish trigger has requested completion.
    pub fn trigger_fired(&self) -> bool {
        self.trigger_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{CountTrigger, FnTrigger};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn expect_sum(expected: i32) -> impl OutputVerifier<i32> + 'static {
        move |records: &[i32]| {
            let sum: i32 = records.iter().sum();
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
    fn test_accept_then_finish_passes() {
        let mut sink = VerificationSink::new(expect_sum(6));
        assert!(!sink.accept(1));
        assert!(!sink.accept(2));
        assert!(!sink.accept(3));
        assert_eq!(sink.records_seen(), 3);
        assert!(sink.finish().is_ok());
    }

    #[test]
    fn test_finish_reports_mismatch() {
        let mut sink = VerificationSink::new(expect_sum(6));
        sink.accept(1);
        let err = sink.finish().unwrap_err();
        assert_eq!(err.description(), "expected sum 6, saw 1");
    }

    #[test]
    fn test_trigger_latch_is_monotonic() {
        // A flapping trigger: true only on even records.
        let trigger = FnTrigger::new(|record: &i32| record % 2 == 0);
        let accept_anything = |_: &[i32]| -> Result<(), VerifyError> { Ok(()) };
        let mut sink = VerificationSink::with_trigger(accept_anything, trigger);

        assert!(!sink.accept(1));
        assert!(sink.accept(2));
        // Latched: an odd record no longer resets the decision.
        assert!(sink.accept(3));
        assert!(sink.trigger_fired());
    }

    #[test]
    fn test_count_trigger_fires_through_sink() {
        let accept_anything = |_: &[i32]| -> Result<(), VerifyError> { Ok(()) };
        let mut sink = VerificationSink::with_trigger(accept_anything, CountTrigger::new(2));
        assert!(!sink.accept(10));
        assert!(sink.accept(20));
        // Late records arriving before the stop takes effect are buffered.
        assert!(sink.accept(30));
        assert_eq!(sink.records_seen(), 3);
    }

    #[test]
    fn test_finish_evaluates_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_verifier = Arc::clone(&calls);
        let verifier = move |_: &[i32]| -> Result<(), VerifyError> {
            calls_in_verifier.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        let mut sink = VerificationSink::new(verifier);
        sink.accept(1);
        assert!(sink.finish().is_ok());
        // Second call is a no-op, not a re-evaluation.
        assert!(sink.finish().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_accept_after_finish_is_ignored() {
        let mut sink = VerificationSink::new(|records: &[i32]| {
            if records.len() == 1 {
                Ok(())
            } else {
                Err(VerifyError::new("unexpected extra records"))
            }
        });
        sink.accept(1);
        assert!(sink.finish().is_ok());
        sink.accept(2);
        assert_eq!(sink.records_seen(), 1);
    }
}
