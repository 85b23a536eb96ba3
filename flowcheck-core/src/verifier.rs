//! The predicate evaluated over everything a sink observed.
//!
//! An [`OutputVerifier`] is the harness's matcher abstraction: any assertion
//! library or hand-written predicate can implement it. Verification is
//! order-insignificant — parallel delivery makes arrival order
//! nondeterministic, so a verifier sees the full batch and decides.

use thiserror::Error;

/// A descriptive output mismatch produced by an [`OutputVerifier`].
///
/// Carries the human-readable explanation of what did not match; the harness
/// propagates the description verbatim to the failing test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct VerifyError {
    description: String,
}

impl VerifyError {
    /// Create a mismatch with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// The mismatch explanation.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Predicate over the full sequence of records a sink observed during a run.
///
/// `verify` is called exactly once per run, after the run reached a terminal
/// state. Returning `Err` is the only failure path; the error's description
/// should identify the mismatch.
pub trait OutputVerifier<T>: Send {
    fn verify(&self, records: &[T]) -> Result<(), VerifyError>;
}

// Any matching closure is a verifier; hand-written predicates need no wrapper.
impl<T, F> OutputVerifier<T> for F
where
    F: Fn(&[T]) -> Result<(), VerifyError> + Send,
{
    fn verify(&self, records: &[T]) -> Result<(), VerifyError> {
        self(records)
    }
}
