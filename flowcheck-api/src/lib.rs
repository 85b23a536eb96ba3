//! # Flowcheck API
//!
//! Test-author surface for the flowcheck output-verification harness:
//! declare an expected-output predicate over an unordered (possibly
//! unbounded) output stream, and let the harness decide deterministically
//! when enough output has arrived to judge it — or kill the run at the
//! watchdog timeout and say so.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowcheck_api::harness::TestHarness;
//! use flowcheck_api::matchers;
//!
//! let mut harness = TestHarness::new();
//! let numbers = harness.create_dataset(vec![1i64, 2, 3]);
//! harness.assert_output(numbers, matchers::contains_exactly_in_any_order(vec![1i64, 2, 3]));
//! harness.execute().unwrap();
//! ```
//!
//! - [`harness`] — [`TestHarness`](harness::TestHarness): per-test lifecycle
//!   (set up, register assertions, execute, report) and the
//!   [`TestFailure`](harness::TestFailure) taxonomy.
//! - [`datastream`] — [`TestStream`](datastream::TestStream): fluent builder
//!   for test inputs with `map`/`filter`/`flat_map`.
//! - [`matchers`] — ready-made [`OutputVerifier`](flowcheck_core::verifier::OutputVerifier)
//!   implementations with descriptive mismatch messages.

pub mod datastream;
pub mod harness;
pub mod matchers;

pub use flowcheck_core;

pub use datastream::TestStream;
pub use flowcheck_core::trigger::{CountTrigger, FinishTrigger, FnTrigger, RunToCompletion};
pub use flowcheck_core::verifier::{OutputVerifier, VerifyError};
pub use harness::{TestFailure, TestHarness};
