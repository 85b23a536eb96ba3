//! # Flowcheck Core
//!
//! Engine and verification machinery for the flowcheck test harness.
//!
//! This crate provides the runtime half of the harness:
//!
//! - [`types`] — Core data types: [`StreamElement`](types::StreamElement) and
//!   the [`StreamData`](types::StreamData) trait bound.
//! - [`channel`] — Bounded local channels between pipeline threads.
//! - [`gate`] — [`CollectionGate`](gate::CollectionGate): fair fan-in from
//!   parallel sink subtasks into one verification sink.
//! - [`partitioner`] — Routing of records across parallel subtasks.
//! - [`verifier`] — [`OutputVerifier`](verifier::OutputVerifier): the
//!   predicate evaluated over everything a sink observed.
//! - [`trigger`] — [`FinishTrigger`](trigger::FinishTrigger): per-record
//!   policy deciding when a sink has seen enough output.
//! - [`sink`] — [`VerificationSink`](sink::VerificationSink): buffers records
//!   and evaluates the verifier exactly once.
//! - [`control`] — [`StopSignal`](control::StopSignal) and the watchdog
//!   enforcing the run timeout.
//! - [`pipeline`] — Per-pipeline thread topology (source, subtasks, collector).
//! - [`environment`] — [`TestEnvironment`](environment::TestEnvironment):
//!   owns pipelines and produces one [`RunOutcome`](environment::RunOutcome)
//!   per run.

pub mod channel;
pub mod control;
pub mod environment;
pub mod gate;
pub mod partitioner;
pub mod pipeline;
pub mod sink;
pub mod trigger;
pub mod types;
pub mod verifier;
