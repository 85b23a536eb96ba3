//! Per-pipeline execution topology.
//!
//! Each registered assertion becomes one pipeline:
//!
//! ```text
//! Source Thread (1)
//!     |
//!     | Hash Partition (record bytes)
//!     v
//! Subtask Forwarders (parallelism threads)
//!     |
//!     v
//! Collection Gate -> Verification Sink (coordinator thread)
//! ```
//!
//! The source checks the shared stop flag before each record and emits `End`
//! down every subtask channel when stopping, so a stop request drains rather
//! than deadlocks. The sink is finished only after all subtasks ended.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};

use crate::channel::{DEFAULT_CHANNEL_CAPACITY, element_channel};
use crate::control::{StopReason, StopSignal};
use crate::gate::CollectionGate;
use crate::partitioner::{HashPartitioner, Partitioner, record_bytes_key};
use crate::sink::VerificationSink;
use crate::types::{StreamData, StreamElement};
use crate::verifier::VerifyError;

/// Summary of one pipeline's sink after its run ended.
#[derive(Debug)]
pub struct SinkReport {
    /// Verdict of the sink's verifier over the full record batch.
    pub verdict: Result<(), VerifyError>,
    /// Records observed before the run terminated.
    pub records_seen: usize,
    /// Whether the sink's finish trigger requested completion.
    pub trigger_fired: bool,
}

pub(crate) type PipelineHandle = JoinHandle<Result<SinkReport>>;

/// Deferred pipeline start: parallelism and the shared stop signal are bound
/// at run time, not at registration time.
pub(crate) type PipelineLauncher = Box<dyn FnOnce(usize, Arc<StopSignal>) -> PipelineHandle + Send>;

/// Launch one pipeline: spawn its coordinator thread and return the handle.
pub(crate) fn launch<T>(
    source: Box<dyn Iterator<Item = T> + Send>,
    mut sink: VerificationSink<T>,
    parallelism: usize,
    stop: Arc<StopSignal>,
) -> PipelineHandle
where
    T: StreamData,
{
    thread::spawn(move || -> Result<SinkReport> {
        let parallelism = parallelism.max(1);

        // Channels: Source -> Subtasks and Subtasks -> Collector.
        let mut subtask_inputs = Vec::with_capacity(parallelism);
        let mut collector_inputs = Vec::with_capacity(parallelism);
        let mut source_senders = Vec::with_capacity(parallelism);
        let mut collector_receivers = Vec::with_capacity(parallelism);
        for _ in 0..parallelism {
            let (tx, rx) = element_channel::<T>(DEFAULT_CHANNEL_CAPACITY);
            source_senders.push(tx);
            subtask_inputs.push(rx);
            let (tx, rx) = element_channel::<T>(DEFAULT_CHANNEL_CAPACITY);
            collector_inputs.push(tx);
            collector_receivers.push(rx);
        }

        // Source thread: partition records until exhausted or stopped, then
        // broadcast End so every subtask terminates.
        let source_stop = Arc::clone(&stop);
        let source_handle = thread::spawn(move || -> Result<()> {
            let partitioner = HashPartitioner::new(record_bytes_key::<T>);
            for record in source {
                if source_stop.is_stopped() {
                    break;
                }
                let partition = partitioner.partition(&record, parallelism);
                source_senders[partition].send(StreamElement::Record(record))?;
            }
            for sender in &source_senders {
                sender.send(StreamElement::End)?;
            }
            Ok(())
        });

        // Subtask forwarders: one thread per parallel sink instance.
        let mut subtask_handles = Vec::with_capacity(parallelism);
        for (input, output) in subtask_inputs.into_iter().zip(collector_inputs) {
            subtask_handles.push(thread::spawn(move || -> Result<()> {
                loop {
                    match input.recv()? {
                        StreamElement::Record(record) => {
                            output.send(StreamElement::Record(record))?;
                        }
                        StreamElement::End => {
                            output.send(StreamElement::End)?;
                            break;
                        }
                    }
                }
                Ok(())
            }));
        }

        // Collector: fair fan-in into the sink, polling the finish trigger.
        let mut gate = CollectionGate::new(collector_receivers);
        while let Some(record) = gate.next()? {
            if sink.accept(record) && stop.request_stop(StopReason::TriggerComplete) {
                tracing::info!(
                    "finish trigger fired after {} record(s), requesting graceful stop",
                    sink.records_seen()
                );
            }
        }

        let verdict = sink.finish();
        let report = SinkReport {
            records_seen: sink.records_seen(),
            trigger_fired: sink.trigger_fired(),
            verdict,
        };

        source_handle
            .join()
            .map_err(|_| anyhow!("source thread panicked"))??;
        for handle in subtask_handles {
            handle
                .join()
                .map_err(|_| anyhow!("subtask thread panicked"))??;
        }

        Ok(report)
    })
}
