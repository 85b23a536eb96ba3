//! Local channels between pipeline threads.
//!
//! Uses crossbeam-channel for bounded, backpressure-aware communication
//! between the source, subtask, and collector threads of a pipeline.

use crate::types::StreamElement;
use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};

/// Default channel buffer size (bounded for backpressure).
///
/// Buffer size affects:
/// - Memory usage: larger = more buffering
/// - Latency: smaller = lower latency
/// - Throughput: larger = better throughput under bursty sources
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Sender side of a local element channel.
#[derive(Clone)]
pub struct ElementSender<T> {
    sender: Sender<StreamElement<T>>,
}

impl<T> ElementSender<T> {
    /// Send a stream element to the channel.
    ///
    /// Blocks if the channel is full (backpressure).
    pub fn send(&self, element: StreamElement<T>) -> Result<()> {
        self.sender
            .send(element)
            .map_err(|_| anyhow!("channel closed: receiver dropped"))
    }

    /// Try to send without blocking.
    ///
    /// Returns an error if the channel is full or closed.
    pub fn try_send(&self, element: StreamElement<T>) -> Result<()> {
        self.sender
            .try_send(element)
            .map_err(|e| anyhow!("failed to send: {:?}", e))
    }
}

/// Receiver side of a local element channel.
pub struct ElementReceiver<T> {
    pub(crate) receiver: Receiver<StreamElement<T>>,
}

impl<T> ElementReceiver<T> {
    /// Receive the next stream element.
    ///
    /// Blocks until an element is available.
    pub fn recv(&self) -> Result<StreamElement<T>> {
        self.receiver
            .recv()
            .map_err(|_| anyhow!("channel closed: sender dropped"))
    }

    /// Try to receive without blocking.
    ///
    /// Returns `None` if no element is available.
    pub fn try_recv(&self) -> Result<Option<StreamElement<T>>> {
        match self.receiver.try_recv() {
            Ok(elem) => Ok(Some(elem)),
            Err(crossbeam_channel::TryRecvError::Empty) => Ok(None),
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                Err(anyhow!("channel closed: sender dropped"))
            }
        }
    }
}

/// Create a bounded local channel pair with the given capacity.
///
/// When the channel is full, `send()` blocks until space is available,
/// propagating backpressure up the pipeline.
pub fn element_channel<T>(capacity: usize) -> (ElementSender<T>, ElementReceiver<T>) {
    let (sender, receiver) = bounded(capacity);
    (ElementSender { sender }, ElementReceiver { receiver })
}
