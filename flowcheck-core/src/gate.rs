//! Fair fan-in from parallel subtask channels into one sink.
//!
//! Each verification sink is fed by `parallelism` subtask channels. The gate
//! reads them with fair selection so no subtask can starve the others, and
//! tracks end markers so the sink is finished only after every subtask ended.

use crate::channel::ElementReceiver;
use crate::types::StreamElement;
use anyhow::{Result, anyhow};
use crossbeam_channel::Select;

/// Fair fan-in over the subtask channels feeding a single sink.
pub struct CollectionGate<T> {
    channels: Vec<ElementReceiver<T>>,
    ended: Vec<bool>,
    ended_count: usize,
}

impl<T> CollectionGate<T> {
    /// Create a gate over the given subtask channels.
    pub fn new(channels: Vec<ElementReceiver<T>>) -> Self {
        let num_channels = channels.len();
        Self {
            channels,
            ended: vec![false; num_channels],
            ended_count: 0,
        }
    }

    /// Return the next record from any channel, or `None` once every channel
    /// has delivered its end marker.
    ///
    /// Uses fair selection: all live channels have equal priority. A channel
    /// that disconnects before sending `End` is an error.
    pub fn next(&mut self) -> Result<Option<T>> {
        loop {
            if self.ended_count == self.channels.len() {
                return Ok(None);
            }

            let mut select = Select::new();
            let mut active_indices = Vec::new();
            for (idx, receiver) in self.channels.iter().enumerate() {
                if !self.ended[idx] {
                    select.recv(&receiver.receiver);
                    active_indices.push(idx);
                }
            }

            let oper = select.select();
            let channel_idx = active_indices[oper.index()];
            let element = oper
                .recv(&self.channels[channel_idx].receiver)
                .map_err(|_| anyhow!("subtask channel {} closed before end marker", channel_idx))?;

            match element {
                StreamElement::Record(record) => return Ok(Some(record)),
                StreamElement::End => {
                    self.ended[channel_idx] = true;
                    self.ended_count += 1;
                }
            }
        }
    }

    /// Number of channels feeding this gate.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of channels that have delivered their end marker.
    pub fn num_ended(&self) -> usize {
        self.ended_count
    }

    /// True once every channel has ended.
    pub fn all_ended(&self) -> bool {
        self.ended_count == self.channels.len()
    }
}
