//! # Partitioner
//!
//! Routing of records across the parallel subtasks feeding a sink.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use ahash::AHasher;
use serde::Serialize;

/// Trait for routing records across parallel subtask instances.
pub trait Partitioner<T>: Send + Sync {
    /// Determine which partition (0..num_partitions) this record goes to.
    fn partition(&self, record: &T, num_partitions: usize) -> usize;
}

/// Hash-based partitioner using a key selector function.
///
/// Uses ahash for fast hashing. Routing here is load balancing only — every
/// partition feeds the same sink — but hashing keeps it deterministic: the
/// same record value always lands on the same subtask.
pub struct HashPartitioner<K, F> {
    key_selector: F,
    _phantom: PhantomData<K>,
}

impl<K, F> HashPartitioner<K, F> {
    /// Create a new hash partitioner with the given key selector.
    pub fn new(key_selector: F) -> Self {
        Self {
            key_selector,
            _phantom: PhantomData,
        }
    }
}

impl<K, T, F> Partitioner<T> for HashPartitioner<K, F>
where
    K: Hash + Send + Sync,
    F: Fn(&T) -> K + Send + Sync,
{
    fn partition(&self, record: &T, num_partitions: usize) -> usize {
        let key = (self.key_selector)(record);
        let mut hasher = AHasher::default();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        (hash as usize) % num_partitions
    }
}

/// Round-robin partitioner.
pub struct RoundRobinPartitioner {
    counter: std::sync::atomic::AtomicUsize,
}

impl RoundRobinPartitioner {
    pub fn new() -> Self {
        Self {
            counter: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobinPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Partitioner<T> for RoundRobinPartitioner {
    fn partition(&self, _record: &T, num_partitions: usize) -> usize {
        let count = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        count % num_partitions
    }
}

/// Serialize a record into key bytes for [`HashPartitioner`].
///
/// A record that fails to serialize degrades to an empty key (partition of
/// the empty hash); since routing is load balancing only, any index is valid.
pub fn record_bytes_key<T: Serialize>(record: &T) -> Vec<u8> {
    bincode::serialize(record).unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/partitioner_tests.rs"]
mod tests;
