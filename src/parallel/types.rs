//! Type definitions for the dispatch pipeline
//!
//! Contains data structures for batches, channel messages, and configuration.

use crate::record::LineRecord;

/// Configuration for the dispatch pipeline
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub workers: usize,
    pub batch_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            batch_size: 250,
        }
    }
}

impl DispatchConfig {
    /// Capacity of the work channel: at most twice the worker count of
    /// batches may sit ahead of consumption, bounding producer memory.
    pub fn work_channel_capacity(&self) -> usize {
        self.workers * 2
    }
}

/// A sequence-numbered group of records processed by one engine invocation.
/// Sequences are dense, starting at 0; a batch is never mutated after the
/// chunker hands it off.
#[derive(Debug, Clone)]
pub struct Batch {
    pub sequence: u64,
    pub records: Vec<LineRecord>,
}

/// Work distributed to the pool. The chunker follows the last batch with
/// one `Stop` per worker.
#[derive(Debug)]
pub(crate) enum Work {
    Batch(Batch),
    Stop,
}

/// Result of one engine invocation over one batch.
#[derive(Debug)]
pub struct BatchResult {
    pub sequence: u64,
    /// Annotated output lines joined with newlines, or one
    /// `<id>|*** error ***` line per record when the invocation failed.
    /// May be empty when the engine emitted no result lines.
    pub payload: String,
    /// How many of the batch's records came back as error lines.
    pub error_count: usize,
}

/// Messages on the result channel. `Done` is the terminal sentinel the
/// driver pushes once every worker has exited; channel disconnection is
/// honored as a fallback.
#[derive(Debug)]
pub(crate) enum ResultMessage {
    Completed(BatchResult),
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = DispatchConfig::default();
        assert!(config.workers > 0);
        assert!(config.batch_size > 0);
        assert_eq!(config.work_channel_capacity(), config.workers * 2);
    }
}
