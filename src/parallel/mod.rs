//! Parallel dispatch pipeline for annopipe
//!
//! Splits the input stream across a pool of worker threads, each of which
//! supervises one engine process at a time, and merges the results back in
//! input order.
//!
//! # Module Structure
//!
//! - `types`: Data structures for batches, messages, and configuration
//! - `chunker`: Input reading and batch creation thread
//! - `worker`: Worker thread driving one engine invocation per batch
//! - `sink`: Result sink thread for ordered output
//! - `processor`: BatchDispatcher orchestration

mod chunker;
mod processor;
mod sink;
mod types;
mod worker;

// Re-export public types
pub use processor::BatchDispatcher;
pub use types::{Batch, BatchResult, DispatchConfig};
