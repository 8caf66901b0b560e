//! Dispatcher orchestration
//!
//! Wires the chunker, the worker pool, and the result sink together and
//! owns the thread lifecycle: spawn everything, join in dependency order,
//! push the terminal sentinel once the pool has drained.

use std::thread;
use std::time::Instant;

use anyhow::Result;
use crossbeam_channel::{bounded, unbounded};

use crate::engine::Engine;
use crate::errlog::ErrorSink;
use crate::stats::ProcessingStats;

use super::chunker::chunker_thread;
use super::sink::result_sink_thread;
use super::types::{DispatchConfig, ResultMessage};
use super::worker::worker_thread;

/// Batch dispatch pipeline driver.
pub struct BatchDispatcher {
    config: DispatchConfig,
}

impl BatchDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion: drain `reader` through the worker
    /// pool into `output`, in input order. Returns the merged run statistics.
    pub fn run<R, W>(
        &self,
        reader: R,
        output: W,
        engine: Engine,
        sink: ErrorSink,
        report_progress: bool,
    ) -> Result<ProcessingStats>
    where
        R: std::io::BufRead + Send + 'static,
        W: std::io::Write + Send + 'static,
    {
        let started_at = Instant::now();

        // Bounded work channel: the chunker blocks once 2x workers batches
        // are in flight. Results are unbounded; the sink drains continuously.
        let (work_sender, work_receiver) = bounded(self.config.work_channel_capacity());
        let (result_sender, result_receiver) = unbounded();

        let chunker_handle = {
            let work_sender = work_sender.clone();
            let batch_size = self.config.batch_size;
            let workers = self.config.workers;
            let sink = sink.clone();
            thread::spawn(move || chunker_thread(reader, work_sender, batch_size, workers, sink))
        };

        let mut worker_handles = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let work_receiver = work_receiver.clone();
            let result_sender = result_sender.clone();
            let engine = engine.clone();
            worker_handles.push(thread::spawn(move || {
                worker_thread(worker_id, work_receiver, result_sender, engine)
            }));
        }
        // The spawned threads hold their own clones.
        drop(work_sender);
        drop(work_receiver);

        let sink_handle =
            thread::spawn(move || result_sink_thread(result_receiver, output, report_progress));

        let chunker_stats = chunker_handle
            .join()
            .unwrap_or_else(|e| panic!("chunker thread panicked: {:?}", e))?;

        for (idx, handle) in worker_handles.into_iter().enumerate() {
            handle
                .join()
                .unwrap_or_else(|e| panic!("worker thread {} panicked: {:?}", idx, e));
        }

        // Every worker has exited; nothing can produce results anymore.
        let _ = result_sender.send(ResultMessage::Done);
        drop(result_sender);

        let mut stats = sink_handle
            .join()
            .unwrap_or_else(|e| panic!("sink thread panicked: {:?}", e))?;

        stats.merge(&chunker_stats);
        stats.processing_time = started_at.elapsed();
        Ok(stats)
    }
}
