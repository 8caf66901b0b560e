//! Result sink thread: ordered output reassembly
//!
//! Workers finish batches in whatever order the engine allows; the sink
//! buffers out-of-order results and flushes them strictly by ascending
//! sequence number, so the output file matches the input order exactly.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::Receiver;

use crate::stats::ProcessingStats;

use super::types::{BatchResult, ResultMessage};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) fn result_sink_thread<W: Write>(
    result_receiver: Receiver<ResultMessage>,
    mut output: W,
    report_progress: bool,
) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::default();
    let mut pending: BTreeMap<u64, BatchResult> = BTreeMap::new();
    let mut next_expected = 0u64;

    let start_time = Instant::now();
    let mut last_report = Instant::now();

    loop {
        let result = match result_receiver.recv() {
            Ok(ResultMessage::Completed(result)) => result,
            // Terminal sentinel from the driver, or every sender is gone.
            Ok(ResultMessage::Done) | Err(_) => break,
        };

        stats.lines_errored += result.error_count;
        pending.insert(result.sequence, result);

        // Flush every consecutive batch starting from next_expected.
        while let Some(result) = pending.remove(&next_expected) {
            write_payload(&mut output, &result, &mut stats)?;
            next_expected += 1;
        }

        if report_progress && last_report.elapsed() >= PROGRESS_INTERVAL {
            eprintln!("{}", stats.format_progress(start_time.elapsed()));
            last_report = Instant::now();
        }
    }

    // Anything still buffered means a sequence never arrived upstream. That
    // is unreachable in a correct run, but dumping the leftovers in ascending
    // order beats blocking forever or dropping them.
    for (_, result) in std::mem::take(&mut pending) {
        write_payload(&mut output, &result, &mut stats)?;
    }

    output.flush()?;
    Ok(stats)
}

fn write_payload<W: Write>(
    output: &mut W,
    result: &BatchResult,
    stats: &mut ProcessingStats,
) -> Result<()> {
    if !result.payload.is_empty() {
        writeln!(output, "{}", result.payload)?;
        stats.lines_output += result.payload.lines().count();
    }
    stats.batches_completed += 1;
    Ok(())
}
