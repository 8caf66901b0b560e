//! Chunker thread
//!
//! Reads the input stream lazily, groups records into fixed-size batches in
//! strictly increasing sequence order, and feeds them to the work channel.
//! Sending blocks when the channel is full, which is what backpressures a
//! fast reader against slow workers.

use anyhow::Result;
use crossbeam_channel::Sender;

use crate::errlog::ErrorSink;
use crate::platform;
use crate::record::LineRecord;
use crate::stats::ProcessingStats;

use super::types::{Batch, Work};

pub(crate) fn chunker_thread<R: std::io::BufRead>(
    mut reader: R,
    work_sender: Sender<Work>,
    batch_size: usize,
    workers: usize,
    sink: ErrorSink,
) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::default();
    let mut records: Vec<LineRecord> = Vec::with_capacity(batch_size);
    let mut sequence = 0u64;
    let mut buffer = String::new();

    loop {
        if platform::should_terminate() {
            break;
        }

        buffer.clear();
        match reader.read_line(&mut buffer) {
            Ok(0) => break,
            Ok(_) => {
                let line = buffer.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    continue;
                }
                stats.lines_read += 1;

                match LineRecord::parse(line) {
                    Some(record) => records.push(record),
                    None => {
                        stats.lines_malformed += 1;
                        sink.log_line(&format!("Malformed line (no delimiter): {}", line));
                        continue;
                    }
                }

                if records.len() >= batch_size {
                    let batch = Batch {
                        sequence,
                        records: std::mem::replace(&mut records, Vec::with_capacity(batch_size)),
                    };
                    sequence += 1;
                    stats.batches_dispatched += 1;
                    if work_sender.send(Work::Batch(batch)).is_err() {
                        // Workers are gone; nothing left to feed.
                        return Ok(stats);
                    }
                }
            }
            Err(e) => {
                sink.log_line(&format!("Input read error: {}", e));
                break;
            }
        }
    }

    // Final short batch, if any.
    if !records.is_empty() {
        let batch = Batch {
            sequence,
            records: std::mem::take(&mut records),
        };
        stats.batches_dispatched += 1;
        if work_sender.send(Work::Batch(batch)).is_err() {
            return Ok(stats);
        }
    }

    for _ in 0..workers {
        if work_sender.send(Work::Stop).is_err() {
            break;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io::Cursor;

    fn sink() -> (ErrorSink, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::open(&dir.path().join("errors.log")).unwrap();
        (sink, dir)
    }

    fn drain(receiver: &crossbeam_channel::Receiver<Work>) -> (Vec<Batch>, usize) {
        let mut batches = Vec::new();
        let mut stops = 0;
        while let Ok(work) = receiver.try_recv() {
            match work {
                Work::Batch(batch) => batches.push(batch),
                Work::Stop => stops += 1,
            }
        }
        (batches, stops)
    }

    #[test]
    fn batches_are_dense_and_sized() {
        let (sink, _dir) = sink();
        let (tx, rx) = unbounded();
        let input = "1|a\n2|b\n3|c\n4|d\n5|e\n";

        let stats = chunker_thread(Cursor::new(input), tx, 2, 3, sink).unwrap();

        let (batches, stops) = drain(&rx);
        assert_eq!(batches.len(), 3);
        assert_eq!(stops, 3);
        for (i, batch) in batches.iter().enumerate() {
            assert_eq!(batch.sequence, i as u64);
        }
        assert_eq!(batches[0].records.len(), 2);
        assert_eq!(batches[1].records.len(), 2);
        assert_eq!(batches[2].records.len(), 1, "final batch may be short");
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.batches_dispatched, 3);
    }

    #[test]
    fn empty_input_sends_only_stop_signals() {
        let (sink, _dir) = sink();
        let (tx, rx) = unbounded();

        let stats = chunker_thread(Cursor::new(""), tx, 10, 2, sink).unwrap();

        let (batches, stops) = drain(&rx);
        assert!(batches.is_empty());
        assert_eq!(stops, 2);
        assert_eq!(stats.lines_read, 0);
    }

    #[test]
    fn malformed_lines_are_logged_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let sink = ErrorSink::open(&path).unwrap();
        let (tx, rx) = unbounded();
        let input = "1|good\nno delimiter at all\n2|also good\n";

        let stats = chunker_thread(Cursor::new(input), tx, 10, 1, sink).unwrap();

        let (batches, _) = drain(&rx);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].records.len(), 2);
        assert_eq!(stats.lines_malformed, 1);

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("no delimiter at all"));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let (sink, _dir) = sink();
        let (tx, rx) = unbounded();
        let input = "1|a\n\n\n2|b\n";

        let stats = chunker_thread(Cursor::new(input), tx, 10, 1, sink).unwrap();

        let (batches, _) = drain(&rx);
        assert_eq!(batches[0].records.len(), 2);
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.lines_malformed, 0);
    }

    #[test]
    fn crlf_line_endings_are_trimmed() {
        let (sink, _dir) = sink();
        let (tx, rx) = unbounded();

        chunker_thread(Cursor::new("1|one\r\n2|two\r\n"), tx, 10, 1, sink).unwrap();

        let (batches, _) = drain(&rx);
        assert_eq!(batches[0].records[0].text, "one");
        assert_eq!(batches[0].records[1].text, "two");
    }
}
