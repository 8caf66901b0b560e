use std::time::Duration;

/// Statistics collected during a run.
///
/// The chunker and the result sink each fill in the fields they can observe;
/// the dispatcher merges both halves after the threads join.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    pub lines_read: usize,
    pub lines_malformed: usize,
    pub lines_output: usize,
    pub lines_errored: usize,
    pub batches_dispatched: usize,
    pub batches_completed: usize,
    pub processing_time: Duration,
}

impl ProcessingStats {
    /// Fold another thread's counters into this one.
    pub fn merge(&mut self, other: &ProcessingStats) {
        self.lines_read += other.lines_read;
        self.lines_malformed += other.lines_malformed;
        self.lines_output += other.lines_output;
        self.lines_errored += other.lines_errored;
        self.batches_dispatched += other.batches_dispatched;
        self.batches_completed += other.batches_completed;
    }

    /// One-line end-of-run summary.
    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Lines processed: {} total, {} output, {} errored",
            self.lines_read, self.lines_output, self.lines_errored
        );

        if self.lines_malformed > 0 {
            output.push_str(&format!(", {} malformed", self.lines_malformed));
        }

        output.push_str(&format!(
            "; Batches: {} dispatched, {} completed",
            self.batches_dispatched, self.batches_completed
        ));

        let processing_time_ms = self.processing_time.as_millis();
        output.push_str(&format!(" in {}ms", processing_time_ms));

        if processing_time_ms > 0 && self.lines_output > 0 {
            let lines_per_sec = (self.lines_output as f64 * 1000.0) / processing_time_ms as f64;
            output.push_str(&format!(" ({:.0} lines/s)", lines_per_sec));
        }

        output
    }

    /// Periodic progress line emitted while the sink is flushing.
    pub fn format_progress(&self, elapsed: Duration) -> String {
        let secs = elapsed.as_secs_f64();
        let speed = if secs > 0.0 {
            self.lines_output as f64 / secs
        } else {
            self.lines_output as f64
        };
        format!(
            "{} batches done, {} lines written in {:.2}s ({:.2} lines/s)",
            self.batches_completed, self.lines_output, secs, speed
        )
    }
}
