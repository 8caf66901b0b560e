// Append-only error log shared across workers

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

/// Append-only sink for offending input lines and failed batches.
///
/// Cloned into every worker; a single lock guards each append. Appends are
/// best-effort: a logging failure must never abort the batch that reported it,
/// so write errors are swallowed.
#[derive(Clone)]
pub struct ErrorSink {
    file: Arc<Mutex<File>>,
}

impl ErrorSink {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open error log {}", path.display()))?;
        Ok(ErrorSink {
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Append one raw line.
    pub fn log_line(&self, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line.trim_end());
        }
    }

    /// Append several raw lines under one lock acquisition, so a failed
    /// batch is not interleaved with entries from other workers.
    pub fn log_lines<'a, I>(&self, lines: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Ok(mut file) = self.file.lock() {
            for line in lines {
                let _ = writeln!(file, "{}", line.trim_end());
            }
        }
    }
}
