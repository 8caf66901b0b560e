// Engine supervision: one isolated child process per batch
//
// The interaction is a single synchronous round trip: serialize the batch
// onto the child's stdin, read its stdout to completion, filter the result
// lines. A wall-clock deadline bounds the whole exchange; exceeding it kills
// the child's entire process group so no grandchildren linger.

use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AnnopipeConfig;
use crate::errlog::ErrorSink;
use crate::parallel::{Batch, BatchResult};
use crate::record::{self, LineRecord};

/// Engine output lines that are annotation results: numeric id, then `|`.
/// Everything else is engine noise and is discarded.
static RESULT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\|").expect("valid pattern"));

/// Per-batch supervisor for the external annotation engine.
///
/// Cloned into every worker. The contract is total: given a batch, return a
/// result. Spawn errors, crashes, protocol mismatches, and timeouts all come
/// back as synthesized error lines, never as propagated errors, so one bad
/// batch cannot affect its worker or any other batch.
#[derive(Clone)]
pub struct Engine {
    argv: Vec<String>,
    timeout_per_line: Duration,
    max_words: usize,
    sink: ErrorSink,
}

impl Engine {
    pub fn new(config: &AnnopipeConfig, sink: ErrorSink) -> Self {
        Engine {
            argv: config.engine_argv.clone(),
            timeout_per_line: config.timeout_per_line,
            max_words: config.max_words,
            sink,
        }
    }

    /// Process one batch with one engine invocation.
    pub fn process_batch(&self, batch: &Batch) -> BatchResult {
        // Records the engine cannot handle are set aside up front, logged,
        // and answered with an error line instead of being silently dropped.
        let mut kept: Vec<&LineRecord> = Vec::with_capacity(batch.records.len());
        let mut oversized: Vec<&LineRecord> = Vec::new();
        for rec in &batch.records {
            if rec.word_count() > self.max_words {
                self.sink
                    .log_line(&format!("Line {} has too many words: {}", rec.id, rec.text));
                oversized.push(rec);
            } else {
                kept.push(rec);
            }
        }

        let mut lines: Vec<String> = Vec::new();
        let mut error_count = oversized.len();

        if !kept.is_empty() {
            let limit = batch.records.len().min(u32::MAX as usize) as u32;
            let deadline = self.timeout_per_line.saturating_mul(limit);

            match self.invoke(&kept, deadline) {
                Ok(result_lines) => lines = result_lines,
                Err(reason) => {
                    // The invocation is written off as a whole: log the raw
                    // batch and answer every remaining record with an error
                    // line. No retry; the worker moves on to its next batch.
                    self.sink
                        .log_line(&format!("Batch {} failed: {:#}", batch.sequence, reason));
                    let raw: Vec<String> = batch.records.iter().map(LineRecord::raw_line).collect();
                    self.sink.log_lines(raw.iter().map(String::as_str));

                    error_count += kept.len();
                    lines = kept.iter().map(|rec| record::error_line(&rec.id)).collect();
                }
            }
        }

        for rec in &oversized {
            lines.push(record::error_line(&rec.id));
        }

        BatchResult {
            sequence: batch.sequence,
            payload: lines.join("\n"),
            error_count,
        }
    }

    /// One synchronous request/response round trip against a fresh child.
    fn invoke(&self, records: &[&LineRecord], deadline: Duration) -> Result<Vec<String>> {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]);
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::null());
        // Fresh process group, created atomically at spawn: the group id
        // equals the child's pid and is known before the child can exit.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("cannot spawn engine {}", self.argv[0]))?;
        let group = child.id() as i32;

        let mut stdin_pipe = child.stdin.take().expect("stdin piped");
        let mut stdout_pipe = child.stdout.take().expect("stdout piped");

        let request = render_request(records);
        let writer = thread::spawn(move || {
            use std::io::Write;
            // An engine that dies before reading everything closes the pipe;
            // that failure surfaces as a bad exit status, not here.
            let _ = stdin_pipe.write_all(request.as_bytes());
            // Dropping stdin here is the end-of-input signal to the engine.
        });

        let (stdout_tx, stdout_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            use std::io::Read;
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf);
            let _ = stdout_tx.send(buf);
        });

        let started_at = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let _ = writer.join();
                    if !status.success() {
                        bail!("engine exited with status {}", status.code().unwrap_or(-1));
                    }
                    // The engine may have handed its stdout to a grandchild;
                    // the drain only sees EOF once every holder is gone. Wait
                    // out the rest of the deadline for it. An engine that
                    // exits without its output ever closing has lost the
                    // batch, so the whole group goes down with it.
                    let remaining = deadline.saturating_sub(started_at.elapsed());
                    let stdout = match stdout_rx.recv_timeout(remaining) {
                        Ok(buf) => buf,
                        Err(_) => {
                            kill_process_group(&mut child, group);
                            bail!("engine exited but its output never closed");
                        }
                    };
                    let text = String::from_utf8_lossy(&stdout);
                    return Ok(text
                        .lines()
                        .filter(|line| RESULT_LINE.is_match(line))
                        .map(str::to_string)
                        .collect());
                }
                Ok(None) => {}
                Err(err) => {
                    kill_process_group(&mut child, group);
                    let _ = child.wait();
                    return Err(err).context("cannot poll engine process");
                }
            }

            if started_at.elapsed() >= deadline {
                kill_process_group(&mut child, group);
                let _ = child.wait();
                bail!(
                    "engine timed out after {}",
                    humantime::format_duration(deadline)
                );
            }

            thread::sleep(Duration::from_millis(20));
        }
    }
}

/// Serialize records into the engine's request protocol, one two-field
/// block per record with a blank trailer line.
fn render_request(records: &[&LineRecord]) -> String {
    let mut request = String::new();
    for rec in records {
        request.push_str(&format!("UI  - {}\nTX  - {}\n\n", rec.id, rec.text));
    }
    request
}

/// Kill the child's whole process group, grandchildren included. The child
/// handle is killed too in case it already left the group somehow.
fn kill_process_group(child: &mut Child, group: i32) {
    #[cfg(unix)]
    unsafe {
        libc::killpg(group, libc::SIGKILL);
    }
    #[cfg(not(unix))]
    let _ = group;
    let _ = child.kill();
}
