// Command-line interface definition

use clap::Parser;
use std::time::Duration;

use crate::config::DEFAULT_ENGINE_COMMAND;

/// Annotate a line-oriented `<id>|<text>` stream through an external engine.
///
/// Input is chunked into fixed-size batches, each batch is fed to one
/// isolated engine process, and results are written back in input order.
/// Slow, crashing, or hung engine invocations affect only their own batch.
#[derive(Parser, Debug)]
#[command(name = "annopipe")]
#[command(version)]
#[command(
    about = "Parallel batch dispatcher for line-oriented annotation engines",
    long_about = "Parallel batch dispatcher for line-oriented annotation engines.\n\n\
        Reads one \"<id>|<text>\" record per input line, groups records into\n\
        batches, runs one engine process per batch across a pool of workers,\n\
        and writes the annotated output in the original input order. A batch\n\
        whose engine times out or crashes yields one \"<id>|*** error ***\"\n\
        line per record; the offending input is appended to the error log.\n\n\
        The engine's auxiliary daemons are assumed to be running already."
)]
pub struct Cli {
    /// Input file, one "<id>|<text>" record per line
    pub input: String,

    /// Output file; one line per record, in input order
    pub output: String,

    /// Engine command line, run once per batch with records on stdin
    #[arg(
        long = "engine",
        default_value = DEFAULT_ENGINE_COMMAND,
        help_heading = "Engine Options"
    )]
    pub engine: String,

    /// Records per engine invocation
    #[arg(
        long = "batch-size",
        default_value_t = 250,
        help_heading = "Engine Options"
    )]
    pub batch_size: usize,

    /// Wall-clock budget per record; a batch gets batch-size times this (e.g. "10s", "500ms")
    #[arg(
        long = "timeout-per-line",
        default_value = "10s",
        value_parser = humantime::parse_duration,
        help_heading = "Engine Options"
    )]
    pub timeout_per_line: Duration,

    /// Records with more words than this are not sent to the engine
    #[arg(
        long = "max-words",
        default_value_t = 125,
        help_heading = "Engine Options"
    )]
    pub max_words: usize,

    /// Number of worker threads (default: available CPUs)
    #[arg(short = 'w', long = "workers", help_heading = "Processing Options")]
    pub workers: Option<usize>,

    /// File the offending lines and failed batches are appended to
    #[arg(
        long = "error-log",
        default_value = "error_lines.log",
        help_heading = "Output Options"
    )]
    pub error_log: String,

    /// Suppress progress and summary reporting on stderr
    #[arg(short = 'q', long = "quiet", help_heading = "Output Options")]
    pub quiet: bool,
}
