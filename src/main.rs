use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use std::fs::File;
use std::io::{BufReader, BufWriter};

mod cli;
mod config;
mod engine;
mod errlog;
mod parallel;
mod platform;
mod record;
mod stats;

use cli::Cli;
use config::AnnopipeConfig;
use engine::Engine;
use errlog::ErrorSink;
use parallel::{BatchDispatcher, DispatchConfig};
use platform::{ExitCode, SignalHandler};

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => {
            if let Some(code) = platform::signal_exit_code() {
                std::process::exit(code);
            }
            ExitCode::Success.exit()
        }
        Err(err) => {
            eprintln!("annopipe: {:#}", err);
            ExitCode::GeneralError.exit()
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = AnnopipeConfig::from_cli(cli)?;
    let _signals = SignalHandler::install()?;

    let input = File::open(&config.input)
        .with_context(|| format!("cannot open input file {}", config.input.display()))?;
    let output = File::create(&config.output)
        .with_context(|| format!("cannot create output file {}", config.output.display()))?;
    let sink = ErrorSink::open(&config.error_log)?;
    let engine = Engine::new(&config, sink.clone());

    let report_progress = !config.quiet && std::io::stderr().is_terminal();
    let dispatcher = BatchDispatcher::new(DispatchConfig {
        workers: config.workers,
        batch_size: config.batch_size,
    });

    let stats = dispatcher.run(
        BufReader::new(input),
        BufWriter::new(output),
        engine,
        sink,
        report_progress,
    )?;

    if !config.quiet {
        eprintln!("{}", stats.format_stats());
    }
    Ok(())
}
