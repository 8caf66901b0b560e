use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cli::Cli;

/// The engine invocation used when --engine is not given. Matches the
/// standard MetaMap installation this tool's input format comes from.
pub const DEFAULT_ENGINE_COMMAND: &str = "/opt/public_mm/bin/metamap09 -Z 08 -iDN --no_header_info";

/// Resolved runtime configuration, built once from the CLI.
#[derive(Debug, Clone)]
pub struct AnnopipeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub engine_argv: Vec<String>,
    pub batch_size: usize,
    pub timeout_per_line: Duration,
    pub max_words: usize,
    pub workers: usize,
    pub error_log: PathBuf,
    pub quiet: bool,
}

impl AnnopipeConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let engine_argv =
            shell_words::split(&cli.engine).context("invalid --engine command line")?;
        if engine_argv.is_empty() {
            bail!("--engine command line is empty");
        }
        if cli.batch_size == 0 {
            bail!("--batch-size must be at least 1");
        }
        if cli.timeout_per_line.is_zero() {
            bail!("--timeout-per-line must be positive");
        }
        let workers = cli.workers.unwrap_or_else(num_cpus::get).max(1);

        Ok(AnnopipeConfig {
            input: PathBuf::from(&cli.input),
            output: PathBuf::from(&cli.output),
            engine_argv,
            batch_size: cli.batch_size,
            timeout_per_line: cli.timeout_per_line,
            max_words: cli.max_words,
            workers,
            error_log: PathBuf::from(&cli.error_log),
            quiet: cli.quiet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["annopipe"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["in.txt", "out.txt"]);
        Cli::parse_from(full)
    }

    #[test]
    fn engine_command_is_split_into_argv() {
        let cli = parse(&["--engine", "/usr/bin/env cat -A"]);
        let config = AnnopipeConfig::from_cli(&cli).unwrap();
        assert_eq!(config.engine_argv, ["/usr/bin/env", "cat", "-A"]);
    }

    #[test]
    fn quoted_engine_arguments_survive_splitting() {
        let cli = parse(&["--engine", "run 'with spaces' plain"]);
        let config = AnnopipeConfig::from_cli(&cli).unwrap();
        assert_eq!(config.engine_argv, ["run", "with spaces", "plain"]);
    }

    #[test]
    fn empty_engine_command_is_rejected() {
        let cli = parse(&["--engine", "   "]);
        assert!(AnnopipeConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let cli = parse(&["--batch-size", "0"]);
        assert!(AnnopipeConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn worker_override_is_honored() {
        let cli = parse(&["--workers", "3"]);
        let config = AnnopipeConfig::from_cli(&cli).unwrap();
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn worker_default_is_at_least_one() {
        let cli = parse(&[]);
        let config = AnnopipeConfig::from_cli(&cli).unwrap();
        assert!(config.workers >= 1);
    }
}
