#![allow(dead_code)]
use anyhow::Result;
use std::process;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread;

// Cross-platform signal handling
#[cfg(unix)]
use signal_hook::{consts::SIGINT, consts::SIGTERM, iterator::Signals};

#[cfg(windows)]
use signal_hook::{consts::SIGINT, iterator::Signals};

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
    SignalInt = 130,  // 128 + SIGINT (2)
    SignalTerm = 143, // 128 + SIGTERM (15)
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Global termination flag for graceful shutdown. The chunker checks it and
/// stops feeding new batches; in-flight batches drain normally.
pub static SHOULD_TERMINATE: AtomicBool = AtomicBool::new(false);

/// Exit code the run should end with after a graceful signal shutdown.
/// Zero means no signal was seen.
static SIGNAL_EXIT_CODE: AtomicI32 = AtomicI32::new(0);

pub fn should_terminate() -> bool {
    SHOULD_TERMINATE.load(Ordering::Relaxed)
}

pub fn signal_exit_code() -> Option<i32> {
    match SIGNAL_EXIT_CODE.load(Ordering::Relaxed) {
        0 => None,
        code => Some(code),
    }
}

/// Signal handler for graceful shutdown
pub struct SignalHandler {
    _handle: thread::JoinHandle<()>,
}

impl SignalHandler {
    /// Install the handler. The first SIGINT/SIGTERM requests a graceful
    /// shutdown; a second one exits immediately.
    ///
    /// SIGPIPE stays at its default disposition (ignored under the Rust
    /// runtime): a broken engine stdin pipe must surface as `EPIPE` in the
    /// writer thread, where it is contained per batch, not kill the process.
    pub fn install() -> Result<Self> {
        #[cfg(unix)]
        let signals_to_handle = vec![SIGINT, SIGTERM];

        #[cfg(windows)]
        let signals_to_handle = vec![SIGINT];

        let mut signals = Signals::new(&signals_to_handle)?;

        let handle = thread::spawn(move || {
            let mut shutdown_count = 0;
            for sig in signals.forever() {
                match sig {
                    SIGINT => {
                        SHOULD_TERMINATE.store(true, Ordering::Relaxed);
                        SIGNAL_EXIT_CODE.store(ExitCode::SignalInt as i32, Ordering::Relaxed);
                        shutdown_count += 1;
                        if shutdown_count > 1 {
                            ExitCode::SignalInt.exit();
                        }
                    }
                    #[cfg(unix)]
                    SIGTERM => {
                        SHOULD_TERMINATE.store(true, Ordering::Relaxed);
                        SIGNAL_EXIT_CODE.store(ExitCode::SignalTerm as i32, Ordering::Relaxed);
                        shutdown_count += 1;
                        if shutdown_count > 1 {
                            ExitCode::SignalTerm.exit();
                        }
                    }
                    _ => {}
                }
            }
        });

        Ok(SignalHandler { _handle: handle })
    }
}
