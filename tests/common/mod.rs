// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Stub engine body answering the request protocol: one "<id>|OK" line per
/// "UI  - <id>" block on stdin.
pub const ECHO_ENGINE_BODY: &str = r#"while IFS= read -r line; do
  case "$line" in
    "UI  - "*) printf '%s|OK\n' "${line#UI  - }" ;;
  esac
done
"#;

pub fn annopipe_binary() -> &'static str {
    env!("CARGO_BIN_EXE_annopipe")
}

/// Everything a finished run left behind.
pub struct Run {
    pub output: String,
    pub error_log: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Write an executable stub engine script into `dir` and return its path.
pub fn write_stub_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("create stub engine");
    writeln!(file, "#!/bin/sh").unwrap();
    file.write_all(body.as_bytes()).unwrap();
    drop(file);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// Run annopipe over `input`, with the error log and data files in `dir`.
/// Extra args come before the positional input/output paths.
pub fn run_annopipe(dir: &TempDir, input: &str, extra_args: &[&str]) -> Run {
    let input_path = dir.path().join("input.txt");
    let output_path = dir.path().join("output.txt");
    let error_log = dir.path().join("errors.log");
    std::fs::write(&input_path, input).expect("write input file");

    let out = Command::new(annopipe_binary())
        .arg("--error-log")
        .arg(&error_log)
        .args(extra_args)
        .arg(&input_path)
        .arg(&output_path)
        .output()
        .expect("failed to run annopipe");

    Run {
        output: std::fs::read_to_string(&output_path).unwrap_or_default(),
        error_log: std::fs::read_to_string(&error_log).unwrap_or_default(),
        stdout: String::from_utf8_lossy(&out.stdout).to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        exit_code: out.status.code().unwrap_or(-1),
    }
}
