//! One-shot external tool invocations.
//!
//! Spawns a program with arguments, captures stdout + stderr, and gives up
//! after a bounded timeout. The child is killed if the timeout fires.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;

/// Captured output of a successful invocation
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {}: {}", exit_label(.code), .stderr.trim())]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {}ms", .timeout.as_millis())]
    Timeout { program: String, timeout: Duration },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

/// Run `program args...` and wait for it to exit, at most `timeout`.
///
/// A non-zero exit status is an error; stdout/stderr are only returned on success.
pub async fn run<I, S>(program: &Path, args: I, timeout: Duration) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();
    let display = program.display().to_string();

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ToolError::Spawn {
                program: display,
                source,
            })
        }
        Err(_) => {
            return Err(ToolError::Timeout {
                program: display,
                timeout,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(ToolError::ExitStatus {
            program: display,
            code: output.status.code(),
            stderr,
        });
    }

    Ok(ToolOutput {
        stdout,
        stderr,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
