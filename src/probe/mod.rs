//! Invocation of the external state-listing processes.
//!
//! Everything in here is a collaborator call: one blocking process spawn per
//! probe, no retries, no timeouts. The checks treat the returned text as an
//! opaque blob and decide themselves how a failure degrades.

pub mod mounttab;
pub mod systemctl;

use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: i32,
        stderr: String,
    },
    #[error("{tool} produced no output")]
    EmptyOutput { tool: &'static str },
    #[error("unexpected {tool} output: {detail}")]
    Malformed {
        tool: &'static str,
        detail: String,
    },
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// Run a tool once and capture its stdout as text.
pub(crate) fn run_capture(tool: &'static str, args: &[&str]) -> Result<String, ProbeError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| ProbeError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(ProbeError::ToolFailed {
            tool,
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
