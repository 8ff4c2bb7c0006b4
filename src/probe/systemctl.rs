//! Unit state via the `systemctl` CLI.
//!
//! The inventory listing is the lenient path: any failure here degrades to
//! an empty listing and the unit check reports what it sees. The targeted
//! property query for threshold evaluation is strict and surfaces its
//! errors, since a missing duration makes the threshold verdict impossible.

use nix::time::{clock_gettime, ClockId};
use tracing::warn;

use super::{run_capture, ProbeError};

const TOOL: &str = "systemctl";

pub fn is_available() -> bool {
    which::which(TOOL).is_ok()
}

/// Raw unit-inventory text, one unit per line.
///
/// `--plain --no-legend` keeps decoration out of the data rows; the parser
/// downstream is still lenient about anything that slips through.
pub fn list_units() -> String {
    if !is_available() {
        warn!("systemctl not found, treating the unit inventory as empty");
        return String::new();
    }
    match run_capture(TOOL, &["list-units", "--all", "--plain", "--no-legend"]) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "unit inventory unavailable, treating as empty");
            String::new()
        }
    }
}

/// Monotonic-clock microseconds at the unit's last transition into `active`,
/// from `systemctl show --property=ActiveEnterTimestampMonotonic`.
pub fn active_enter_monotonic_us(unit: &str) -> Result<u64, ProbeError> {
    let text = run_capture(
        TOOL,
        &["show", unit, "--property=ActiveEnterTimestampMonotonic"],
    )?;
    parse_active_enter(&text)
}

/// Extract the timestamp from the `Key=Value` lines `systemctl show` prints.
fn parse_active_enter(text: &str) -> Result<u64, ProbeError> {
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("ActiveEnterTimestampMonotonic=") {
            return value.trim().parse().map_err(|_| ProbeError::Malformed {
                tool: TOOL,
                detail: format!("ActiveEnterTimestampMonotonic is not an integer: {value}"),
            });
        }
    }
    Err(ProbeError::Malformed {
        tool: TOOL,
        detail: "ActiveEnterTimestampMonotonic property missing".to_string(),
    })
}

/// Current monotonic clock in microseconds, the same timebase systemd
/// reports its transition timestamps in.
pub fn now_monotonic_us() -> u64 {
    clock_gettime(ClockId::CLOCK_MONOTONIC)
        .map(|ts| ts.tv_sec() as u64 * 1_000_000 + ts.tv_nsec() as u64 / 1_000)
        .unwrap_or(0)
}

/// Whole seconds the unit has been in `active`, truncated.
pub fn active_duration_secs(unit: &str) -> Result<u64, ProbeError> {
    let enter_us = active_enter_monotonic_us(unit)?;
    Ok(now_monotonic_us().saturating_sub(enter_us) / 1_000_000)
}
