//! Service-manager unit inventory: parsing, exclusion, bucketing and the
//! unit-check verdicts.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use super::normalize_line;
use crate::core::status::{Metric, Severity, Verdict};

/// One row of the unit inventory. Built fresh from one line of probe output
/// per invocation and discarded after the verdict is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRecord {
    pub name: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    pub description: String,
}

/// Coarse lifecycle phase of a unit. Anything outside the known domain
/// values is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    Active,
    Inactive,
    Failed,
    Activating,
    Deactivating,
    Unknown,
}

impl ActiveState {
    pub fn parse(value: &str) -> Self {
        match value {
            "active" => ActiveState::Active,
            "inactive" => ActiveState::Inactive,
            "failed" => ActiveState::Failed,
            "activating" => ActiveState::Activating,
            "deactivating" => ActiveState::Deactivating,
            _ => ActiveState::Unknown,
        }
    }
}

impl UnitRecord {
    pub fn state(&self) -> ActiveState {
        ActiveState::parse(&self.active_state)
    }
}

/// Parse the raw inventory listing into records, in input order.
///
/// Lenient by policy: a line that does not yield four non-empty leading
/// tokens is a header, footer or blank line from the listing, not a data
/// row, and is dropped without error. The fifth field absorbs the rest of
/// the line, so descriptions keep their interior spaces.
pub fn parse_units(raw: &str) -> Vec<UnitRecord> {
    let mut records = Vec::new();
    for line in raw.lines() {
        let line = normalize_line(line);
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.splitn(5, ' ').collect();
        if parts.len() < 4 {
            debug!(line = %line, "dropping non-record inventory line");
            continue;
        }
        records.push(UnitRecord {
            name: parts[0].to_string(),
            load_state: parts[1].to_string(),
            active_state: parts[2].to_string(),
            sub_state: parts[3].to_string(),
            description: parts.get(4).copied().unwrap_or("").to_string(),
        });
    }
    records
}

/// First record with the given name. Duplicate names are allowed in a
/// snapshot; lookup picks the earliest.
pub fn find_unit<'a>(records: &'a [UnitRecord], name: &str) -> Option<&'a UnitRecord> {
    records.iter().find(|record| record.name == name)
}

/// Compiled `--exclude` patterns: case-insensitive, matched anywhere in the
/// full unit name.
#[derive(Debug, Default)]
pub struct ExcludeList {
    patterns: Vec<Regex>,
}

impl ExcludeList {
    pub fn compile(patterns: &[String]) -> Result<Self, regex::Error> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            compiled.push(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()?,
            );
        }
        Ok(Self { patterns: compiled })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Fleet-mode partition of the inventory. Exclusion is applied before state
/// bucketing, so every record lands in exactly one bucket.
#[derive(Debug, Default)]
pub struct UnitBuckets {
    pub active: Vec<UnitRecord>,
    pub inactive: Vec<UnitRecord>,
    pub failed: Vec<UnitRecord>,
    pub unknown: Vec<UnitRecord>,
    pub excluded: Vec<UnitRecord>,
}

impl UnitBuckets {
    pub fn partition(records: Vec<UnitRecord>, exclude: &ExcludeList) -> Self {
        let mut buckets = Self::default();
        for record in records {
            if exclude.matches(&record.name) {
                buckets.excluded.push(record);
                continue;
            }
            match record.state() {
                ActiveState::Active => buckets.active.push(record),
                ActiveState::Inactive => buckets.inactive.push(record),
                ActiveState::Failed => buckets.failed.push(record),
                _ => buckets.unknown.push(record),
            }
        }
        buckets
    }

    pub fn total(&self) -> usize {
        self.active.len()
            + self.inactive.len()
            + self.failed.len()
            + self.unknown.len()
            + self.excluded.len()
    }
}

/// Fleet-mode verdict: CRITICAL if any unit is failed, OK otherwise. Bucket
/// counts alone never raise WARNING or UNKNOWN.
pub fn fleet_verdict(buckets: &UnitBuckets) -> Verdict {
    let mut verdict = if buckets.failed.is_empty() {
        Verdict::new(Severity::Ok, format!("{} units checked", buckets.total()))
    } else {
        let mut v = Verdict::new(
            Severity::Critical,
            format!("{} failed units!", buckets.failed.len()),
        );
        for unit in &buckets.failed {
            v.push_line(format!("failed: {}", unit.name));
        }
        v
    };

    verdict.push_metric(Metric::counter("count_units", buckets.total()));
    verdict.push_metric(Metric::counter("units_active", buckets.active.len()));
    verdict.push_metric(Metric::counter("units_inactive", buckets.inactive.len()));
    verdict.push_metric(Metric::counter("units_failed", buckets.failed.len()));
    verdict.push_metric(Metric::counter("units_unknown", buckets.unknown.len()));
    verdict.push_metric(Metric::counter("units_excluded", buckets.excluded.len()));
    verdict
}

/// Minimum-active-time bounds, in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveThresholds {
    pub warning: Option<u64>,
    pub critical: Option<u64>,
}

impl ActiveThresholds {
    pub fn is_set(&self) -> bool {
        self.warning.is_some() || self.critical.is_some()
    }

    /// A bound is breached when the unit has been active for less time than
    /// the bound asks for. Critical wins over warning when both breach. The
    /// duration metric is emitted either way.
    pub fn evaluate(&self, name: &str, duration_secs: u64) -> Verdict {
        let mut verdict = match (self.critical, self.warning) {
            (Some(bound), _) if bound > duration_secs => Verdict::new(
                Severity::Critical,
                format!(
                    "{} active for {}s (critical threshold {}s)",
                    name, duration_secs, bound
                ),
            ),
            (_, Some(bound)) if bound > duration_secs => Verdict::new(
                Severity::Warning,
                format!(
                    "{} active for {}s (warning threshold {}s)",
                    name, duration_secs, bound
                ),
            ),
            _ => Verdict::new(
                Severity::Ok,
                format!("{} active for {}s", name, duration_secs),
            ),
        };
        verdict.push_metric(Metric::seconds("active_secs", duration_secs));
        verdict
    }
}

/// Single-unit verdict. `duration_secs` is present only when the caller
/// asked for thresholds and the unit was observed `active`.
pub fn unit_verdict(
    record: Option<&UnitRecord>,
    name: &str,
    thresholds: &ActiveThresholds,
    duration_secs: Option<u64>,
) -> Verdict {
    let record = match record {
        Some(record) => record,
        None => {
            return Verdict::new(Severity::Unknown, format!("{} could not be found!", name));
        }
    };

    let severity = match record.state() {
        ActiveState::Failed => Severity::Critical,
        _ => Severity::Ok,
    };
    let mut verdict = Verdict::new(
        severity,
        format!("{}: {}", record.name, record.active_state),
    );

    if let Some(duration) = duration_secs {
        verdict.merge(thresholds.evaluate(&record.name, duration));
    }
    verdict
}
