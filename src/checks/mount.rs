//! Mount-table parsing and the mounted/not-mounted verdict.
//!
//! Mount lines embed the device and mountpoint as free-form paths that may
//! themselves contain the literal words `on` or `type`, so extraction
//! anchors on the fixed keywords instead of whitespace splitting: the first
//! ` on `, the last ` type ` in the remainder, and the trailing
//! parenthesized option list. Unlike the unit inventory parser this one is
//! strict: a line that does not fit the grammar means the platform
//! assumption is wrong, and the whole run must fail rather than skip it.

use serde::Serialize;
use thiserror::Error;

use super::normalize_line;
use crate::core::status::{Severity, Verdict};

/// One row of the mount table. Either fully populated or not constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountRecord {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub options: Vec<String>,
}

/// A mount line that does not fit
/// `<device> on <mountpoint> type <fstype> (<options>)`.
/// Fatal for the whole run; the message names the offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountParseError {
    #[error("mount line {line_no} has no ' on ' separator: {line}")]
    MissingOn { line_no: usize, line: String },
    #[error("mount line {line_no} has no ' type ' separator: {line}")]
    MissingType { line_no: usize, line: String },
    #[error("mount line {line_no} has no parenthesized option list: {line}")]
    MissingOptions { line_no: usize, line: String },
    #[error("mount line {line_no} fstype is not a single token: {line}")]
    BadFstype { line_no: usize, line: String },
    #[error("mount line {line_no} has an empty field: {line}")]
    EmptyField { line_no: usize, line: String },
}

/// Extract one record from one normalized line via four anchored steps.
pub fn parse_mount_line(line_no: usize, raw: &str) -> Result<MountRecord, MountParseError> {
    let line = normalize_line(raw);

    let on = line.find(" on ").ok_or_else(|| MountParseError::MissingOn {
        line_no,
        line: line.clone(),
    })?;
    let device = &line[..on];

    let rest = &line[on + 4..];
    let ty = rest
        .rfind(" type ")
        .ok_or_else(|| MountParseError::MissingType {
            line_no,
            line: line.clone(),
        })?;
    let mountpoint = &rest[..ty];

    let tail = &rest[ty + 6..];
    let open = tail
        .find('(')
        .ok_or_else(|| MountParseError::MissingOptions {
            line_no,
            line: line.clone(),
        })?;
    let close = tail
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| MountParseError::MissingOptions {
            line_no,
            line: line.clone(),
        })?;

    let fstype = tail[..open].trim();
    if fstype.contains(' ') {
        return Err(MountParseError::BadFstype {
            line_no,
            line: line.clone(),
        });
    }
    if device.is_empty() || mountpoint.is_empty() || fstype.is_empty() {
        return Err(MountParseError::EmptyField {
            line_no,
            line: line.clone(),
        });
    }

    let options = tail[open + 1..close]
        .split(',')
        .map(|opt| opt.trim().to_string())
        .filter(|opt| !opt.is_empty())
        .collect();

    Ok(MountRecord {
        device: device.to_string(),
        mountpoint: mountpoint.to_string(),
        fstype: fstype.to_string(),
        options,
    })
}

/// Parse the whole table in input order, or fail on the first line that does
/// not conform. Blank lines are tolerated; a wholly empty table is caught
/// upstream as a probe failure.
pub fn parse_mount_table(raw: &str) -> Result<Vec<MountRecord>, MountParseError> {
    let mut records = Vec::new();
    for (idx, raw_line) in raw.lines().enumerate() {
        if normalize_line(raw_line).is_empty() {
            continue;
        }
        records.push(parse_mount_line(idx + 1, raw_line)?);
    }
    Ok(records)
}

/// Field-equality query over the mount table. Unspecified fields are
/// wildcards; specified fields must match exactly, case-sensitively.
#[derive(Debug, Clone, Default)]
pub struct MountQuery {
    pub source: Option<String>,
    pub mountpoint: Option<String>,
    pub fstype: Option<String>,
}

impl MountQuery {
    pub fn matches(&self, record: &MountRecord) -> bool {
        if let Some(ref source) = self.source {
            if record.device != *source {
                return false;
            }
        }
        if let Some(ref mountpoint) = self.mountpoint {
            if record.mountpoint != *mountpoint {
                return false;
            }
        }
        if let Some(ref fstype) = self.fstype {
            if record.fstype != *fstype {
                return false;
            }
        }
        true
    }

    /// What the verdict message calls the thing being checked.
    pub fn target(&self) -> &str {
        self.mountpoint
            .as_deref()
            .or(self.source.as_deref())
            .unwrap_or("?")
    }
}

/// Mounted/not-mounted verdict for one query over the parsed table.
///
/// Exactly one match is healthy. Zero means not mounted. More than one is
/// suspicious (the same source bind-mounted repeatedly) but not fatal. A
/// filesystem-type expectation is checked only against a single match and
/// dominates the count-based verdict when it mismatches.
pub fn mount_verdict(
    records: &[MountRecord],
    query: &MountQuery,
    expected_fstype: Option<&str>,
) -> Verdict {
    let matches: Vec<&MountRecord> = records.iter().filter(|r| query.matches(r)).collect();
    let target = query.target();

    let mut verdict = match matches.len() {
        0 => Verdict::new(Severity::Critical, format!("{} is not mounted", target)),
        1 => {
            let record = matches[0];
            match expected_fstype {
                Some(want) if record.fstype != want => Verdict::new(
                    Severity::Critical,
                    format!(
                        "{} is mounted with wrong filesystem type {} (expected {})",
                        target, record.fstype, want
                    ),
                ),
                _ => Verdict::new(Severity::Ok, format!("{} is mounted", target)),
            }
        }
        n => Verdict::new(
            Severity::Warning,
            format!("{} is mounted {} times", target, n),
        ),
    };

    for record in &matches {
        verdict.push_line(format!(
            "{} on {} type {}",
            record.device, record.mountpoint, record.fstype
        ));
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
/dev/sda1 on / type ext4 (rw,relatime,errors=remount-ro)
proc on /proc type proc (rw,nosuid,nodev,noexec)
/dev/sdb1 on /mnt type ext4 (rw,relatime)
tmpfs on /run type tmpfs (rw,nosuid,nodev,size=802656k)
";

    fn query_mountpoint(path: &str) -> MountQuery {
        MountQuery {
            mountpoint: Some(path.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_round_trip() {
        let record = parse_mount_line(1, "/dev/sda1 on /mnt type ext4 (rw,relatime)").unwrap();
        assert_eq!(record.device, "/dev/sda1");
        assert_eq!(record.mountpoint, "/mnt");
        assert_eq!(record.fstype, "ext4");
        assert_eq!(record.options, vec!["rw", "relatime"]);
    }

    #[test]
    fn test_parse_mountpoint_containing_on() {
        let record = parse_mount_line(1, "/dev/sda1 on /mnt/log on disk type ext4 (rw)").unwrap();
        assert_eq!(record.device, "/dev/sda1");
        assert_eq!(record.mountpoint, "/mnt/log on disk");
        assert_eq!(record.fstype, "ext4");
    }

    #[test]
    fn test_parse_mountpoint_containing_type() {
        let record =
            parse_mount_line(1, "/dev/sda1 on /mnt/some type thing type xfs (rw,noatime)").unwrap();
        assert_eq!(record.mountpoint, "/mnt/some type thing");
        assert_eq!(record.fstype, "xfs");
    }

    #[test]
    fn test_parse_missing_on_is_typed_failure() {
        let err = parse_mount_line(3, "garbage without separators").unwrap_err();
        assert_eq!(
            err,
            MountParseError::MissingOn {
                line_no: 3,
                line: "garbage without separators".to_string(),
            }
        );
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("garbage without separators"));
    }

    #[test]
    fn test_parse_missing_type_is_typed_failure() {
        let err = parse_mount_line(1, "/dev/sda1 on /mnt (rw)").unwrap_err();
        assert!(matches!(err, MountParseError::MissingType { .. }));
    }

    #[test]
    fn test_parse_missing_options_is_typed_failure() {
        let err = parse_mount_line(1, "/dev/sda1 on /mnt type ext4").unwrap_err();
        assert!(matches!(err, MountParseError::MissingOptions { .. }));
    }

    #[test]
    fn test_parse_multi_token_fstype_is_typed_failure() {
        let err = parse_mount_line(1, "/dev/sda1 on /mnt type ext4 fancy (rw)").unwrap_err();
        assert!(matches!(err, MountParseError::BadFstype { .. }));
    }

    #[test]
    fn test_table_parse_preserves_order() {
        let records = parse_mount_table(TABLE).unwrap();
        let mountpoints: Vec<&str> = records.iter().map(|r| r.mountpoint.as_str()).collect();
        assert_eq!(mountpoints, vec!["/", "/proc", "/mnt", "/run"]);
    }

    #[test]
    fn test_table_parse_fails_whole_run_on_bad_line() {
        let raw = "/dev/sda1 on / type ext4 (rw)\nnot a mount line\n";
        let err = parse_mount_table(raw).unwrap_err();
        assert!(matches!(err, MountParseError::MissingOn { line_no: 2, .. }));
    }

    #[test]
    fn test_table_parse_is_idempotent() {
        assert_eq!(
            parse_mount_table(TABLE).unwrap(),
            parse_mount_table(TABLE).unwrap()
        );
    }

    #[test]
    fn test_query_by_source_only() {
        let records = parse_mount_table(TABLE).unwrap();
        let query = MountQuery {
            source: Some("/dev/sdb1".to_string()),
            ..Default::default()
        };
        let matched: Vec<&MountRecord> = records.iter().filter(|r| query.matches(r)).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].mountpoint, "/mnt");
    }

    #[test]
    fn test_query_match_is_case_sensitive() {
        let records = parse_mount_table(TABLE).unwrap();
        let query = query_mountpoint("/MNT");
        assert!(!records.iter().any(|r| query.matches(r)));
    }

    #[test]
    fn test_query_all_specified_fields_must_match() {
        let records = parse_mount_table(TABLE).unwrap();
        let query = MountQuery {
            source: Some("/dev/sda1".to_string()),
            mountpoint: Some("/mnt".to_string()),
            fstype: None,
        };
        assert!(!records.iter().any(|r| query.matches(r)));
    }

    #[test]
    fn test_verdict_not_mounted() {
        let records = parse_mount_table(TABLE).unwrap();
        let verdict = mount_verdict(&records, &query_mountpoint("/backup"), None);
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(verdict.lines, vec!["/backup is not mounted"]);
        assert!(verdict.metrics.is_empty());
    }

    #[test]
    fn test_verdict_single_match_ok() {
        let records = parse_mount_table(TABLE).unwrap();
        let verdict = mount_verdict(&records, &query_mountpoint("/mnt"), Some("ext4"));
        assert_eq!(verdict.severity, Severity::Ok);
        assert_eq!(
            verdict.lines,
            vec!["/mnt is mounted", "/dev/sdb1 on /mnt type ext4"]
        );
    }

    #[test]
    fn test_verdict_fstype_mismatch_escalates() {
        let records = parse_mount_table(TABLE).unwrap();
        let verdict = mount_verdict(&records, &query_mountpoint("/mnt"), Some("xfs"));
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(
            verdict.lines[0],
            "/mnt is mounted with wrong filesystem type ext4 (expected xfs)"
        );
    }

    #[test]
    fn test_verdict_multiple_matches_warn() {
        let raw = "\
/dev/sdb1 on /mnt type ext4 (rw)
/dev/sdb1 on /srv/a type ext4 (rw)
/dev/sdb1 on /srv/b type ext4 (ro)
";
        let records = parse_mount_table(raw).unwrap();
        let query = MountQuery {
            source: Some("/dev/sdb1".to_string()),
            ..Default::default()
        };
        let verdict = mount_verdict(&records, &query, None);
        assert_eq!(verdict.severity, Severity::Warning);
        assert_eq!(verdict.lines[0], "/dev/sdb1 is mounted 3 times");
        assert_eq!(verdict.lines.len(), 4);
    }
}
