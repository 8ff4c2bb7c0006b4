use serde::Serialize;
use std::fmt;

/// Verdict severity, ordered by urgency.
///
/// `Unknown` outranks `Critical`: a check that could not determine the truth
/// is a worse signal than one that found a definite failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Process exit code understood by the monitoring framework.
    pub fn exit_code(&self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One performance-data sample.
///
/// Wire format: `'label'=value[unit];warn;crit;min;max`. Counters carry no
/// unit or ranges and a max of `0`; duration samples carry the unit `s` and
/// leave everything else empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: i64,
    pub unit: &'static str,
    pub warn: &'static str,
    pub crit: &'static str,
    pub min: &'static str,
    pub max: &'static str,
}

impl Metric {
    pub fn counter(label: &str, value: usize) -> Self {
        Self {
            label: label.to_string(),
            value: value as i64,
            unit: "",
            warn: "",
            crit: "",
            min: "",
            max: "0",
        }
    }

    pub fn seconds(label: &str, value: u64) -> Self {
        Self {
            label: label.to_string(),
            value: value as i64,
            unit: "s",
            warn: "",
            crit: "",
            min: "",
            max: "",
        }
    }

    pub fn render(&self) -> String {
        format!(
            "'{}'={}{};{};{};{};{}",
            self.label, self.value, self.unit, self.warn, self.crit, self.min, self.max
        )
    }
}

/// The single output value of a probe run: one severity, the message lines
/// backing it, and the performance data collected along the way.
///
/// Verdicts are folded together with [`Verdict::merge`]; there is no global
/// accumulator. Message lines and metrics keep their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub severity: Severity,
    pub lines: Vec<String>,
    pub metrics: Vec<Metric>,
}

impl Verdict {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            lines: vec![message.into()],
            metrics: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn push_metric(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    /// Fold another finding into this one: worst severity wins, message
    /// lines and metrics are appended in order.
    pub fn merge(&mut self, other: Verdict) {
        self.severity = self.severity.max(other.severity);
        self.lines.extend(other.lines);
        self.metrics.extend(other.metrics);
    }

    /// Render the wire format. The `|`-prefixed metrics segment is omitted
    /// entirely when no metric was produced.
    pub fn render(&self, prefix: &str) -> String {
        let mut out = format!("{} {}: {}", prefix, self.severity, self.lines.join("\n"));
        if !self.metrics.is_empty() {
            let rendered: Vec<String> = self.metrics.iter().map(Metric::render).collect();
            out.push_str(" |");
            out.push_str(&rendered.join(" "));
        }
        out
    }

    pub fn exit_code(&self) -> i32 {
        self.severity.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Unknown);
    }

    #[test]
    fn test_severity_exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_counter_metric_render() {
        let metric = Metric::counter("units_active", 3);
        assert_eq!(metric.render(), "'units_active'=3;;;;0");
    }

    #[test]
    fn test_seconds_metric_render() {
        let metric = Metric::seconds("active_secs", 90);
        assert_eq!(metric.render(), "'active_secs'=90s;;;;");
    }

    #[test]
    fn test_render_without_metrics_omits_pipe() {
        let verdict = Verdict::new(Severity::Ok, "/mnt is mounted");
        assert_eq!(verdict.render("MOUNT"), "MOUNT OK: /mnt is mounted");
    }

    #[test]
    fn test_render_with_metrics() {
        let mut verdict = Verdict::new(Severity::Critical, "1 failed units!");
        verdict.push_line("failed: nginx.service");
        verdict.push_metric(Metric::counter("count_units", 5));
        verdict.push_metric(Metric::counter("units_failed", 1));
        assert_eq!(
            verdict.render("UNIT"),
            "UNIT CRITICAL: 1 failed units!\nfailed: nginx.service |'count_units'=5;;;;0 'units_failed'=1;;;;0"
        );
    }

    #[test]
    fn test_merge_worst_wins() {
        let mut verdict = Verdict::new(Severity::Critical, "definite failure");
        verdict.merge(Verdict::new(Severity::Warning, "minor detail"));
        assert_eq!(verdict.severity, Severity::Critical);

        verdict.merge(Verdict::new(Severity::Unknown, "truth unavailable"));
        assert_eq!(verdict.severity, Severity::Unknown);
        assert_eq!(
            verdict.lines,
            vec!["definite failure", "minor detail", "truth unavailable"]
        );
    }

    #[test]
    fn test_merge_preserves_metric_order() {
        let mut verdict = Verdict::new(Severity::Ok, "first");
        verdict.push_metric(Metric::counter("a", 1));
        let mut other = Verdict::new(Severity::Ok, "second");
        other.push_metric(Metric::counter("b", 2));
        verdict.merge(other);
        let labels: Vec<&str> = verdict.metrics.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
    }
}
