use clap::Parser;
use serde::Serialize;
use std::process;

use syschecks::checks::unit::{
    find_unit, fleet_verdict, parse_units, unit_verdict, ActiveThresholds, ExcludeList,
    UnitBuckets, UnitRecord,
};
use syschecks::core;
use syschecks::core::status::{Severity, Verdict};
use syschecks::probe::systemctl;

const PREFIX: &str = "UNIT";

/// Check the state of service-manager units
#[derive(Parser, Debug)]
#[command(name = "check_unit", version)]
struct Cli {
    /// Check a single unit instead of the whole inventory
    #[arg(long, value_name = "NAME")]
    unit: Option<String>,

    /// Exclude units whose name matches this pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Minimum seconds the unit must have been active, WARNING below
    #[arg(long, value_name = "SECONDS", requires = "unit")]
    warning: Option<u64>,

    /// Minimum seconds the unit must have been active, CRITICAL below
    #[arg(long, value_name = "SECONDS", requires = "unit")]
    critical: Option<u64>,

    /// Dump the parsed records to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    core::init_tracing();
    let cli: Cli = core::parse_cli();

    let excludes = match ExcludeList::compile(&cli.exclude) {
        Ok(excludes) => excludes,
        Err(err) => {
            eprintln!("invalid --exclude pattern: {err}");
            process::exit(Severity::Unknown.exit_code());
        }
    };

    let raw = systemctl::list_units();
    let records = parse_units(&raw);
    if cli.verbose {
        dump_records(&records);
    }

    let verdict = match cli.unit {
        Some(ref name) => single_unit(&records, name, &cli),
        None => fleet_verdict(&UnitBuckets::partition(records, &excludes)),
    };

    println!("{}", verdict.render(PREFIX));
    process::exit(verdict.exit_code());
}

fn single_unit(records: &[UnitRecord], name: &str, cli: &Cli) -> Verdict {
    let thresholds = ActiveThresholds {
        warning: cli.warning,
        critical: cli.critical,
    };
    let record = find_unit(records, name);

    // The timing query only makes sense for a unit that is currently
    // active; everything else is judged on its state alone.
    let duration = match record {
        Some(record) if thresholds.is_set() && record.active_state == "active" => {
            match systemctl::active_duration_secs(name) {
                Ok(duration) => Some(duration),
                Err(err) => {
                    return Verdict::new(
                        Severity::Unknown,
                        format!("could not determine active duration for {name}: {err}"),
                    );
                }
            }
        }
        _ => None,
    };

    unit_verdict(record, name, &thresholds, duration)
}

fn dump_records<T: Serialize>(records: &[T]) {
    if let Ok(json) = serde_json::to_string_pretty(records) {
        eprintln!("{json}");
    }
}
