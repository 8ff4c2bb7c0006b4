use clap::{ArgGroup, Parser};
use serde::Serialize;
use std::process;

use syschecks::checks::mount::{mount_verdict, parse_mount_table, MountQuery};
use syschecks::core;
use syschecks::core::status::{Severity, Verdict};
use syschecks::probe::mounttab::{self, MountFlavor};

const PREFIX: &str = "MOUNT";

/// Check that a filesystem is mounted where it should be
#[derive(Parser, Debug)]
#[command(name = "check_mount", version)]
#[command(group(
    ArgGroup::new("selector")
        .required(true)
        .multiple(true)
        .args(["mountpoint", "source"])
))]
struct Cli {
    /// Expected mountpoint path
    #[arg(long, value_name = "PATH")]
    mountpoint: Option<String>,

    /// Expected mount source device
    #[arg(long, value_name = "PATH")]
    source: Option<String>,

    /// Expected filesystem type for a mounted match
    #[arg(long, value_name = "TYPE")]
    fs: Option<String>,

    /// Read the BSD mount table grammar (not supported, fails fast)
    #[arg(long)]
    bsd: bool,

    /// Dump the parsed records to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    core::init_tracing();
    let cli: Cli = core::parse_cli();

    let flavor = if cli.bsd {
        MountFlavor::Bsd
    } else {
        MountFlavor::Linux
    };

    let verdict = run(&cli, flavor);
    println!("{}", verdict.render(PREFIX));
    process::exit(verdict.exit_code());
}

fn run(cli: &Cli, flavor: MountFlavor) -> Verdict {
    // Probe failures and grammar failures both end the run as UNKNOWN: a
    // verdict of "not mounted" from input we could not read would be a lie.
    let raw = match mounttab::read_table(flavor) {
        Ok(raw) => raw,
        Err(err) => return Verdict::new(Severity::Unknown, err.to_string()),
    };

    let records = match parse_mount_table(&raw) {
        Ok(records) => records,
        Err(err) => return Verdict::new(Severity::Unknown, err.to_string()),
    };
    if cli.verbose {
        dump_records(&records);
    }

    let query = MountQuery {
        source: cli.source.clone(),
        mountpoint: cli.mountpoint.clone(),
        fstype: None,
    };
    mount_verdict(&records, &query, cli.fs.as_deref())
}

fn dump_records<T: Serialize>(records: &[T]) {
    if let Ok(json) = serde_json::to_string_pretty(records) {
        eprintln!("{json}");
    }
}
