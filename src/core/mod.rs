pub mod status;

pub use status::{Metric, Severity, Verdict};

use tracing_subscriber::EnvFilter;

/// Parse CLI flags, mapping clap's help/usage exits onto UNKNOWN so the
/// process exit code always stays within the severity contract. This covers
/// `--help` as well: usage text is printed, then the process exits 3.
pub fn parse_cli<T: clap::Parser>() -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(Severity::Unknown.exit_code());
        }
    }
}

/// Diagnostics go to stderr so the verdict line on stdout stays parseable.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
