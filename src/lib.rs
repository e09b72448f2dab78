//! mkuuid library crate
//!
//! Core of the `mkuuid` CLI, which prints RFC4122 version-4 UUIDs built from
//! the host's random device. It is organized into small modules: `count`
//! (repeat-count normalization), `entropy` (opening and reading the random
//! source), `generate` (bit patching, formatting and the output loop), and
//! `error` (failure kinds and their exit codes). The binary `src/main.rs` calls
//! `mkuuid_lib::run()`.
//!
//! Public API
//!
//! - `run()`: CLI entrypoint used by the binary.
//! - `execute()`: the same flow with injectable config and streams.
//!
//! Exit codes: `0` success, `16` entropy source could not be opened, `17`
//! entropy source failed or ran dry mid-run, `18` standard output unwritable.

pub mod count;
pub mod entropy;
pub mod error;
pub mod generate;

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::count::parse_count;
use crate::generate::{Config, generate_to};

/// Environment variable holding the log filter (default `warn`).
pub const LOG_ENV: &str = "MKUUID_LOG";

/// Command line: `mkuuid [count]`. No flags.
#[derive(Parser, Debug, Default)]
#[command(
    name = "mkuuid",
    about,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Number of UUIDs to print (default 1)
    #[arg(allow_hyphen_values = true)]
    count: Option<OsString>,

    /// Anything after the count is ignored
    #[arg(hide = true, allow_hyphen_values = true)]
    rest: Vec<OsString>,
}

/// Run the mkuuid CLI.
///
/// Parses the optional count (falling back to 1 on anything unusable), prints
/// that many UUIDs to standard output and returns the process exit code. The
/// entropy source is released before this function returns.
///
/// Example:
///
/// ```no_run
/// fn main() -> std::process::ExitCode {
///     mkuuid_lib::run()
/// }
/// ```
pub fn run() -> ExitCode {
    init_logging();
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "argument parsing failed, using defaults");
        Cli::default()
    });
    if !cli.rest.is_empty() {
        tracing::debug!(ignored = cli.rest.len(), "extra arguments ignored");
    }
    let count = parse_count(cli.count.as_deref());

    let stdout = io::stdout();
    let stderr = io::stderr();
    let code = execute(&Config::default(), count, &mut stdout.lock(), &mut stderr.lock());
    ExitCode::from(code)
}

/// Generate `count` UUIDs into `out`; on failure write one diagnostic line to
/// `err`. Returns the exit status.
pub fn execute<W: Write, E: Write>(config: &Config, count: u64, out: &mut W, err: &mut E) -> u8 {
    match generate_to(config, count, out) {
        Ok(_) => 0,
        Err(e) => {
            tracing::debug!(code = e.exit_code(), "run failed");
            let _ = writeln!(err, "{}", e);
            e.exit_code()
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
