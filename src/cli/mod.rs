//! Command-line entry point for test binaries.
//!
//! A test binary registers its cases and hands the registry to [`run_main`],
//! which parses the arguments, runs, and returns the process exit code:
//! `0` on success, `1` when a test case failed, `2` for usage and
//! configuration errors.

use crate::errors::Result;
use crate::registry::Registry;
use crate::runner::{RunSummary, Runner};
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;

pub mod args;

pub use args::Args;

/// Runs `registry` with the process arguments.
pub fn run_main(registry: &Registry) -> i32 {
    run_main_from(registry, std::env::args_os())
}

/// Runs `registry` with explicit arguments; the first one names the binary.
pub fn run_main_from<I, T>(registry: &Registry, argv: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let binary = argv
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 2 } else { 0 };
        }
    };

    match execute(registry, args, &binary) {
        Ok(summary) => summary.exit_code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    }
}

fn execute(registry: &Registry, args: Args, binary: &str) -> Result<RunSummary> {
    let options = args.into_options(binary)?;
    Runner::new(registry).with_options(options).run()
}
