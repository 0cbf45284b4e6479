//! Casework engine errors.
//!
//! These cover failures of the engine itself: bad options, duplicate
//! registrations, unreadable configuration. Failures *inside* a test case are
//! never errors; they become failure flags on the test case and are reported
//! through the reporter protocol instead.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum CaseworkError {
    #[error("test case '{name}' at {file}:{line} is already registered as '{existing}'")]
    #[diagnostic(
        code(casework::registry::duplicate),
        help("every test case needs a distinct source location")
    )]
    DuplicateTestCase {
        name: String,
        existing: String,
        file: String,
        line: u32,
    },

    #[error("unknown order-by mode '{0}'")]
    #[diagnostic(
        code(casework::options::order_by),
        help("expected one of: file, suite, name, rand")
    )]
    InvalidOrderBy(String),

    #[error("no reporter matched '{filter}' (registered: {available})")]
    #[diagnostic(
        code(casework::reporters::none_selected),
        help("select reporters by name with --reporters")
    )]
    NoReporterSelected { filter: String, available: String },

    #[error("failed to open output file '{}'", path.display())]
    #[diagnostic(code(casework::io::output))]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config file '{}'", path.display())]
    #[diagnostic(code(casework::config::read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}'", path.display())]
    #[diagnostic(
        code(casework::config::parse),
        help("options are given as a YAML mapping, e.g. `order_by: name`")
    )]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, CaseworkError>;

impl CaseworkError {
    /// Process exit status used by the command line front end.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
