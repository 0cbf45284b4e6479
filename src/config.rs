//! Run options.
//!
//! `RunOptions` can be built in code, loaded from a YAML file, or filled in by
//! the command line front end; flags given on the command line override values
//! from the file.

use crate::errors::{CaseworkError, Result};
use crate::filter::Filters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// ORDERING
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Source file, then declaration line.
    #[default]
    File,
    /// Suite name, then file order.
    Suite,
    /// Test name, then suite order.
    Name,
    /// Seeded shuffle.
    Rand,
}

impl FromStr for OrderBy {
    type Err = CaseworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(OrderBy::File),
            "suite" => Ok(OrderBy::Suite),
            "name" => Ok(OrderBy::Name),
            "rand" => Ok(OrderBy::Rand),
            other => Err(CaseworkError::InvalidOrderBy(other.to_string())),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderBy::File => "file",
            OrderBy::Suite => "suite",
            OrderBy::Name => "name",
            OrderBy::Rand => "rand",
        })
    }
}

// ============================================================================
// RUN OPTIONS
// ============================================================================

/// Unknown keys in a config file are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Name shown by reporters for the running binary.
    pub binary_name: String,
    /// Write reporter output to this file instead of stdout.
    pub out: Option<PathBuf>,
    pub order_by: OrderBy,
    pub rand_seed: u64,
    /// First and last test (counted among those passing the filters) to run.
    pub first: u32,
    pub last: u32,
    /// Stop after this many failed assertions; `0` disables the limit.
    pub abort_after: u32,
    /// Subcase filters apply only to the outermost this-many nesting levels.
    pub subcase_filter_levels: u32,

    pub success: bool,
    pub case_sensitive: bool,
    pub no_exitcode: bool,
    pub no_skip: bool,
    /// Skip every panic assertion (`check_throws!` and friends).
    pub no_throw: bool,
    pub duration: bool,

    pub no_run: bool,
    pub version: bool,
    pub count: bool,
    pub list_test_cases: bool,
    pub list_test_suites: bool,
    pub list_reporters: bool,

    pub no_colors: bool,
    pub force_colors: bool,
    pub no_intro: bool,
    pub no_version: bool,
    pub no_path_in_filenames: bool,
    pub no_line_numbers: bool,
    pub no_skipped_summary: bool,

    pub filters: Filters,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            binary_name: env!("CARGO_PKG_NAME").to_string(),
            out: None,
            order_by: OrderBy::File,
            rand_seed: 0,
            first: 0,
            last: u32::MAX,
            abort_after: 0,
            subcase_filter_levels: u32::MAX,
            success: false,
            case_sensitive: false,
            no_exitcode: false,
            no_skip: false,
            no_throw: false,
            duration: false,
            no_run: false,
            version: false,
            count: false,
            list_test_cases: false,
            list_test_suites: false,
            list_reporters: false,
            no_colors: false,
            force_colors: false,
            no_intro: false,
            no_version: false,
            no_path_in_filenames: false,
            no_line_numbers: false,
            no_skipped_summary: false,
            filters: Filters::default(),
        }
    }
}

impl RunOptions {
    pub fn from_yaml_str(source: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|source| CaseworkError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads options from a YAML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| CaseworkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source, path)
    }

    /// Selection-only modes: tests are filtered and counted but never run.
    pub fn is_query_mode(&self) -> bool {
        self.count || self.list_test_cases || self.list_test_suites
    }

    /// Modes that report immediately without looking at any test.
    pub fn is_early_exit(&self) -> bool {
        self.no_run || self.version || self.list_reporters
    }

    /// Strips directories from `file` when paths are disabled for output.
    pub fn display_file<'a>(&self, file: &'a str) -> &'a str {
        if !self.no_path_in_filenames {
            return file;
        }
        file.rsplit(['/', '\\']).next().unwrap_or(file)
    }

    /// Line number as shown by reporters.
    pub fn display_line(&self, line: u32) -> u32 {
        if self.no_line_numbers {
            0
        } else {
            line
        }
    }
}
