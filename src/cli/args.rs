//! Command-line options of a test binary.
//!
//! Uses the `clap` derive API. Every option maps onto a field of
//! [`RunOptions`]; list-valued filters accept comma separated patterns and may
//! be repeated.

use crate::config::{OrderBy, RunOptions};
use crate::errors::Result;
use crate::filter::FilterKind;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "casework",
    about = "Runs the test cases registered in this binary.",
    disable_version_flag = true
)]
pub struct Args {
    /// Only run test cases from matching source files
    #[arg(long, visible_alias = "sf", value_delimiter = ',', value_name = "PATTERNS")]
    pub source_file: Vec<String>,
    /// Skip test cases from matching source files
    #[arg(long, visible_alias = "sfe", value_delimiter = ',', value_name = "PATTERNS")]
    pub source_file_exclude: Vec<String>,
    /// Only run test cases from matching suites
    #[arg(long, visible_alias = "ts", value_delimiter = ',', value_name = "PATTERNS")]
    pub test_suite: Vec<String>,
    /// Skip test cases from matching suites
    #[arg(long, visible_alias = "tse", value_delimiter = ',', value_name = "PATTERNS")]
    pub test_suite_exclude: Vec<String>,
    /// Only run matching test cases
    #[arg(long, visible_alias = "tc", value_delimiter = ',', value_name = "PATTERNS")]
    pub test_case: Vec<String>,
    /// Skip matching test cases
    #[arg(long, visible_alias = "tce", value_delimiter = ',', value_name = "PATTERNS")]
    pub test_case_exclude: Vec<String>,
    /// Only enter matching subcases
    #[arg(long, visible_alias = "sc", value_delimiter = ',', value_name = "PATTERNS")]
    pub subcase: Vec<String>,
    /// Never enter matching subcases
    #[arg(long, visible_alias = "sce", value_delimiter = ',', value_name = "PATTERNS")]
    pub subcase_exclude: Vec<String>,
    /// Reporters to use (default: console)
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub reporters: Vec<String>,

    /// Write reporter output to a file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Read options from a YAML file; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run order: file, suite, name, or rand
    #[arg(long, visible_alias = "ob", value_name = "MODE")]
    pub order_by: Option<OrderBy>,
    /// Seed for --order-by=rand
    #[arg(long, visible_alias = "rs", value_name = "SEED")]
    pub rand_seed: Option<u64>,
    /// First test (among those passing the filters) to run
    #[arg(long, value_name = "N")]
    pub first: Option<u32>,
    /// Last test (among those passing the filters) to run
    #[arg(long, value_name = "N")]
    pub last: Option<u32>,
    /// Stop after this many failed assertions
    #[arg(long, visible_alias = "aa", value_name = "N")]
    pub abort_after: Option<u32>,
    /// Apply subcase filters to this many nesting levels
    #[arg(long, visible_alias = "scfl", value_name = "N")]
    pub subcase_filter_levels: Option<u32>,

    /// Report passing assertions too
    #[arg(long, short = 's')]
    pub success: bool,
    /// Match filters case-sensitively
    #[arg(long, visible_alias = "cs")]
    pub case_sensitive: bool,
    /// Always exit with status 0
    #[arg(long, visible_alias = "ne")]
    pub no_exitcode: bool,
    /// Run test cases decorated with skip
    #[arg(long, visible_alias = "ns")]
    pub no_skip: bool,
    /// Skip assertions that expect a panic
    #[arg(long, visible_alias = "nt")]
    pub no_throw: bool,
    /// Print the time each test case took
    #[arg(long, short = 'd')]
    pub duration: bool,

    /// Do not run anything
    #[arg(long, visible_alias = "nr")]
    pub no_run: bool,
    /// Print the engine version
    #[arg(long, short = 'v')]
    pub version: bool,
    /// Count the test cases passing the filters
    #[arg(long, short = 'c')]
    pub count: bool,
    /// List the test cases passing the filters
    #[arg(long, visible_alias = "ltc")]
    pub list_test_cases: bool,
    /// List the suites with test cases passing the filters
    #[arg(long, visible_alias = "lts")]
    pub list_test_suites: bool,
    /// List registered reporters and listeners
    #[arg(long, visible_alias = "lr")]
    pub list_reporters: bool,

    /// Disable colored output
    #[arg(long, visible_alias = "nc")]
    pub no_colors: bool,
    /// Use colors even when stdout is not a terminal
    #[arg(long, visible_alias = "fc")]
    pub force_colors: bool,
    /// Omit the intro lines
    #[arg(long, visible_alias = "ni")]
    pub no_intro: bool,
    /// Omit the version line of the intro
    #[arg(long, visible_alias = "nv")]
    pub no_version: bool,
    /// Show file names without directories
    #[arg(long, visible_alias = "npf")]
    pub no_path_filenames: bool,
    /// Show 0 instead of line numbers
    #[arg(long, visible_alias = "nln")]
    pub no_line_numbers: bool,
    /// Omit skipped test cases from the summary
    #[arg(long, visible_alias = "nss")]
    pub no_skipped_summary: bool,
}

impl Args {
    /// Options from `--config` (or the defaults), overridden by every flag
    /// given on the command line.
    pub fn into_options(self, binary_name: &str) -> Result<RunOptions> {
        let mut opts = match &self.config {
            Some(path) => RunOptions::load(path)?,
            None => RunOptions::default(),
        };
        opts.binary_name = binary_name.to_string();

        let filters = [
            (FilterKind::SourceFile, self.source_file),
            (FilterKind::SourceFileExclude, self.source_file_exclude),
            (FilterKind::TestSuite, self.test_suite),
            (FilterKind::TestSuiteExclude, self.test_suite_exclude),
            (FilterKind::TestCase, self.test_case),
            (FilterKind::TestCaseExclude, self.test_case_exclude),
            (FilterKind::Subcase, self.subcase),
            (FilterKind::SubcaseExclude, self.subcase_exclude),
            (FilterKind::Reporters, self.reporters),
        ];
        for (kind, patterns) in filters {
            opts.filters.extend(kind, patterns);
        }

        if self.out.is_some() {
            opts.out = self.out;
        }
        if let Some(order_by) = self.order_by {
            opts.order_by = order_by;
        }
        if let Some(seed) = self.rand_seed {
            opts.rand_seed = seed;
        }
        if let Some(first) = self.first {
            opts.first = first;
        }
        if let Some(last) = self.last {
            opts.last = last;
        }
        if let Some(limit) = self.abort_after {
            opts.abort_after = limit;
        }
        if let Some(levels) = self.subcase_filter_levels {
            opts.subcase_filter_levels = levels;
        }

        opts.success |= self.success;
        opts.case_sensitive |= self.case_sensitive;
        opts.no_exitcode |= self.no_exitcode;
        opts.no_skip |= self.no_skip;
        opts.no_throw |= self.no_throw;
        opts.duration |= self.duration;
        opts.no_run |= self.no_run;
        opts.version |= self.version;
        opts.count |= self.count;
        opts.list_test_cases |= self.list_test_cases;
        opts.list_test_suites |= self.list_test_suites;
        opts.list_reporters |= self.list_reporters;
        opts.no_colors |= self.no_colors;
        opts.force_colors |= self.force_colors;
        opts.no_intro |= self.no_intro;
        opts.no_version |= self.no_version;
        opts.no_path_in_filenames |= self.no_path_filenames;
        opts.no_line_numbers |= self.no_line_numbers;
        opts.no_skipped_summary |= self.no_skipped_summary;
        Ok(opts)
    }
}
