//! Failure classification flags and the statistics snapshots handed to
//! reporters.

use crate::case::TestCaseData;
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// ============================================================================
// FAILURE FLAGS
// ============================================================================

/// Why a test case is (or is not) considered failed.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FailureFlags(u32);

impl FailureFlags {
    pub const NONE: FailureFlags = FailureFlags(0);
    pub const ASSERT_FAILURE: FailureFlags = FailureFlags(1);
    pub const EXCEPTION: FailureFlags = FailureFlags(1 << 1);
    pub const CRASH: FailureFlags = FailureFlags(1 << 2);
    pub const TOO_MANY_FAILED_ASSERTS: FailureFlags = FailureFlags(1 << 3);
    pub const TIMEOUT: FailureFlags = FailureFlags(1 << 4);
    pub const SHOULD_HAVE_FAILED_BUT_DIDNT: FailureFlags = FailureFlags(1 << 5);
    pub const SHOULD_HAVE_FAILED_AND_DID: FailureFlags = FailureFlags(1 << 6);
    pub const DIDNT_FAIL_EXACTLY_NUM_TIMES: FailureFlags = FailureFlags(1 << 7);
    pub const FAILED_EXACTLY_NUM_TIMES: FailureFlags = FailureFlags(1 << 8);
    pub const COULD_HAVE_FAILED_AND_DID: FailureFlags = FailureFlags(1 << 9);

    /// Outcomes a decorator turned into an acceptable result.
    pub const OK_TO_FAIL: FailureFlags = FailureFlags(
        Self::SHOULD_HAVE_FAILED_AND_DID.0
            | Self::FAILED_EXACTLY_NUM_TIMES.0
            | Self::COULD_HAVE_FAILED_AND_DID.0,
    );

    const NAMES: [(FailureFlags, &'static str); 10] = [
        (Self::ASSERT_FAILURE, "assert_failure"),
        (Self::EXCEPTION, "exception"),
        (Self::CRASH, "crash"),
        (Self::TOO_MANY_FAILED_ASSERTS, "too_many_failed_asserts"),
        (Self::TIMEOUT, "timeout"),
        (Self::SHOULD_HAVE_FAILED_BUT_DIDNT, "should_have_failed_but_didnt"),
        (Self::SHOULD_HAVE_FAILED_AND_DID, "should_have_failed_and_did"),
        (Self::DIDNT_FAIL_EXACTLY_NUM_TIMES, "didnt_fail_exactly_num_times"),
        (Self::FAILED_EXACTLY_NUM_TIMES, "failed_exactly_num_times"),
        (Self::COULD_HAVE_FAILED_AND_DID, "could_have_failed_and_did"),
    ];

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: FailureFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: FailureFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: FailureFlags) {
        self.0 |= other.0;
    }

    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    /// True when the flags mark a failure that no decorator excused.
    pub fn is_failure(self) -> bool {
        !self.is_empty() && !self.intersects(Self::OK_TO_FAIL)
    }
}

impl BitOr for FailureFlags {
    type Output = FailureFlags;

    fn bitor(self, rhs: FailureFlags) -> FailureFlags {
        FailureFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FailureFlags {
    fn bitor_assign(&mut self, rhs: FailureFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FailureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("FailureFlags(NONE)");
        }
        let names: Vec<&str> = self.names().collect();
        write!(f, "FailureFlags({})", names.join(" | "))
    }
}

impl Serialize for FailureFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// Totals for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TestRunStats {
    pub num_test_cases: u32,
    pub num_test_cases_passing_filters: u32,
    pub num_test_suites_passing_filters: u32,
    pub num_test_cases_failed: u32,
    pub num_asserts: u32,
    pub num_asserts_failed: u32,
}

impl TestRunStats {
    pub fn num_test_cases_passed(&self) -> u32 {
        self.num_test_cases_passing_filters
            .saturating_sub(self.num_test_cases_failed)
    }

    pub fn num_test_cases_skipped(&self) -> u32 {
        self.num_test_cases
            .saturating_sub(self.num_test_cases_passing_filters)
    }

    pub fn num_asserts_passed(&self) -> u32 {
        self.num_asserts.saturating_sub(self.num_asserts_failed)
    }
}

/// Outcome of the test case that just finished.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CurrentTestCaseStats {
    pub num_asserts: u32,
    pub num_asserts_failed: u32,
    pub seconds: f64,
    pub failure_flags: FailureFlags,
}

/// An exception (panic) or crash that ended a test case invocation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TestCaseException {
    pub error_string: String,
    pub is_crash: bool,
    /// Info contexts that were alive while the invocation unwound, innermost last.
    pub contexts: Vec<String>,
}

// ============================================================================
// QUERIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Version,
    ListReporters,
    NoRun,
    Count,
    ListTestCases,
    ListTestSuites,
}

/// A registered reporter or listener as shown by `list_reporters`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReporterInfo {
    pub name: String,
    pub priority: i32,
    pub is_listener: bool,
}

/// Answer to a query-mode run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryData {
    pub mode: QueryMode,
    /// Selection totals; absent for modes that exit before selection.
    pub run_stats: Option<TestRunStats>,
    /// Listed test cases, or one representative case per listed suite.
    pub data: Vec<TestCaseData>,
    pub reporters: Vec<ReporterInfo>,
}
