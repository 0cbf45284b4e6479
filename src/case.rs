//! Test case descriptors and subcase signatures.

use crate::context::TestContext;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// The callable body of a test case. It runs once per discovered subcase path.
pub type TestBody = Arc<dyn Fn(&TestContext) + Send + Sync>;

/// Name prefix of cases created with [`TestCase::scenario`].
pub const SCENARIO_PREFIX: &str = "  Scenario: ";

// ============================================================================
// DECORATORS
// ============================================================================

/// Per-test policies that change how failures are classified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decorators {
    pub description: String,
    pub skip: bool,
    pub may_fail: bool,
    pub should_fail: bool,
    pub expected_failures: u32,
    /// Time limit in seconds; `0.0` means unlimited.
    pub timeout: f64,
}

// ============================================================================
// TEST CASE DATA
// ============================================================================

/// Everything a reporter may know about a test case: its identity and
/// decorators, without the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseData {
    pub file: String,
    pub line: u32,
    pub name: String,
    pub suite: String,
    /// Index of the instantiation for cases registered from one template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<u32>,
    #[serde(flatten)]
    pub decorators: Decorators,
}

impl TestCaseData {
    /// Display name of the suite, empty when the case belongs to none.
    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn description(&self) -> &str {
        &self.decorators.description
    }
}

// ============================================================================
// TEST CASE
// ============================================================================

/// A registered test case: descriptor plus body.
#[derive(Clone)]
pub struct TestCase {
    data: TestCaseData,
    body: TestBody,
}

impl TestCase {
    /// Creates a test case located at the caller.
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestContext) + Send + Sync + 'static,
    {
        let location = Location::caller();
        Self {
            data: TestCaseData {
                file: location.file().to_string(),
                line: location.line(),
                name: name.into(),
                suite: String::new(),
                template_id: None,
                decorators: Decorators::default(),
            },
            body: Arc::new(body),
        }
    }

    /// Creates a BDD-style test case. Its steps are the `given!`, `when!`
    /// and `then!` subcases.
    #[track_caller]
    pub fn scenario<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestContext) + Send + Sync + 'static,
    {
        Self::new(format!("{}{}", SCENARIO_PREFIX, name.into()), body)
    }

    /// Overrides the recorded source location.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.data.file = file.into();
        self.data.line = line;
        self
    }

    pub fn in_suite(mut self, suite: impl Into<String>) -> Self {
        self.data.suite = suite.into();
        self
    }

    /// Replaces every decorator at once.
    pub fn decorate(mut self, decorators: Decorators) -> Self {
        self.data.decorators = decorators;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.data.decorators.description = text.into();
        self
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.data.decorators.skip = skip;
        self
    }

    pub fn may_fail(mut self, may_fail: bool) -> Self {
        self.data.decorators.may_fail = may_fail;
        self
    }

    pub fn should_fail(mut self, should_fail: bool) -> Self {
        self.data.decorators.should_fail = should_fail;
        self
    }

    pub fn expected_failures(mut self, count: u32) -> Self {
        self.data.decorators.expected_failures = count;
        self
    }

    pub fn timeout(mut self, seconds: f64) -> Self {
        self.data.decorators.timeout = seconds;
        self
    }

    /// Marks the case as instantiation `id` of a test template. Instances
    /// share a source location and are told apart by this id.
    pub fn template_id(mut self, id: u32) -> Self {
        self.data.template_id = Some(id);
        self
    }

    pub fn data(&self) -> &TestCaseData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn suite(&self) -> &str {
        &self.data.suite
    }

    pub fn file(&self) -> &str {
        &self.data.file
    }

    pub fn line(&self) -> u32 {
        self.data.line
    }

    pub(crate) fn template_key(&self) -> Option<u32> {
        self.data.template_id
    }

    pub(crate) fn invoke(&self, ctx: &TestContext) {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SUBCASE SIGNATURE
// ============================================================================

/// Identity of one subcase: its name and where it was opened.
///
/// Ordered by line first, then file, then name, so the signatures of a
/// single test body sort in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubcaseSignature {
    pub name: String,
    pub file: String,
    pub line: u32,
}

impl SubcaseSignature {
    pub fn new(name: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line,
        }
    }
}

impl Ord for SubcaseSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.file.cmp(&other.file))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for SubcaseSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
