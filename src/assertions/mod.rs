//! Assertion taxonomy, decomposed results, and the builder that logs them.
//!
//! The assertion macros (`check!`, `require_eq!`, `warn_throws!`, ...) all
//! funnel into [`Assertion`]: they evaluate their operands exactly once inside
//! a panic-capturing closure, decompose the values into text when needed, and
//! hand the outcome to the builder which counts it, delivers it to reporters,
//! and aborts the current invocation when the severity demands it.

pub mod approx;
pub mod decompose;
mod macros;

pub use approx::Approx;
pub use decompose::{raw_memory_to_string, PlainBytes};

use crate::case::TestCaseData;
use crate::context::TestContext;
use crate::exception::Payload;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// ASSERTION TYPES
// ============================================================================

/// How hard a failing assertion hits the running test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, never counted, never fails the test.
    Warn,
    /// Counted and fails the test, execution continues.
    Check,
    /// Counted, fails the test, and aborts the current invocation.
    Require,
}

impl Severity {
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Warn => "WARN",
            Severity::Check => "CHECK",
            Severity::Require => "REQUIRE",
        }
    }

    /// Label used when an assertion or message of this severity fails.
    pub fn failure_label(self) -> &'static str {
        match self {
            Severity::Warn => "WARNING",
            Severity::Check => "ERROR",
            Severity::Require => "FATAL ERROR",
        }
    }

    pub fn is_counted(self) -> bool {
        self != Severity::Warn
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssertKind {
    Normal,
    False,
    Throws,
    ThrowsAs,
    ThrowsWith,
    ThrowsWithAs,
    NoThrow,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Unary,
    UnaryFalse,
}

impl AssertKind {
    fn suffix(self) -> &'static str {
        match self {
            AssertKind::Normal => "",
            AssertKind::False => "_FALSE",
            AssertKind::Throws => "_THROWS",
            AssertKind::ThrowsAs => "_THROWS_AS",
            AssertKind::ThrowsWith => "_THROWS_WITH",
            AssertKind::ThrowsWithAs => "_THROWS_WITH_AS",
            AssertKind::NoThrow => "_NOTHROW",
            AssertKind::Eq => "_EQ",
            AssertKind::Ne => "_NE",
            AssertKind::Gt => "_GT",
            AssertKind::Lt => "_LT",
            AssertKind::Ge => "_GE",
            AssertKind::Le => "_LE",
            AssertKind::Unary => "_UNARY",
            AssertKind::UnaryFalse => "_UNARY_FALSE",
        }
    }

    /// Inverted verdict: the assertion passes when the expression is false.
    pub fn is_false(self) -> bool {
        matches!(self, AssertKind::False | AssertKind::UnaryFalse)
    }

    pub fn expects_type(self) -> bool {
        matches!(self, AssertKind::ThrowsAs | AssertKind::ThrowsWithAs)
    }

    pub fn expects_message(self) -> bool {
        matches!(self, AssertKind::ThrowsWith | AssertKind::ThrowsWithAs)
    }

    /// Assertions about a value, as opposed to whether something panics.
    pub fn is_value_check(self) -> bool {
        !matches!(
            self,
            AssertKind::Throws
                | AssertKind::ThrowsAs
                | AssertKind::ThrowsWith
                | AssertKind::ThrowsWithAs
                | AssertKind::NoThrow
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssertType {
    pub severity: Severity,
    pub kind: AssertKind,
}

impl AssertType {
    pub const fn new(severity: Severity, kind: AssertKind) -> Self {
        Self { severity, kind }
    }
}

impl fmt::Display for AssertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.severity.prefix(), self.kind.suffix())
    }
}

impl Serialize for AssertType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// EVENT DATA
// ============================================================================

/// One evaluated assertion, as delivered to reporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertData {
    pub test_case: Option<Arc<TestCaseData>>,
    #[serde(rename = "type")]
    pub at: AssertType,
    pub file: String,
    pub line: u32,
    /// Source text of the asserted expression.
    pub expr: String,
    pub failed: bool,
    /// Operand values, filled in when the assertion failed or successes are logged.
    pub decomp: String,
    pub threw: bool,
    /// Translated panic message, quoted.
    pub exception: String,
    pub threw_as: bool,
    pub exception_type: String,
    pub exception_string: String,
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageData {
    pub text: String,
    pub file: String,
    pub line: u32,
    pub severity: Severity,
    pub contexts: Vec<String>,
}

// ============================================================================
// DECOMPOSED RESULTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        }
    }
}

/// Verdict of a value assertion plus its rendered operands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprResult {
    pub passed: bool,
    pub decomp: String,
}

impl ExprResult {
    pub fn new(passed: bool, decomp: impl Into<String>) -> Self {
        Self {
            passed,
            decomp: decomp.into(),
        }
    }

    /// `lhs OP rhs`, as produced by `check!(ctx, a == b)`.
    pub fn comparison(passed: bool, lhs: String, op: Comparison, rhs: String) -> Self {
        Self::new(passed, format!("{} {} {}", lhs, op.symbol(), rhs))
    }

    /// `lhs, rhs`, as produced by the binary forms such as `check_eq!`.
    pub fn binary(passed: bool, lhs: String, rhs: String) -> Self {
        Self::new(passed, format!("{}, {}", lhs, rhs))
    }
}

// ============================================================================
// ASSERTION BUILDER
// ============================================================================

/// An assertion waiting for its outcome. Created by [`TestContext::assertion`].
#[must_use = "an assertion is only logged once its outcome is supplied"]
pub struct Assertion<'a> {
    ctx: &'a TestContext,
    data: AssertData,
}

impl<'a> Assertion<'a> {
    pub(crate) fn new(ctx: &'a TestContext, at: AssertType, expr: &str, file: &str, line: u32) -> Self {
        Self {
            ctx,
            data: AssertData {
                test_case: ctx.current_test(),
                at,
                file: file.to_string(),
                line,
                expr: expr.to_string(),
                failed: true,
                decomp: String::new(),
                threw: false,
                exception: String::new(),
                threw_as: false,
                exception_type: String::new(),
                exception_string: String::new(),
                contexts: Vec::new(),
            },
        }
    }

    /// Whether operand text should be rendered for a result with this verdict.
    pub fn wants_decomposition(&self, passed: bool) -> bool {
        !passed || self.ctx.logs_successes()
    }

    pub fn expected_type(mut self, type_name: &str) -> Self {
        self.data.exception_type = type_name.to_string();
        self
    }

    pub fn expected_message(mut self, message: impl Into<String>) -> Self {
        self.data.exception_string = message.into();
        self
    }

    /// Logs a value assertion. A panic while evaluating the operands fails it.
    pub fn evaluated(mut self, outcome: Result<ExprResult, Payload>) -> bool {
        match outcome {
            Ok(result) => {
                self.data.failed = !result.passed;
                self.data.decomp = result.decomp;
            }
            Err(payload) => {
                self.data.threw = true;
                self.data.exception = self.ctx.translate(&*payload);
            }
        }
        self.log()
    }

    /// Logs a panic assertion. `matches_type` tells whether the payload has
    /// the expected type.
    pub fn thrown<F>(mut self, outcome: Result<(), Payload>, matches_type: F) -> bool
    where
        F: FnOnce(&(dyn Any + Send)) -> bool,
    {
        if let Err(payload) = outcome {
            self.data.threw = true;
            self.data.threw_as = matches_type(&*payload);
            self.data.exception = self.ctx.translate(&*payload);
        }
        self.log()
    }

    fn log(mut self) -> bool {
        let data = &mut self.data;
        match data.at.kind {
            AssertKind::Throws => data.failed = !data.threw,
            AssertKind::ThrowsWithAs => {
                data.failed = !data.threw_as || data.exception != data.exception_string
            }
            AssertKind::ThrowsAs => data.failed = !data.threw_as,
            AssertKind::ThrowsWith => data.failed = data.exception != data.exception_string,
            AssertKind::NoThrow => data.failed = data.threw,
            _ => {}
        }
        if !data.exception.is_empty() {
            data.exception = format!("\"{}\"", data.exception);
        }
        data.contexts = self.ctx.active_contexts();

        let failed = data.failed;
        self.ctx.record_assert(&self.data);
        if failed && self.ctx.should_abort(self.data.at.severity) {
            self.ctx.abort_invocation();
        }
        !failed
    }
}
