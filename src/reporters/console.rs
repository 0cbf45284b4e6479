//! Human-readable terminal output.

use super::{ReportSink, Reporter};
use crate::assertions::{AssertData, AssertKind, MessageData, Severity};
use crate::case::{SubcaseSignature, TestCaseData, SCENARIO_PREFIX};
use crate::config::RunOptions;
use crate::stats::{
    CurrentTestCaseStats, FailureFlags, QueryData, QueryMode, ReporterInfo, TestCaseException,
    TestRunStats,
};
use std::io;
use termcolor::{Color, ColorSpec, WriteColor};

const PREFIX: &str = "[casework] ";
const SEPARATOR_WIDTH: usize = 79;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Yellow,
    Cyan,
    Red,
    Green,
    BrightGreen,
    Grey,
}

fn tone(w: &mut dyn WriteColor, tone: Tone) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    match tone {
        Tone::Plain => return w.reset(),
        Tone::Yellow => spec.set_fg(Some(Color::Yellow)),
        Tone::Cyan => spec.set_fg(Some(Color::Cyan)),
        Tone::Red => spec.set_fg(Some(Color::Red)),
        Tone::Green => spec.set_fg(Some(Color::Green)),
        Tone::BrightGreen => spec.set_fg(Some(Color::Green)).set_intense(true),
        Tone::Grey => spec.set_fg(Some(Color::White)),
    };
    w.set_color(&spec)
}

fn prefix(w: &mut dyn WriteColor) -> io::Result<()> {
    tone(w, Tone::Cyan)?;
    write!(w, "{}", PREFIX)?;
    tone(w, Tone::Plain)
}

fn separator(w: &mut dyn WriteColor) -> io::Result<()> {
    tone(w, Tone::Yellow)?;
    writeln!(w, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    tone(w, Tone::Plain)
}

fn outcome_tone(success: bool, severity: Severity) -> Tone {
    if success {
        Tone::BrightGreen
    } else if severity == Severity::Warn {
        Tone::Yellow
    } else {
        Tone::Red
    }
}

/// Coloured text report: failures with their context, then a summary table.
pub struct ConsoleReporter {
    opts: RunOptions,
    sink: ReportSink,
    current: Option<TestCaseData>,
    /// Deepest subcase stack seen during the current invocation.
    subcases: Vec<SubcaseSignature>,
    level: usize,
    logged_start: bool,
}

impl ConsoleReporter {
    pub fn new(opts: RunOptions, sink: ReportSink) -> Self {
        Self {
            opts,
            sink,
            current: None,
            subcases: Vec::new(),
            level: 0,
            logged_start: false,
        }
    }

    fn emit(&mut self, write: impl FnOnce(&mut Self, &mut dyn WriteColor) -> io::Result<()>) {
        let sink = self.sink.clone();
        sink.write_with(|w| write(self, w));
    }

    fn file_line(&self, w: &mut dyn WriteColor, file: &str, line: u32, tail: &str) -> io::Result<()> {
        tone(w, Tone::Grey)?;
        write!(
            w,
            "{}:{}:",
            self.opts.display_file(file),
            self.opts.display_line(line)
        )?;
        tone(w, Tone::Plain)?;
        write!(w, "{}", tail)
    }

    fn version(&self, w: &mut dyn WriteColor) -> io::Result<()> {
        prefix(w)?;
        writeln!(
            w,
            "{} version is \"{}\"",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Header naming the test case and the subcase path, printed once before
    /// the first thing logged for an invocation.
    fn log_test_start(&mut self, w: &mut dyn WriteColor) -> io::Result<()> {
        if self.logged_start {
            return Ok(());
        }
        let Some(case) = &self.current else {
            return Ok(());
        };

        separator(w)?;
        self.file_line(w, &case.file, case.line, "\n")?;
        if !case.description().is_empty() {
            tone(w, Tone::Yellow)?;
            write!(w, "DESCRIPTION: ")?;
            tone(w, Tone::Plain)?;
            writeln!(w, "{}", case.description())?;
        }
        if !case.suite.is_empty() {
            tone(w, Tone::Yellow)?;
            write!(w, "TEST SUITE: ")?;
            tone(w, Tone::Plain)?;
            writeln!(w, "{}", case.suite)?;
        }
        if !case.name.starts_with(SCENARIO_PREFIX) {
            tone(w, Tone::Yellow)?;
            write!(w, "TEST CASE:  ")?;
        }
        tone(w, Tone::Plain)?;
        writeln!(w, "{}", case.name)?;

        for signature in self.subcases.iter().take(self.level) {
            if !signature.name.is_empty() {
                writeln!(w, "  {}", signature.name)?;
            }
        }
        if self.level != self.subcases.len() {
            tone(w, Tone::Yellow)?;
            writeln!(w, "\nDEEPEST SUBCASE STACK REACHED (DIFFERENT FROM THE CURRENT ONE):")?;
            tone(w, Tone::Plain)?;
            for signature in &self.subcases {
                if !signature.name.is_empty() {
                    writeln!(w, "  {}", signature.name)?;
                }
            }
        }
        writeln!(w)?;
        self.logged_start = true;
        Ok(())
    }

    fn log_contexts(w: &mut dyn WriteColor, contexts: &[String]) -> io::Result<()> {
        if !contexts.is_empty() {
            tone(w, Tone::Plain)?;
            write!(w, "  logged: ")?;
            for (i, text) in contexts.iter().enumerate() {
                let indent = if i == 0 { "" } else { "          " };
                writeln!(w, "{}{}", indent, text)?;
            }
        }
        writeln!(w)
    }

    fn assert_text(w: &mut dyn WriteColor, rb: &AssertData) -> io::Result<()> {
        let kind = rb.at.kind;
        if !kind.expects_type() && !kind.expects_message() {
            tone(w, Tone::Cyan)?;
            write!(w, "{}( {} ) ", rb.at, rb.expr)?;
            tone(w, Tone::Plain)?;
        }

        match kind {
            AssertKind::Throws => {
                let text = if rb.threw {
                    "threw as expected!"
                } else {
                    "did NOT throw at all!"
                };
                writeln!(w, "{}", text)
            }
            AssertKind::ThrowsWithAs => {
                tone(w, Tone::Cyan)?;
                write!(
                    w,
                    "{}( {}, \"{}\", {} ) ",
                    rb.at, rb.expr, rb.exception_string, rb.exception_type
                )?;
                tone(w, Tone::Plain)?;
                if !rb.threw {
                    writeln!(w, "did NOT throw at all!")
                } else if !rb.failed {
                    writeln!(w, "threw as expected!")
                } else {
                    writeln!(w, "threw a DIFFERENT exception! (contents: {})", rb.exception)
                }
            }
            AssertKind::ThrowsAs => {
                tone(w, Tone::Cyan)?;
                write!(w, "{}( {}, {} ) ", rb.at, rb.expr, rb.exception_type)?;
                tone(w, Tone::Plain)?;
                let verdict = match (rb.threw, rb.threw_as) {
                    (false, _) => "did NOT throw at all!",
                    (true, true) => "threw as expected!",
                    (true, false) => "threw a DIFFERENT exception: ",
                };
                write!(w, "{}", verdict)?;
                tone(w, Tone::Cyan)?;
                writeln!(w, "{}", rb.exception)
            }
            AssertKind::ThrowsWith => {
                tone(w, Tone::Cyan)?;
                write!(w, "{}( {}, \"{}\" ) ", rb.at, rb.expr, rb.exception_string)?;
                tone(w, Tone::Plain)?;
                let verdict = match (rb.threw, rb.failed) {
                    (false, _) => "did NOT throw at all!",
                    (true, false) => "threw as expected!",
                    (true, true) => "threw a DIFFERENT exception: ",
                };
                write!(w, "{}", verdict)?;
                tone(w, Tone::Cyan)?;
                writeln!(w, "{}", rb.exception)
            }
            AssertKind::NoThrow => {
                write!(w, "{}", if rb.threw { "THREW exception: " } else { "didn't throw!" })?;
                tone(w, Tone::Cyan)?;
                writeln!(w, "{}", rb.exception)
            }
            _ if rb.threw => writeln!(w, "THREW exception: {}", rb.exception),
            _ => {
                if rb.failed {
                    writeln!(w, "is NOT correct!")?;
                } else {
                    writeln!(w, "is correct!")?;
                }
                writeln!(w, "  values: {}( {} )", rb.at, rb.decomp)
            }
        }
    }

    fn reporters_listing(w: &mut dyn WriteColor, infos: &[ReporterInfo]) -> io::Result<()> {
        for (kind, listeners) in [("listeners", true), ("reporters", false)] {
            let group: Vec<&ReporterInfo> =
                infos.iter().filter(|i| i.is_listener == listeners).collect();
            if group.is_empty() {
                continue;
            }
            prefix(w)?;
            writeln!(w, "listing all registered {}", kind)?;
            for info in group {
                writeln!(w, "priority: {:>5} name: {}", info.priority, info.name)?;
            }
        }
        Ok(())
    }

    fn summary(&self, w: &mut dyn WriteColor, stats: &TestRunStats) -> io::Result<()> {
        let anything_failed = stats.num_test_cases_failed > 0 || stats.num_asserts_failed > 0;
        let highlight = |cond: bool, t: Tone| if cond { t } else { Tone::Plain };

        prefix(w)?;
        write!(w, "test cases: {:>6} | ", stats.num_test_cases_passing_filters)?;
        tone(
            w,
            highlight(
                stats.num_test_cases_passing_filters > 0 && !anything_failed,
                Tone::Green,
            ),
        )?;
        write!(w, "{:>6} passed", stats.num_test_cases_passed())?;
        tone(w, Tone::Plain)?;
        write!(w, " | ")?;
        tone(w, highlight(stats.num_test_cases_failed > 0, Tone::Red))?;
        write!(w, "{:>6} failed", stats.num_test_cases_failed)?;
        tone(w, Tone::Plain)?;
        write!(w, " |")?;
        if !self.opts.no_skipped_summary {
            let skipped = stats.num_test_cases_skipped();
            write!(w, " ")?;
            tone(w, highlight(skipped > 0, Tone::Yellow))?;
            write!(w, "{:>6} skipped", skipped)?;
            tone(w, Tone::Plain)?;
        }
        writeln!(w)?;

        prefix(w)?;
        write!(w, "assertions: {:>6} | ", stats.num_asserts)?;
        tone(w, highlight(stats.num_asserts > 0 && !anything_failed, Tone::Green))?;
        write!(w, "{:>6} passed", stats.num_asserts_passed())?;
        tone(w, Tone::Plain)?;
        write!(w, " | ")?;
        tone(w, highlight(stats.num_asserts_failed > 0, Tone::Red))?;
        write!(w, "{:>6} failed", stats.num_asserts_failed)?;
        tone(w, Tone::Plain)?;
        writeln!(w, " |")?;

        prefix(w)?;
        write!(w, "Status: ")?;
        if stats.num_test_cases_failed > 0 {
            tone(w, Tone::Red)?;
            write!(w, "FAILURE!")?;
        } else {
            tone(w, Tone::Green)?;
            write!(w, "SUCCESS!")?;
        }
        tone(w, Tone::Plain)?;
        writeln!(w)
    }
}

impl Reporter for ConsoleReporter {
    fn report_query(&mut self, query: &QueryData) {
        self.emit(|this, w| {
            match query.mode {
                QueryMode::Version => this.version(w)?,
                QueryMode::ListReporters => {
                    this.version(w)?;
                    Self::reporters_listing(w, &query.reporters)?;
                }
                QueryMode::NoRun => {}
                QueryMode::Count | QueryMode::ListTestCases => {
                    if query.mode == QueryMode::ListTestCases {
                        prefix(w)?;
                        writeln!(w, "listing all test case names")?;
                        separator(w)?;
                    }
                    for case in &query.data {
                        writeln!(w, "{}", case.name)?;
                    }
                    separator(w)?;
                    let stats = query.run_stats.clone().unwrap_or_default();
                    prefix(w)?;
                    writeln!(
                        w,
                        "unskipped test cases passing the current filters: {}",
                        stats.num_test_cases_passing_filters
                    )?;
                }
                QueryMode::ListTestSuites => {
                    prefix(w)?;
                    writeln!(w, "listing all test suites")?;
                    separator(w)?;
                    for case in &query.data {
                        writeln!(w, "{}", case.suite)?;
                    }
                    separator(w)?;
                    let stats = query.run_stats.clone().unwrap_or_default();
                    prefix(w)?;
                    writeln!(
                        w,
                        "unskipped test cases passing the current filters: {}",
                        stats.num_test_cases_passing_filters
                    )?;
                    prefix(w)?;
                    writeln!(
                        w,
                        "test suites with unskipped test cases passing the current filters: {}",
                        stats.num_test_suites_passing_filters
                    )?;
                }
            }
            w.flush()
        });
    }

    fn test_run_start(&mut self) {
        if self.opts.no_intro {
            return;
        }
        self.emit(|this, w| {
            if !this.opts.no_version {
                this.version(w)?;
            }
            prefix(w)?;
            writeln!(w, "run with \"--help\" for options")
        });
    }

    fn test_run_end(&mut self, stats: &TestRunStats) {
        self.emit(|this, w| {
            separator(w)?;
            this.summary(w, stats)?;
            w.flush()
        });
    }

    fn test_case_start(&mut self, case: &TestCaseData) {
        self.current = Some(case.clone());
        self.subcases.clear();
        self.level = 0;
        self.logged_start = false;
    }

    fn test_case_reenter(&mut self, _case: &TestCaseData) {
        self.subcases.clear();
        self.level = 0;
        self.logged_start = false;
    }

    fn test_case_end(&mut self, stats: &CurrentTestCaseStats) {
        let flags = stats.failure_flags;
        self.emit(|this, w| {
            if this.opts.duration
                || (!flags.is_empty() && flags != FailureFlags::ASSERT_FAILURE)
            {
                this.log_test_start(w)?;
            }
            let Some(case) = this.current.clone() else {
                return Ok(());
            };
            if this.opts.duration {
                writeln!(w, "{:.6} s: {}", stats.seconds, case.name)?;
            }
            let decorators = &case.decorators;
            if flags.contains(FailureFlags::TIMEOUT) {
                tone(w, Tone::Red)?;
                writeln!(w, "Test case exceeded time limit of {:.6}!", decorators.timeout)?;
            }
            if flags.contains(FailureFlags::SHOULD_HAVE_FAILED_BUT_DIDNT) {
                tone(w, Tone::Red)?;
                writeln!(w, "Should have failed but didn't! Marking it as failed!")?;
            } else if flags.contains(FailureFlags::SHOULD_HAVE_FAILED_AND_DID) {
                tone(w, Tone::Yellow)?;
                writeln!(w, "Failed as expected so marking it as not failed")?;
            } else if flags.contains(FailureFlags::COULD_HAVE_FAILED_AND_DID) {
                tone(w, Tone::Yellow)?;
                writeln!(w, "Allowed to fail so marking it as not failed")?;
            } else if flags.contains(FailureFlags::DIDNT_FAIL_EXACTLY_NUM_TIMES) {
                tone(w, Tone::Red)?;
                writeln!(
                    w,
                    "Didn't fail exactly {} times so marking it as failed!",
                    decorators.expected_failures
                )?;
            } else if flags.contains(FailureFlags::FAILED_EXACTLY_NUM_TIMES) {
                tone(w, Tone::Yellow)?;
                writeln!(
                    w,
                    "Failed exactly {} times as expected so marking it as not failed!",
                    decorators.expected_failures
                )?;
            }
            if flags.contains(FailureFlags::TOO_MANY_FAILED_ASSERTS) {
                tone(w, Tone::Red)?;
                writeln!(w, "Aborting - too many failed asserts!")?;
            }
            tone(w, Tone::Plain)
        });
    }

    fn test_case_exception(&mut self, exception: &TestCaseException) {
        self.emit(|this, w| {
            this.log_test_start(w)?;
            if let Some(case) = &this.current {
                this.file_line(w, &case.file, case.line, " ")?;
            }
            let severity = if exception.is_crash {
                Severity::Require
            } else {
                Severity::Check
            };
            tone(w, outcome_tone(false, severity))?;
            write!(w, "{}: ", severity.failure_label())?;
            tone(w, Tone::Red)?;
            write!(
                w,
                "{}",
                if exception.is_crash {
                    "test case CRASHED: "
                } else {
                    "test case THREW exception: "
                }
            )?;
            tone(w, Tone::Cyan)?;
            writeln!(w, "{}", exception.error_string)?;
            if !exception.contexts.is_empty() {
                tone(w, Tone::Plain)?;
                write!(w, "  logged: ")?;
                for (i, text) in exception.contexts.iter().enumerate() {
                    writeln!(w, "{}{}", if i == 0 { "" } else { "          " }, text)?;
                }
            }
            writeln!(w)?;
            tone(w, Tone::Plain)
        });
    }

    fn subcase_start(&mut self, signature: &SubcaseSignature) {
        self.subcases.truncate(self.level);
        self.subcases.push(signature.clone());
        self.level += 1;
        self.logged_start = false;
    }

    fn subcase_end(&mut self) {
        self.level = self.level.saturating_sub(1);
        self.logged_start = false;
    }

    fn log_assert(&mut self, rb: &AssertData) {
        if !rb.failed && !self.opts.success {
            return;
        }
        self.emit(|this, w| {
            this.log_test_start(w)?;
            this.file_line(w, &rb.file, rb.line, " ")?;
            tone(w, outcome_tone(!rb.failed, rb.at.severity))?;
            if rb.failed {
                write!(w, "{}: ", rb.at.severity.failure_label())?;
            } else {
                write!(w, "SUCCESS: ")?;
            }
            tone(w, Tone::Plain)?;
            Self::assert_text(w, rb)?;
            Self::log_contexts(w, &rb.contexts)
        });
    }

    fn log_message(&mut self, message: &MessageData) {
        self.emit(|this, w| {
            this.log_test_start(w)?;
            this.file_line(w, &message.file, message.line, " ")?;
            let warn = message.severity == Severity::Warn;
            tone(w, outcome_tone(false, message.severity))?;
            let label = if warn {
                "MESSAGE"
            } else {
                message.severity.failure_label()
            };
            write!(w, "{}: ", label)?;
            tone(w, Tone::Plain)?;
            writeln!(w, "{}", message.text)?;
            Self::log_contexts(w, &message.contexts)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::AssertType;
    use std::sync::Arc;

    fn reporter(opts: RunOptions) -> (ConsoleReporter, crate::reporters::SharedBuffer) {
        let (sink, buffer) = ReportSink::buffer();
        (ConsoleReporter::new(opts, sink), buffer)
    }

    fn case() -> TestCaseData {
        TestCaseData {
            file: "tests/math.rs".into(),
            line: 10,
            name: "addition".into(),
            suite: "math".into(),
            template_id: None,
            decorators: Default::default(),
        }
    }

    fn failed_eq() -> AssertData {
        AssertData {
            test_case: Some(Arc::new(case())),
            at: AssertType::new(Severity::Check, AssertKind::Normal),
            file: "tests/math.rs".into(),
            line: 12,
            expr: "3 == 4".into(),
            failed: true,
            decomp: "3 == 4".into(),
            threw: false,
            exception: String::new(),
            threw_as: false,
            exception_type: String::new(),
            exception_string: String::new(),
            contexts: vec!["x = 3".into()],
        }
    }

    #[test]
    fn failed_assert_prints_header_and_values() {
        let (mut r, out) = reporter(RunOptions::default());
        r.test_case_start(&case());
        r.subcase_start(&SubcaseSignature::new("small numbers", "tests/math.rs", 11));
        r.log_assert(&failed_eq());
        let text = out.contents();
        assert!(text.contains(&"=".repeat(79)));
        assert!(text.contains("TEST SUITE: math"));
        assert!(text.contains("TEST CASE:  addition"));
        assert!(text.contains("  small numbers\n"));
        assert!(text.contains("tests/math.rs:12: ERROR: CHECK( 3 == 4 ) is NOT correct!"));
        assert!(text.contains("  values: CHECK( 3 == 4 )"));
        assert!(text.contains("  logged: x = 3"));
    }

    #[test]
    fn scenario_header_omits_the_test_case_label() {
        let (mut r, out) = reporter(RunOptions::default());
        let mut scenario = case();
        scenario.name = "  Scenario: vectors can be sized".into();
        r.test_case_start(&scenario);
        r.subcase_start(&SubcaseSignature::new("   Given: an empty vector", "tests/math.rs", 11));
        let mut failed = failed_eq();
        failed.test_case = Some(Arc::new(scenario));
        r.log_assert(&failed);
        let text = out.contents();
        assert!(!text.contains("TEST CASE:"));
        assert!(text.contains("\n  Scenario: vectors can be sized\n"));
        assert!(text.contains("     Given: an empty vector\n"));
    }

    #[test]
    fn passing_asserts_are_quiet_by_default() {
        let (mut r, out) = reporter(RunOptions::default());
        r.test_case_start(&case());
        let mut ok = failed_eq();
        ok.failed = false;
        r.log_assert(&ok);
        assert!(out.contents().is_empty());
    }

    #[test]
    fn crash_is_reported_as_fatal() {
        let (mut r, out) = reporter(RunOptions::default());
        r.test_case_start(&case());
        r.test_case_exception(&TestCaseException {
            error_string: "SIGSEGV - Segmentation violation signal".into(),
            is_crash: true,
            contexts: vec![],
        });
        let text = out.contents();
        assert!(text.contains(
            "FATAL ERROR: test case CRASHED: SIGSEGV - Segmentation violation signal"
        ));
    }

    #[test]
    fn decorator_outcomes_are_explained() {
        let (mut r, out) = reporter(RunOptions::default());
        r.test_case_start(&case());
        r.test_case_end(&CurrentTestCaseStats {
            failure_flags: FailureFlags::SHOULD_HAVE_FAILED_BUT_DIDNT,
            ..Default::default()
        });
        assert!(out
            .contents()
            .contains("Should have failed but didn't! Marking it as failed!"));
    }

    #[test]
    fn summary_counts_line_up() {
        let (mut r, out) = reporter(RunOptions::default());
        r.test_run_end(&TestRunStats {
            num_test_cases: 4,
            num_test_cases_passing_filters: 3,
            num_test_suites_passing_filters: 0,
            num_test_cases_failed: 1,
            num_asserts: 9,
            num_asserts_failed: 2,
        });
        let text = out.contents();
        assert!(text.contains(
            "[casework] test cases:      3 |      2 passed |      1 failed |      1 skipped"
        ));
        assert!(text.contains("[casework] assertions:      9 |      7 passed |      2 failed |"));
        assert!(text.contains("[casework] Status: FAILURE!"));
    }
}
