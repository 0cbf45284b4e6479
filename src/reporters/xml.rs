//! XML report: one `TestSuite` element per run of consecutive test cases from
//! the same suite, with expressions, messages, and exceptions nested inside
//! their `TestCase`.

use super::{ReportSink, Reporter};
use crate::assertions::{AssertData, MessageData};
use crate::case::{SubcaseSignature, TestCaseData};
use crate::config::RunOptions;
use crate::stats::{
    CurrentTestCaseStats, QueryData, QueryMode, TestCaseException, TestRunStats,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;

// ============================================================================
// XML WRITER
// ============================================================================

/// Streaming XML builder over a `quick_xml::Writer`. A started element stays
/// pending until its first child, text, or end, so attributes can still be
/// added and a childless element collapses to `<Name/>`. Output accumulates
/// in memory until taken.
struct XmlWriter {
    writer: Writer<Vec<u8>>,
    pending: Option<BytesStart<'static>>,
    tags: Vec<&'static str>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            pending: None,
            tags: Vec::new(),
        }
    }
}

impl XmlWriter {
    fn event(&mut self, event: Event<'_>) {
        // Writes into a `Vec` cannot fail.
        let _ = self.writer.write_event(event);
    }

    fn declaration(&mut self) {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
    }

    /// Writes the pending element as an opening tag.
    fn ensure_tag_closed(&mut self) {
        if let Some(element) = self.pending.take() {
            self.event(Event::Start(element));
        }
    }

    fn start(&mut self, name: &'static str) -> &mut Self {
        self.ensure_tag_closed();
        self.pending = Some(BytesStart::new(name));
        self.tags.push(name);
        self
    }

    /// Empty values are omitted.
    fn attr(&mut self, name: &str, value: impl fmt::Display) -> &mut Self {
        let value = value.to_string();
        if let Some(element) = self.pending.as_mut().filter(|_| !value.is_empty()) {
            element.push_attribute((name, value.as_str()));
        }
        self
    }

    fn text(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.ensure_tag_closed();
            self.event(Event::Text(BytesText::new(text)));
        }
        self
    }

    fn end(&mut self) -> &mut Self {
        let Some(name) = self.tags.pop() else {
            return self;
        };
        match self.pending.take() {
            Some(element) => self.event(Event::Empty(element)),
            None => self.event(Event::End(BytesEnd::new(name))),
        }
        if self.tags.is_empty() {
            self.writer.get_mut().push(b'\n');
        }
        self
    }

    /// `<name>text</name>` as a single call.
    fn element_with_text(&mut self, name: &'static str, text: &str) -> &mut Self {
        self.start(name).text(text).end()
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(self.writer.get_mut())
    }
}

// ============================================================================
// REPORTER
// ============================================================================

pub struct XmlReporter {
    opts: RunOptions,
    sink: ReportSink,
    xml: XmlWriter,
    /// Suite of the `TestSuite` element currently open, if any.
    open_suite: Option<String>,
    current: Option<TestCaseData>,
}

impl XmlReporter {
    pub fn new(opts: RunOptions, sink: ReportSink) -> Self {
        Self {
            opts,
            sink,
            xml: XmlWriter::default(),
            open_suite: None,
            current: None,
        }
    }

    fn drain(&mut self) {
        let bytes = self.xml.take();
        if !bytes.is_empty() {
            self.sink.write_with(|w| w.write_all(&bytes));
        }
    }

    fn open_root(&mut self) {
        self.xml.declaration();
        let binary = self.opts.display_file(&self.opts.binary_name).to_string();
        self.xml
            .start("casework")
            .attr("binary", binary)
            .attr("version", env!("CARGO_PKG_VERSION"));
    }

    fn test_case_element(&mut self, case: &TestCaseData) {
        if self.open_suite.as_deref() != Some(case.suite.as_str()) {
            if self.open_suite.is_some() {
                self.xml.end();
            }
            self.xml.start("TestSuite").attr("name", &case.suite);
            self.open_suite = Some(case.suite.clone());
        }
        let file = self.opts.display_file(&case.file).to_string();
        let line = self.opts.display_line(case.line);
        self.xml
            .start("TestCase")
            .attr("name", &case.name)
            .attr("filename", file)
            .attr("line", line)
            .attr("description", case.description());
        let decorators = &case.decorators;
        if decorators.timeout != 0.0 {
            self.xml.attr("timeout", decorators.timeout);
        }
        if decorators.may_fail {
            self.xml.attr("may_fail", true);
        }
        if decorators.should_fail {
            self.xml.attr("should_fail", true);
        }
    }

    fn contexts(&mut self, contexts: &[String]) {
        if contexts.is_empty() {
            return;
        }
        self.xml.start("Info");
        for text in contexts {
            self.xml.element_with_text("Text", text);
        }
        self.xml.end();
    }
}

impl Reporter for XmlReporter {
    fn report_query(&mut self, query: &QueryData) {
        self.open_root();
        let stats = query.run_stats.clone().unwrap_or_default();
        match query.mode {
            QueryMode::Version | QueryMode::NoRun => {}
            QueryMode::ListReporters => {
                for info in &query.reporters {
                    let tag = if info.is_listener { "Listener" } else { "Reporter" };
                    self.xml
                        .start(tag)
                        .attr("priority", info.priority)
                        .attr("name", &info.name)
                        .end();
                }
            }
            QueryMode::Count | QueryMode::ListTestCases => {
                for case in &query.data {
                    let file = self.opts.display_file(&case.file).to_string();
                    let line = self.opts.display_line(case.line);
                    self.xml
                        .start("TestCase")
                        .attr("name", &case.name)
                        .attr("testsuite", &case.suite)
                        .attr("filename", file)
                        .attr("line", line)
                        .attr("skipped", case.decorators.skip)
                        .end();
                }
                self.xml
                    .start("OverallResultsTestCases")
                    .attr("unskipped", stats.num_test_cases_passing_filters)
                    .end();
            }
            QueryMode::ListTestSuites => {
                for case in &query.data {
                    self.xml.start("TestSuite").attr("name", &case.suite).end();
                }
                self.xml
                    .start("OverallResultsTestCases")
                    .attr("unskipped", stats.num_test_cases_passing_filters)
                    .end();
                self.xml
                    .start("OverallResultsTestSuites")
                    .attr("unskipped", stats.num_test_suites_passing_filters)
                    .end();
            }
        }
        self.xml.end();
        self.drain();
        self.sink.flush();
    }

    fn test_run_start(&mut self) {
        self.open_root();
        let opts = &self.opts;
        self.xml
            .start("Options")
            .attr("order_by", opts.order_by)
            .attr("rand_seed", opts.rand_seed)
            .attr("first", opts.first)
            .attr("last", opts.last)
            .attr("abort_after", opts.abort_after)
            .attr("subcase_filter_levels", opts.subcase_filter_levels)
            .attr("case_sensitive", opts.case_sensitive)
            .attr("no_skip", opts.no_skip)
            .attr("no_throw", opts.no_throw)
            .end();
        self.drain();
    }

    fn test_run_end(&mut self, stats: &TestRunStats) {
        if self.open_suite.take().is_some() {
            self.xml.end();
        }
        self.xml
            .start("OverallResultsAsserts")
            .attr("successes", stats.num_asserts_passed())
            .attr("failures", stats.num_asserts_failed)
            .end();
        self.xml
            .start("OverallResultsTestCases")
            .attr("successes", stats.num_test_cases_passed())
            .attr("failures", stats.num_test_cases_failed);
        if !self.opts.no_skipped_summary {
            self.xml.attr("skipped", stats.num_test_cases_skipped());
        }
        self.xml.end();
        self.xml.end();
        self.drain();
        self.sink.flush();
    }

    fn test_case_start(&mut self, case: &TestCaseData) {
        self.test_case_element(case);
        self.current = Some(case.clone());
        self.drain();
    }

    fn test_case_end(&mut self, stats: &CurrentTestCaseStats) {
        let expected_failures = self
            .current
            .take()
            .map(|case| case.decorators.expected_failures)
            .unwrap_or_default();
        self.xml
            .start("OverallResultsAsserts")
            .attr("successes", stats.num_asserts.saturating_sub(stats.num_asserts_failed))
            .attr("failures", stats.num_asserts_failed)
            .attr("test_case_success", !stats.failure_flags.is_failure());
        if self.opts.duration {
            self.xml.attr("duration", stats.seconds);
        }
        if expected_failures > 0 {
            self.xml.attr("expected_failures", expected_failures);
        }
        self.xml.end();
        self.xml.end();
        self.drain();
    }

    fn test_case_exception(&mut self, exception: &TestCaseException) {
        self.xml
            .start("Exception")
            .attr("crash", exception.is_crash)
            .text(&exception.error_string)
            .end();
        self.drain();
    }

    fn subcase_start(&mut self, signature: &SubcaseSignature) {
        let file = self.opts.display_file(&signature.file).to_string();
        let line = self.opts.display_line(signature.line);
        self.xml
            .start("SubCase")
            .attr("name", &signature.name)
            .attr("filename", file)
            .attr("line", line);
        self.xml.ensure_tag_closed();
        self.drain();
    }

    fn subcase_end(&mut self) {
        self.xml.end();
        self.drain();
    }

    fn log_assert(&mut self, rb: &AssertData) {
        if !rb.failed && !self.opts.success {
            return;
        }
        let file = self.opts.display_file(&rb.file).to_string();
        let line = self.opts.display_line(rb.line);
        self.xml
            .start("Expression")
            .attr("success", !rb.failed)
            .attr("type", rb.at)
            .attr("filename", file)
            .attr("line", line);
        self.xml.element_with_text("Original", &rb.expr);
        if rb.threw {
            self.xml.element_with_text("Exception", &rb.exception);
        }
        if rb.at.kind.expects_type() {
            self.xml
                .element_with_text("ExpectedException", &rb.exception_type);
        }
        if rb.at.kind.expects_message() {
            self.xml
                .element_with_text("ExpectedExceptionString", &rb.exception_string);
        }
        if rb.at.kind.is_value_check() && !rb.threw {
            self.xml.element_with_text("Expanded", &rb.decomp);
        }
        self.contexts(&rb.contexts);
        self.xml.end();
        self.drain();
    }

    fn log_message(&mut self, message: &MessageData) {
        let file = self.opts.display_file(&message.file).to_string();
        let line = self.opts.display_line(message.line);
        self.xml
            .start("Message")
            .attr("type", message.severity.failure_label())
            .attr("filename", file)
            .attr("line", line);
        self.xml.element_with_text("Text", &message.text);
        self.contexts(&message.contexts);
        self.xml.end();
        self.drain();
    }

    fn test_case_skipped(&mut self, case: &TestCaseData) {
        if self.opts.no_skipped_summary {
            return;
        }
        self.test_case_element(case);
        self.xml.attr("skipped", "true");
        self.xml.end();
        self.drain();
    }
}
