//! Line-delimited JSON events, one object per reporter callback.

use super::{ReportSink, Reporter};
use crate::assertions::{AssertData, MessageData};
use crate::case::{SubcaseSignature, TestCaseData};
use crate::config::RunOptions;
use crate::stats::{CurrentTestCaseStats, QueryData, TestCaseException, TestRunStats};
use serde::Serialize;

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Query(&'a QueryData),
    TestRunStart { binary: &'a str, version: &'a str },
    TestRunEnd(&'a TestRunStats),
    TestCaseStart(&'a TestCaseData),
    TestCaseReenter(&'a TestCaseData),
    TestCaseEnd(&'a CurrentTestCaseStats),
    TestCaseException(&'a TestCaseException),
    SubcaseStart(&'a SubcaseSignature),
    SubcaseEnd,
    Assert(&'a AssertData),
    Message(&'a MessageData),
    TestCaseSkipped(&'a TestCaseData),
}

pub struct JsonReporter {
    opts: RunOptions,
    sink: ReportSink,
}

impl JsonReporter {
    pub fn new(opts: RunOptions, sink: ReportSink) -> Self {
        Self { opts, sink }
    }

    fn emit(&self, event: &Event<'_>) {
        self.sink.write_with(|w| {
            serde_json::to_writer(&mut *w, event)?;
            writeln!(w)
        });
    }
}

impl Reporter for JsonReporter {
    fn report_query(&mut self, query: &QueryData) {
        self.emit(&Event::Query(query));
        self.sink.flush();
    }

    fn test_run_start(&mut self) {
        self.emit(&Event::TestRunStart {
            binary: &self.opts.binary_name,
            version: env!("CARGO_PKG_VERSION"),
        });
    }

    fn test_run_end(&mut self, stats: &TestRunStats) {
        self.emit(&Event::TestRunEnd(stats));
        self.sink.flush();
    }

    fn test_case_start(&mut self, case: &TestCaseData) {
        self.emit(&Event::TestCaseStart(case));
    }

    fn test_case_reenter(&mut self, case: &TestCaseData) {
        self.emit(&Event::TestCaseReenter(case));
    }

    fn test_case_end(&mut self, stats: &CurrentTestCaseStats) {
        self.emit(&Event::TestCaseEnd(stats));
    }

    fn test_case_exception(&mut self, exception: &TestCaseException) {
        self.emit(&Event::TestCaseException(exception));
    }

    fn subcase_start(&mut self, signature: &SubcaseSignature) {
        self.emit(&Event::SubcaseStart(signature));
    }

    fn subcase_end(&mut self) {
        self.emit(&Event::SubcaseEnd);
    }

    fn log_assert(&mut self, assert: &AssertData) {
        if assert.failed || self.opts.success {
            self.emit(&Event::Assert(assert));
        }
    }

    fn log_message(&mut self, message: &MessageData) {
        self.emit(&Event::Message(message));
    }

    fn test_case_skipped(&mut self, case: &TestCaseData) {
        self.emit(&Event::TestCaseSkipped(case));
    }
}
