//! Shared fixtures for the integration tests: a reporter that records every
//! event as a short line of text, and helpers to run a registry with it.

#![allow(dead_code)]

use casework::{
    AssertData, CurrentTestCaseStats, MessageData, QueryData, Registry, ReportSink, Reporter,
    ReporterRegistry, RunOptions, RunSummary, Runner, SubcaseSignature, TestCaseData,
    TestCaseException, TestRunStats,
};
use std::sync::{Arc, Mutex};

/// Records reporter events in delivery order.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Events starting with `prefix`.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.starts_with(prefix))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

fn flags(stats: &CurrentTestCaseStats) -> String {
    stats.failure_flags.names().collect::<Vec<_>>().join("|")
}

impl Reporter for Recorder {
    fn report_query(&mut self, query: &QueryData) {
        let names: Vec<&str> = query.data.iter().map(|case| case.name.as_str()).collect();
        self.push(format!("query {:?} [{}]", query.mode, names.join(",")));
    }

    fn test_run_start(&mut self) {
        self.push("run start".to_string());
    }

    fn test_run_end(&mut self, stats: &TestRunStats) {
        self.push(format!(
            "run end cases={} failed={} asserts={}/{}",
            stats.num_test_cases_passing_filters,
            stats.num_test_cases_failed,
            stats.num_asserts_failed,
            stats.num_asserts
        ));
    }

    fn test_case_start(&mut self, case: &TestCaseData) {
        self.push(format!("case start {}", case.name));
    }

    fn test_case_reenter(&mut self, case: &TestCaseData) {
        self.push(format!("case reenter {}", case.name));
    }

    fn test_case_end(&mut self, stats: &CurrentTestCaseStats) {
        self.push(format!("case end [{}]", flags(stats)));
    }

    fn test_case_exception(&mut self, exception: &TestCaseException) {
        self.push(format!(
            "exception {} crash={} contexts={:?}",
            exception.error_string, exception.is_crash, exception.contexts
        ));
    }

    fn subcase_start(&mut self, signature: &SubcaseSignature) {
        self.push(format!("subcase start {}", signature.name));
    }

    fn subcase_end(&mut self) {
        self.push("subcase end".to_string());
    }

    fn log_assert(&mut self, assert: &AssertData) {
        self.push(format!(
            "assert {} failed={} decomp={} exception={} contexts={:?}",
            assert.at, assert.failed, assert.decomp, assert.exception, assert.contexts
        ));
    }

    fn log_message(&mut self, message: &MessageData) {
        self.push(format!("message {:?} {}", message.severity, message.text));
    }

    fn test_case_skipped(&mut self, case: &TestCaseData) {
        self.push(format!("skipped {}", case.name));
    }
}

/// Runs `registry` with only a [`Recorder`] attached.
pub fn record(registry: &Registry, options: RunOptions) -> (RunSummary, Recorder) {
    let recorder = Recorder::default();
    let (sink, _) = ReportSink::buffer();
    let summary = Runner::new(registry)
        .with_options(options)
        .with_reporter_registry(ReporterRegistry::empty())
        .with_reporter(recorder.clone())
        .with_output(sink)
        .run()
        .unwrap();
    (summary, recorder)
}

/// Runs `registry` through the built-in reporters and returns their output.
pub fn render(registry: &Registry, options: RunOptions) -> (RunSummary, String) {
    let (sink, output) = ReportSink::buffer();
    let summary = Runner::new(registry)
        .with_options(options)
        .with_output(sink)
        .run()
        .unwrap();
    (summary, output.contents())
}
