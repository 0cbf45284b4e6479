//! The run driver.
//!
//! Collects the registered cases in the requested order, applies skip,
//! filter, and range selection, and drives each selected case through as many
//! invocations as its subcase tree needs. Panics are classified here:
//! a [`TestFailure`](crate::exception::TestFailure) unwind is an aborted
//! invocation, anything else is an exception of the test case.

use crate::case::{TestCase, TestCaseData};
use crate::config::RunOptions;
use crate::context::TestContext;
use crate::errors::Result;
use crate::exception::{self, translator_for, Translators};
use crate::fatal::FatalGuard;
use crate::filter::FilterKind;
use crate::registry::Registry;
use crate::reporters::{ReportSink, Reporter, ReporterRegistry, ReporterSet};
use crate::stats::{FailureFlags, QueryData, QueryMode, ReporterInfo, TestRunStats};
use std::any::Any;
use std::collections::HashSet;

/// Totals and process exit code of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: TestRunStats,
    pub exit_code: i32,
}

/// Configures and executes one run over a [`Registry`].
pub struct Runner<'r> {
    registry: &'r Registry,
    options: RunOptions,
    factories: ReporterRegistry,
    attached: Vec<Box<dyn Reporter>>,
    translators: Translators,
    sink: Option<ReportSink>,
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            options: RunOptions::default(),
            factories: ReporterRegistry::default(),
            attached: Vec::new(),
            translators: Translators::new(),
            sink: None,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the named reporter and listener factories.
    pub fn with_reporter_registry(mut self, factories: ReporterRegistry) -> Self {
        self.factories = factories;
        self
    }

    /// Attaches a ready-made reporter. It receives every event, after the
    /// listeners and selected reporters.
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.attached.push(Box::new(reporter));
        self
    }

    /// Teaches the run how to describe panics carrying a `T` payload.
    pub fn with_translator<T, F>(mut self, convert: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.translators.register(translator_for(convert));
        self
    }

    /// Sends reporter output to `sink` instead of stdout or `out`.
    pub fn with_output(mut self, sink: ReportSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn run(self) -> Result<RunSummary> {
        let Runner {
            registry,
            options,
            factories,
            attached,
            translators,
            sink,
        } = self;

        if attached.is_empty() && !factories.selects_any(&options) {
            return Err(factories.nothing_selected(&options));
        }
        let sink = match sink {
            Some(sink) => sink,
            None => ReportSink::for_options(&options)?,
        };

        let mut reporters = factories.instantiate(&options, &sink);
        let mut extra = ReporterSet::new();
        for reporter in attached {
            extra.push(reporter);
        }
        reporters.extend(extra);

        exception::install_quiet_hook();
        let ctx = TestContext::new(options, reporters, translators);
        let summary = drive(registry, &ctx, factories.infos());
        sink.flush();
        Ok(summary)
    }
}

/// Skip and filter gates first; only cases passing both advance `passing`,
/// which the `first`/`last` range is checked against.
pub(crate) fn selection_gate(data: &TestCaseData, opts: &RunOptions, passing: &mut u32) -> bool {
    let filters = &opts.filters;
    let cs = opts.case_sensitive;
    let filtered_out = !filters.admits(
        FilterKind::SourceFile,
        FilterKind::SourceFileExclude,
        &data.file,
        cs,
    ) || !filters.admits(FilterKind::TestSuite, FilterKind::TestSuiteExclude, &data.suite, cs)
        || !filters.admits(FilterKind::TestCase, FilterKind::TestCaseExclude, &data.name, cs);
    if (data.decorators.skip && !opts.no_skip) || filtered_out {
        return false;
    }

    *passing += 1;
    let (first, last) = (opts.first, opts.last);
    !((last < *passing && first <= last) || first > *passing)
}

fn query_mode(opts: &RunOptions) -> Option<QueryMode> {
    if opts.count {
        Some(QueryMode::Count)
    } else if opts.list_test_cases {
        Some(QueryMode::ListTestCases)
    } else if opts.list_test_suites {
        Some(QueryMode::ListTestSuites)
    } else {
        None
    }
}

fn early_exit_mode(opts: &RunOptions) -> Option<QueryMode> {
    if opts.version {
        Some(QueryMode::Version)
    } else if opts.list_reporters {
        Some(QueryMode::ListReporters)
    } else if opts.no_run {
        Some(QueryMode::NoRun)
    } else {
        None
    }
}

fn drive(registry: &Registry, ctx: &TestContext, infos: Vec<ReporterInfo>) -> RunSummary {
    let opts = ctx.options();

    if let Some(mode) = early_exit_mode(opts) {
        let query = QueryData {
            mode,
            run_stats: None,
            data: Vec::new(),
            reporters: if mode == QueryMode::ListReporters {
                infos
            } else {
                Vec::new()
            },
        };
        ctx.report(|r| r.report_query(&query));
        return RunSummary {
            stats: TestRunStats::default(),
            exit_code: 0,
        };
    }

    let query = query_mode(opts);
    let cases = registry.ordered(opts.order_by, opts.rand_seed);
    let total = u32::try_from(cases.len()).unwrap_or(u32::MAX);
    ctx.update_totals(|totals| totals.num_test_cases = total);
    if query.is_none() {
        ctx.report(|r| r.test_run_start());
    }

    let mut passing = 0u32;
    let mut listed: Vec<TestCaseData> = Vec::new();
    let mut suites: HashSet<&str> = HashSet::new();

    for case in cases {
        let data = case.data();
        let selected = selection_gate(data, opts, &mut passing);
        ctx.update_totals(|totals| totals.num_test_cases_passing_filters = passing);
        if !selected {
            if query.is_none() {
                ctx.report(|r| r.test_case_skipped(data));
            }
            continue;
        }

        match query {
            Some(QueryMode::ListTestCases) => listed.push(data.clone()),
            Some(QueryMode::ListTestSuites) => {
                if !data.suite.is_empty() && suites.insert(&data.suite) {
                    listed.push(data.clone());
                    ctx.update_totals(|totals| totals.num_test_suites_passing_filters += 1);
                }
            }
            Some(_) => {}
            None => {
                run_test_case(ctx, case);
                if opts.abort_after > 0 && ctx.stats().num_asserts_failed >= opts.abort_after {
                    break;
                }
            }
        }
    }

    let stats = ctx.stats();
    match query {
        Some(mode) => {
            let answer = QueryData {
                mode,
                run_stats: Some(stats.clone()),
                data: listed,
                reporters: Vec::new(),
            };
            ctx.report(|r| r.report_query(&answer));
        }
        None => ctx.report(|r| r.test_run_end(&stats)),
    }

    let exit_code = if stats.num_test_cases_failed > 0 && !opts.no_exitcode {
        1
    } else {
        0
    };
    RunSummary { stats, exit_code }
}

fn run_test_case(ctx: &TestContext, case: &TestCase) {
    let data = ctx.begin_test(case);
    ctx.report(|r| r.test_case_start(&data));

    loop {
        ctx.begin_invocation();
        let outcome = {
            let _guard = FatalGuard::install(ctx);
            exception::run_body(|| case.invoke(ctx))
        };

        if let Err(payload) = outcome {
            if exception::is_test_failure(&*payload) {
                ctx.flag(FailureFlags::ASSERT_FAILURE);
            } else {
                let event = ctx.exception_event(&*payload);
                ctx.report(|r| r.test_case_exception(&event));
                ctx.flag(FailureFlags::EXCEPTION);
            }
        }

        let mut keep_going = true;
        if ctx.abort_threshold_reached() {
            keep_going = false;
            ctx.flag(FailureFlags::TOO_MANY_FAILED_ASSERTS);
        }
        if !(keep_going && ctx.should_reenter()) {
            break;
        }
        ctx.report(|r| r.test_case_reenter(&data));
    }

    let stats = ctx.finalize_test();
    ctx.report(|r| r.test_case_end(&stats));
    ctx.end_test();
}
