//! The execution context handed to every test body.
//!
//! `TestContext` owns the run options, the attached reporters, and all run
//! state: totals, the current test case, its failure flags, the subcase
//! tracker, and the active info scopes. Test bodies receive `&TestContext`
//! and every assertion, message, and subcase goes through it.
//!
//! Assertion counters for the running test are atomics so bodies that spawn
//! scoped threads can assert from them; they are folded into the run totals
//! when the test case is finalized. Info scopes belong to the thread that
//! opened them and only decorate that thread's assertions. Reporter delivery
//! is serialized by one mutex.

use crate::assertions::{AssertData, AssertType, Assertion, MessageData, Severity};
use crate::case::{SubcaseSignature, TestCase, TestCaseData};
use crate::config::RunOptions;
use crate::exception::{self, Translators};
use crate::filter::FilterKind;
use crate::reporters::{Reporter, ReporterSet};
use crate::stats::{CurrentTestCaseStats, FailureFlags, TestCaseException, TestRunStats};
use crate::subcase::{Entry, Subcase, SubcaseTracker};
use std::any::Any;
use std::panic::Location;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, ThreadId};
use std::time::Instant;

const SUBCASE_EXCEPTION_NOTE: &str = "exception thrown in subcase - will translate later when \
the whole test case has been exited (cannot translate while there is an active exception)";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Non-blocking lock for the fatal signal path.
fn try_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

// ============================================================================
// RUN STATE
// ============================================================================

#[derive(Default)]
struct RunState {
    totals: TestRunStats,
    current_test: Option<Arc<TestCaseData>>,
    current: CurrentTestCaseStats,
    started: Option<Instant>,
    subcases: SubcaseTracker,
    should_log_current_exception: bool,
    /// Set while unwinding out of a body after a failed fatal assertion.
    aborting: bool,
    /// Open info scopes of every thread, tagged with their owner.
    infos: Vec<(ThreadId, u64, String)>,
    /// Info texts captured while a panic unwound through their scopes.
    stringified_infos: Vec<String>,
}

// ============================================================================
// TEST CONTEXT
// ============================================================================

pub struct TestContext {
    options: RunOptions,
    reporters: Mutex<ReporterSet>,
    translators: Translators,
    asserts_current: AtomicU32,
    asserts_failed_current: AtomicU32,
    next_info_id: AtomicU64,
    state: Mutex<RunState>,
}

impl TestContext {
    pub fn new(options: RunOptions, reporters: ReporterSet, translators: Translators) -> Self {
        Self {
            options,
            reporters: Mutex::new(reporters),
            translators,
            asserts_current: AtomicU32::new(0),
            asserts_failed_current: AtomicU32::new(0),
            next_info_id: AtomicU64::new(0),
            state: Mutex::new(RunState::default()),
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Whether passing assertions are reported too.
    pub fn logs_successes(&self) -> bool {
        self.options.success
    }

    pub fn current_test(&self) -> Option<Arc<TestCaseData>> {
        lock(&self.state).current_test.clone()
    }

    /// Snapshot of the run totals so far.
    pub fn stats(&self) -> TestRunStats {
        lock(&self.state).totals.clone()
    }

    pub fn translate(&self, payload: &(dyn Any + Send)) -> String {
        self.translators.translate(payload)
    }

    /// Delivers one event to every attached reporter, listeners first.
    pub(crate) fn report(&self, mut event: impl FnMut(&mut dyn Reporter)) {
        lock(&self.reporters).for_each(&mut event);
    }

    fn try_report(&self, mut event: impl FnMut(&mut dyn Reporter)) {
        if let Some(mut reporters) = try_lock(&self.reporters) {
            reporters.for_each(&mut event);
        }
    }

    // ------------------------------------------------------------------------
    // Subcases
    // ------------------------------------------------------------------------

    /// Opens a subcase of the running test. Returns `None` when this
    /// invocation must not run it; the body of the subcase should then be
    /// skipped.
    #[track_caller]
    pub fn subcase(&self, name: impl Into<String>) -> Option<Subcase<'_>> {
        let location = Location::caller();
        let signature = SubcaseSignature::new(name, location.file(), location.line());
        let levels = usize::try_from(self.options.subcase_filter_levels).unwrap_or(usize::MAX);
        let filters = &self.options.filters;
        let case_sensitive = self.options.case_sensitive;

        let entry = lock(&self.state).subcases.enter(&signature, levels, |name| {
            filters.admits(
                FilterKind::Subcase,
                FilterKind::SubcaseExclude,
                name,
                case_sensitive,
            )
        });
        if entry != Entry::Entered {
            return None;
        }
        self.report(|r| r.subcase_start(&signature));
        Some(Subcase::new(self, signature))
    }

    pub(crate) fn leave_subcase(&self, unwinding: bool) {
        let log_exception = {
            let mut state = lock(&self.state);
            state.subcases.leave();
            if unwinding && !state.aborting && state.should_log_current_exception {
                state.should_log_current_exception = false;
                true
            } else {
                false
            }
        };
        if log_exception {
            let exception = TestCaseException {
                error_string: SUBCASE_EXCEPTION_NOTE.to_string(),
                is_crash: false,
                contexts: Vec::new(),
            };
            self.report(|r| r.test_case_exception(&exception));
        }
        self.report(|r| r.subcase_end());
    }

    // ------------------------------------------------------------------------
    // Info scopes
    // ------------------------------------------------------------------------

    /// Attaches `text` to every assertion and message logged by the calling
    /// thread while the returned scope is alive.
    pub fn info(&self, text: impl Into<String>) -> InfoScope<'_> {
        let id = self.next_info_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.state)
            .infos
            .push((thread::current().id(), id, text.into()));
        InfoScope { ctx: self, id }
    }

    /// Open info texts of the calling thread, outermost first.
    pub(crate) fn active_contexts(&self) -> Vec<String> {
        contexts_of(&lock(&self.state).infos, thread::current().id())
    }

    fn close_info(&self, id: u64, unwinding: bool) {
        let mut state = lock(&self.state);
        if let Some(pos) = state.infos.iter().position(|(_, info_id, _)| *info_id == id) {
            let (_, _, text) = state.infos.remove(pos);
            if unwinding {
                state.stringified_infos.push(text);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Assertions and messages
    // ------------------------------------------------------------------------

    /// Starts an assertion located at the caller. The assertion macros are
    /// built on this.
    #[track_caller]
    pub fn assertion(&self, at: AssertType, expr: &str) -> Assertion<'_> {
        let location = Location::caller();
        Assertion::new(self, at, expr, location.file(), location.line())
    }

    /// Logs a free-form message. Non-warning messages count as failed
    /// assertions; `Require` ones also abort the invocation.
    #[track_caller]
    pub fn message(&self, severity: Severity, text: impl Into<String>) {
        let location = Location::caller();
        let data = MessageData {
            text: text.into(),
            file: location.file().to_string(),
            line: location.line(),
            severity,
            contexts: self.active_contexts(),
        };
        self.report(|r| r.log_message(&data));
        if severity.is_counted() {
            self.asserts_current.fetch_add(1, Ordering::SeqCst);
            self.asserts_failed_current.fetch_add(1, Ordering::SeqCst);
        }
        if severity == Severity::Require {
            self.abort_invocation();
        }
    }

    pub(crate) fn record_assert(&self, data: &AssertData) {
        if data.at.severity.is_counted() {
            self.asserts_current.fetch_add(1, Ordering::SeqCst);
        }
        self.report(|r| r.log_assert(data));
        if data.failed && data.at.severity.is_counted() {
            self.asserts_failed_current.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Total failed assertions including the running test case.
    fn failed_asserts_so_far(&self) -> u32 {
        let settled = lock(&self.state).totals.num_asserts_failed;
        settled + self.asserts_failed_current.load(Ordering::SeqCst)
    }

    pub(crate) fn abort_threshold_reached(&self) -> bool {
        self.options.abort_after > 0 && self.failed_asserts_so_far() >= self.options.abort_after
    }

    /// A failed assertion of this severity ends the current invocation.
    pub(crate) fn should_abort(&self, severity: Severity) -> bool {
        match severity {
            Severity::Require => true,
            Severity::Check => self.abort_threshold_reached(),
            Severity::Warn => false,
        }
    }

    pub(crate) fn abort_invocation(&self) -> ! {
        lock(&self.state).aborting = true;
        exception::abort_invocation()
    }

    // ------------------------------------------------------------------------
    // Test case lifecycle (driven by the runner)
    // ------------------------------------------------------------------------

    pub(crate) fn update_totals<R>(&self, f: impl FnOnce(&mut TestRunStats) -> R) -> R {
        f(&mut lock(&self.state).totals)
    }

    pub(crate) fn begin_test(&self, case: &TestCase) -> Arc<TestCaseData> {
        let data = Arc::new(case.data().clone());
        let mut state = lock(&self.state);
        state.current_test = Some(Arc::clone(&data));
        state.current = CurrentTestCaseStats::default();
        state.subcases.reset_for_test();
        state.started = Some(Instant::now());
        self.asserts_current.store(0, Ordering::SeqCst);
        self.asserts_failed_current.store(0, Ordering::SeqCst);
        data
    }

    pub(crate) fn begin_invocation(&self) {
        let mut state = lock(&self.state);
        state.subcases.reset_for_invocation();
        state.should_log_current_exception = true;
        state.aborting = false;
        state.stringified_infos.clear();
    }

    pub(crate) fn should_reenter(&self) -> bool {
        lock(&self.state).subcases.should_reenter()
    }

    pub(crate) fn flag(&self, flags: FailureFlags) {
        lock(&self.state).current.failure_flags |= flags;
    }

    /// Exception event for a panic that escaped the body.
    pub(crate) fn exception_event(&self, payload: &(dyn Any + Send)) -> TestCaseException {
        let mut contexts = std::mem::take(&mut lock(&self.state).stringified_infos);
        // Scopes close innermost first; report outermost first.
        contexts.reverse();
        TestCaseException {
            error_string: self.translate(payload),
            is_crash: false,
            contexts,
        }
    }

    /// Folds the running test into the totals and classifies its outcome.
    pub(crate) fn finalize_test(&self) -> CurrentTestCaseStats {
        let mut state = lock(&self.state);
        self.finalize_locked(&mut state)
    }

    fn finalize_locked(&self, state: &mut RunState) -> CurrentTestCaseStats {
        let asserts = self.asserts_current.load(Ordering::SeqCst);
        let failed = self.asserts_failed_current.load(Ordering::SeqCst);
        let seconds = state
            .started
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or_default();

        state.totals.num_asserts += asserts;
        state.totals.num_asserts_failed += failed;
        state.current.num_asserts = asserts;
        state.current.num_asserts_failed = failed;
        state.current.seconds = seconds;

        let decorators = state
            .current_test
            .as_ref()
            .map(|case| case.decorators.clone())
            .unwrap_or_default();
        let flags = &mut state.current.failure_flags;

        if failed > 0 {
            *flags |= FailureFlags::ASSERT_FAILURE;
        }
        if decorators.timeout > 0.0 && seconds > decorators.timeout {
            *flags |= FailureFlags::TIMEOUT;
        }

        if decorators.should_fail {
            if flags.is_empty() {
                *flags |= FailureFlags::SHOULD_HAVE_FAILED_BUT_DIDNT;
            } else {
                *flags |= FailureFlags::SHOULD_HAVE_FAILED_AND_DID;
            }
        } else if !flags.is_empty() && decorators.may_fail {
            *flags |= FailureFlags::COULD_HAVE_FAILED_AND_DID;
        } else if decorators.expected_failures > 0 {
            if failed == decorators.expected_failures {
                *flags |= FailureFlags::FAILED_EXACTLY_NUM_TIMES;
            } else {
                *flags |= FailureFlags::DIDNT_FAIL_EXACTLY_NUM_TIMES;
            }
        }

        if flags.is_failure() {
            state.totals.num_test_cases_failed += 1;
        }
        state.current.clone()
    }

    pub(crate) fn end_test(&self) {
        lock(&self.state).current_test = None;
    }

    // ------------------------------------------------------------------------
    // Fatal conditions
    // ------------------------------------------------------------------------

    /// Reports a crash of the running test and closes the run, so reporters
    /// produce complete output before the process dies. Runs inside a signal
    /// handler, so it never blocks on a lock.
    pub(crate) fn report_fatal(&self, message: &str) {
        let Some(mut state) = try_lock(&self.state) else {
            return;
        };
        state.current.failure_flags |= FailureFlags::CRASH;
        let exception = TestCaseException {
            error_string: message.to_string(),
            is_crash: true,
            contexts: contexts_of(&state.infos, thread::current().id()),
        };
        let mut open_subcases = 0;
        while state.subcases.unwind_one().is_some() {
            open_subcases += 1;
        }
        let stats = self.finalize_locked(&mut state);
        let totals = state.totals.clone();
        state.current_test = None;
        drop(state);

        self.try_report(|r| r.test_case_exception(&exception));
        for _ in 0..open_subcases {
            self.try_report(|r| r.subcase_end());
        }
        self.try_report(|r| r.test_case_end(&stats));
        self.try_report(|r| r.test_run_end(&totals));
    }
}

// ============================================================================
// INFO SCOPE
// ============================================================================

fn contexts_of(infos: &[(ThreadId, u64, String)], owner: ThreadId) -> Vec<String> {
    infos
        .iter()
        .filter(|(thread, _, _)| *thread == owner)
        .map(|(_, _, text)| text.clone())
        .collect()
}

/// Keeps an info message attached while alive. See [`TestContext::info`].
#[must_use = "the message is detached as soon as the scope is dropped"]
pub struct InfoScope<'a> {
    ctx: &'a TestContext,
    id: u64,
}

impl Drop for InfoScope<'_> {
    fn drop(&mut self) {
        self.ctx.close_info(self.id, std::thread::panicking());
    }
}
