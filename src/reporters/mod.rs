//! The reporter protocol.
//!
//! A run produces a fixed sequence of events:
//!
//! - query runs: a single `report_query`
//! - full runs: `test_run_start`, then per selected test `test_case_start`,
//!   any number of subcase, assertion, message, and reenter events,
//!   an optional `test_case_exception`, and `test_case_end`; skipped tests
//!   get `test_case_skipped`; finally `test_run_end`
//!
//! Reporters are created from named factories. Listeners receive every event
//! regardless of selection; reporters are chosen by the `reporters` filter
//! (`console` when none is given). Listeners always come first.

pub mod console;
pub mod json;
pub mod xml;

use crate::assertions::{AssertData, MessageData};
use crate::case::{SubcaseSignature, TestCaseData};
use crate::config::RunOptions;
use crate::errors::{CaseworkError, Result};
use crate::filter::{matches_any, FilterKind};
use crate::stats::{
    CurrentTestCaseStats, QueryData, ReporterInfo, TestCaseException, TestRunStats,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use xml::XmlReporter;

// ============================================================================
// REPORTER TRAIT
// ============================================================================

/// Receives run events. Every callback defaults to doing nothing.
pub trait Reporter: Send {
    fn report_query(&mut self, _query: &QueryData) {}
    fn test_run_start(&mut self) {}
    fn test_run_end(&mut self, _stats: &TestRunStats) {}
    fn test_case_start(&mut self, _case: &TestCaseData) {}
    fn test_case_reenter(&mut self, _case: &TestCaseData) {}
    fn test_case_end(&mut self, _stats: &CurrentTestCaseStats) {}
    fn test_case_exception(&mut self, _exception: &TestCaseException) {}
    fn subcase_start(&mut self, _signature: &SubcaseSignature) {}
    fn subcase_end(&mut self) {}
    fn log_assert(&mut self, _assert: &AssertData) {}
    fn log_message(&mut self, _message: &MessageData) {}
    fn test_case_skipped(&mut self, _case: &TestCaseData) {}
}

/// Attached reporters in delivery order.
#[derive(Default)]
pub struct ReporterSet {
    entries: Vec<Box<dyn Reporter>>,
}

impl ReporterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.entries.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `other`, keeping its order.
    pub fn extend(&mut self, other: ReporterSet) {
        self.entries.extend(other.entries);
    }

    pub fn for_each(&mut self, mut event: impl FnMut(&mut dyn Reporter)) {
        for reporter in &mut self.entries {
            event(reporter.as_mut());
        }
    }
}

// ============================================================================
// FACTORIES
// ============================================================================

pub type ReporterFactory = Arc<dyn Fn(&RunOptions, &ReportSink) -> Box<dyn Reporter> + Send + Sync>;

/// Named reporter and listener factories, ordered by (priority, name).
#[derive(Clone)]
pub struct ReporterRegistry {
    reporters: BTreeMap<(i32, String), ReporterFactory>,
    listeners: BTreeMap<(i32, String), ReporterFactory>,
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ReporterRegistry {
    pub fn empty() -> Self {
        Self {
            reporters: BTreeMap::new(),
            listeners: BTreeMap::new(),
        }
    }

    /// The built-in `console`, `xml`, and `json` reporters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_reporter("console", 0, |opts, sink| {
            Box::new(ConsoleReporter::new(opts.clone(), sink.clone()))
        });
        registry.register_reporter("xml", 0, |opts, sink| {
            Box::new(XmlReporter::new(opts.clone(), sink.clone()))
        });
        registry.register_reporter("json", 0, |opts, sink| {
            Box::new(JsonReporter::new(opts.clone(), sink.clone()))
        });
        registry
    }

    pub fn register_reporter<F>(&mut self, name: impl Into<String>, priority: i32, factory: F)
    where
        F: Fn(&RunOptions, &ReportSink) -> Box<dyn Reporter> + Send + Sync + 'static,
    {
        self.reporters
            .insert((priority, name.into()), Arc::new(factory));
    }

    pub fn register_listener<F>(&mut self, name: impl Into<String>, priority: i32, factory: F)
    where
        F: Fn(&RunOptions, &ReportSink) -> Box<dyn Reporter> + Send + Sync + 'static,
    {
        self.listeners
            .insert((priority, name.into()), Arc::new(factory));
    }

    /// Listeners then reporters, each in (priority, name) order.
    pub fn infos(&self) -> Vec<ReporterInfo> {
        let describe = |map: &BTreeMap<(i32, String), ReporterFactory>, is_listener: bool| {
            map.keys()
                .map(|(priority, name)| ReporterInfo {
                    name: name.clone(),
                    priority: *priority,
                    is_listener,
                })
                .collect::<Vec<_>>()
        };
        let mut infos = describe(&self.listeners, true);
        infos.extend(describe(&self.reporters, false));
        infos
    }

    fn is_selected(name: &str, opts: &RunOptions) -> bool {
        match opts.filters.get(FilterKind::Reporters) {
            [] => name == "console",
            given => matches_any(name, given, false, opts.case_sensitive),
        }
    }

    /// Whether the options select at least one registered reporter.
    pub fn selects_any(&self, opts: &RunOptions) -> bool {
        self.reporters
            .keys()
            .any(|(_, name)| Self::is_selected(name, opts))
    }

    /// Builds every listener plus the reporters selected by the options.
    pub fn instantiate(&self, opts: &RunOptions, sink: &ReportSink) -> ReporterSet {
        let mut set = ReporterSet::new();
        for factory in self.listeners.values() {
            set.push(factory(opts, sink));
        }
        for ((_, name), factory) in &self.reporters {
            if Self::is_selected(name, opts) {
                set.push(factory(opts, sink));
            }
        }
        set
    }

    /// Error for a selection that produced nothing.
    pub(crate) fn nothing_selected(&self, opts: &RunOptions) -> CaseworkError {
        let filter = match opts.filters.get(FilterKind::Reporters) {
            [] => "console".to_string(),
            given => given.join(","),
        };
        let available = self
            .reporters
            .keys()
            .map(|(_, name)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        CaseworkError::NoReporterSelected { filter, available }
    }
}

// ============================================================================
// OUTPUT SINK
// ============================================================================

/// Shared, colour-capable output target for reporters.
#[derive(Clone)]
pub struct ReportSink {
    inner: Arc<Mutex<Box<dyn WriteColor + Send>>>,
}

impl ReportSink {
    pub fn new(writer: impl WriteColor + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(choice))
    }

    /// The sink selected by `out`, `no_colors`, and `force_colors`.
    pub fn for_options(opts: &RunOptions) -> Result<Self> {
        match &opts.out {
            Some(path) => {
                let file = File::create(path).map_err(|source| CaseworkError::Output {
                    path: path.clone(),
                    source,
                })?;
                Ok(Self::new(NoColor::new(file)))
            }
            None => Ok(Self::stdout(color_choice(opts))),
        }
    }

    /// An in-memory sink and a handle to read what was written.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(NoColor::new(buffer.clone())), buffer)
    }

    /// Runs `write` against the underlying writer. Output errors are dropped:
    /// a reporter has nowhere to report them.
    pub fn write_with(&self, write: impl FnOnce(&mut dyn WriteColor) -> io::Result<()>) {
        // Delivery is already serialized by the reporter set; a busy sink
        // only happens when a fatal signal interrupts a write.
        let mut guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return,
        };
        let _ = write(guard.as_mut());
    }

    pub fn flush(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = guard.flush();
    }
}

pub fn color_choice(opts: &RunOptions) -> ColorChoice {
    if opts.no_colors {
        ColorChoice::Never
    } else if opts.force_colors {
        ColorChoice::Always
    } else if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// A cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
