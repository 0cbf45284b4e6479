//! # Casework
//!
//! An in-process unit test engine. Test cases are plain closures registered in
//! a [`Registry`]; each receives a [`TestContext`] through which it asserts,
//! logs, and opens nested subcases. A body containing subcases is re-invoked
//! until every leaf path has run exactly once, sharing the setup code above
//! each branch.
//!
//! ```
//! use casework::{check_eq, require, subcase, Registry, Runner, ReportSink, TestCase};
//!
//! let mut registry = Registry::new();
//! registry
//!     .add(TestCase::new("vectors", |ctx| {
//!         let mut v = vec![1, 2, 3];
//!         subcase!(ctx, "push", {
//!             v.push(4);
//!             check_eq!(ctx, v.len(), 4);
//!         });
//!         subcase!(ctx, "pop", {
//!             v.pop();
//!             require!(ctx, v.len() == 2);
//!         });
//!     }))
//!     .unwrap();
//!
//! let (sink, _output) = ReportSink::buffer();
//! let summary = Runner::new(&registry).with_output(sink).run().unwrap();
//! assert_eq!(summary.exit_code, 0);
//! assert_eq!(summary.stats.num_asserts, 2);
//! ```

pub mod assertions;
pub mod case;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod exception;
mod fatal;
pub mod filter;
pub mod registry;
pub mod reporters;
pub mod runner;
pub mod stats;
pub mod subcase;

pub use assertions::{Approx, AssertData, AssertKind, AssertType, MessageData, Severity};
pub use case::{Decorators, SubcaseSignature, TestCase, TestCaseData};
pub use config::{OrderBy, RunOptions};
pub use context::{InfoScope, TestContext};
pub use errors::{CaseworkError, Result};
pub use exception::{TestFailure, Translator, Translators};
pub use filter::{FilterKind, Filters};
pub use registry::{global_registry, Registry, SuiteScope};
pub use reporters::{
    ConsoleReporter, JsonReporter, ReportSink, Reporter, ReporterRegistry, XmlReporter,
};
pub use runner::{RunSummary, Runner};
pub use stats::{
    CurrentTestCaseStats, FailureFlags, QueryData, QueryMode, ReporterInfo, TestCaseException,
    TestRunStats,
};
pub use subcase::Subcase;
