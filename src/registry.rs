//! # Test Case Registry
//!
//! Holds the registered test cases of a program and produces them in run
//! order. Registration is explicit: build a [`Registry`] and add cases to it,
//! or use the process-wide one from [`global_registry`].
//!
//! Two cases may not share a source location; the second registration is
//! rejected with [`CaseworkError::DuplicateTestCase`]. Instances of one test
//! template share a location and differ in their template id.
//!
//! # Example
//! ```
//! use casework::{check_eq, Registry, TestCase};
//!
//! let mut registry = Registry::new();
//! registry
//!     .add(TestCase::new("addition", |ctx| {
//!         check_eq!(ctx, 2 + 2, 4);
//!     }))
//!     .unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

use crate::case::TestCase;
use crate::config::OrderBy;
use crate::errors::{CaseworkError, Result};
use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default, Clone)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, case: TestCase) -> Result<()> {
        let clash = self
            .cases
            .iter()
            .find(|known| {
                known.file() == case.file()
                    && known.line() == case.line()
                    && known.template_key() == case.template_key()
            });
        if let Some(existing) = clash {
            return Err(CaseworkError::DuplicateTestCase {
                name: case.name().to_string(),
                existing: existing.name().to_string(),
                file: case.file().to_string(),
                line: case.line(),
            });
        }
        self.cases.push(case);
        Ok(())
    }

    /// Registers cases that all belong to `suite`.
    pub fn suite(&mut self, name: impl Into<String>) -> SuiteScope<'_> {
        SuiteScope {
            registry: self,
            name: name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter()
    }

    /// Cases in the order a run visits them.
    pub(crate) fn ordered(&self, order_by: OrderBy, seed: u64) -> Vec<&TestCase> {
        let mut cases: Vec<&TestCase> = self.cases.iter().collect();
        let by_file = |a: &&TestCase, b: &&TestCase| {
            a.file()
                .cmp(b.file())
                .then(a.line().cmp(&b.line()))
                .then(a.template_key().cmp(&b.template_key()))
        };
        match order_by {
            OrderBy::File => cases.sort_by(by_file),
            OrderBy::Suite => cases.sort_by(|a, b| a.suite().cmp(b.suite()).then_with(|| by_file(a, b))),
            OrderBy::Name => cases.sort_by(|a, b| {
                a.name()
                    .cmp(b.name())
                    .then_with(|| a.suite().cmp(b.suite()))
                    .then_with(|| by_file(a, b))
            }),
            OrderBy::Rand => {
                cases.sort_by(by_file);
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                cases.shuffle(&mut rng);
            }
        }
        cases
    }
}

/// Adds cases to a registry under one suite name. See [`Registry::suite`].
pub struct SuiteScope<'r> {
    registry: &'r mut Registry,
    name: String,
}

impl SuiteScope<'_> {
    pub fn add(&mut self, case: TestCase) -> Result<()> {
        self.registry.add(case.in_suite(self.name.clone()))
    }
}

lazy_static! {
    static ref GLOBAL_REGISTRY: Mutex<Registry> = Mutex::new(Registry::new());
}

/// The process-wide registry.
pub fn global_registry() -> MutexGuard<'static, Registry> {
    GLOBAL_REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers a test case whose body receives the context as `$ctx`.
///
/// ```
/// use casework::{check, test_case, Registry};
///
/// let mut registry = Registry::new();
/// test_case!(registry, "truth", |ctx| {
///     check!(ctx, true);
/// })
/// .unwrap();
/// ```
#[macro_export]
macro_rules! test_case {
    ($registry:expr, $name:expr, |$ctx:ident| $body:block) => {
        $registry.add($crate::TestCase::new(
            $name,
            move |$ctx: &$crate::TestContext| $body,
        ))
    };
}

/// Registers a BDD-style scenario; see [`TestCase::scenario`].
#[macro_export]
macro_rules! scenario {
    ($registry:expr, $name:expr, |$ctx:ident| $body:block) => {
        $registry.add($crate::TestCase::scenario(
            $name,
            move |$ctx: &$crate::TestContext| $body,
        ))
    };
}

/// Registers the generic function `$body` once per listed type. Each
/// instance is named `name<type>`.
///
/// ```
/// use casework::{check, test_case_template, Registry, TestContext};
///
/// fn defaults_to_zero<T: Default + PartialEq + From<u8>>(ctx: &TestContext) {
///     check!(ctx, T::default() == T::from(0));
/// }
///
/// let mut registry = Registry::new();
/// test_case_template!(registry, "default", defaults_to_zero, [u16, u32, f64]).unwrap();
/// assert_eq!(registry.len(), 3);
/// ```
#[macro_export]
macro_rules! test_case_template {
    ($registry:expr, $name:expr, $body:ident, [$($ty:ty),+ $(,)?]) => {{
        let __instances: ::std::vec::Vec<$crate::TestCase> = ::std::vec![
            $($crate::TestCase::new(format!("{}<{}>", $name, stringify!($ty)), $body::<$ty>)),+
        ];
        __instances
            .into_iter()
            .zip(0u32..)
            .try_for_each(|(__case, __id)| $registry.add(__case.template_id(__id)))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(registry: &Registry, order: OrderBy, seed: u64) -> Vec<String> {
        registry
            .ordered(order, seed)
            .into_iter()
            .map(|case| case.name().to_string())
            .collect()
    }

    fn sample() -> Registry {
        let mut registry = Registry::new();
        let cases = [
            ("gamma", "net", "b.rs", 10),
            ("alpha", "net", "b.rs", 2),
            ("beta", "", "a.rs", 30),
            ("alpha", "io", "c.rs", 1),
        ];
        for (name, suite, file, line) in cases {
            registry
                .add(TestCase::new(name, |_| {}).in_suite(suite).at(file, line))
                .unwrap();
        }
        registry
    }

    #[test]
    fn duplicate_locations_are_rejected() {
        let mut registry = Registry::new();
        registry.add(TestCase::new("one", |_| {}).at("x.rs", 5)).unwrap();
        let err = registry
            .add(TestCase::new("two", |_| {}).at("x.rs", 5))
            .unwrap_err();
        assert!(matches!(err, CaseworkError::DuplicateTestCase { ref existing, .. } if existing == "one"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn template_instances_share_a_location() {
        let mut registry = Registry::new();
        registry
            .add(TestCase::new("sized<u8>", |_| {}).at("t.rs", 9).template_id(1))
            .unwrap();
        registry
            .add(TestCase::new("sized<i64>", |_| {}).at("t.rs", 9).template_id(0))
            .unwrap();
        let err = registry
            .add(TestCase::new("sized<u8> again", |_| {}).at("t.rs", 9).template_id(1))
            .unwrap_err();
        assert!(matches!(err, CaseworkError::DuplicateTestCase { .. }));
        assert_eq!(named(&registry, OrderBy::File, 0), ["sized<i64>", "sized<u8>"]);
    }

    fn zero_sized<T>(ctx: &crate::TestContext) {
        let _ = (ctx, std::mem::size_of::<T>());
    }

    #[test]
    fn template_macro_names_each_instance() {
        let mut registry = Registry::new();
        test_case_template!(registry, "sizes", zero_sized, [u8, String, Vec<u32>]).unwrap();
        let names: Vec<&str> = registry.iter().map(|case| case.name()).collect();
        assert_eq!(names, ["sizes<u8>", "sizes<String>", "sizes<Vec<u32>>"]);
        let ids: Vec<Option<u32>> = registry.iter().map(|case| case.data().template_id).collect();
        assert_eq!(ids, [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn scenario_macro_prefixes_the_name() {
        let mut registry = Registry::new();
        scenario!(registry, "stack grows", |ctx| {
            let _ = ctx.options();
        })
        .unwrap();
        assert_eq!(registry.iter().next().unwrap().name(), "  Scenario: stack grows");
    }

    #[test]
    fn file_order_sorts_by_path_then_line() {
        assert_eq!(named(&sample(), OrderBy::File, 0), ["beta", "alpha", "gamma", "alpha"]);
    }

    #[test]
    fn suite_order_groups_suites() {
        let registry = sample();
        let suites: Vec<&str> = registry
            .ordered(OrderBy::Suite, 0)
            .iter()
            .map(|case| case.suite())
            .collect();
        assert_eq!(suites, ["", "io", "net", "net"]);
    }

    #[test]
    fn name_order_breaks_ties_by_suite() {
        let registry = sample();
        let ordered = registry.ordered(OrderBy::Name, 0);
        assert_eq!(ordered[0].suite(), "io");
        assert_eq!(ordered[1].suite(), "net");
        assert_eq!(ordered[3].name(), "gamma");
    }

    #[test]
    fn random_order_is_a_seeded_permutation() {
        let registry = sample();
        let first = named(&registry, OrderBy::Rand, 42);
        assert_eq!(first, named(&registry, OrderBy::Rand, 42));
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, ["alpha", "alpha", "beta", "gamma"]);
    }

    #[test]
    fn suite_scope_tags_its_cases() {
        let mut registry = Registry::new();
        let mut parsing = registry.suite("parsing");
        parsing.add(TestCase::new("empty", |_| {}).at("p.rs", 1)).unwrap();
        parsing.add(TestCase::new("nested", |_| {}).at("p.rs", 2)).unwrap();
        assert!(registry.iter().all(|case| case.suite() == "parsing"));
    }

    #[test]
    fn macro_registers_with_caller_location() {
        let mut registry = Registry::new();
        test_case!(registry, "via macro", |ctx| {
            let _ = ctx.options();
        })
        .unwrap();
        let case = registry.iter().next().unwrap();
        assert_eq!(case.name(), "via macro");
        assert!(case.file().ends_with("registry.rs"));
    }
}
