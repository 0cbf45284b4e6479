//! Subcase traversal.
//!
//! A test body containing subcases is invoked repeatedly. Each invocation
//! enters at most one not-yet-finished path through the subcase tree; when a
//! sibling had to be passed over, the invocation asks to be re-entered. A
//! path is memoized as finished only if no sibling was deferred while it ran,
//! so a body with `A { A1, A2 }, B` runs three times: `A/A1`, `A/A2`, `B`.

use crate::case::SubcaseSignature;
use crate::context::TestContext;
use std::collections::BTreeSet;

/// Why a subcase was or was not entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entry {
    Entered,
    /// Rejected by the subcase name filters.
    Filtered,
    /// A sibling at this depth already ran during this invocation.
    Deferred,
    /// Every path below this one has already run.
    Finished,
}

/// Stack, memo, and depth bookkeeping for the running test case.
#[derive(Debug, Default)]
pub(crate) struct SubcaseTracker {
    stack: Vec<SubcaseSignature>,
    passed: BTreeSet<Vec<SubcaseSignature>>,
    max_level: usize,
    should_reenter: bool,
}

impl SubcaseTracker {
    /// Forgets everything, including finished paths. Called at test start.
    pub fn reset_for_test(&mut self) {
        *self = SubcaseTracker::default();
    }

    /// Prepares another invocation of the same body; the memo survives.
    pub fn reset_for_invocation(&mut self) {
        self.stack.clear();
        self.max_level = 0;
        self.should_reenter = false;
    }

    /// `admit` is consulted only for the outermost `filter_levels` levels.
    pub fn enter(
        &mut self,
        signature: &SubcaseSignature,
        filter_levels: usize,
        admit: impl FnOnce(&str) -> bool,
    ) -> Entry {
        if self.stack.len() < filter_levels && !admit(&signature.name) {
            return Entry::Filtered;
        }
        if self.stack.len() < self.max_level {
            self.should_reenter = true;
            return Entry::Deferred;
        }
        self.stack.push(signature.clone());
        if self.passed.contains(&self.stack) {
            self.stack.pop();
            return Entry::Finished;
        }
        self.max_level = self.stack.len();
        Entry::Entered
    }

    /// Leaves the innermost entered subcase.
    pub fn leave(&mut self) {
        if !self.should_reenter {
            self.passed.insert(self.stack.clone());
        }
        self.stack.pop();
    }

    /// Pops without memoizing; used when a crash tears the stack down.
    pub fn unwind_one(&mut self) -> Option<SubcaseSignature> {
        self.stack.pop()
    }

    pub fn should_reenter(&self) -> bool {
        self.should_reenter
    }

    #[cfg(test)]
    pub fn stack(&self) -> &[SubcaseSignature] {
        &self.stack
    }
}

// ============================================================================
// SCOPE GUARD
// ============================================================================

/// An entered subcase. Leaving the scope (normally or by unwinding) closes it.
///
/// Obtain one with [`TestContext::subcase`] or the `subcase!` macro:
///
/// ```ignore
/// if let Some(_s) = ctx.subcase("empty input") {
///     check!(ctx, parse("").is_err());
/// }
/// ```
pub struct Subcase<'a> {
    ctx: &'a TestContext,
    signature: SubcaseSignature,
}

impl<'a> Subcase<'a> {
    pub(crate) fn new(ctx: &'a TestContext, signature: SubcaseSignature) -> Self {
        Self { ctx, signature }
    }

    pub fn signature(&self) -> &SubcaseSignature {
        &self.signature
    }
}

impl Drop for Subcase<'_> {
    fn drop(&mut self) {
        self.ctx.leave_subcase(std::thread::panicking());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str, line: u32) -> SubcaseSignature {
        SubcaseSignature::new(name, "body.rs", line)
    }

    /// Drives `body` the way the runner does and returns the paths entered.
    fn drive<F>(tracker: &mut SubcaseTracker, mut body: F) -> (usize, Vec<String>)
    where
        F: FnMut(&mut SubcaseTracker, &mut Vec<String>),
    {
        tracker.reset_for_test();
        let mut invocations = 0;
        let mut log = Vec::new();
        loop {
            tracker.reset_for_invocation();
            invocations += 1;
            body(tracker, &mut log);
            if !tracker.should_reenter() {
                break;
            }
        }
        (invocations, log)
    }

    fn enter(t: &mut SubcaseTracker, s: &SubcaseSignature) -> bool {
        t.enter(s, usize::MAX, |_| true) == Entry::Entered
    }

    #[test]
    fn nested_tree_runs_each_leaf_once() {
        let (a, a1, a2, b) = (sig("A", 1), sig("A1", 2), sig("A2", 3), sig("B", 4));
        let mut tracker = SubcaseTracker::default();
        let (runs, log) = drive(&mut tracker, |t, log| {
            if enter(t, &a) {
                if enter(t, &a1) {
                    log.push("A/A1".to_string());
                    t.leave();
                }
                if enter(t, &a2) {
                    log.push("A/A2".to_string());
                    t.leave();
                }
                t.leave();
            }
            if enter(t, &b) {
                log.push("B".to_string());
                t.leave();
            }
        });
        assert_eq!(runs, 3);
        assert_eq!(log, vec!["A/A1", "A/A2", "B"]);
    }

    #[test]
    fn two_siblings_need_two_invocations() {
        let (x, y) = (sig("X", 1), sig("Y", 2));
        let mut tracker = SubcaseTracker::default();
        let (runs, log) = drive(&mut tracker, |t, log| {
            log.push("setup".to_string());
            if enter(t, &x) {
                log.push("X".to_string());
                t.leave();
            }
            if enter(t, &y) {
                log.push("Y".to_string());
                t.leave();
            }
        });
        assert_eq!(runs, 2);
        assert_eq!(log, vec!["setup", "X", "setup", "Y"]);
    }

    #[test]
    fn body_without_subcases_runs_once() {
        let mut tracker = SubcaseTracker::default();
        let (runs, _) = drive(&mut tracker, |_, log| log.push("only".to_string()));
        assert_eq!(runs, 1);
    }

    #[test]
    fn filtered_subcases_do_not_trigger_reentry() {
        let (x, y) = (sig("X", 1), sig("Y", 2));
        let mut tracker = SubcaseTracker::default();
        let (runs, log) = drive(&mut tracker, |t, log| {
            for s in [&x, &y] {
                if t.enter(s, usize::MAX, |name| name != "X") == Entry::Entered {
                    log.push(s.name.clone());
                    t.leave();
                }
            }
        });
        assert_eq!(runs, 1);
        assert_eq!(log, vec!["Y"]);
    }

    #[test]
    fn filters_stop_at_the_configured_depth() {
        let (outer, inner) = (sig("outer", 1), sig("inner", 2));
        let mut tracker = SubcaseTracker::default();
        tracker.reset_for_invocation();
        assert_eq!(tracker.enter(&outer, 1, |_| true), Entry::Entered);
        assert_eq!(tracker.enter(&inner, 1, |_| false), Entry::Entered);
        tracker.leave();
        tracker.leave();
        assert!(!tracker.should_reenter());
    }

    #[test]
    fn rerunning_the_same_test_is_idempotent() {
        let (x, y) = (sig("X", 1), sig("Y", 2));
        let mut tracker = SubcaseTracker::default();
        let mut body = |t: &mut SubcaseTracker, log: &mut Vec<String>| {
            for s in [&x, &y] {
                if enter(t, s) {
                    log.push(s.name.clone());
                    t.leave();
                }
            }
        };
        let first = drive(&mut tracker, &mut body);
        let second = drive(&mut tracker, &mut body);
        assert_eq!(first, second);
        assert_eq!(tracker.stack().len(), 0);
    }
}
