mod common;

use casework::{
    and_then, check, given, require, scenario, subcase, then, when, FilterKind, Filters,
    Registry, RunOptions, TestCase, TestContext,
};
use common::record;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Registers `A { A1, A2 }, B` and returns the leaf log and invocation count.
fn branching(registry: &mut Registry) -> (Arc<Mutex<Vec<&'static str>>>, Arc<AtomicUsize>) {
    let leaves = Arc::new(Mutex::new(Vec::new()));
    let invocations = Arc::new(AtomicUsize::new(0));
    let (log, count) = (Arc::clone(&leaves), Arc::clone(&invocations));
    registry
        .add(TestCase::new("tree", move |ctx| {
            count.fetch_add(1, Ordering::SeqCst);
            subcase!(ctx, "A", {
                subcase!(ctx, "A1", {
                    log.lock().unwrap().push("A/A1");
                });
                subcase!(ctx, "A2", {
                    log.lock().unwrap().push("A/A2");
                });
            });
            subcase!(ctx, "B", {
                log.lock().unwrap().push("B");
            });
        }))
        .unwrap();
    (leaves, invocations)
}

#[test]
fn every_leaf_runs_exactly_once() {
    let mut registry = Registry::new();
    let (leaves, invocations) = branching(&mut registry);

    let (summary, recorder) = record(&registry, RunOptions::default());

    assert_eq!(*leaves.lock().unwrap(), ["A/A1", "A/A2", "B"]);
    assert_eq!(invocations.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.matching("case reenter").len(), 2);
    assert_eq!(summary.exit_code, 0);
}

#[test]
fn subcase_events_follow_the_entered_path() {
    let mut registry = Registry::new();
    branching(&mut registry);

    let (_, recorder) = record(&registry, RunOptions::default());

    let subcase_events: Vec<String> = recorder
        .events()
        .into_iter()
        .filter(|event| event.starts_with("subcase") || event.starts_with("case"))
        .collect();
    assert_eq!(
        subcase_events,
        [
            "case start tree",
            "subcase start A",
            "subcase start A1",
            "subcase end",
            "subcase end",
            "case reenter tree",
            "subcase start A",
            "subcase start A2",
            "subcase end",
            "subcase end",
            "case reenter tree",
            "subcase start B",
            "subcase end",
            "case end []",
        ]
    );
}

#[test]
fn setup_code_is_shared_between_siblings() {
    let mut registry = Registry::new();
    let setups = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&setups);
    registry
        .add(TestCase::new("siblings", move |ctx| {
            let mut v = vec![1, 2, 3];
            counter.fetch_add(1, Ordering::SeqCst);
            subcase!(ctx, "push", {
                v.push(4);
                check!(ctx, v.len() == 4);
            });
            subcase!(ctx, "pop", {
                v.pop();
                check!(ctx, v.len() == 2);
            });
        }))
        .unwrap();

    let (summary, _) = record(&registry, RunOptions::default());

    assert_eq!(setups.load(Ordering::SeqCst), 2);
    assert_eq!(summary.stats.num_asserts, 2);
    assert_eq!(summary.stats.num_asserts_failed, 0);
}

#[test]
fn excluded_subcases_are_never_entered() {
    let mut registry = Registry::new();
    let (leaves, _) = branching(&mut registry);
    let options = RunOptions {
        filters: Filters::default().with(FilterKind::SubcaseExclude, "a2"),
        ..RunOptions::default()
    };

    record(&registry, options);

    assert_eq!(*leaves.lock().unwrap(), ["A/A1", "B"]);
}

#[test]
fn filter_levels_limit_subcase_filtering() {
    let mut registry = Registry::new();
    let (leaves, _) = branching(&mut registry);
    // Only the outermost level is filtered, so the inner A2 survives.
    let options = RunOptions {
        filters: Filters::default().with(FilterKind::SubcaseExclude, "A2"),
        subcase_filter_levels: 1,
        ..RunOptions::default()
    };

    record(&registry, options);

    assert_eq!(*leaves.lock().unwrap(), ["A/A1", "A/A2", "B"]);
}

#[test]
fn failed_require_closes_open_subcases() {
    let mut registry = Registry::new();
    registry
        .add(TestCase::new("aborted", |ctx| {
            subcase!(ctx, "outer", {
                subcase!(ctx, "inner", {
                    require!(ctx, 1 == 2);
                });
            });
        }))
        .unwrap();

    let (summary, recorder) = record(&registry, RunOptions::default());

    assert_eq!(recorder.matching("subcase start").len(), 2);
    assert_eq!(recorder.matching("subcase end").len(), 2);
    assert!(recorder.matching("exception").is_empty());
    assert_eq!(recorder.matching("case end"), ["case end [assert_failure]"]);
    assert_eq!(summary.exit_code, 1);
}

#[test]
fn panic_inside_a_subcase_is_reported_once() {
    let mut registry = Registry::new();
    registry
        .add(TestCase::new("boom", |ctx| {
            subcase!(ctx, "outer", {
                subcase!(ctx, "inner", {
                    panic!("kaboom");
                });
            });
        }))
        .unwrap();

    let (summary, recorder) = record(&registry, RunOptions::default());

    let exceptions = recorder.matching("exception");
    assert_eq!(exceptions.len(), 2);
    assert!(exceptions[0].starts_with("exception exception thrown in subcase"));
    assert_eq!(exceptions[1], "exception kaboom crash=false contexts=[]");
    assert_eq!(recorder.matching("case end"), ["case end [exception]"]);
    assert_eq!(summary.stats.num_test_cases_failed, 1);
}

#[test]
fn scenario_steps_are_prefixed_subcases() {
    let mut registry = Registry::new();
    scenario!(registry, "vectors can be sized", |ctx| {
        given!(ctx, "a vector with 5 items", {
            let mut v = vec![0; 5];
            when!(ctx, "it grows", {
                v.push(1);
                then!(ctx, "the size changes", {
                    check!(ctx, v.len() == 6);
                });
            });
            when!(ctx, "it is cleared", {
                v.clear();
                then!(ctx, "it is empty", {
                    check!(ctx, v.is_empty());
                });
                and_then!(ctx, "the capacity stays", {
                    check!(ctx, v.capacity() >= 5);
                });
            });
        });
    })
    .unwrap();

    let (summary, recorder) = record(&registry, RunOptions::default());

    assert_eq!(
        recorder.matching("case "),
        [
            "case start   Scenario: vectors can be sized",
            "case reenter   Scenario: vectors can be sized",
            "case reenter   Scenario: vectors can be sized",
            "case end []",
        ]
    );
    assert_eq!(
        recorder.matching("subcase start"),
        [
            "subcase start    Given: a vector with 5 items",
            "subcase start     When: it grows",
            "subcase start     Then: the size changes",
            "subcase start    Given: a vector with 5 items",
            "subcase start     When: it is cleared",
            "subcase start     Then: it is empty",
            "subcase start    Given: a vector with 5 items",
            "subcase start     When: it is cleared",
            "subcase start      And: the capacity stays",
        ]
    );
    assert_eq!(summary.stats.num_asserts, 3);
    assert_eq!(summary.stats.num_asserts_failed, 0);
}

/// A subcase tree: every node is a subcase, named by its index among its
/// siblings.
#[derive(Debug, Clone)]
struct Tree(Vec<Tree>);

fn tree() -> impl Strategy<Value = Tree> {
    Just(Tree(Vec::new())).prop_recursive(3, 24, 3, |inner| {
        prop::collection::vec(inner, 0..3).prop_map(Tree)
    })
}

fn walk(ctx: &TestContext, node: &Tree, path: String, log: &Mutex<Vec<String>>) {
    if node.0.is_empty() {
        log.lock().unwrap().push(path);
        return;
    }
    for (i, child) in node.0.iter().enumerate() {
        if let Some(_s) = ctx.subcase(i.to_string()) {
            walk(ctx, child, format!("{}/{}", path, i), log);
        }
    }
}

fn leaf_paths(node: &Tree, path: String, out: &mut Vec<String>) {
    if node.0.is_empty() {
        out.push(path);
        return;
    }
    for (i, child) in node.0.iter().enumerate() {
        leaf_paths(child, format!("{}/{}", path, i), out);
    }
}

/// Runs `root` as a test body; returns the leaves in visit order and every
/// reporter event.
fn run_tree(root: &Arc<Tree>) -> (Vec<String>, Vec<String>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (tree, sink) = (Arc::clone(root), Arc::clone(&log));
    let mut registry = Registry::new();
    registry
        .add(TestCase::new("random tree", move |ctx| {
            walk(ctx, &tree, String::new(), &sink)
        }))
        .unwrap();
    let (_, recorder) = record(&registry, RunOptions::default());
    let visited = log.lock().unwrap().clone();
    (visited, recorder.events())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_trees_visit_each_leaf_once_in_order(root in tree()) {
        let mut expected = Vec::new();
        leaf_paths(&root, String::new(), &mut expected);
        let root = Arc::new(root);

        let (visited, events) = run_tree(&root);
        let invocations = events
            .iter()
            .filter(|event| event.starts_with("case start") || event.starts_with("case reenter"))
            .count();

        prop_assert_eq!(&visited, &expected);
        prop_assert_eq!(invocations, expected.len());
        prop_assert_eq!((visited, events), run_tree(&root));
    }
}
