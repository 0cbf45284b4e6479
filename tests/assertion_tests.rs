mod common;

use casework::{
    capture, check, check_eq, check_false, check_false_message, check_message, check_nothrow,
    check_throws, check_throws_as, check_throws_with, check_throws_with_as, fail, fail_check,
    info, message, require, require_message, warn, warn_message, Approx, Registry, ReportSink,
    ReporterRegistry, RunOptions, Runner, TestCase, TestContext,
};
use std::collections::HashMap;
use common::{record, Recorder};
use proptest::prelude::*;
use std::panic::panic_any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct ErrorCode(u32);

fn explode(message: &str) -> u32 {
    panic!("{}", message)
}

fn run_with<F>(options: RunOptions, body: F) -> (casework::RunSummary, Recorder)
where
    F: Fn(&TestContext) + Send + Sync + 'static,
{
    let mut registry = Registry::new();
    registry.add(TestCase::new("body", body)).unwrap();
    record(&registry, options)
}

fn run<F>(body: F) -> (casework::RunSummary, Recorder)
where
    F: Fn(&TestContext) + Send + Sync + 'static,
{
    run_with(RunOptions::default(), body)
}

#[test]
fn comparison_is_decomposed() {
    let (summary, recorder) = run(|ctx| {
        check!(ctx, 3 == 4);
    });
    assert_eq!(
        recorder.matching("assert"),
        ["assert CHECK failed=true decomp=3 == 4 exception= contexts=[]"]
    );
    assert_eq!(summary.stats.num_asserts_failed, 1);
}

#[test]
fn passing_assertions_are_reported_only_with_success() {
    let (_, recorder) = run(|ctx| {
        check!(ctx, 3 == 3);
    });
    assert_eq!(
        recorder.matching("assert"),
        ["assert CHECK failed=false decomp= exception= contexts=[]"]
    );

    let options = RunOptions {
        success: true,
        ..RunOptions::default()
    };
    let (_, recorder) = run_with(options, |ctx| {
        check!(ctx, 3 == 3);
    });
    assert_eq!(
        recorder.matching("assert"),
        ["assert CHECK failed=false decomp=3 == 3 exception= contexts=[]"]
    );
}

#[test]
fn binary_forms_and_negation() {
    let (_, recorder) = run(|ctx| {
        let name = String::from("alpha");
        check_eq!(ctx, name.len(), 4);
        check_false!(ctx, name.len() == 5);
        check!(ctx, name.is_empty() || name.len() == 1);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK_EQ failed=true decomp=5, 4 exception= contexts=[]",
            "assert CHECK_FALSE failed=true decomp=5 == 5 exception= contexts=[]",
            "assert CHECK failed=true decomp=false exception= contexts=[]",
        ]
    );
}

#[test]
fn strict_comparisons_are_decomposed() {
    let (_, recorder) = run(|ctx| {
        check!(ctx, 2 < 1);
        check!(ctx, 1 > 2);
        check_false!(ctx, 1 < 2);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK failed=true decomp=2 < 1 exception= contexts=[]",
            "assert CHECK failed=true decomp=1 > 2 exception= contexts=[]",
            "assert CHECK_FALSE failed=true decomp=1 < 2 exception= contexts=[]",
        ]
    );
}

#[test]
fn generic_arguments_are_not_taken_for_comparisons() {
    let (_, recorder) = run(|ctx| {
        check!(ctx, "1,2".split(',').collect::<Vec<_>>().len() > 3);
        check!(ctx, Vec::<u8>::with_capacity(4).len() == 1);
        check!(ctx, <u8 as Default>::default() > 1);
        check!(ctx, HashMap::<u8, Vec<u8>>::new().len() >= 1);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK failed=true decomp=2 > 3 exception= contexts=[]",
            "assert CHECK failed=true decomp=0 == 1 exception= contexts=[]",
            "assert CHECK failed=true decomp=0 > 1 exception= contexts=[]",
            "assert CHECK failed=true decomp=0 >= 1 exception= contexts=[]",
        ]
    );
}

#[test]
fn logical_operators_keep_the_expression_whole() {
    let (_, recorder) = run(|ctx| {
        check!(ctx, 1 < 2 && 3 > 4);
        check!(ctx, 2 == 1 || 1 > 2);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK failed=true decomp=false exception= contexts=[]",
            "assert CHECK failed=true decomp=false exception= contexts=[]",
        ]
    );
}

#[test]
fn long_method_chains_are_decomposed() {
    let (_, recorder) = run(|ctx| {
        let v = vec![1, 2, 3];
        check!(
            ctx,
            v.iter()
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .map(|x| x + 1)
                .count()
                == v.len() + 1
        );
    });
    assert_eq!(
        recorder.matching("assert"),
        ["assert CHECK failed=true decomp=3 == 4 exception= contexts=[]"]
    );
}

#[test]
fn oversized_expressions_are_evaluated_whole() {
    let (summary, recorder) = run(|ctx| {
        check!(ctx, 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1 == 0);
    });
    assert_eq!(
        recorder.matching("assert"),
        ["assert CHECK failed=true decomp=false exception= contexts=[]"]
    );
    assert_eq!(summary.stats.num_asserts_failed, 1);
}

#[test]
fn approx_comparisons_render_the_target() {
    let (_, recorder) = run(|ctx| {
        check!(ctx, 0.1_f64 + 0.2 == Approx::new(0.3));
        check!(ctx, 1.5_f64 == Approx::new(2.0));
    });
    assert_eq!(recorder.matching("assert").len(), 2);
    assert_eq!(
        recorder.matching("assert CHECK failed=true"),
        ["assert CHECK failed=true decomp=1.5 == Approx( 2 ) exception= contexts=[]"]
    );
}

#[test]
fn panicking_operand_fails_the_assertion_only() {
    let (summary, recorder) = run(|ctx| {
        check!(ctx, explode("bad input") == 1);
        check!(ctx, 2 == 2);
    });
    let asserts = recorder.matching("assert");
    assert_eq!(
        asserts[0],
        "assert CHECK failed=true decomp= exception=\"bad input\" contexts=[]"
    );
    assert_eq!(summary.stats.num_asserts, 2);
    assert!(recorder.matching("exception").is_empty());
    assert_eq!(recorder.matching("case end"), ["case end [assert_failure]"]);
}

#[test]
fn panic_assertions() {
    let (summary, _) = run(|ctx| {
        check_throws!(ctx, explode("any"));
        check_throws_as!(ctx, panic_any(ErrorCode(7)), ErrorCode);
        check_throws_with!(ctx, explode("disk full"), "disk full");
        check_throws_with_as!(ctx, explode("disk full"), "disk full", String);
        check_nothrow!(ctx, 1 + 1);
    });
    assert_eq!(summary.stats.num_asserts, 5);
    assert_eq!(summary.stats.num_asserts_failed, 0);

    let (summary, recorder) = run(|ctx| {
        check_throws!(ctx, 1 + 1);
        check_throws_as!(ctx, explode("text"), ErrorCode);
        check_throws_with!(ctx, explode("disk full"), "disk empty");
        check_nothrow!(ctx, explode("oops"));
    });
    assert_eq!(summary.stats.num_asserts_failed, 4);
    let asserts = recorder.matching("assert");
    assert!(asserts[0].starts_with("assert CHECK_THROWS failed=true"));
    assert!(asserts[2].contains("exception=\"disk full\""));
    assert!(asserts[3].starts_with("assert CHECK_NOTHROW failed=true"));
}

#[test]
fn translators_describe_custom_payloads() {
    let mut registry = Registry::new();
    registry
        .add(TestCase::new("custom", |ctx| {
            check_throws_with!(ctx, panic_any(ErrorCode(7)), "error code 7");
            panic_any(ErrorCode(9));
        }))
        .unwrap();
    let recorder = Recorder::default();
    let (sink, _) = ReportSink::buffer();
    let summary = Runner::new(&registry)
        .with_reporter_registry(ReporterRegistry::empty())
        .with_reporter(recorder.clone())
        .with_translator(|code: &ErrorCode| format!("error code {}", code.0))
        .with_output(sink)
        .run()
        .unwrap();

    assert_eq!(summary.stats.num_asserts_failed, 0);
    assert_eq!(
        recorder.matching("exception"),
        ["exception error code 9 crash=false contexts=[]"]
    );
}

#[test]
fn unknown_payloads_are_described_generically() {
    let (_, recorder) = run(|_| panic_any(42_u8));
    assert_eq!(
        recorder.matching("exception"),
        ["exception unknown exception crash=false contexts=[]"]
    );
}

#[test]
fn require_ends_the_invocation() {
    let reached = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&reached);
    let (summary, recorder) = run(move |ctx| {
        require!(ctx, 1 > 2);
        flag.store(true, Ordering::SeqCst);
    });
    assert!(!reached.load(Ordering::SeqCst));
    assert!(recorder.matching("exception").is_empty());
    assert_eq!(summary.exit_code, 1);
}

#[test]
fn warnings_are_not_counted() {
    let (summary, recorder) = run(|ctx| {
        warn!(ctx, 1 == 2);
    });
    assert_eq!(recorder.matching("assert").len(), 1);
    assert_eq!(summary.stats.num_asserts, 0);
    assert_eq!(summary.exit_code, 0);
}

#[test]
fn info_scopes_attach_to_assertions() {
    let (_, recorder) = run(|ctx| {
        info!(ctx, "outer");
        for i in 0..3 {
            info!(ctx, "i = {}", i);
            check!(ctx, i < 2);
        }
    });
    assert_eq!(
        recorder.matching("assert CHECK failed=true"),
        ["assert CHECK failed=true decomp=2 < 2 exception= contexts=[\"outer\", \"i = 2\"]"]
    );
}

#[test]
fn info_scopes_survive_into_exception_reports() {
    let (_, recorder) = run(|ctx| {
        info!(ctx, "loading fixture");
        {
            info!(ctx, "row {}", 3);
            explode("corrupt row");
        }
    });
    assert_eq!(
        recorder.matching("exception"),
        ["exception corrupt row crash=false contexts=[\"loading fixture\", \"row 3\"]"]
    );
}

#[test]
fn info_scopes_stay_with_the_thread_that_opened_them() {
    let (_, recorder) = run(|ctx| {
        info!(ctx, "main");
        std::thread::scope(|s| {
            s.spawn(|| {
                info!(ctx, "worker");
                check!(ctx, 1 == 2);
            });
        });
        check!(ctx, 3 == 4);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK failed=true decomp=1 == 2 exception= contexts=[\"worker\"]",
            "assert CHECK failed=true decomp=3 == 4 exception= contexts=[\"main\"]",
        ]
    );
}

#[test]
fn worker_threads_assert_concurrently() {
    let (summary, recorder) = run(|ctx| {
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for j in 0..100 {
                        check_eq!(ctx, j % 2, 0);
                    }
                });
            }
        });
    });
    assert_eq!(summary.stats.num_asserts, 800);
    assert_eq!(summary.stats.num_asserts_failed, 400);
    let failures = recorder.matching("assert");
    assert_eq!(failures.len(), 400);
    assert!(failures
        .iter()
        .all(|line| line == "assert CHECK_EQ failed=true decomp=1, 0 exception= contexts=[]"));
    assert_eq!(recorder.matching("case end"), ["case end [assert_failure]"]);
}

#[test]
fn assertions_with_messages() {
    let (summary, recorder) = run(|ctx| {
        check_message!(ctx, 2 + 2 == 5, "arithmetic on {}", "ints");
        warn_message!(ctx, false, "just a warning");
        check_false_message!(ctx, 1 < 2, "ordering");
        check_message!(ctx, std::cmp::max(1, 2) == 3, "max of {} and {}", 1, 2);
        check_message!(ctx, HashMap::<u8, u8>::new().is_empty(), "fresh map");
        check!(ctx, false);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK failed=true decomp=4 == 5 exception= contexts=[\"arithmetic on ints\"]",
            "assert WARN failed=true decomp=false exception= contexts=[\"just a warning\"]",
            "assert CHECK_FALSE failed=true decomp=1 < 2 exception= contexts=[\"ordering\"]",
            "assert CHECK failed=true decomp=2 == 3 exception= contexts=[\"max of 1 and 2\"]",
            "assert CHECK failed=true decomp=false exception= contexts=[]",
        ]
    );
    assert_eq!(summary.stats.num_asserts, 5);
    assert_eq!(summary.stats.num_asserts_failed, 4);
}

#[test]
fn require_message_ends_the_invocation() {
    let reached = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&reached);
    let (_, recorder) = run(move |ctx| {
        require_message!(ctx, 1 > 2, "cannot continue");
        flag.store(true, Ordering::SeqCst);
    });
    assert!(!reached.load(Ordering::SeqCst));
    assert_eq!(
        recorder.matching("assert"),
        ["assert REQUIRE failed=true decomp=1 > 2 exception= contexts=[\"cannot continue\"]"]
    );
}

#[test]
fn captured_values_are_attached() {
    let (_, recorder) = run(|ctx| {
        let width = 3;
        {
            capture!(ctx, width, width * 2);
            check!(ctx, width == 4);
        }
        check!(ctx, width == 5);
    });
    assert_eq!(
        recorder.matching("assert"),
        [
            "assert CHECK failed=true decomp=3 == 4 exception= contexts=[\"width := 3\", \"width * 2 := 6\"]",
            "assert CHECK failed=true decomp=3 == 5 exception= contexts=[]",
        ]
    );
}

#[test]
fn no_throw_skips_panic_assertions() {
    let options = RunOptions {
        no_throw: true,
        ..RunOptions::default()
    };
    let (summary, recorder) = run_with(options, |ctx| {
        let skipped = check_throws!(ctx, 1 + 1);
        check_nothrow!(ctx, explode("never evaluated"));
        check!(ctx, skipped);
    });
    assert_eq!(summary.stats.num_asserts, 1);
    assert_eq!(summary.stats.num_asserts_failed, 0);
    assert!(recorder.matching("exception").is_empty());
}

#[test]
fn messages() {
    let (summary, recorder) = run(|ctx| {
        message!(ctx, "starting {}", "up");
        fail_check!(ctx, "soft failure");
        fail!(ctx, "hard failure");
        message!(ctx, "never logged");
    });
    assert_eq!(
        recorder.matching("message"),
        [
            "message Warn starting up",
            "message Check soft failure",
            "message Require hard failure",
        ]
    );
    assert_eq!(summary.stats.num_asserts_failed, 2);
    assert_eq!(summary.exit_code, 1);
}

proptest! {
    #[test]
    fn approx_equality_is_symmetric(x in -1.0e6f64..1.0e6, y in -1.0e6f64..1.0e6) {
        let target = Approx::new(x);
        prop_assert!(x == target);
        prop_assert_eq!(y == target, target == y);
        prop_assert_eq!(y == Approx::new(x), x == Approx::new(y));
    }
}
