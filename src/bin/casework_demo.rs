// Sample test binary: registers a handful of cases and runs them through the
// command-line front end.
// Usage: cargo run --bin casework_demo -- [options]

use casework::{
    check, check_eq, check_message, check_throws_with, cli, fail_check, given, info, require,
    subcase, test_case_template, then, warn, Approx, Registry, TestCase, TestContext,
};
use std::str::FromStr;

fn parse_port(text: &str) -> u16 {
    match text.parse() {
        Ok(port) => port,
        Err(_) => panic!("invalid port: {}", text),
    }
}

fn round_trips_through_text<T>(ctx: &TestContext)
where
    T: FromStr + ToString + From<u8> + PartialEq,
{
    let value = T::from(42);
    check_message!(
        ctx,
        value.to_string().parse::<T>().ok() == Some(T::from(42)),
        "{} did not survive",
        value.to_string()
    );
}

fn build_registry() -> casework::Result<Registry> {
    let mut registry = Registry::new();

    let mut math = registry.suite("math");
    math.add(TestCase::new("addition", |ctx| {
        check_eq!(ctx, 2 + 2, 4);
        check!(ctx, 0.1_f64 + 0.2 == Approx::new(0.3));
    }))?;
    math.add(
        TestCase::new("off by one", |ctx| {
            check!(ctx, 10 / 3 == 4);
        })
        .expected_failures(1)
        .description("integer division truncates"),
    )?;

    let mut collections = registry.suite("collections");
    collections.add(TestCase::new("vector growth", |ctx| {
        let mut items = vec![1, 2, 3];
        require!(ctx, items.len() == 3);
        subcase!(ctx, "push", {
            items.push(4);
            check_eq!(ctx, items.len(), 4);
            subcase!(ctx, "then clear", {
                items.clear();
                check!(ctx, items.is_empty());
            });
        });
        subcase!(ctx, "pop", {
            info!(ctx, "popping from {:?}", items);
            check_eq!(ctx, items.pop(), Some(3));
        });
    }))?;

    registry.add(TestCase::new("port parsing", |ctx| {
        check_eq!(ctx, parse_port("8080"), 8080);
        check_throws_with!(ctx, parse_port("http"), "invalid port: http");
        warn!(ctx, parse_port("80") > 1024);
    }))?;

    registry.add(TestCase::scenario("ports are parsed strictly", |ctx| {
        given!(ctx, "a numeric port", {
            let text = "443";
            then!(ctx, "it parses", {
                check_eq!(ctx, parse_port(text), 443);
            });
        });
        given!(ctx, "a service name", {
            let text = "https";
            then!(ctx, "parsing panics", {
                check_throws_with!(ctx, parse_port(text), "invalid port: https");
            });
        });
    }))?;

    test_case_template!(registry, "text round trip", round_trips_through_text, [u16, u64, f64])?;

    registry.add(
        TestCase::new("flaky network", |ctx| {
            fail_check!(ctx, "connection reset");
        })
        .may_fail(true),
    )?;

    registry.add(
        TestCase::new("hard crash", |_| {
            std::process::abort();
        })
        .skip(true)
        .description("run with --no-skip to exercise crash reporting"),
    )?;

    Ok(registry)
}

fn main() {
    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(2);
        }
    };
    std::process::exit(cli::run_main(&registry));
}
