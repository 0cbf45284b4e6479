//! Assertion, message, and scoping macros.
//!
//! Every macro takes the test context as its first argument. Value
//! assertions evaluate to `true` when they passed; `require_*` forms never
//! return on failure.

// ============================================================================
// INTERNAL BUILDING BLOCKS
// ============================================================================

/// Splits `lhs OP rhs` at the first top-level comparison operator and builds
/// an `ExprResult`. Expressions joined by `&&`, `||` or a range stay whole.
///
/// The walk is a single pass over the tokens. Method calls and function
/// calls are taken as one chunk, and every step burns one token of the fuel
/// list, so an expression too long to split within the recursion limit is
/// evaluated whole instead. Turbofish and qualified-path angle brackets are
/// tracked so their `<` and `>` are never taken for comparisons.
///
/// `$env` is `(logs, kind, [whole expression])`.
#[doc(hidden)]
#[macro_export]
macro_rules! __casework_expr {
    // ---- left operand ----
    (@lhs $env:tt [] $lhs:tt $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@lhs $env:tt $fuel:tt $lhs:tt) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@lhs $env:tt $fuel:tt $lhs:tt && $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@lhs $env:tt $fuel:tt $lhs:tt || $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@lhs $env:tt $fuel:tt $lhs:tt .. $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@lhs $env:tt $fuel:tt $lhs:tt ..= $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [] < $($rest:tt)*) => {
        $crate::__casework_expr!(@fish $env [$($fuel)*] [_] [<] $($rest)*)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)*] :: < $($rest:tt)*) => {
        $crate::__casework_expr!(@fish $env [$($fuel)*] [_] [$($lhs)* :: <] $($rest)*)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)+] == $($rest:tt)+) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] (Eq, ==) [$($lhs)+] [] $($rest)+)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)+] != $($rest:tt)+) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] (Ne, !=) [$($lhs)+] [] $($rest)+)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)+] <= $($rest:tt)+) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] (Le, <=) [$($lhs)+] [] $($rest)+)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)+] >= $($rest:tt)+) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] (Ge, >=) [$($lhs)+] [] $($rest)+)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)+] < $($rest:tt)+) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] (Lt, <) [$($lhs)+] [] $($rest)+)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)+] > $($rest:tt)+) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] (Gt, >) [$($lhs)+] [] $($rest)+)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)*] . $m:ident ($($args:tt)*) $($rest:tt)*) => {
        $crate::__casework_expr!(@lhs $env [$($fuel)*] [$($lhs)* . $m ($($args)*)] $($rest)*)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)*] $f:ident ($($args:tt)*) $($rest:tt)*) => {
        $crate::__casework_expr!(@lhs $env [$($fuel)*] [$($lhs)* $f ($($args)*)] $($rest)*)
    };
    (@lhs $env:tt [_ $($fuel:tt)*] [$($lhs:tt)*] $head:tt $($rest:tt)*) => {
        $crate::__casework_expr!(@lhs $env [$($fuel)*] [$($lhs)* $head] $($rest)*)
    };

    // ---- generic arguments; `$depth` holds one `_` per open `<` ----
    (@fish $env:tt [] $depth:tt $lhs:tt $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@fish $env:tt $fuel:tt $depth:tt $lhs:tt) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@fish $env:tt [_ $($fuel:tt)*] [_] [$($lhs:tt)*] > $($rest:tt)*) => {
        $crate::__casework_expr!(@lhs $env [$($fuel)*] [$($lhs)* >] $($rest)*)
    };
    (@fish $env:tt [_ $($fuel:tt)*] [_ $($depth:tt)+] [$($lhs:tt)*] > $($rest:tt)*) => {
        $crate::__casework_expr!(@fish $env [$($fuel)*] [$($depth)+] [$($lhs)* >] $($rest)*)
    };
    (@fish $env:tt [_ $($fuel:tt)*] [_ _] [$($lhs:tt)*] >> $($rest:tt)*) => {
        $crate::__casework_expr!(@lhs $env [$($fuel)*] [$($lhs)* >>] $($rest)*)
    };
    (@fish $env:tt [_ $($fuel:tt)*] [_ _ $($depth:tt)+] [$($lhs:tt)*] >> $($rest:tt)*) => {
        $crate::__casework_expr!(@fish $env [$($fuel)*] [$($depth)+] [$($lhs)* >>] $($rest)*)
    };
    (@fish $env:tt [_ $($fuel:tt)*] [$($depth:tt)*] [$($lhs:tt)*] < $($rest:tt)*) => {
        $crate::__casework_expr!(@fish $env [$($fuel)*] [_ $($depth)*] [$($lhs)* <] $($rest)*)
    };
    (@fish $env:tt [_ $($fuel:tt)*] $depth:tt [$($lhs:tt)*] $head:tt $($rest:tt)*) => {
        $crate::__casework_expr!(@fish $env [$($fuel)*] $depth [$($lhs)* $head] $($rest)*)
    };

    // ---- right operand ----
    (@rhs $env:tt $fuel:tt $op:tt $lhs:tt []) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@rhs $env:tt $fuel:tt $op:tt $lhs:tt $rhs:tt) => {
        $crate::__casework_expr!(@binop $env $op $lhs $rhs)
    };
    (@rhs $env:tt [] $op:tt $lhs:tt $rhs:tt $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@rhs $env:tt $fuel:tt $op:tt $lhs:tt $rhs:tt && $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@rhs $env:tt $fuel:tt $op:tt $lhs:tt $rhs:tt || $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@rhs $env:tt $fuel:tt $op:tt $lhs:tt $rhs:tt .. $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@rhs $env:tt $fuel:tt $op:tt $lhs:tt $rhs:tt ..= $($rest:tt)*) => {
        $crate::__casework_expr!(@whole $env)
    };
    (@rhs $env:tt [_ $($fuel:tt)*] $op:tt $lhs:tt [$($rhs:tt)*] . $m:ident ($($args:tt)*) $($rest:tt)*) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] $op $lhs [$($rhs)* . $m ($($args)*)] $($rest)*)
    };
    (@rhs $env:tt [_ $($fuel:tt)*] $op:tt $lhs:tt [$($rhs:tt)*] $f:ident ($($args:tt)*) $($rest:tt)*) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] $op $lhs [$($rhs)* $f ($($args)*)] $($rest)*)
    };
    (@rhs $env:tt [_ $($fuel:tt)*] $op:tt $lhs:tt [$($rhs:tt)*] $head:tt $($rest:tt)*) => {
        $crate::__casework_expr!(@rhs $env [$($fuel)*] $op $lhs [$($rhs)* $head] $($rest)*)
    };

    // ---- evaluation ----
    (@whole ($logs:ident, $kind:ident, [$($all:tt)+])) => {
        $crate::__casework_expr!(@unary $logs, $kind, $($all)+)
    };

    (@binop ($logs:ident, $kind:ident, $all:tt) ($cmp:ident, $op:tt) [$($lhs:tt)+] [$($rhs:tt)+]) => {{
        let __lhs = &($($lhs)+);
        let __rhs = &($($rhs)+);
        let __passed = (__lhs $op __rhs) != $crate::assertions::AssertKind::$kind.is_false();
        if !__passed || $logs {
            $crate::assertions::ExprResult::comparison(
                __passed,
                $crate::__casework_render!(__lhs),
                $crate::assertions::Comparison::$cmp,
                $crate::__casework_render!(__rhs),
            )
        } else {
            $crate::assertions::ExprResult::new(__passed, "")
        }
    }};

    (@unary $logs:ident, $kind:ident, $($expr:tt)+) => {{
        let __value: bool = { $($expr)+ };
        let __passed = __value != $crate::assertions::AssertKind::$kind.is_false();
        if !__passed || $logs {
            $crate::assertions::ExprResult::new(__passed, $crate::__casework_render!(&__value))
        } else {
            $crate::assertions::ExprResult::new(__passed, "")
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __casework_assert_expr {
    (@fuel [$($fuel:tt)*] $ctx:expr, $sev:ident, $kind:ident, $($expr:tt)+) => {{
        let __ctx: &$crate::TestContext = &$ctx;
        let __assertion = __ctx.assertion(
            $crate::assertions::AssertType::new(
                $crate::assertions::Severity::$sev,
                $crate::assertions::AssertKind::$kind,
            ),
            stringify!($($expr)+),
        );
        let __logs = __ctx.logs_successes();
        let __outcome = $crate::exception::capture(|| {
            $crate::__casework_expr!(@lhs (__logs, $kind, [$($expr)+]) [$($fuel)*] [] $($expr)+)
        });
        __assertion.evaluated(__outcome)
    }};
    ($ctx:expr, $sev:ident, $kind:ident, $($expr:tt)+) => {
        $crate::__casework_assert_expr!(
            @fuel [
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
            ]
            $ctx, $sev, $kind, $($expr)+
        )
    };
}

/// Splits `condition, format args...` at the first top-level comma, then
/// asserts the condition with the message attached as an info scope. Shares
/// the fuel of the expression splitter.
///
/// `$env` is `(ctx, severity, kind, [all arguments])`.
#[doc(hidden)]
#[macro_export]
macro_rules! __casework_assert_message {
    (@split $env:tt $fuel:tt [$($cond:tt)+] , $($msg:tt)+) => {
        $crate::__casework_assert_message!(@emit $env $fuel [$($cond)+] [$($msg)+])
    };
    (@split $env:tt $fuel:tt $cond:tt) => {
        $crate::__casework_assert_message!(@opaque $env)
    };
    (@split $env:tt [] $cond:tt $($rest:tt)*) => {
        $crate::__casework_assert_message!(@opaque $env)
    };
    (@split $env:tt [_ $($fuel:tt)*] [] < $($rest:tt)*) => {
        $crate::__casework_assert_message!(@angle $env [$($fuel)*] [_] [<] $($rest)*)
    };
    (@split $env:tt [_ $($fuel:tt)*] [$($cond:tt)*] :: < $($rest:tt)*) => {
        $crate::__casework_assert_message!(@angle $env [$($fuel)*] [_] [$($cond)* :: <] $($rest)*)
    };
    (@split $env:tt [_ $($fuel:tt)*] [$($cond:tt)*] . $m:ident ($($args:tt)*) $($rest:tt)*) => {
        $crate::__casework_assert_message!(@split $env [$($fuel)*] [$($cond)* . $m ($($args)*)] $($rest)*)
    };
    (@split $env:tt [_ $($fuel:tt)*] [$($cond:tt)*] $f:ident ($($args:tt)*) $($rest:tt)*) => {
        $crate::__casework_assert_message!(@split $env [$($fuel)*] [$($cond)* $f ($($args)*)] $($rest)*)
    };
    (@split $env:tt [_ $($fuel:tt)*] [$($cond:tt)*] $head:tt $($rest:tt)*) => {
        $crate::__casework_assert_message!(@split $env [$($fuel)*] [$($cond)* $head] $($rest)*)
    };

    // Commas between generic arguments do not end the condition.
    (@angle $env:tt [] $depth:tt $cond:tt $($rest:tt)*) => {
        $crate::__casework_assert_message!(@opaque $env)
    };
    (@angle $env:tt $fuel:tt $depth:tt $cond:tt) => {
        $crate::__casework_assert_message!(@opaque $env)
    };
    (@angle $env:tt [_ $($fuel:tt)*] [_] [$($cond:tt)*] > $($rest:tt)*) => {
        $crate::__casework_assert_message!(@split $env [$($fuel)*] [$($cond)* >] $($rest)*)
    };
    (@angle $env:tt [_ $($fuel:tt)*] [_ $($depth:tt)+] [$($cond:tt)*] > $($rest:tt)*) => {
        $crate::__casework_assert_message!(@angle $env [$($fuel)*] [$($depth)+] [$($cond)* >] $($rest)*)
    };
    (@angle $env:tt [_ $($fuel:tt)*] [_ _] [$($cond:tt)*] >> $($rest:tt)*) => {
        $crate::__casework_assert_message!(@split $env [$($fuel)*] [$($cond)* >>] $($rest)*)
    };
    (@angle $env:tt [_ $($fuel:tt)*] [_ _ $($depth:tt)+] [$($cond:tt)*] >> $($rest:tt)*) => {
        $crate::__casework_assert_message!(@angle $env [$($fuel)*] [$($depth)+] [$($cond)* >>] $($rest)*)
    };
    (@angle $env:tt [_ $($fuel:tt)*] [$($depth:tt)*] [$($cond:tt)*] < $($rest:tt)*) => {
        $crate::__casework_assert_message!(@angle $env [$($fuel)*] [_ $($depth)*] [$($cond)* <] $($rest)*)
    };
    (@angle $env:tt [_ $($fuel:tt)*] $depth:tt [$($cond:tt)*] $head:tt $($rest:tt)*) => {
        $crate::__casework_assert_message!(@angle $env [$($fuel)*] $depth [$($cond)* $head] $($rest)*)
    };

    (@emit ($ctx:expr, $sev:ident, $kind:ident, $all:tt) $fuel:tt [$($cond:tt)+] [$($msg:tt)+]) => {{
        let __casework_message = $ctx.info(format!($($msg)+));
        $crate::__casework_assert_expr!(@fuel $fuel $ctx, $sev, $kind, $($cond)+)
    }};
    // Too long to split by tokens: let the parser find the comma and give up
    // on decomposition.
    (@opaque ($ctx:expr, $sev:ident, $kind:ident, [$cond:expr, $($msg:tt)+])) => {{
        let __casework_message = $ctx.info(format!($($msg)+));
        $crate::__casework_assert_expr!(@fuel [] $ctx, $sev, $kind, $cond)
    }};

    ($ctx:expr, $sev:ident, $kind:ident, $($args:tt)+) => {
        $crate::__casework_assert_message!(
            @split ($ctx, $sev, $kind, [$($args)+])
            [
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
                _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _
            ]
            [] $($args)+
        )
    };
}
#[doc(hidden)]
#[macro_export]
macro_rules! __casework_assert_unary {
    ($ctx:expr, $sev:ident, $kind:ident, $value:expr) => {{
        let __ctx: &$crate::TestContext = &$ctx;
        let __assertion = __ctx.assertion(
            $crate::assertions::AssertType::new(
                $crate::assertions::Severity::$sev,
                $crate::assertions::AssertKind::$kind,
            ),
            stringify!($value),
        );
        let __logs = __ctx.logs_successes();
        let __outcome = $crate::exception::capture(|| {
            $crate::__casework_expr!(@unary __logs, $kind, $value)
        });
        __assertion.evaluated(__outcome)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __casework_assert_binary {
    ($ctx:expr, $sev:ident, $kind:ident, $op:tt, $lhs:expr, $rhs:expr) => {{
        let __ctx: &$crate::TestContext = &$ctx;
        let __assertion = __ctx.assertion(
            $crate::assertions::AssertType::new(
                $crate::assertions::Severity::$sev,
                $crate::assertions::AssertKind::$kind,
            ),
            concat!(stringify!($lhs), ", ", stringify!($rhs)),
        );
        let __logs = __ctx.logs_successes();
        let __outcome = $crate::exception::capture(|| {
            let __lhs = &$lhs;
            let __rhs = &$rhs;
            let __passed = __lhs $op __rhs;
            if !__passed || __logs {
                $crate::assertions::ExprResult::binary(
                    __passed,
                    $crate::__casework_render!(__lhs),
                    $crate::__casework_render!(__rhs),
                )
            } else {
                $crate::assertions::ExprResult::new(__passed, "")
            }
        });
        __assertion.evaluated(__outcome)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __casework_assert_throws {
    (@run $ctx:expr, $sev:ident, $kind:ident, $expr:expr, |$p:pat_param| $matches:expr, |$a:ident| $expect:expr) => {{
        let __ctx: &$crate::TestContext = &$ctx;
        if __ctx.options().no_throw {
            true
        } else {
            let $a = __ctx.assertion(
                $crate::assertions::AssertType::new(
                    $crate::assertions::Severity::$sev,
                    $crate::assertions::AssertKind::$kind,
                ),
                stringify!($expr),
            );
            let __assertion = $expect;
            let __outcome = $crate::exception::capture(|| {
                let _ = $expr;
            });
            __assertion.thrown(__outcome, |$p: &(dyn ::std::any::Any + Send)| $matches)
        }
    }};
    ($ctx:expr, $sev:ident, Throws, $expr:expr) => {
        $crate::__casework_assert_throws!(@run $ctx, $sev, Throws, $expr, |_| false, |a| a)
    };
    ($ctx:expr, $sev:ident, NoThrow, $expr:expr) => {
        $crate::__casework_assert_throws!(@run $ctx, $sev, NoThrow, $expr, |_| false, |a| a)
    };
    ($ctx:expr, $sev:ident, ThrowsAs, $expr:expr, $ty:ty) => {
        $crate::__casework_assert_throws!(
            @run $ctx, $sev, ThrowsAs, $expr,
            |p| p.is::<$ty>(),
            |a| a.expected_type(stringify!($ty))
        )
    };
    ($ctx:expr, $sev:ident, ThrowsWith, $expr:expr, $msg:expr) => {
        $crate::__casework_assert_throws!(
            @run $ctx, $sev, ThrowsWith, $expr,
            |_| false,
            |a| a.expected_message($msg)
        )
    };
    ($ctx:expr, $sev:ident, ThrowsWithAs, $expr:expr, $msg:expr, $ty:ty) => {
        $crate::__casework_assert_throws!(
            @run $ctx, $sev, ThrowsWithAs, $expr,
            |p| p.is::<$ty>(),
            |a| a.expected_message($msg).expected_type(stringify!($ty))
        )
    };
}

// ============================================================================
// VALUE ASSERTIONS
// ============================================================================

/// Reports a warning when the expression is false. Never fails the test.
#[macro_export]
macro_rules! warn {
    ($ctx:expr, $($expr:tt)+) => { $crate::__casework_assert_expr!($ctx, Warn, Normal, $($expr)+) };
}

/// Fails the test case when the expression is false.
///
/// A top-level `==`, `!=`, `<`, `>`, `<=` or `>=` is decomposed so both
/// operands are shown on failure:
///
/// ```ignore
/// check!(ctx, parse("12") == 12);
/// check!(ctx, items.iter().filter(|i| i.done).count() > 2);
/// ```
#[macro_export]
macro_rules! check {
    ($ctx:expr, $($expr:tt)+) => { $crate::__casework_assert_expr!($ctx, Check, Normal, $($expr)+) };
}

/// Like `check!` but also aborts the current invocation of the test body.
#[macro_export]
macro_rules! require {
    ($ctx:expr, $($expr:tt)+) => { $crate::__casework_assert_expr!($ctx, Require, Normal, $($expr)+) };
}

#[macro_export]
macro_rules! warn_false {
    ($ctx:expr, $($expr:tt)+) => { $crate::__casework_assert_expr!($ctx, Warn, False, $($expr)+) };
}

#[macro_export]
macro_rules! check_false {
    ($ctx:expr, $($expr:tt)+) => { $crate::__casework_assert_expr!($ctx, Check, False, $($expr)+) };
}

#[macro_export]
macro_rules! require_false {
    ($ctx:expr, $($expr:tt)+) => { $crate::__casework_assert_expr!($ctx, Require, False, $($expr)+) };
}

#[macro_export]
macro_rules! warn_unary {
    ($ctx:expr, $value:expr $(,)?) => { $crate::__casework_assert_unary!($ctx, Warn, Unary, $value) };
}

#[macro_export]
macro_rules! check_unary {
    ($ctx:expr, $value:expr $(,)?) => { $crate::__casework_assert_unary!($ctx, Check, Unary, $value) };
}

#[macro_export]
macro_rules! require_unary {
    ($ctx:expr, $value:expr $(,)?) => { $crate::__casework_assert_unary!($ctx, Require, Unary, $value) };
}

#[macro_export]
macro_rules! warn_unary_false {
    ($ctx:expr, $value:expr $(,)?) => { $crate::__casework_assert_unary!($ctx, Warn, UnaryFalse, $value) };
}

#[macro_export]
macro_rules! check_unary_false {
    ($ctx:expr, $value:expr $(,)?) => { $crate::__casework_assert_unary!($ctx, Check, UnaryFalse, $value) };
}

#[macro_export]
macro_rules! require_unary_false {
    ($ctx:expr, $value:expr $(,)?) => { $crate::__casework_assert_unary!($ctx, Require, UnaryFalse, $value) };
}

// ============================================================================
// ASSERTIONS WITH A MESSAGE
// ============================================================================

/// `warn!` with a formatted message attached to the result.
#[macro_export]
macro_rules! warn_message {
    ($ctx:expr, $($args:tt)+) => { $crate::__casework_assert_message!($ctx, Warn, Normal, $($args)+) };
}

/// `check!` with a formatted message attached to the result:
///
/// ```ignore
/// check_message!(ctx, user.age >= 18, "user {} is a minor", user.name);
/// ```
#[macro_export]
macro_rules! check_message {
    ($ctx:expr, $($args:tt)+) => { $crate::__casework_assert_message!($ctx, Check, Normal, $($args)+) };
}

#[macro_export]
macro_rules! require_message {
    ($ctx:expr, $($args:tt)+) => { $crate::__casework_assert_message!($ctx, Require, Normal, $($args)+) };
}

#[macro_export]
macro_rules! warn_false_message {
    ($ctx:expr, $($args:tt)+) => { $crate::__casework_assert_message!($ctx, Warn, False, $($args)+) };
}

#[macro_export]
macro_rules! check_false_message {
    ($ctx:expr, $($args:tt)+) => { $crate::__casework_assert_message!($ctx, Check, False, $($args)+) };
}

#[macro_export]
macro_rules! require_false_message {
    ($ctx:expr, $($args:tt)+) => { $crate::__casework_assert_message!($ctx, Require, False, $($args)+) };
}

// ============================================================================
// BINARY ASSERTIONS
// ============================================================================

#[macro_export]
macro_rules! warn_eq {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Warn, Eq, ==, $lhs, $rhs) };
}

#[macro_export]
macro_rules! check_eq {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Check, Eq, ==, $lhs, $rhs) };
}

#[macro_export]
macro_rules! require_eq {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Require, Eq, ==, $lhs, $rhs) };
}

#[macro_export]
macro_rules! warn_ne {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Warn, Ne, !=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! check_ne {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Check, Ne, !=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! require_ne {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Require, Ne, !=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! warn_gt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Warn, Gt, >, $lhs, $rhs) };
}

#[macro_export]
macro_rules! check_gt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Check, Gt, >, $lhs, $rhs) };
}

#[macro_export]
macro_rules! require_gt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Require, Gt, >, $lhs, $rhs) };
}

#[macro_export]
macro_rules! warn_lt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Warn, Lt, <, $lhs, $rhs) };
}

#[macro_export]
macro_rules! check_lt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Check, Lt, <, $lhs, $rhs) };
}

#[macro_export]
macro_rules! require_lt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Require, Lt, <, $lhs, $rhs) };
}

#[macro_export]
macro_rules! warn_ge {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Warn, Ge, >=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! check_ge {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Check, Ge, >=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! require_ge {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Require, Ge, >=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! warn_le {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Warn, Le, <=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! check_le {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Check, Le, <=, $lhs, $rhs) };
}

#[macro_export]
macro_rules! require_le {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => { $crate::__casework_assert_binary!($ctx, Require, Le, <=, $lhs, $rhs) };
}

// ============================================================================
// PANIC ASSERTIONS
// ============================================================================

/// Passes when evaluating the expression panics.
#[macro_export]
macro_rules! warn_throws {
    ($ctx:expr, $expr:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Warn, Throws, $expr) };
}

#[macro_export]
macro_rules! check_throws {
    ($ctx:expr, $expr:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Check, Throws, $expr) };
}

#[macro_export]
macro_rules! require_throws {
    ($ctx:expr, $expr:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Require, Throws, $expr) };
}

/// Passes when the expression panics with a payload of type `$ty`.
#[macro_export]
macro_rules! warn_throws_as {
    ($ctx:expr, $expr:expr, $ty:ty $(,)?) => { $crate::__casework_assert_throws!($ctx, Warn, ThrowsAs, $expr, $ty) };
}

#[macro_export]
macro_rules! check_throws_as {
    ($ctx:expr, $expr:expr, $ty:ty $(,)?) => { $crate::__casework_assert_throws!($ctx, Check, ThrowsAs, $expr, $ty) };
}

#[macro_export]
macro_rules! require_throws_as {
    ($ctx:expr, $expr:expr, $ty:ty $(,)?) => { $crate::__casework_assert_throws!($ctx, Require, ThrowsAs, $expr, $ty) };
}

/// Passes when the expression panics and the translated message equals `$msg`.
#[macro_export]
macro_rules! warn_throws_with {
    ($ctx:expr, $expr:expr, $msg:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Warn, ThrowsWith, $expr, $msg) };
}

#[macro_export]
macro_rules! check_throws_with {
    ($ctx:expr, $expr:expr, $msg:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Check, ThrowsWith, $expr, $msg) };
}

#[macro_export]
macro_rules! require_throws_with {
    ($ctx:expr, $expr:expr, $msg:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Require, ThrowsWith, $expr, $msg) };
}

#[macro_export]
macro_rules! warn_throws_with_as {
    ($ctx:expr, $expr:expr, $msg:expr, $ty:ty $(,)?) => { $crate::__casework_assert_throws!($ctx, Warn, ThrowsWithAs, $expr, $msg, $ty) };
}

#[macro_export]
macro_rules! check_throws_with_as {
    ($ctx:expr, $expr:expr, $msg:expr, $ty:ty $(,)?) => { $crate::__casework_assert_throws!($ctx, Check, ThrowsWithAs, $expr, $msg, $ty) };
}

#[macro_export]
macro_rules! require_throws_with_as {
    ($ctx:expr, $expr:expr, $msg:expr, $ty:ty $(,)?) => { $crate::__casework_assert_throws!($ctx, Require, ThrowsWithAs, $expr, $msg, $ty) };
}

#[macro_export]
macro_rules! warn_nothrow {
    ($ctx:expr, $expr:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Warn, NoThrow, $expr) };
}

#[macro_export]
macro_rules! check_nothrow {
    ($ctx:expr, $expr:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Check, NoThrow, $expr) };
}

#[macro_export]
macro_rules! require_nothrow {
    ($ctx:expr, $expr:expr $(,)?) => { $crate::__casework_assert_throws!($ctx, Require, NoThrow, $expr) };
}

// ============================================================================
// MESSAGES AND SCOPES
// ============================================================================

/// Logs a message without affecting the outcome.
#[macro_export]
macro_rules! message {
    ($ctx:expr, $($arg:tt)+) => { $ctx.message($crate::assertions::Severity::Warn, format!($($arg)+)) };
}

/// Logs a message and counts it as a failed check.
#[macro_export]
macro_rules! fail_check {
    ($ctx:expr, $($arg:tt)+) => { $ctx.message($crate::assertions::Severity::Check, format!($($arg)+)) };
}

/// Logs a message, fails the test case, and aborts the current invocation.
#[macro_export]
macro_rules! fail {
    ($ctx:expr, $($arg:tt)+) => { $ctx.message($crate::assertions::Severity::Require, format!($($arg)+)) };
}

/// Attaches a message to every assertion logged until the end of the
/// enclosing block.
#[macro_export]
macro_rules! info {
    ($ctx:expr, $($arg:tt)+) => {
        let __casework_info = $ctx.info(format!($($arg)+));
    };
}

/// Attaches `name := value` for each expression until the end of the
/// enclosing block.
#[macro_export]
macro_rules! capture {
    ($ctx:expr, $($value:expr),+ $(,)?) => {
        $(
            let __casework_capture = $ctx.info(format!(
                "{} := {}",
                stringify!($value),
                $crate::__casework_render!(&$value),
            ));
        )+
    };
}

/// Runs `$body` as a subcase of the current test case.
#[macro_export]
macro_rules! subcase {
    ($ctx:expr, $name:expr, $body:block) => {
        if let Some(_subcase) = $ctx.subcase($name) $body
    };
}

// ============================================================================
// BDD STEPS
// ============================================================================

/// A `given` step of a scenario. Steps are subcases with a prefixed name.
#[macro_export]
macro_rules! given {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::subcase!($ctx, format!("   Given: {}", $name), $body)
    };
}

#[macro_export]
macro_rules! when {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::subcase!($ctx, format!("    When: {}", $name), $body)
    };
}

#[macro_export]
macro_rules! and_when {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::subcase!($ctx, format!("And when: {}", $name), $body)
    };
}

#[macro_export]
macro_rules! then {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::subcase!($ctx, format!("    Then: {}", $name), $body)
    };
}

#[macro_export]
macro_rules! and_then {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::subcase!($ctx, format!("     And: {}", $name), $body)
    };
}
