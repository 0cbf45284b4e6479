//! Panics as test exceptions.
//!
//! A panic escaping a test body (or an assertion operand) is the analogue of
//! an uncaught exception: it is caught, translated into text, and reported.
//! Aborting an invocation after a failed `require` also unwinds, but with a
//! private [`TestFailure`] payload that is never reported as an exception.

use once_cell::sync::Lazy;
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

/// A caught panic payload.
pub type Payload = Box<dyn Any + Send + 'static>;

/// Unwind payload used to abort the current invocation after a fatal
/// assertion failure.
#[derive(Debug, Clone, Copy)]
pub struct TestFailure;

pub fn is_test_failure(payload: &(dyn Any + Send)) -> bool {
    payload.is::<TestFailure>()
}

/// Unwinds out of the running test body.
pub(crate) fn abort_invocation() -> ! {
    panic::resume_unwind(Box::new(TestFailure))
}

/// Runs `f`, returning the payload if it panicked. Aborts raised by failed
/// fatal assertions inside `f` keep unwinding.
pub fn capture<R>(f: impl FnOnce() -> R) -> Result<R, Payload> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) if is_test_failure(&*payload) => panic::resume_unwind(payload),
        Err(payload) => Err(payload),
    }
}

// ============================================================================
// TRANSLATORS
// ============================================================================

/// Turns a panic payload into a message, if it knows the payload's type.
pub trait Translator: Send + Sync {
    fn translate(&self, payload: &(dyn Any + Send)) -> Option<String>;
}

struct TypedTranslator<T, F> {
    convert: F,
    _marker: std::marker::PhantomData<fn(&T)>,
}

impl<T, F> Translator for TypedTranslator<T, F>
where
    T: Any,
    F: Fn(&T) -> String + Send + Sync,
{
    fn translate(&self, payload: &(dyn Any + Send)) -> Option<String> {
        payload.downcast_ref::<T>().map(&self.convert)
    }
}

/// Builds a translator for payloads of type `T`.
pub fn translator_for<T, F>(convert: F) -> Box<dyn Translator>
where
    T: Any,
    F: Fn(&T) -> String + Send + Sync + 'static,
{
    Box::new(TypedTranslator {
        convert,
        _marker: std::marker::PhantomData,
    })
}

/// Translation chain: registered translators in order, then the built-in
/// string payloads, then `"unknown exception"`.
#[derive(Default)]
pub struct Translators {
    chain: Vec<Box<dyn Translator>>,
}

impl Translators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, translator: Box<dyn Translator>) {
        self.chain.push(translator);
    }

    pub fn translate(&self, payload: &(dyn Any + Send)) -> String {
        if let Some(text) = self.chain.iter().find_map(|t| t.translate(payload)) {
            return text;
        }
        if let Some(text) = payload.downcast_ref::<&'static str>() {
            return (*text).to_string();
        }
        if let Some(text) = payload.downcast_ref::<String>() {
            return text.clone();
        }
        "unknown exception".to_string()
    }
}

// ============================================================================
// PANIC HOOK
// ============================================================================

thread_local! {
    static IN_TEST_BODY: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if !IN_TEST_BODY.with(Cell::get) {
            previous(info);
        }
    }));
});

/// Silences the default panic message for panics raised inside test bodies;
/// they are reported through the reporters instead.
pub(crate) fn install_quiet_hook() {
    Lazy::force(&QUIET_HOOK);
}

/// Runs a test body with panic output suppressed on this thread.
pub(crate) fn run_body(f: impl FnOnce()) -> Result<(), Payload> {
    struct Restore(bool);
    impl Drop for Restore {
        fn drop(&mut self) {
            IN_TEST_BODY.with(|flag| flag.set(self.0));
        }
    }

    let _restore = Restore(IN_TEST_BODY.with(|flag| flag.replace(true)));
    panic::catch_unwind(AssertUnwindSafe(f))
}
