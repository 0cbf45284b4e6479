//! Fatal signal guard.
//!
//! While a [`FatalGuard`] is alive, a crash signal (segmentation fault,
//! illegal instruction, abort, ...) is turned into a `test_case_exception`
//! with `is_crash` set, followed by the closing events of the test case and of
//! the run, so every reporter finishes its output. The previous handlers are
//! then restored and the signal is raised again, so the process still dies
//! from it.
//!
//! Only one context can be active at a time. On platforms without POSIX
//! signals the guard only tracks the active context.

use crate::context::TestContext;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

static ACTIVE: AtomicPtr<TestContext> = AtomicPtr::new(ptr::null_mut());

/// Routes fatal signals to `ctx` until dropped.
pub(crate) struct FatalGuard<'a> {
    ctx: &'a TestContext,
}

impl<'a> FatalGuard<'a> {
    pub(crate) fn install(ctx: &'a TestContext) -> Self {
        ACTIVE.store(ctx as *const TestContext as *mut TestContext, Ordering::SeqCst);
        backend::install();
        Self { ctx }
    }
}

impl Drop for FatalGuard<'_> {
    fn drop(&mut self) {
        backend::uninstall();
        let ours = self.ctx as *const TestContext as *mut TestContext;
        let _ = ACTIVE.compare_exchange(ours, ptr::null_mut(), Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Hands the crash to the active context, at most once.
fn report(description: &str) {
    let ctx = ACTIVE.swap(ptr::null_mut(), Ordering::SeqCst);
    // SAFETY: ACTIVE only holds a context borrowed by a live guard; the guard
    // clears it before the borrow ends.
    if let Some(ctx) = unsafe { ctx.as_ref() } {
        ctx.report_fatal(description);
    }
}

#[cfg(unix)]
mod backend {
    use libc::c_int;
    use std::sync::atomic::{AtomicPtr, Ordering};
    use std::sync::{Mutex, PoisonError};
    use std::{mem, ptr};

    pub(super) const SIGNALS: [(c_int, &str); 6] = [
        (libc::SIGINT, "SIGINT - Terminal interrupt signal"),
        (libc::SIGILL, "SIGILL - Illegal instruction signal"),
        (libc::SIGFPE, "SIGFPE - Floating point error signal"),
        (libc::SIGSEGV, "SIGSEGV - Segmentation violation signal"),
        (libc::SIGTERM, "SIGTERM - Termination request signal"),
        (libc::SIGABRT, "SIGABRT - Abort (abnormal termination) signal"),
    ];

    const ALT_STACK_SIZE: usize = 128 * 1024;

    struct Installed {
        old_actions: [libc::sigaction; SIGNALS.len()],
        old_stack: libc::stack_t,
        _alt_stack: Vec<u8>,
    }

    static INSTALLED: AtomicPtr<Installed> = AtomicPtr::new(ptr::null_mut());
    /// Number of live guards.
    static GUARDS: Mutex<usize> = Mutex::new(0);

    pub(super) fn install() {
        let mut guards = GUARDS.lock().unwrap_or_else(PoisonError::into_inner);
        *guards += 1;
        if *guards > 1 {
            return;
        }

        let mut alt_stack = vec![0u8; ALT_STACK_SIZE];
        // SAFETY: plain-data libc structs are valid when zeroed; the alternate
        // stack buffer lives in `Installed` until the handlers are restored.
        unsafe {
            let mut installed = Box::new(Installed {
                old_actions: mem::zeroed(),
                old_stack: mem::zeroed(),
                _alt_stack: Vec::new(),
            });
            let stack = libc::stack_t {
                ss_sp: alt_stack.as_mut_ptr().cast(),
                ss_flags: 0,
                ss_size: ALT_STACK_SIZE,
            };
            libc::sigaltstack(&stack, &mut installed.old_stack);

            let mut action: libc::sigaction = mem::zeroed();
            action.sa_sigaction = handle_signal as extern "C" fn(c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_ONSTACK;
            libc::sigemptyset(&mut action.sa_mask);
            for (slot, (signal, _)) in installed.old_actions.iter_mut().zip(SIGNALS) {
                libc::sigaction(signal, &action, slot);
            }

            installed._alt_stack = alt_stack;
            INSTALLED.store(Box::into_raw(installed), Ordering::SeqCst);
        }
    }

    pub(super) fn uninstall() {
        let mut guards = GUARDS.lock().unwrap_or_else(PoisonError::into_inner);
        *guards = guards.saturating_sub(1);
        if *guards > 0 {
            return;
        }
        let installed = INSTALLED.swap(ptr::null_mut(), Ordering::SeqCst);
        if !installed.is_null() {
            // SAFETY: the pointer came from Box::into_raw and was swapped out,
            // so nothing else can reach it.
            let installed = unsafe { Box::from_raw(installed) };
            restore(&installed);
        }
    }

    fn restore(installed: &Installed) {
        // SAFETY: restoring actions and the stack saved by `install`.
        unsafe {
            for (old, (signal, _)) in installed.old_actions.iter().zip(SIGNALS) {
                libc::sigaction(signal, old, ptr::null_mut());
            }
            libc::sigaltstack(&installed.old_stack, ptr::null_mut());
        }
    }

    pub(super) fn describe(signal: c_int) -> &'static str {
        SIGNALS
            .iter()
            .find(|(known, _)| *known == signal)
            .map(|(_, name)| *name)
            .unwrap_or("unknown signal")
    }

    extern "C" fn handle_signal(signal: c_int) {
        let installed = INSTALLED.swap(ptr::null_mut(), Ordering::SeqCst);
        // The handler may be running on the alternate stack, so the
        // allocation is leaked rather than freed here.
        // SAFETY: see `uninstall`.
        if let Some(installed) = unsafe { installed.as_ref() } {
            restore(installed);
        }
        super::report(describe(signal));
        // SAFETY: the previous disposition is back in place.
        unsafe {
            libc::raise(signal);
        }
    }
}

#[cfg(not(unix))]
mod backend {
    pub(super) fn install() {}
    pub(super) fn uninstall() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::exception::Translators;
    use crate::reporters::ReporterSet;

    fn context() -> TestContext {
        TestContext::new(RunOptions::default(), ReporterSet::new(), Translators::new())
    }

    #[test]
    fn dropping_the_guard_forgets_the_context() {
        let ctx = context();
        drop(FatalGuard::install(&ctx));
        assert_ne!(ACTIVE.load(Ordering::SeqCst) as *const TestContext, &ctx as *const _);
    }

    #[test]
    fn nested_guards_keep_handlers_until_the_last_drop() {
        let (a, b) = (context(), context());
        let outer = FatalGuard::install(&a);
        let inner = FatalGuard::install(&b);
        drop(inner);
        drop(outer);
        assert_ne!(ACTIVE.load(Ordering::SeqCst) as *const TestContext, &a as *const _);
    }

    #[cfg(unix)]
    #[test]
    fn signals_have_descriptive_names() {
        assert_eq!(
            backend::describe(libc::SIGSEGV),
            "SIGSEGV - Segmentation violation signal"
        );
        assert_eq!(
            backend::describe(libc::SIGABRT),
            "SIGABRT - Abort (abnormal termination) signal"
        );
        assert_eq!(backend::describe(12345), "unknown signal");
    }
}
