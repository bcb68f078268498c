//! Panic containment at test and hook boundaries.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    /// Number of [`catch`] calls active on this thread
    static CONTAINED: Cell<usize> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

/// Payload used to unwind a test body on `fail_now`.
///
/// Raised with `resume_unwind`, so the panic hook never sees it and nothing is
/// printed.
#[derive(Debug)]
pub(crate) struct FailNowSignal;

/// How a guarded closure finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Unwound {
    Completed,
    /// Stopped through `fail_now`
    Aborted,
    Panicked(String),
}

/// Run `f`, converting any unwind into an [`Unwound`] value.
///
/// Panics raised inside `f` are recorded by the caller, so they are logged at
/// debug level instead of going through the default panic output.
pub(crate) fn catch<F: FnOnce()>(f: F) -> Unwound {
    install_quiet_hook();
    let _guard = ContainedGuard::enter();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => Unwound::Completed,
        Err(payload) if payload.is::<FailNowSignal>() => Unwound::Aborted,
        Err(payload) => Unwound::Panicked(panic_message(payload.as_ref())),
    }
}

/// Wrap the process panic hook once. Panics on threads inside [`catch`] are
/// logged; everything else goes to the hook that was installed before.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if is_contained() {
                log::debug!("contained {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

fn is_contained() -> bool {
    CONTAINED.with(|depth| depth.get() > 0)
}

struct ContainedGuard;

impl ContainedGuard {
    fn enter() -> Self {
        CONTAINED.with(|depth| depth.set(depth.get() + 1));
        ContainedGuard
    }
}

impl Drop for ContainedGuard {
    fn drop(&mut self) {
        CONTAINED.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Stop the current test body. Drops on the way out still run.
pub(crate) fn abort() -> ! {
    panic::resume_unwind(Box::new(FailNowSignal))
}

/// Render a panic payload the way `panic!` formatted it.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if payload.is::<FailNowSignal>() {
        "fail_now".to_string()
    } else {
        "non-string panic payload".to_string()
    }
}
