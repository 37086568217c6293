//! Cooperative shutdown on SIGINT/SIGTERM: the handler only flips a flag,
//! workers poll it at safe points (between frames, between chunk reads).

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static INSTALLED: AtomicBool = AtomicBool::new(false);

pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// The control surface's `stop()` goes through the same flag a signal
/// would set.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Re-arms the flag for a fresh `start()` after a stop or restart.
pub fn clear_shutdown() {
    SHUTDOWN.store(false, Ordering::SeqCst);
}

#[cfg(unix)]
extern "C" fn handle_signal(_signum: nix::libc::c_int) {
    // Async-signal-safe: a single atomic store and nothing else.
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Installs the handlers once per process; later calls are no-ops.
#[cfg(unix)]
pub fn install_handlers() -> anyhow::Result<()> {
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    let action = SigAction::new(
        SigHandler::Handler(handle_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signum in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler is async-signal-safe (atomic store only) and
        // lives for the whole process.
        unsafe { signal::sigaction(signum, &action) }?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn install_handlers() -> anyhow::Result<()> {
    INSTALLED.store(true, Ordering::SeqCst);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_clear_round_trip() {
        clear_shutdown();
        assert!(!shutdown_requested());
        request_shutdown();
        assert!(shutdown_requested());
        clear_shutdown();
        assert!(!shutdown_requested());
    }

    #[test]
    fn install_is_idempotent() {
        install_handlers().unwrap();
        install_handlers().unwrap();
    }
}
