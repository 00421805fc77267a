//! # Cancellation
//!
//! A [`CancelToken`] is the single cancellation signal shared by every worker of
//! a command. Workers poll it at query boundaries; long-running child processes
//! (fetches) are killed when it trips.
//!
//! [`InterruptGuard`] is the scoped resource that turns an external interrupt
//! (SIGINT on unix) into that signal. While it is alive it owns the process
//! SIGINT disposition and hides the terminal cursor for interactive feedback.
//! Both are restored exactly once: on `restore()`, on drop, or during unwinding
//! after a panic. Calling `restore()` more than once is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};

/// Set from the signal handler. Only async-signal-safe operations touch it.
static SIGNALLED: AtomicBool = AtomicBool::new(false);

/// Shared cancellation flag. Cheap to clone; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    follow_signal: bool,
}

impl CancelToken {
    /// A token that only trips when [`CancelToken::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    fn following_signal() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            follow_signal: true,
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || (self.follow_signal && SIGNALLED.load(Ordering::SeqCst))
    }

    /// Returns `Err(Error::Cancelled)` once the token has tripped.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(unix)]
extern "C" fn handle_sigint(_sig: i32) {
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Scoped ownership of SIGINT handling and cursor visibility.
pub struct InterruptGuard {
    #[cfg(unix)]
    previous: Option<nix::sys::signal::SigAction>,
    cursor_hidden: bool,
    restored: bool,
}

impl InterruptGuard {
    /// Install the SIGINT handler and return the guard with a token that
    /// follows it. When `feedback` is set and stderr is a terminal, the cursor
    /// is hidden until the guard is restored.
    pub fn install(feedback: bool) -> (Self, CancelToken) {
        SIGNALLED.store(false, Ordering::SeqCst);

        #[cfg(unix)]
        let previous = {
            use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
            let action = SigAction::new(
                SigHandler::Handler(handle_sigint),
                SaFlags::SA_RESTART,
                SigSet::empty(),
            );
            // SAFETY: the handler only stores to an atomic.
            unsafe { signal::sigaction(Signal::SIGINT, &action) }.ok()
        };

        let term = console::Term::stderr();
        let cursor_hidden = feedback && term.is_term() && term.hide_cursor().is_ok();

        debug!("interrupt guard installed (cursor hidden: {})", cursor_hidden);
        let guard = Self {
            #[cfg(unix)]
            previous,
            cursor_hidden,
            restored: false,
        };
        (guard, CancelToken::following_signal())
    }

    /// Whether an interrupt arrived while the guard was installed.
    pub fn interrupted(&self) -> bool {
        SIGNALLED.load(Ordering::SeqCst)
    }

    /// Restore the previous SIGINT disposition and the cursor. Idempotent.
    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        #[cfg(unix)]
        if let Some(previous) = self.previous.take() {
            // SAFETY: reinstates the disposition that was active before install.
            let _ = unsafe { nix::sys::signal::sigaction(nix::sys::signal::Signal::SIGINT, &previous) };
        }

        if self.cursor_hidden {
            let _ = console::Term::stderr().show_cursor();
            self.cursor_hidden = false;
        }
        debug!("interrupt guard restored");
    }

    /// Restore, then re-deliver the interrupt to the process if one arrived so
    /// the previous disposition (usually termination) takes effect.
    pub fn restore_and_reraise(mut self) {
        let interrupted = self.interrupted();
        self.restore();
        #[cfg(unix)]
        if interrupted {
            let _ = nix::sys::signal::raise(nix::sys::signal::Signal::SIGINT);
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
