//! Hop from a background thread onto the owner thread.
//!
//! Bridge state belongs to the host's main thread. A background thread that needs
//! something done there posts a callback; the owner thread runs it on its next
//! [`MainThreadDispatcher::run_pending`]. Only one callback is held: posting again before
//! it ran replaces it (last write wins).
//!
//! # Examples
//!
//! ```rust
//! use std::sync::{atomic::{AtomicU32, Ordering}, Arc};
//! use dotbridge::{diagnostics::DiagnosticSink, dispatch::MainThreadDispatcher};
//!
//! let dispatcher = MainThreadDispatcher::new(DiagnosticSink::silent());
//! let hits = Arc::new(AtomicU32::new(0));
//!
//! let first = hits.clone();
//! dispatcher.post(move || { first.fetch_add(1, Ordering::SeqCst); });
//! let second = hits.clone();
//! assert!(dispatcher.post(move || { second.fetch_add(10, Ordering::SeqCst); }));
//!
//! assert!(dispatcher.run_pending());
//! assert_eq!(hits.load(Ordering::SeqCst), 10);
//! ```

use std::sync::Mutex;

use crate::diagnostics::{DiagnosticCategory, DiagnosticSink};

type Callback = Box<dyn FnOnce() + Send>;

/// Single-slot callback mailbox for the owner thread.
pub struct MainThreadDispatcher {
    pending: Mutex<Option<Callback>>,
    diagnostics: DiagnosticSink,
}

impl MainThreadDispatcher {
    /// Create an empty dispatcher
    pub fn new(diagnostics: DiagnosticSink) -> Self {
        MainThreadDispatcher {
            pending: Mutex::new(None),
            diagnostics,
        }
    }

    /// Queue `callback` for the owner thread. Safe to call from any thread.
    ///
    /// Returns `true` if a callback that had not run yet was replaced.
    pub fn post<F>(&self, callback: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let replaced = lock!(self.pending).replace(Box::new(callback)).is_some();
        if replaced {
            self.diagnostics.info(
                DiagnosticCategory::Dispatch,
                "pending main-thread callback replaced before it ran",
            );
        }
        replaced
    }

    /// Run the pending callback, if any. Call from the owner thread only.
    ///
    /// The callback runs after the slot is released, so it may post again.
    pub fn run_pending(&self) -> bool {
        let callback = lock!(self.pending).take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Whether a callback is waiting
    pub fn has_pending(&self) -> bool {
        lock!(self.pending).is_some()
    }
}
