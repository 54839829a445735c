//! Navigation history.
//!
//! Screens finish by returning to wherever the user came from. They only
//! need [`Navigator::previous_state`]; [`History`] is the in-process
//! implementation the CLI and tests use.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Return-to-previous-context hook used by every screen.
pub trait Navigator: Send + Sync {
    /// Go back to the previous navigation context.
    fn previous_state(&self);
}

/// A stack of visited paths.
#[derive(Debug, Default)]
pub struct History {
    inner: Mutex<HistoryInner>,
}

#[derive(Debug, Default)]
struct HistoryInner {
    entries: Vec<String>,
    backs: usize,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit to `path`.
    pub fn push(&self, path: impl Into<String>) {
        self.lock().entries.push(path.into());
    }

    /// The path currently on top of the stack.
    pub fn current(&self) -> Option<String> {
        self.lock().entries.last().cloned()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no path has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// How many times `previous_state` has been called.
    pub fn back_count(&self) -> usize {
        self.lock().backs
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for History {
    fn previous_state(&self) {
        let mut inner = self.lock();
        inner.backs += 1;
        let left = inner.entries.pop();
        debug!(
            "navigating back from {}",
            left.as_deref().unwrap_or("<start>")
        );
    }
}
