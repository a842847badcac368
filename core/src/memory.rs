//! Scoped tensor-resource management.
//!
//! Tensor lifetimes are organized as a tree of named scopes. Each loaded
//! model owns a root [`MemoryManager`]; every predictor derives a sub-manager
//! from it, and every inference call derives a short-lived sub-manager from
//! the predictor's. Closing a manager closes its whole subtree; closing a
//! child never affects the parent or siblings.

use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::error::{DlrError, Result};

/// A named, hierarchical allocation scope for tensors.
///
/// Managers are cheap handles around shared state; cloning the handle does
/// not create a new scope. A closed manager refuses new sub-managers and new
/// registrations, and [`MemoryManager::close`] is idempotent.
#[derive(Clone)]
pub struct MemoryManager {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    name: String,
    parent: Option<Weak<Inner>>,
    state: Mutex<State>,
}

#[derive(Default, Debug)]
struct State {
    closed: bool,
    live: usize,
    children: Vec<Weak<Inner>>,
}

/// Registration token for one tensor allocated under a manager.
///
/// Dropping the token releases the registration; the manager's live count
/// drops with it.
#[derive(Debug)]
pub struct Allocation {
    inner: Arc<Inner>,
}

impl MemoryManager {
    /// Create a new root manager.
    pub fn new_root(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                parent: None,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Derive a named sub-manager nested under this one.
    ///
    /// # Errors
    ///
    /// Returns a closed-resource error if this manager is already closed.
    pub fn sub_manager(&self, name: impl Into<String>) -> Result<MemoryManager> {
        let child = Arc::new(Inner {
            name: name.into(),
            parent: Some(Arc::downgrade(&self.inner)),
            state: Mutex::new(State::default()),
        });

        let mut state = self.inner.lock_state();
        if state.closed {
            return Err(DlrError::closed(format!(
                "manager '{}' is closed",
                self.inner.path()
            )));
        }
        state.children.push(Arc::downgrade(&child));
        Ok(MemoryManager { inner: child })
    }

    /// Register one allocation under this manager.
    ///
    /// # Errors
    ///
    /// Returns a closed-resource error if this manager is already closed.
    pub fn register(&self) -> Result<Allocation> {
        let mut state = self.inner.lock_state();
        if state.closed {
            return Err(DlrError::closed(format!(
                "manager '{}' is closed",
                self.inner.path()
            )));
        }
        state.live += 1;
        Ok(Allocation {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Count live registrations in this manager's subtree.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }

    /// Whether this manager is still open.
    pub fn is_open(&self) -> bool {
        !self.inner.lock_state().closed
    }

    /// The name this manager was created with.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Slash-separated scope path from the root, for diagnostics.
    pub fn path(&self) -> String {
        self.inner.path()
    }

    /// Close this manager and, recursively, every sub-manager under it.
    ///
    /// Idempotent. Registrations held by live tensors stay counted until
    /// those tensors drop; no new registrations are accepted afterwards.
    pub fn close(&self) {
        self.inner.close();
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        // Lock poisoning only happens if a holder panicked; the state itself
        // stays coherent, so keep going with it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn path(&self) -> String {
        match self.parent.as_ref().and_then(Weak::upgrade) {
            Some(parent) => format!("{}/{}", parent.path(), self.name),
            None => self.name.clone(),
        }
    }

    fn outstanding(&self) -> usize {
        let (live, children) = {
            let state = self.lock_state();
            (state.live, state.children.clone())
        };
        live + children
            .iter()
            .filter_map(Weak::upgrade)
            .map(|child| child.outstanding())
            .sum::<usize>()
    }

    fn close(&self) {
        let children = {
            let mut state = self.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.children)
        };
        debug!(scope = %self.path(), "closing memory scope");
        for child in children.iter().filter_map(Weak::upgrade) {
            child.close();
        }
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        state.live = state.live.saturating_sub(1);
    }
}
