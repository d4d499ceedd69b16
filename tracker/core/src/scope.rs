//! Controller Scope
//!
//! Every controller runs its gateway calls on tokio tasks owned by a
//! [`ControllerScope`]. Dropping the scope (that is, dropping the
//! controller) aborts whatever is still running, so no task outlives the
//! state it writes to.

use std::future::Future;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

/// Set of tasks tied to a controller's lifetime
#[derive(Debug, Default)]
pub struct ControllerScope {
    tasks: Mutex<Vec<AbortHandle>>,
}

impl ControllerScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task in this scope
    ///
    /// The returned handle may be dropped (fire-and-forget) or awaited.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle.abort_handle());
        handle
    }
}

impl Drop for ControllerScope {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
