//! Task List Controller
//!
//! Owns the task list shown to the user and the multi-select state, and
//! mediates every call to the data gateway.
//!
//! # Design Philosophy
//!
//! The remote store is the source of truth. The controller never edits its
//! list locally: after a confirmed create, update or delete it reloads the
//! whole list from the gateway. Failures leave the current list alone and
//! surface as an error message.
//!
//! Operations are fire-and-forget. Each returns the [`JoinHandle`] of the
//! task doing the work; surfaces usually drop it and watch the state cells,
//! tests and the CLI await it.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::repository::{TaskRepository, TASKS_TABLE};
use super::selection::Selection;
use super::sort::SortPolicy;
use crate::error::GatewayError;
use crate::gateway::{AuthGateway, DataGateway};
use crate::models::{Task, TaskInsert, TaskPriority, TaskUpdate};
use crate::observable::StateCell;
use crate::scope::ControllerScope;

/// Shown when a task is submitted without a title
pub const EMPTY_TITLE_MESSAGE: &str = "Title must not be empty";
/// Fallback when adding a task fails without a server message
pub const ADD_FAILED_MESSAGE: &str = "Failed to add task";
/// Fallback when updating a task fails without a server message
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update task";
/// Fallback when deleting a task fails without a server message
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete task";
/// Fallback when a bulk delete fails without a server message
pub const DELETE_MANY_FAILED_MESSAGE: &str = "Failed to delete tasks";

/// Task list controller configuration
#[derive(Clone, Debug)]
pub struct TaskListConfig {
    /// Collection name
    pub table: String,
    /// List ordering
    pub sort: SortPolicy,
}

impl Default for TaskListConfig {
    fn default() -> Self {
        Self {
            table: TASKS_TABLE.to_string(),
            sort: SortPolicy::default(),
        }
    }
}

struct TaskListInner<G> {
    gateway: Arc<G>,
    repository: TaskRepository<G>,
    tasks: StateCell<Vec<Task>>,
    loading: StateCell<bool>,
    error: StateCell<Option<String>>,
    selection: StateCell<Selection>,
}

impl<G: AuthGateway + DataGateway + 'static> TaskListInner<G> {
    fn fail(&self, err: &GatewayError, fallback: &str) {
        tracing::warn!(error = %err, "{fallback}");
        self.error
            .set(Some(err.user_message().unwrap_or_else(|| fallback.to_string())));
    }

    /// Pull the current user's tasks and replace the list with each emission
    async fn refresh(&self) {
        let Some(user_id) = self.gateway.current_user_id() else {
            tracing::debug!("No signed-in user, showing an empty task list");
            self.tasks.set(Vec::new());
            return;
        };

        let mut updates = self.repository.watch(&user_id);
        while let Some(update) = updates.next().await {
            match update {
                Ok(tasks) => {
                    tracing::debug!(count = tasks.len(), "Task list loaded");
                    self.tasks.set(tasks);
                    self.error.set(None);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load tasks");
                    self.error
                        .set(Some(e.user_message().unwrap_or_else(|| e.to_string())));
                }
            }
        }
    }
}

/// Controller for the signed-in user's task list
pub struct TaskListController<G> {
    inner: Arc<TaskListInner<G>>,
    scope: ControllerScope,
}

impl<G: AuthGateway + DataGateway + 'static> TaskListController<G> {
    /// Create a controller over `gateway`
    ///
    /// Nothing is loaded until [`load_tasks`](Self::load_tasks) is called.
    pub fn new(gateway: Arc<G>, config: TaskListConfig) -> Self {
        let repository = TaskRepository::new(Arc::clone(&gateway), config.table, config.sort);
        Self {
            inner: Arc::new(TaskListInner {
                gateway,
                repository,
                tasks: StateCell::default(),
                loading: StateCell::new(false),
                error: StateCell::new(None),
                selection: StateCell::default(),
            }),
            scope: ControllerScope::new(),
        }
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    /// Subscribe to the task list
    pub fn tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.inner.tasks.subscribe()
    }

    /// Subscribe to the loading flag
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Subscribe to the error message
    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.inner.error.subscribe()
    }

    /// Subscribe to the selection
    pub fn selection(&self) -> watch::Receiver<Selection> {
        self.inner.selection.subscribe()
    }

    /// Current task list
    pub fn snapshot(&self) -> Vec<Task> {
        self.inner.tasks.get()
    }

    /// Current error message
    pub fn error_message(&self) -> Option<String> {
        self.inner.error.get()
    }

    /// Whether an add or bulk delete is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.loading.get()
    }

    /// Whether selection mode is active
    pub fn selection_mode(&self) -> bool {
        self.inner.selection.get().is_active()
    }

    /// Currently selected ids
    pub fn selected(&self) -> Selection {
        self.inner.selection.get()
    }

    /// Tasks not yet completed, in list order
    pub fn active_tasks(&self) -> Vec<Task> {
        self.snapshot()
            .into_iter()
            .filter(|t| !t.is_completed)
            .collect()
    }

    /// Completed tasks, in list order
    pub fn completed_tasks(&self) -> Vec<Task> {
        self.snapshot()
            .into_iter()
            .filter(|t| t.is_completed)
            .collect()
    }

    // ------------------------------------------------------------------
    // Gateway operations
    // ------------------------------------------------------------------

    /// Reload the current user's tasks
    pub fn load_tasks(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.scope.spawn(async move { inner.refresh().await })
    }

    /// Create a task
    ///
    /// Returns `None` without contacting the gateway when `title` is blank.
    pub fn add_task(
        &self,
        title: &str,
        description: &str,
        priority: TaskPriority,
        due_date: Option<String>,
    ) -> Option<JoinHandle<()>> {
        if title.trim().is_empty() {
            self.inner.error.set(Some(EMPTY_TITLE_MESSAGE.to_string()));
            return None;
        }

        let inner = Arc::clone(&self.inner);
        let title = title.to_string();
        let description = description.to_string();

        Some(self.scope.spawn(async move {
            inner.loading.set(true);

            let result = match inner.gateway.current_user_id() {
                Some(user_id) => {
                    let insert = TaskInsert::new(user_id, title)
                        .with_description(description)
                        .with_priority(priority)
                        .with_due_date(due_date);
                    inner.repository.create(&insert).await
                }
                None => Err(GatewayError::NotAuthenticated),
            };

            match result {
                Ok(()) => {
                    tracing::info!("Task added");
                    inner.error.set(None);
                    inner.refresh().await;
                }
                Err(e) => inner.fail(&e, ADD_FAILED_MESSAGE),
            }

            inner.loading.set(false);
        }))
    }

    /// Apply a partial update to a task
    pub fn update_task(&self, task_id: &str, update: TaskUpdate) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let task_id = task_id.to_string();

        self.scope.spawn(async move {
            match inner.repository.update(&task_id, &update).await {
                Ok(changed) => {
                    tracing::info!(task_id = %task_id, changed, "Task updated");
                    inner.refresh().await;
                }
                Err(e) => inner.fail(&e, UPDATE_FAILED_MESSAGE),
            }
        })
    }

    /// Flip a task's completion flag
    pub fn toggle_completed(&self, task: &Task) -> JoinHandle<()> {
        self.update_task(&task.id, TaskUpdate::new().completed(!task.is_completed))
    }

    /// Delete one task
    pub fn delete_task(&self, task_id: &str) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let task_id = task_id.to_string();

        self.scope.spawn(async move {
            match inner.repository.delete(&task_id).await {
                Ok(removed) => {
                    tracing::info!(task_id = %task_id, removed, "Task deleted");
                    inner.refresh().await;
                }
                Err(e) => inner.fail(&e, DELETE_FAILED_MESSAGE),
            }
        })
    }

    /// Delete every selected task
    ///
    /// One delete per id, in id order, stopping at the first failure. On
    /// success the selection is cleared and the list reloaded. On failure
    /// the selection and list are left as they were (deletes that already
    /// went through are not undone).
    pub fn delete_selected_tasks(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let selected = self.inner.selection.get();

        self.scope.spawn(async move {
            inner.loading.set(true);

            match inner.repository.delete_many(selected.ids()).await {
                Ok(removed) => {
                    tracing::info!(removed, "Selected tasks deleted");
                    inner.selection.set(Selection::new());
                    inner.refresh().await;
                }
                Err(e) => inner.fail(&e, DELETE_MANY_FAILED_MESSAGE),
            }

            inner.loading.set(false);
        })
    }

    // ------------------------------------------------------------------
    // Local state
    // ------------------------------------------------------------------

    /// Select or deselect a task; deselecting the last one ends selection mode
    pub fn toggle_task_selection(&self, task_id: &str) {
        self.inner.selection.update(|s| s.toggle(task_id));
    }

    /// Enter selection mode with only `task_id` selected
    pub fn enter_selection_mode(&self, task_id: &str) {
        self.inner.selection.update(|s| s.enter(task_id));
    }

    /// Leave selection mode
    pub fn clear_selection(&self) {
        self.inner.selection.update(Selection::clear);
    }

    /// Clear the error message
    pub fn clear_error(&self) {
        self.inner.error.set(None);
    }
}
