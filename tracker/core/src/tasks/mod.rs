//! Task Management
//!
//! The signed-in user's task list: typed repository over the data gateway,
//! list ordering, multi-select state, and the controller that ties them
//! together for UI surfaces.

mod controller;
mod repository;
mod selection;
mod sort;

pub use controller::{
    TaskListConfig, TaskListController, ADD_FAILED_MESSAGE, DELETE_FAILED_MESSAGE,
    DELETE_MANY_FAILED_MESSAGE, EMPTY_TITLE_MESSAGE, UPDATE_FAILED_MESSAGE,
};
pub use repository::{TaskRepository, TASKS_TABLE};
pub use selection::Selection;
pub use sort::SortPolicy;
