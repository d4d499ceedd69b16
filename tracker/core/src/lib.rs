//! Tracker Core - Headless Task Tracking
//!
//! This crate provides the controller layer of a personal task tracker,
//! independent of any UI framework. It can drive a CLI, a TUI, a mobile
//! shell, or run headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                            │
//! │      ┌─────────┐      ┌─────────┐      ┌──────────────┐      │
//! │      │   CLI   │      │   TUI   │      │   Headless   │      │
//! │      └────┬────┘      └────┬────┘      └──────┬───────┘      │
//! │           └────────────────┼──────────────────┘              │
//! │              operations (down) / watch::Receiver (up)         │
//! └────────────────────────────┼──────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼──────────────────────────────────┐
//! │                      TRACKER CORE                             │
//! │  ┌──────────────┐  ┌───────┴────────┐  ┌──────────────────┐  │
//! │  │     Auth     │  │   Task List    │  │      Theme       │  │
//! │  │  Controller  │  │   Controller   │  │    Controller    │  │
//! │  └──────┬───────┘  └───────┬────────┘  └────────┬─────────┘  │
//! │         │          TaskRepository               │            │
//! │  ┌──────┴──────────────────┴──────┐  ┌──────────┴─────────┐  │
//! │  │  AuthGateway + DataGateway     │  │  PreferenceStore   │  │
//! │  │  (Supabase / in-memory)        │  │  (file / memory)   │  │
//! │  └────────────────────────────────┘  └────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`AuthController`]: sign-up, sign-in, sign-out and the resulting [`AuthState`]
//! - [`TaskListController`]: the user's task list, multi-select and bulk delete
//! - [`ThemeController`]: light/dark/system theme preference
//! - [`SupabaseClient`]: hosted auth + data gateway
//! - [`InMemoryGateway`]: in-process gateway for tests and offline use
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracker_core::{load_config, AuthController, SupabaseClient, TaskListController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config().await?;
//!     let client = Arc::new(SupabaseClient::new(&config.supabase()?)?);
//!
//!     let auth = AuthController::new(Arc::clone(&client));
//!     if let Some(handle) = auth.sign_in("me@example.com", "hunter22") {
//!         handle.await?;
//!     }
//!
//!     let tasks = TaskListController::new(client, config.task_list());
//!     tasks.load_tasks().await?;
//!     for task in tasks.snapshot() {
//!         println!("{} [{}]", task.title, task.priority);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`auth`]: authentication state controller
//! - [`tasks`]: task repository, ordering, selection and list controller
//! - [`theme`]: theme preference controller
//! - [`preferences`]: boolean preference storage
//! - [`gateway`]: auth/data gateway traits and implementations
//! - [`models`]: task and user records
//! - [`observable`]: single-writer state cells
//! - [`scope`]: controller-owned task sets
//! - [`config`]: TOML + environment configuration
//! - [`error`]: gateway and preference errors
//!
//! # No UI Dependencies
//!
//! Nothing here renders. Surfaces subscribe to the controllers' state cells
//! and call their operations.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod observable;
pub mod preferences;
pub mod scope;
pub mod tasks;
pub mod theme;

// Re-exports for convenience
pub use auth::{AuthController, AuthState};
pub use error::{GatewayError, GatewayResult, PreferenceError};
pub use gateway::{
    AuthGateway, DataGateway, Direction, Filter, InMemoryGateway, OrderBy, Query, Session,
    SessionStore, SupabaseClient, SupabaseConfig,
};
pub use models::{Task, TaskInsert, TaskPriority, TaskUpdate, User};
pub use observable::StateCell;
pub use preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceMap, PreferenceStore, DARK_MODE_KEY,
    USE_SYSTEM_THEME_KEY,
};
pub use scope::ControllerScope;
pub use tasks::{Selection, SortPolicy, TaskListConfig, TaskListController, TaskRepository};
pub use theme::{ThemeController, ThemePreference};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, TrackerConfig, TrackerToml,
};
