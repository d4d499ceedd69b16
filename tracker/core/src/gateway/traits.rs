//! Gateway Traits
//!
//! Trait definitions for the external services the controllers talk to.
//! This abstraction lets the controllers run against the hosted backend, an
//! in-process store, or a test double without changing their logic.
//!
//! # Design Philosophy
//!
//! Gateways are thin. They perform one remote call per method and report
//! the outcome as a [`GatewayResult`]. Validation, state and user-facing
//! messages belong to the controllers.

use async_trait::async_trait;

use super::query::{Filter, Query};
use crate::error::GatewayResult;
use crate::models::User;

/// Session-based email/password authentication
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Gateway name for logs (e.g. "Supabase")
    fn name(&self) -> &str;

    /// Register a new account and start a session for it
    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<User>;

    /// Start a session for an existing account
    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<User>;

    /// End the current session
    ///
    /// The local session is discarded even when the remote call fails.
    async fn sign_out(&self) -> GatewayResult<()>;

    /// User of the current session, restoring a persisted one if needed
    async fn current_user(&self) -> GatewayResult<Option<User>>;

    /// Id of the user of the cached session, without any I/O
    fn current_user_id(&self) -> Option<String>;
}

/// Row-oriented CRUD over named collections
///
/// Rows travel as JSON objects; typed encoding and decoding happen one
/// layer up, in the repositories.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Rows of `table` matching `query`, in the requested order
    async fn select(&self, table: &str, query: &Query) -> GatewayResult<Vec<serde_json::Value>>;

    /// Insert one row; the gateway assigns id and timestamps
    async fn insert(&self, table: &str, row: serde_json::Value) -> GatewayResult<()>;

    /// Apply `patch` to every matching row, returning how many changed
    ///
    /// Only the keys present in `patch` are written.
    async fn update(
        &self,
        table: &str,
        patch: serde_json::Value,
        filters: &[Filter],
    ) -> GatewayResult<usize>;

    /// Delete every matching row, returning how many were removed
    async fn delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<usize>;
}
