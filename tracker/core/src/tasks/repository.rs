//! Task Repository
//!
//! Typed access to the `tasks` collection on top of a [`DataGateway`]:
//! builds the queries, encodes inserts and patches, decodes rows.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use super::sort::SortPolicy;
use crate::error::GatewayResult;
use crate::gateway::{DataGateway, Filter, Query};
use crate::models::{Task, TaskInsert, TaskUpdate};

/// Default collection name
pub const TASKS_TABLE: &str = "tasks";

/// Typed task access
pub struct TaskRepository<D> {
    gateway: Arc<D>,
    table: String,
    sort: SortPolicy,
}

impl<D> Clone for TaskRepository<D> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            table: self.table.clone(),
            sort: self.sort,
        }
    }
}

impl<D: DataGateway + 'static> TaskRepository<D> {
    /// Repository over `table` with the given ordering
    pub fn new(gateway: Arc<D>, table: impl Into<String>, sort: SortPolicy) -> Self {
        Self {
            gateway,
            table: table.into(),
            sort,
        }
    }

    /// Query for one user's tasks under the configured ordering
    #[must_use]
    pub fn list_query(&self, user_id: &str) -> Query {
        self.sort.apply(Query::new().eq("user_id", user_id))
    }

    /// Fetch one user's tasks
    pub async fn list(&self, user_id: &str) -> GatewayResult<Vec<Task>> {
        let rows = self
            .gateway
            .select(&self.table, &self.list_query(user_id))
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// One user's tasks as a stream of whole lists
    ///
    /// Each item replaces the previous list. The backend has no push
    /// channel wired up, so the stream yields a single snapshot and ends.
    pub fn watch(&self, user_id: &str) -> BoxStream<'static, GatewayResult<Vec<Task>>> {
        let repo = self.clone();
        let user_id = user_id.to_string();
        stream::once(async move { repo.list(&user_id).await }).boxed()
    }

    /// Create a task
    pub async fn create(&self, task: &TaskInsert) -> GatewayResult<()> {
        let row = serde_json::to_value(task)?;
        self.gateway.insert(&self.table, row).await
    }

    /// Apply a partial update to one task, returning rows changed
    pub async fn update(&self, task_id: &str, update: &TaskUpdate) -> GatewayResult<usize> {
        let patch = serde_json::to_value(update)?;
        self.gateway
            .update(&self.table, patch, &[Filter::eq("id", task_id)])
            .await
    }

    /// Delete one task, returning rows removed
    pub async fn delete(&self, task_id: &str) -> GatewayResult<usize> {
        self.gateway
            .delete(&self.table, &[Filter::eq("id", task_id)])
            .await
    }

    /// Delete several tasks, one call per id, in order
    ///
    /// Stops at the first failing call. Deletes issued before it stay
    /// applied; there is no rollback. An id that matched no row is not a
    /// failure.
    pub async fn delete_many<'a, I>(&self, task_ids: I) -> GatewayResult<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut removed = 0;
        for id in task_ids {
            removed += self.delete(id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::models::TaskPriority;
    use pretty_assertions::assert_eq;

    fn repo() -> (Arc<InMemoryGateway>, TaskRepository<InMemoryGateway>) {
        let gw = Arc::new(InMemoryGateway::for_tasks(TASKS_TABLE));
        let repo = TaskRepository::new(Arc::clone(&gw), TASKS_TABLE, SortPolicy::default());
        (gw, repo)
    }

    #[tokio::test]
    async fn test_list_is_filtered_by_owner_and_ordered() {
        let (_gw, repo) = repo();
        repo.create(&TaskInsert::new("u1", "low").with_priority(TaskPriority::Low))
            .await
            .unwrap();
        repo.create(&TaskInsert::new("u2", "not mine")).await.unwrap();
        repo.create(&TaskInsert::new("u1", "high").with_priority(TaskPriority::High))
            .await
            .unwrap();

        let titles: Vec<String> = repo
            .list("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["high", "low"]);
    }

    #[tokio::test]
    async fn test_watch_yields_one_snapshot() {
        let (_gw, repo) = repo();
        repo.create(&TaskInsert::new("u1", "a")).await.unwrap();

        let items: Vec<_> = repo.watch("u1").collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_many_counts_removed_rows() {
        let (gw, repo) = repo();
        repo.create(&TaskInsert::new("u1", "a")).await.unwrap();
        repo.create(&TaskInsert::new("u1", "b")).await.unwrap();
        let ids: Vec<String> = repo.list("u1").await.unwrap().into_iter().map(|t| t.id).collect();

        let removed = repo
            .delete_many(ids.iter().map(String::as_str).chain(["missing"]))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(gw.row_count(TASKS_TABLE), 0);
    }

    #[test]
    fn test_list_query_filters_by_user() {
        let (_gw, repo) = repo();
        let query = repo.list_query("u1");
        assert_eq!(query.filters, vec![Filter::eq("user_id", "u1")]);
        assert_eq!(query.order.len(), 2);
    }
}
