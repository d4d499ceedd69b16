//! In-Memory Gateway
//!
//! An in-process stand-in for the hosted backend, implementing both
//! [`AuthGateway`] and [`DataGateway`]. Used for offline runs of the CLI and
//! as the store behind test doubles.
//!
//! It behaves like the server where the controllers can observe it:
//! - `id`, `created_at` and `updated_at` are assigned here, never taken
//!   from the client
//! - updates only touch the keys present in the patch
//! - columns registered with [`InMemoryGateway::with_enum_column`] sort by
//!   declaration order, like a Postgres enum type

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use super::query::{Direction, Filter, Query};
use super::traits::{AuthGateway, DataGateway};
use crate::error::{GatewayError, GatewayResult};
use crate::models::{TaskPriority, User};

/// Columns the gateway owns; stripped from client writes
const SERVER_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

type Row = Map<String, Value>;

#[derive(Clone, Debug)]
struct Account {
    user: User,
    password: String,
}

/// In-process auth + data gateway
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    /// Registered accounts by email
    accounts: Mutex<HashMap<String, Account>>,
    /// Signed-in user
    current: RwLock<Option<User>>,
    /// Rows by table, in insertion order
    tables: Mutex<HashMap<String, Vec<Row>>>,
    /// Enum label order by (table, column)
    enum_columns: HashMap<(String, String), Vec<String>>,
}

impl InMemoryGateway {
    /// Empty gateway with no enum columns
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway preconfigured for the `tasks` table
    ///
    /// Registers `priority` as an enum column ordered low < medium < high.
    #[must_use]
    pub fn for_tasks(table: &str) -> Self {
        let labels: Vec<&str> = TaskPriority::ALL.iter().map(TaskPriority::as_str).collect();
        Self::new().with_enum_column(table, "priority", &labels)
    }

    /// Declare `column` of `table` as an enum sorted in `labels` order
    #[must_use]
    pub fn with_enum_column(mut self, table: &str, column: &str, labels: &[&str]) -> Self {
        self.enum_columns.insert(
            (table.to_string(), column.to_string()),
            labels.iter().map(|l| (*l).to_string()).collect(),
        );
        self
    }

    /// Register an account without signing in
    pub fn add_account(&self, email: &str, password: &str) -> User {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
        };
        self.accounts.lock().insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, Vec::len)
    }

    fn timestamp() -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }

    fn compare(&self, table: &str, column: &str, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let labels = self
            .enum_columns
            .get(&(table.to_string(), column.to_string()));

        match (a, b) {
            (Some(Value::String(x)), Some(Value::String(y))) => match labels {
                Some(labels) => {
                    let rank = |s: &str| labels.iter().position(|l| l == s);
                    rank(x).cmp(&rank(y))
                }
                None => x.cmp(y),
            },
            (Some(Value::Number(x)), Some(Value::Number(y))) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
            // Postgres sorts NULL last ascending
            (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
            (None | Some(Value::Null), _) => Ordering::Greater,
            (_, None | Some(Value::Null)) => Ordering::Less,
            (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        }
    }

    fn matches(row: &Row, filters: &[Filter]) -> bool {
        filters.iter().all(|f| f.matches(row))
    }

    fn client_row(value: Value) -> GatewayResult<Row> {
        match value {
            Value::Object(mut row) => {
                for column in SERVER_COLUMNS {
                    row.remove(column);
                }
                Ok(row)
            }
            other => Err(GatewayError::Rejected(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl AuthGateway for InMemoryGateway {
    fn name(&self) -> &'static str {
        "In-memory"
    }

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<User> {
        if self.accounts.lock().contains_key(email) {
            return Err(GatewayError::Rejected("User already registered".to_string()));
        }
        let user = self.add_account(email, password);
        *self.current.write() = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<User> {
        let account = self.accounts.lock().get(email).cloned();
        match account {
            Some(account) if account.password == password => {
                *self.current.write() = Some(account.user.clone());
                Ok(account.user)
            }
            _ => Err(GatewayError::Rejected(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        *self.current.write() = None;
        Ok(())
    }

    async fn current_user(&self) -> GatewayResult<Option<User>> {
        Ok(self.current.read().clone())
    }

    fn current_user_id(&self) -> Option<String> {
        self.current.read().as_ref().map(|u| u.id.clone())
    }
}

#[async_trait]
impl DataGateway for InMemoryGateway {
    async fn select(&self, table: &str, query: &Query) -> GatewayResult<Vec<Value>> {
        let mut rows: Vec<Row> = self
            .tables
            .lock()
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| Self::matches(r, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Stable sort keeps insertion order for ties
        rows.sort_by(|a, b| {
            query
                .order
                .iter()
                .map(|o| {
                    let ord = self.compare(table, &o.column, a.get(&o.column), b.get(&o.column));
                    match o.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn insert(&self, table: &str, row: Value) -> GatewayResult<()> {
        let mut row = Self::client_row(row)?;
        let now = Self::timestamp();
        row.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        row.insert("created_at".to_string(), Value::String(now.clone()));
        row.insert("updated_at".to_string(), Value::String(now));

        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn update(&self, table: &str, patch: Value, filters: &[Filter]) -> GatewayResult<usize> {
        let patch = Self::client_row(patch)?;
        let now = Self::timestamp();
        let mut tables = self.tables.lock();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };

        let mut changed = 0;
        for row in rows.iter_mut().filter(|r| Self::matches(r, filters)) {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            row.insert("updated_at".to_string(), Value::String(now.clone()));
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<usize> {
        let mut tables = self.tables.lock();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|r| !Self::matches(r, filters));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn titles(rows: &[Value]) -> Vec<String> {
        rows.iter()
            .map(|r| r["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_server_fields() {
        let gw = InMemoryGateway::new();
        gw.insert("tasks", json!({"id": "client-id", "title": "A"}))
            .await
            .unwrap();

        let rows = gw.select("tasks", &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0]["id"], json!("client-id"));
        assert!(rows[0]["created_at"].is_string());
        assert_eq!(rows[0]["created_at"], rows[0]["updated_at"]);
    }

    #[tokio::test]
    async fn test_enum_column_orders_by_declaration() {
        let gw = InMemoryGateway::for_tasks("tasks");
        for (title, priority) in [("a", "low"), ("b", "high"), ("c", "medium"), ("d", "high")] {
            gw.insert("tasks", json!({"title": title, "priority": priority}))
                .await
                .unwrap();
        }

        let query = Query::new()
            .order("priority", Direction::Descending)
            .order("created_at", Direction::Ascending);
        let rows = gw.select("tasks", &query).await.unwrap();
        assert_eq!(titles(&rows), vec!["b", "d", "c", "a"]);
    }

    #[tokio::test]
    async fn test_update_is_partial_and_delete_counts() {
        let gw = InMemoryGateway::new();
        gw.insert("tasks", json!({"title": "A", "is_completed": false, "user_id": "u1"}))
            .await
            .unwrap();
        let id = gw.select("tasks", &Query::new()).await.unwrap()[0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let changed = gw
            .update("tasks", json!({"is_completed": true}), &[Filter::eq("id", &id)])
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let row = &gw.select("tasks", &Query::new()).await.unwrap()[0];
        assert_eq!(row["title"], json!("A"));
        assert_eq!(row["is_completed"], json!(true));

        assert_eq!(gw.delete("tasks", &[Filter::eq("id", &id)]).await.unwrap(), 1);
        assert_eq!(gw.delete("tasks", &[Filter::eq("id", &id)]).await.unwrap(), 0);
        assert_eq!(gw.row_count("tasks"), 0);
    }

    #[tokio::test]
    async fn test_auth_flow() {
        let gw = InMemoryGateway::new();
        assert!(gw.current_user().await.unwrap().is_none());

        let user = gw.sign_up("a@example.com", "secret1").await.unwrap();
        assert_eq!(gw.current_user_id(), Some(user.id.clone()));
        assert!(gw.sign_up("a@example.com", "other").await.is_err());

        gw.sign_out().await.unwrap();
        assert!(gw.current_user_id().is_none());

        assert!(gw.sign_in("a@example.com", "wrong").await.is_err());
        let again = gw.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(again, user);
    }
}
