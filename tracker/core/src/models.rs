//! Task and User Types
//!
//! Row types for the `tasks` collection and the signed-in user.
//!
//! # Server-Assigned Fields
//!
//! `id`, `created_at` and `updated_at` are owned by the data gateway. The
//! client never sets them: creation goes through [`TaskInsert`], which has no
//! such fields, and edits go through [`TaskUpdate`], which only carries the
//! columns a user may change.

use serde::{Deserialize, Serialize};

/// Task priority
///
/// Ordered `Low < Medium < High`. The wire form is the lowercase name, which
/// matches the declaration order of the `task_priority` enum type on the
/// server so `order=priority.desc` sorts high first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Can wait
    Low,
    /// The default
    #[default]
    Medium,
    /// Do first
    High,
}

impl TaskPriority {
    /// All priorities in ascending order
    pub const ALL: [TaskPriority; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire name (also the server enum label)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parse a priority, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "l" => Some(Self::Low),
            "medium" | "med" | "m" => Some(Self::Medium),
            "high" | "h" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task row as stored by the data gateway
///
/// Missing columns decode to their defaults so a partial `select` still
/// yields a usable value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    /// Server-assigned identifier
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Title (never empty for tasks created through the controller)
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Completion flag
    pub is_completed: bool,
    /// Priority
    pub priority: TaskPriority,
    /// Due date as an ISO-8601 calendar date (`YYYY-MM-DD`)
    pub due_date: Option<String>,
    /// Server-assigned creation timestamp
    pub created_at: String,
    /// Server-assigned last-update timestamp
    pub updated_at: String,
}

impl Task {
    /// Description, or the empty string when absent
    #[must_use]
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Creation request for a task
///
/// Deliberately has no `id` or timestamp fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInsert {
    /// Owner
    pub user_id: String,
    /// Title
    pub title: String,
    /// Description (empty string when the user gave none)
    pub description: String,
    /// Priority
    pub priority: TaskPriority,
    /// Optional due date (`YYYY-MM-DD`)
    pub due_date: Option<String>,
    /// Always `false` for new tasks
    pub is_completed: bool,
}

impl TaskInsert {
    /// Create an insert for a new, not yet completed task
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::default(),
            due_date: None,
            is_completed: false,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set due date
    pub fn with_due_date(mut self, due_date: Option<String>) -> Self {
        self.due_date = due_date;
        self
    }
}

/// Partial update for a task (PATCH semantics)
///
/// `None` fields are skipped when serialized, so the server leaves those
/// columns untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New completion flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    /// New priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// New due date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl TaskUpdate {
    /// Create an empty update
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set completion flag
    #[must_use]
    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }

    /// Set priority
    #[must_use]
    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set due date
    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Whether no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// An authenticated user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id (owner key for tasks)
    pub id: String,
    /// Email address
    #[serde(default)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_priority_order_and_wire_form() {
        assert!(TaskPriority::High > TaskPriority::Medium);
        assert!(TaskPriority::Medium > TaskPriority::Low);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(
            serde_json::to_string(&TaskPriority::High).unwrap(),
            "\"high\""
        );
        assert_eq!(TaskPriority::parse(" HIGH "), Some(TaskPriority::High));
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn test_task_decodes_server_row() {
        let row = serde_json::json!({
            "id": "7f1c",
            "user_id": "u1",
            "title": "Buy milk",
            "description": null,
            "is_completed": false,
            "priority": "high",
            "due_date": "2026-11-01",
            "created_at": "2026-10-19T08:00:00+00:00",
            "updated_at": "2026-10-19T08:00:00+00:00"
        });
        let task: Task = serde_json::from_value(row).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.due_date.as_deref(), Some("2026-11-01"));
        assert_eq!(task.description_or_empty(), "");
    }

    #[test]
    fn test_task_missing_columns_use_defaults() {
        let task: Task = serde_json::from_value(serde_json::json!({"id": "1"})).unwrap();
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(!task.is_completed);
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_insert_has_no_server_fields() {
        let insert = TaskInsert::new("u1", "Buy milk").with_priority(TaskPriority::Low);
        let value = serde_json::to_value(&insert).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("created_at"));
        assert!(!obj.contains_key("updated_at"));
        assert_eq!(obj["is_completed"], serde_json::json!(false));
        assert_eq!(obj["priority"], serde_json::json!("low"));
    }

    #[test]
    fn test_update_only_serializes_set_fields() {
        let update = TaskUpdate::new().completed(true);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"is_completed": true})
        );
        assert!(TaskUpdate::new().is_empty());
        assert!(!update.is_empty());
    }
}
