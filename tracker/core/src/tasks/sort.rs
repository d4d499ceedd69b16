//! Task list ordering

use serde::{Deserialize, Serialize};

use crate::gateway::{Direction, Query};

/// How the task list is ordered when loaded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Priority high to low, then oldest first
    #[default]
    PriorityThenCreated,
    /// Whatever order the data gateway returns
    Unordered,
}

impl SortPolicy {
    /// Parse from config/env text
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "priority_then_created" | "priority" => Some(Self::PriorityThenCreated),
            "unordered" | "none" => Some(Self::Unordered),
            _ => None,
        }
    }

    /// Add this policy's ordering terms to `query`
    #[must_use]
    pub fn apply(&self, query: Query) -> Query {
        match self {
            Self::PriorityThenCreated => query
                .order("priority", Direction::Descending)
                .order("created_at", Direction::Ascending),
            Self::Unordered => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            SortPolicy::parse("priority-then-created"),
            Some(SortPolicy::PriorityThenCreated)
        );
        assert_eq!(SortPolicy::parse("NONE"), Some(SortPolicy::Unordered));
        assert_eq!(SortPolicy::parse("alphabetical"), None);
    }

    #[test]
    fn test_apply() {
        assert_eq!(SortPolicy::Unordered.apply(Query::new()).order.len(), 0);

        let query = SortPolicy::PriorityThenCreated.apply(Query::new());
        assert_eq!(query.order[0].column, "priority");
        assert_eq!(query.order[0].direction, Direction::Descending);
        assert_eq!(query.order[1].column, "created_at");
        assert_eq!(query.order[1].direction, Direction::Ascending);
    }
}
