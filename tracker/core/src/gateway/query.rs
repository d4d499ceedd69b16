//! Row Queries
//!
//! A small, backend-neutral description of the filters and ordering a
//! `select` needs. [`Query::to_params`] renders it in PostgREST syntax; the
//! in-memory gateway evaluates it directly.

/// Sort direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl Direction {
    /// PostgREST keyword
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A row predicate
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq {
        /// Column name
        column: String,
        /// Value, in its text form
        value: String,
    },
}

impl Filter {
    /// Equality filter
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// PostgREST query parameter (`column`, `eq.value`)
    #[must_use]
    pub fn to_param(&self) -> (String, String) {
        match self {
            Self::Eq { column, value } => (column.clone(), format!("eq.{value}")),
        }
    }

    /// Evaluate against a JSON row
    #[must_use]
    pub fn matches(&self, row: &serde_json::Map<String, serde_json::Value>) -> bool {
        match self {
            Self::Eq { column, value } => match row.get(column) {
                Some(serde_json::Value::String(s)) => s == value,
                Some(serde_json::Value::Null) | None => false,
                Some(other) => other.to_string() == *value,
            },
        }
    }
}

/// One ordering term
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    /// Column name
    pub column: String,
    /// Direction
    pub direction: Direction,
}

/// Filters plus ordering for a `select`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    /// All filters must match
    pub filters: Vec<Filter>,
    /// Applied left to right
    pub order: Vec<OrderBy>,
}

impl Query {
    /// Empty query (every row, server order)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Add an ordering term
    #[must_use]
    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    /// Render as PostgREST query parameters
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filters.iter().map(Filter::to_param));

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, o.direction.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_params_renders_postgrest_syntax() {
        let query = Query::new()
            .eq("user_id", "u1")
            .order("priority", Direction::Descending)
            .order("created_at", Direction::Ascending);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), "eq.u1".to_string()),
                (
                    "order".to_string(),
                    "priority.desc,created_at.asc".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_unordered_query_has_no_order_param() {
        let params = Query::new().eq("id", "7").to_params();
        assert!(params.iter().all(|(k, _)| k != "order"));
    }

    #[test]
    fn test_filter_matches_rows() {
        let row = serde_json::json!({"user_id": "u1", "is_completed": true});
        let row = row.as_object().unwrap();

        assert!(Filter::eq("user_id", "u1").matches(row));
        assert!(!Filter::eq("user_id", "u2").matches(row));
        assert!(Filter::eq("is_completed", "true").matches(row));
        assert!(!Filter::eq("missing", "x").matches(row));
    }
}
