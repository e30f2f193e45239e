//! Row and parameter types for the `todos` table

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Primary key, assigned by the store
    pub id: i64,
    /// Title (nullable column)
    pub title: Option<String>,
    /// Description (nullable column)
    pub description: Option<String>,
    /// Insert time
    pub created_at: NaiveDateTime,
    /// Last update time
    pub updated_at: NaiveDateTime,
}

impl Todo {
    /// Title or an empty string when the column is NULL
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Description or an empty string when the column is NULL
    pub fn description_str(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// Values for a new to-do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodoParams {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CreateTodoParams {
    /// Create params with both columns set
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
        }
    }
}

/// Values for an update; only the description is editable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTodoParams {
    pub id: i64,
    pub description: Option<String>,
}

/// Window of rows to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTodoParams {
    pub limit: i64,
    pub offset: i64,
}
