//! Data access trait

use super::types::{CreateTodoParams, ListTodoParams, Todo, UpdateTodoParams};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Queries the web handlers and CLI run against the `todos` table
#[async_trait]
pub trait TodoRepo: Send + Sync {
    /// Number of stored to-dos
    async fn count_todos(&self) -> Result<i64>;

    /// One window of to-dos, ordered by id
    async fn list_todos(&self, params: ListTodoParams) -> Result<Vec<Todo>>;

    /// Fetch one to-do; `Error::TodoNotFound` if absent
    async fn get_todo(&self, id: i64) -> Result<Todo>;

    /// Insert a to-do and return its id
    async fn create_todo(&self, params: CreateTodoParams) -> Result<i64>;

    /// Replace the description of a to-do
    async fn update_todo(&self, params: UpdateTodoParams) -> Result<()>;

    /// Delete one to-do. Deleting a missing id is not an error.
    async fn delete_todo(&self, id: i64) -> Result<()>;

    /// Delete every listed id
    async fn delete_todos(&self, ids: &[i64]) -> Result<()>;

    /// Delete every to-do
    async fn clear_todos(&self) -> Result<()>;
}

/// Repo handle shared between request handlers
pub type SharedRepo = Arc<dyn TodoRepo>;
