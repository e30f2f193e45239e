//! DuckDB-backed to-do repository
//!
//! A single DuckDB connection (file or in-memory) guarded by a mutex.
//! Queries run on the blocking thread pool so request tasks never block
//! the async runtime.

use super::repo::TodoRepo;
use super::types::{CreateTodoParams, ListTodoParams, Todo, UpdateTodoParams};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use duckdb::{params, params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS todos_id_seq START 1;
CREATE TABLE IF NOT EXISTS todos (
    id BIGINT PRIMARY KEY DEFAULT nextval('todos_id_seq'),
    title VARCHAR,
    description VARCHAR,
    created_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
    updated_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);
";

const TODO_COLUMNS: &str = "id, title, description, \
     strftime(created_at, '%Y-%m-%d %H:%M:%S'), \
     strftime(updated_at, '%Y-%m-%d %H:%M:%S')";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// To-do repository using DuckDB
#[derive(Clone)]
pub struct DuckDbRepo {
    /// DuckDB connection
    conn: Arc<Mutex<Connection>>,
    /// Path the connection was opened with (for logging)
    path: String,
}

impl std::fmt::Debug for DuckDbRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbRepo").field("path", &self.path).finish()
    }
}

impl DuckDbRepo {
    /// Open a database file (or `:memory:`) and make sure the schema exists
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| Error::database(format!("Failed to open DuckDB at '{path}': {e}")))?;

        Self::from_connection(conn, path)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn from_connection(conn: Connection, path: &str) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::database(format!("Failed to create schema: {e}")))?;

        tracing::debug!(path, "DuckDB repository ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_string(),
        })
    }

    /// Path or `:memory:`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run `f` with the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::database("DuckDB connection mutex poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::database(format!("Database task failed: {e}")))?
    }
}

#[async_trait]
impl TodoRepo for DuckDbRepo {
    async fn count_todos(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let total = conn.query_row("SELECT COUNT(*) FROM todos", params![], |row| {
                row.get::<_, i64>(0)
            })?;
            Ok(total)
        })
        .await
    }

    async fn list_todos(&self, params: ListTodoParams) -> Result<Vec<Todo>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY id LIMIT ? OFFSET ?");
            let mut stmt = conn.prepare(&sql)?;
            let todos = stmt
                .query_map(params![params.limit, params.offset], row_to_todo)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(todos)
        })
        .await
    }

    async fn get_todo(&self, id: i64) -> Result<Todo> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?");
            match conn.query_row(&sql, params![id], row_to_todo) {
                Ok(todo) => Ok(todo),
                Err(duckdb::Error::QueryReturnedNoRows) => Err(Error::TodoNotFound { id }),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn create_todo(&self, params: CreateTodoParams) -> Result<i64> {
        self.with_conn(move |conn| {
            let id = conn.query_row(
                "INSERT INTO todos (title, description) VALUES (?, ?) RETURNING id",
                params![params.title, params.description],
                |row| row.get::<_, i64>(0),
            )?;
            tracing::debug!(id, "Inserted todo");
            Ok(id)
        })
        .await
    }

    async fn update_todo(&self, params: UpdateTodoParams) -> Result<()> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE todos SET description = ?, updated_at = current_timestamp WHERE id = ?",
                params![params.description, params.id],
            )?;
            tracing::debug!(id = params.id, changed, "Updated todo");
            Ok(())
        })
        .await
    }

    async fn delete_todo(&self, id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM todos WHERE id = ?", params![id])?;
            tracing::debug!(id, changed, "Deleted todo");
            Ok(())
        })
        .await
    }

    async fn delete_todos(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!("DELETE FROM todos WHERE id IN ({placeholders})");
            let changed = conn.execute(&sql, params_from_iter(ids.iter().copied()))?;
            tracing::debug!(requested = ids.len(), changed, "Deleted todos");
            Ok(())
        })
        .await
    }

    async fn clear_todos(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch("DELETE FROM todos;")?;
            Ok(())
        })
        .await
    }
}

/// Map a `TODO_COLUMNS` row to a [`Todo`]
fn row_to_todo(row: &Row<'_>) -> duckdb::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_timestamp(row, 3)?,
        updated_at: parse_timestamp(row, 4)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> duckdb::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| {
        duckdb::Error::FromSqlConversionFailure(idx, duckdb::types::Type::Text, Box::new(e))
    })
}
