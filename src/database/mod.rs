//! To-do storage backed by DuckDB
//!
//! Handlers talk to the [`TodoRepo`] trait; [`DuckDbRepo`] is the only
//! production implementation. Tests substitute their own repos to exercise
//! failure paths.

mod engine;
mod repo;
mod types;

pub use engine::DuckDbRepo;
pub use repo::{SharedRepo, TodoRepo};
pub use types::{CreateTodoParams, ListTodoParams, Todo, UpdateTodoParams};
