// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # todo-web
//!
//! A small server-rendered to-do list. Items live in DuckDB, pages are
//! rendered from HTML templates, and the list is paged with a fixed-width
//! navigation window.
//!
//! ## Features
//!
//! - **Pagination**: `compute` turns (page, window length, total, page size)
//!   into the navigation shown under the list
//! - **CRUD over HTTP**: create, show, edit and (bulk) delete to-dos
//! - **Sessions + CSRF**: signed session cookie, per-session form tokens
//! - **CLI**: serve, list, seed and clear from the command line
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use todo_web::{compute, Result};
//!
//! fn main() -> Result<()> {
//!     // 12 items, 5 per page, 5 page links, viewing page 2
//!     let info = compute(2, 5, 12, 5)?;
//!     assert_eq!(info.total_pages, 3);
//!     assert!(info.pages[1].is_selected);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   HTTP (axum router)                      │
//! │  session layer → csrf layer → handlers → views            │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//! ┌──────────────┬────────────┴─────┬──────────────┬──────────┐
//! │  Pagination  │    TodoRepo      │   Session    │ Template │
//! ├──────────────┼──────────────────┼──────────────┼──────────┤
//! │ compute      │ DuckDB           │ JWT cookie   │ {{ x }}  │
//! │ offset       │ count/list/crud  │ CSRF token   │ {{{ x }}}│
//! └──────────────┴──────────────────┴──────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Application configuration
pub mod config;

/// Page navigation calculator
pub mod pagination;

/// To-do storage via DuckDB
pub mod database;

/// Session cookies and CSRF tokens
pub mod session;

/// Template interpolation
pub mod template;

/// HTML pages
pub mod views;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use pagination::{compute, Page, PageInfo};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
