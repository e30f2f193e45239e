//! CLI module
//!
//! Command-line interface for the to-do application.
//!
//! # Commands
//!
//! - `serve` - Start the web server
//! - `list` - Print one page of to-dos
//! - `seed` - Insert sample to-dos
//! - `clear` - Delete every to-do

mod commands;
mod middleware;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve, AppState, ServerOptions};
