//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Upper bound for `seed --count`
pub const MAX_SEED_COUNT: i64 = 10_000;

/// Server-rendered to-do list
#[derive(Parser, Debug)]
#[command(name = "todo-web")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB file to use instead of the configured one
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind
        #[arg(short, long)]
        address: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print one page of to-dos
    List {
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: i64,
    },

    /// Insert sample to-dos
    Seed {
        /// Number of to-dos to insert
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(0..=MAX_SEED_COUNT))]
        count: u32,
    },

    /// Delete every to-do
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_count_default() {
        let cli = Cli::try_parse_from(["todo-web", "seed"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { count: 10 }));
    }

    #[test]
    fn test_seed_count_is_bounded() {
        assert!(Cli::try_parse_from(["todo-web", "seed", "--count", "10000"]).is_ok());
        assert!(Cli::try_parse_from(["todo-web", "seed", "--count", "10001"]).is_err());
        assert!(
            Cli::try_parse_from(["todo-web", "seed", "--count", "18446744073709551615"]).is_err()
        );
        assert!(Cli::try_parse_from(["todo-web", "seed", "--count", "-1"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["todo-web", "list", "--page", "3", "-d", "x.duckdb", "-v"])
            .unwrap();
        assert_eq!(cli.database.as_deref(), Some("x.duckdb"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::List { page: 3 }));
    }
}
