//! Application configuration
//!
//! Settings are read from an optional YAML file and then overridden by
//! `TODO_*` environment variables. Every section has defaults, so an empty
//! file (or no file at all) yields a runnable configuration.

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Secret used when none is configured. Fine for local use only.
pub const DEFAULT_SESSION_SECRET: &str = "change-me-session-secret";

/// CSRF secret used when none is configured. Fine for local use only.
pub const DEFAULT_CSRF_SECRET: &str = "change-me-csrf-secret";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Session cookie and CSRF settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Listing page settings
    #[serde(default)]
    pub listing: ListingConfig,
}

impl AppConfig {
    /// Load configuration from an optional YAML file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// Parse YAML config text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `TODO_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("TODO_SERVER_ADDRESS") {
            self.server.address = address;
        }
        if let Some(port) = lookup("TODO_SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::invalid_config("TODO_SERVER_PORT", format!("{e}")))?;
        }
        if let Some(path) = lookup("TODO_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(secret) = lookup("TODO_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Some(secret) = lookup("TODO_CSRF_SECRET") {
            self.session.csrf_secret = secret;
        }
        Ok(())
    }

    /// Check values the rest of the application relies on
    pub fn validate(&self) -> Result<()> {
        if self.listing.page_size <= 0 {
            return Err(Error::invalid_config(
                "listing.page_size",
                "must be positive",
            ));
        }
        if self.listing.nav_len <= 0 {
            return Err(Error::invalid_config("listing.nav_len", "must be positive"));
        }
        if self.session.secret.is_empty() {
            return Err(Error::missing_field("session.secret"));
        }
        if self.session.csrf_secret.is_empty() {
            return Err(Error::missing_field("session.csrf_secret"));
        }
        if self.session.cookie_name.is_empty() {
            return Err(Error::missing_field("session.cookie_name"));
        }
        if self.database.path.is_empty() {
            return Err(Error::missing_field("database.path"));
        }
        Ok(())
    }

    /// Whether either secret is still the built-in default
    pub fn uses_default_secrets(&self) -> bool {
        self.session.secret == DEFAULT_SESSION_SECRET
            || self.session.csrf_secret == DEFAULT_CSRF_SECRET
    }
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_address")]
    pub address: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "todo.duckdb".to_string()
}

/// Session cookie and CSRF settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// HMAC secret for the session cookie
    #[serde(default = "default_session_secret")]
    pub secret: String,

    /// HMAC secret for CSRF tokens
    #[serde(default = "default_csrf_secret")]
    pub csrf_secret: String,

    /// Session lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Mark the cookie `Secure`
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secret: default_session_secret(),
            csrf_secret: default_csrf_secret(),
            max_age_secs: default_max_age(),
            secure_cookie: false,
        }
    }
}

fn default_cookie_name() -> String {
    "todo_session".to_string()
}

fn default_session_secret() -> String {
    DEFAULT_SESSION_SECRET.to_string()
}

fn default_csrf_secret() -> String {
    DEFAULT_CSRF_SECRET.to_string()
}

fn default_max_age() -> u64 {
    86_400
}

/// Listing page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// To-dos per page
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Page links in the navigation window
    #[serde(default = "default_nav_len")]
    pub nav_len: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            nav_len: default_nav_len(),
        }
    }
}

fn default_page_size() -> i64 {
    5
}

fn default_nav_len() -> i64 {
    5
}
