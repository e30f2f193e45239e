//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::AppConfig;
use crate::database::{CreateTodoParams, DuckDbRepo, ListTodoParams, Todo, TodoRepo};
use crate::error::Result;
use crate::pagination::{self, PageInfo};

const SAMPLE_TITLES: [&str; 6] = [
    "Buy groceries",
    "Write weekly report",
    "Call the plumber",
    "Renew passport",
    "Water the plants",
    "Book dentist appointment",
];

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let mut config = self.load_config()?;

        match &self.cli.command {
            Commands::Serve { address, port } => {
                if let Some(address) = address {
                    config.server.address.clone_from(address);
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                crate::cli::serve(&config).await
            }
            Commands::List { page } => self.list(&config, *page).await,
            Commands::Seed { count } => self.seed(&config, *count as usize).await,
            Commands::Clear => self.clear(&config).await,
        }
    }

    /// Load configuration and apply global flags
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.cli.config.as_deref())?;
        if let Some(database) = &self.cli.database {
            config.database.path.clone_from(database);
        }
        tracing::debug!(?config.server, ?config.database, ?config.listing, "Loaded config");
        Ok(config)
    }

    /// Print one page of to-dos
    async fn list(&self, config: &AppConfig, page: i64) -> Result<()> {
        let repo = DuckDbRepo::open(&config.database.path)?;
        let limit = config.listing.page_size;
        let offset = pagination::offset(page, limit)?;

        let total = repo.count_todos().await?;
        let page_info = pagination::compute(page, config.listing.nav_len, total, limit)?;
        let todos = repo.list_todos(ListTodoParams { limit, offset }).await?;

        print!("{}", format_listing(&todos, &page_info, total));
        Ok(())
    }

    /// Insert `count` sample to-dos
    async fn seed(&self, config: &AppConfig, count: usize) -> Result<()> {
        let repo = DuckDbRepo::open(&config.database.path)?;
        let ids = seed_todos(&repo, count).await?;

        tracing::info!(count = ids.len(), "Seeded todos");
        println!("Inserted {} todos", ids.len());
        Ok(())
    }

    /// Delete every to-do
    async fn clear(&self, config: &AppConfig) -> Result<()> {
        let repo = DuckDbRepo::open(&config.database.path)?;
        let before = repo.count_todos().await?;
        repo.clear_todos().await?;

        tracing::info!(deleted = before, "Cleared todos");
        println!("Deleted {before} todos");
        Ok(())
    }
}

/// Insert `count` sample to-dos and return their ids
pub async fn seed_todos(repo: &dyn TodoRepo, count: usize) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for n in 0..count {
        let title = SAMPLE_TITLES[n % SAMPLE_TITLES.len()];
        let id = repo
            .create_todo(CreateTodoParams::new(
                format!("{title} #{}", n + 1),
                format!("Sample todo number {}", n + 1),
            ))
            .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Plain-text listing with the page navigation underneath
pub fn format_listing(todos: &[Todo], page_info: &PageInfo, total: i64) -> String {
    let mut out = String::new();

    if todos.is_empty() {
        out.push_str("No todos on this page.\n");
    }
    for todo in todos {
        out.push_str(&format!(
            "{:>6}  {:<32}  {}\n",
            todo.id,
            todo.title_str(),
            todo.description_str()
        ));
    }

    if page_info.is_empty() {
        return out;
    }

    let mut nav = Vec::new();
    if let Some(previous) = page_info.previous_link() {
        nav.push(format!("<{previous}"));
    }
    for page in &page_info.pages {
        if page.is_selected {
            nav.push(format!("[{}]", page.page_num));
        } else {
            nav.push(page.page_num.to_string());
        }
    }
    if let Some(next) = page_info.next_link() {
        nav.push(format!("{next}>"));
    }

    out.push_str(&format!(
        "\nPages: {}  ({} todos, {} pages)\n",
        nav.join(" "),
        total,
        page_info.total_pages
    ));
    out
}
