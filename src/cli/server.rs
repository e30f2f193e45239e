//! HTTP server for the to-do pages

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{csrf_layer, session_layer};
use crate::config::{AppConfig, ListingConfig};
use crate::database::{
    CreateTodoParams, DuckDbRepo, ListTodoParams, SharedRepo, UpdateTodoParams,
};
use crate::error::{Error, Result};
use crate::pagination;
use crate::session::{Session, SessionKeys};
use crate::views;

/// Server behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOptions {
    /// Accept state-changing requests without a CSRF token (tests only)
    pub skip_csrf: bool,
}

/// App state shared across handlers
pub struct AppState {
    pub(super) repo: SharedRepo,
    pub(super) sessions: SessionKeys,
    pub(super) listing: ListingConfig,
    pub(super) options: ServerOptions,
}

impl AppState {
    /// Build state from configuration and a repository
    pub fn new(config: &AppConfig, repo: SharedRepo, options: ServerOptions) -> Self {
        Self {
            repo,
            sessions: SessionKeys::new(&config.session),
            listing: config.listing.clone(),
            options,
        }
    }
}

/// Build the router with all pages and middleware
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health))
        .route("/", get(root))
        .route("/index", get(list_todos))
        .route("/new", get(new_todo).post(create_todo))
        .route("/show", get(show_todo))
        .route("/edit", get(edit_todo).post(update_todo))
        .route("/delete", post(delete_todo))
        .layer(middleware::from_fn_with_state(state.clone(), csrf_layer))
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database and run the HTTP server until Ctrl-C
pub async fn serve(config: &AppConfig) -> Result<()> {
    if config.uses_default_secrets() {
        tracing::warn!("Using built-in session secrets; set TODO_SESSION_SECRET and TODO_CSRF_SECRET");
    }

    let repo = DuckDbRepo::open(&config.database.path)?;
    tracing::info!(path = repo.path(), "Opened database");

    let app = router(AppState::new(
        config,
        Arc::new(repo),
        ServerOptions::default(),
    ));

    let addr = format!("{}:{}", config.server.address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting HTTP server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Error responses
// ============================================================================

/// A handler failure: the error plus where it happened
#[derive(Debug)]
struct AppError {
    error: Error,
    position: &'static str,
}

impl AppError {
    /// Structured description of the failure for the log
    fn details(&self) -> (&'static str, &'static str, &'static str) {
        match &self.error {
            e if e.is_client_error() => (
                "Client sent an invalid request parameter",
                "User sees the 400 Bad Request page",
                "Request was tampered with by the client; no special handling needed",
            ),
            Error::TodoNotFound { .. } => (
                "The selected todo does not exist",
                "User sees the 404 Not Found page",
                "The requested id does not exist, or the data is inconsistent",
            ),
            Error::Database { .. } => (
                "Error occurred while accessing the database",
                "User sees the 500 Internal Server Error page",
                "This might be a database connection issue; check the database status",
            ),
            _ => (
                "Unexpected error while handling the request",
                "User sees the 500 Internal Server Error page",
                "Check the error message and the surrounding log lines",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let (cause, effect, solution) = self.details();

        if status >= 500 {
            tracing::error!(
                cause,
                effect,
                solution,
                position = self.position,
                error = %self.error,
                "Request failed"
            );
        } else {
            tracing::warn!(
                cause,
                effect,
                solution,
                position = self.position,
                error = %self.error,
                "Request rejected"
            );
        }

        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Html(views::error_page(status))).into_response()
    }
}

/// Attach the failing position to an error
trait At<T> {
    fn at(self, position: &'static str) -> std::result::Result<T, AppError>;
}

impl<T, E: Into<Error>> At<T> for std::result::Result<T, E> {
    fn at(self, position: &'static str) -> std::result::Result<T, AppError> {
        self.map_err(|e| AppError {
            error: e.into(),
            position,
        })
    }
}

type HandlerResult = std::result::Result<Response, AppError>;

/// 302 redirect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

// ============================================================================
// Request parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTodoForm {
    #[serde(rename = "titleInput")]
    title: Option<String>,
    #[serde(rename = "descriptionInput")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateTodoForm {
    id: Option<String>,
    #[serde(rename = "descriptionInput")]
    description: Option<String>,
}

/// Page number from the query; absent means 1
fn parse_page(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(1);
    };
    let page: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::invalid_request(format!("page '{raw}' is not a number")))?;
    if page < 1 {
        return Err(Error::invalid_request(format!("page {page} is below 1")));
    }
    Ok(page)
}

/// A required positive id
fn parse_id(raw: Option<&str>) -> Result<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::invalid_request("id is required"))?;
    let id: i64 = raw
        .parse()
        .map_err(|_| Error::invalid_request(format!("id '{raw}' is not a number")))?;
    if id < 1 {
        return Err(Error::invalid_request(format!("id {id} is below 1")));
    }
    Ok(id)
}

/// A required, non-blank text field
fn required_text(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::invalid_request(format!("{field} is required")))
}

/// Ids to delete: every `ids` value (comma-separated) or else the single `id`.
/// A form with neither selects nothing.
fn parse_delete_ids(pairs: &[(String, String)]) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for (_, value) in pairs.iter().filter(|(k, _)| k == "ids") {
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            ids.push(parse_id(Some(part))?);
        }
    }

    if ids.is_empty() {
        if let Some((_, single)) = pairs.iter().find(|(k, _)| k == "id") {
            ids.push(parse_id(Some(single.as_str()))?);
        }
    }
    Ok(ids)
}

fn bad_form(rejection: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("Malformed form body: {rejection}"))
}

fn bad_query(rejection: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("Malformed query string: {rejection}"))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "Up" }))
}

async fn root() -> Response {
    found("/index")
}

/// Paginated list
async fn list_todos(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> HandlerResult {
    let Query(query) = query.map_err(bad_query).at("list_todos")?;
    let page = parse_page(query.page.as_deref()).at("list_todos")?;
    let limit = state.listing.page_size;
    let offset = pagination::offset(page, limit).at("list_todos")?;

    let total = state.repo.count_todos().await.at("list_todos: count_todos")?;
    let page_info =
        pagination::compute(page, state.listing.nav_len, total, limit).at("list_todos")?;

    let todos = state
        .repo
        .list_todos(ListTodoParams { limit, offset })
        .await
        .at("list_todos: list_todos")?;

    let token = state.sessions.csrf_token(&session).at("list_todos")?;
    let html = views::index_page(&todos, &page_info, &token).at("list_todos: render")?;
    Ok(Html(html).into_response())
}

/// Form for a new to-do
async fn new_todo(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> HandlerResult {
    let token = state.sessions.csrf_token(&session).at("new_todo")?;
    let html = views::new_page(&token).at("new_todo: render")?;
    Ok(Html(html).into_response())
}

/// Create a to-do and redirect to it
async fn create_todo(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<CreateTodoForm>, FormRejection>,
) -> HandlerResult {
    let Form(form) = form.map_err(bad_form).at("create_todo")?;
    let title = required_text(form.title, "titleInput").at("create_todo")?;
    let description = required_text(form.description, "descriptionInput").at("create_todo")?;

    let id = state
        .repo
        .create_todo(CreateTodoParams::new(title, description))
        .await
        .at("create_todo: create_todo")?;

    tracing::info!(id, "Created todo");
    Ok(found(&format!("/show?id={id}")))
}

/// One to-do
async fn show_todo(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> HandlerResult {
    let Query(query) = query.map_err(bad_query).at("show_todo")?;
    let id = parse_id(query.id.as_deref()).at("show_todo")?;

    let todo = state.repo.get_todo(id).await.at("show_todo: get_todo")?;

    let token = state.sessions.csrf_token(&session).at("show_todo")?;
    let html = views::show_page(&todo, &token).at("show_todo: render")?;
    Ok(Html(html).into_response())
}

/// Edit form
async fn edit_todo(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> HandlerResult {
    let Query(query) = query.map_err(bad_query).at("edit_todo")?;
    let id = parse_id(query.id.as_deref()).at("edit_todo")?;

    let todo = state.repo.get_todo(id).await.at("edit_todo: get_todo")?;

    let token = state.sessions.csrf_token(&session).at("edit_todo")?;
    let html = views::edit_page(&todo, &token).at("edit_todo: render")?;
    Ok(Html(html).into_response())
}

/// Save the description and redirect to the to-do
async fn update_todo(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<UpdateTodoForm>, FormRejection>,
) -> HandlerResult {
    let Form(form) = form.map_err(bad_form).at("update_todo")?;
    let id = parse_id(form.id.as_deref()).at("update_todo")?;
    let description = required_text(form.description, "descriptionInput").at("update_todo")?;

    state
        .repo
        .update_todo(UpdateTodoParams {
            id,
            description: Some(description),
        })
        .await
        .at("update_todo: update_todo")?;

    tracing::info!(id, "Updated todo");
    Ok(found(&format!("/show?id={id}")))
}

/// Delete one to-do (`id`) or several (`ids`)
async fn delete_todo(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<Vec<(String, String)>>, FormRejection>,
) -> HandlerResult {
    let Form(pairs) = form.map_err(bad_form).at("delete_todo")?;
    let ids = parse_delete_ids(&pairs).at("delete_todo")?;

    if ids.is_empty() {
        tracing::debug!("Nothing selected for deletion");
        return Ok(found("/index"));
    }

    if let [id] = ids.as_slice() {
        state
            .repo
            .delete_todo(*id)
            .await
            .at("delete_todo: delete_todo")?;
    } else {
        state
            .repo
            .delete_todos(&ids)
            .await
            .at("delete_todo: delete_todos")?;
    }

    tracing::info!(?ids, "Deleted todos");
    Ok(found("/index"))
}
