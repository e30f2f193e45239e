//! End-to-end tests against a running server
//!
//! Each test binds the router to an ephemeral port and drives it with a
//! real HTTP client, cookies and CSRF tokens included.

use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use todo_web::cli::{router, AppState, ServerOptions};
use todo_web::config::AppConfig;
use todo_web::database::{
    CreateTodoParams, DuckDbRepo, ListTodoParams, SharedRepo, Todo, TodoRepo, UpdateTodoParams,
};
use todo_web::{Error, Result};

// ============================================================================
// Harness
// ============================================================================

/// Serve `repo` on a random local port and return the base URL
async fn spawn_server(repo: SharedRepo, options: ServerOptions) -> String {
    let app = router(AppState::new(&AppConfig::default(), repo, options));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Browser stand-in: no redirects followed, session cookie carried by hand
struct Browser {
    client: Client,
    base: String,
    cookie: Option<String>,
}

impl Browser {
    fn new(base: String) -> Self {
        let client = Client::builder().redirect(Policy::none()).build().unwrap();
        Self {
            client,
            base,
            cookie: None,
        }
    }

    fn remember_cookie(&mut self, response: &reqwest::Response) {
        if let Some(value) = response.headers().get(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
    }

    async fn get(&mut self, path: &str) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{path}", self.base));
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await.unwrap();
        self.remember_cookie(&response);
        response
    }

    async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        let mut request = self.client.post(format!("{}{path}", self.base)).form(form);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await.unwrap();
        self.remember_cookie(&response);
        response
    }

    /// Load a form page and pull its CSRF token out of the HTML
    async fn csrf_token(&mut self, path: &str) -> String {
        let html = self.get(path).await.text().await.unwrap();
        extract_token(&html)
    }
}

fn extract_token(html: &str) -> String {
    let marker = r#"name="_csrf" value=""#;
    let start = html.find(marker).expect("page has a CSRF field") + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn memory_repo() -> DuckDbRepo {
    DuckDbRepo::open_in_memory().unwrap()
}

/// Repo whose every call fails like a lost database connection
struct FailingRepo;

#[async_trait]
impl TodoRepo for FailingRepo {
    async fn count_todos(&self) -> Result<i64> {
        Err(Error::database("connection lost"))
    }
    async fn list_todos(&self, _params: ListTodoParams) -> Result<Vec<Todo>> {
        Err(Error::database("connection lost"))
    }
    async fn get_todo(&self, _id: i64) -> Result<Todo> {
        Err(Error::database("connection lost"))
    }
    async fn create_todo(&self, _params: CreateTodoParams) -> Result<i64> {
        Err(Error::database("connection lost"))
    }
    async fn update_todo(&self, _params: UpdateTodoParams) -> Result<()> {
        Err(Error::database("connection lost"))
    }
    async fn delete_todo(&self, _id: i64) -> Result<()> {
        Err(Error::database("connection lost"))
    }
    async fn delete_todos(&self, _ids: &[i64]) -> Result<()> {
        Err(Error::database("connection lost"))
    }
    async fn clear_todos(&self) -> Result<()> {
        Err(Error::database("connection lost"))
    }
}

// ============================================================================
// Create / show / edit
// ============================================================================

#[tokio::test]
async fn test_create_show_edit_flow() {
    let repo = memory_repo();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let token = browser.csrf_token("/new").await;
    assert!(browser.cookie.is_some());

    let response = browser
        .post(
            "/new",
            &[
                ("_csrf", token.as_str()),
                ("titleInput", "Buy milk"),
                ("descriptionInput", "Two litres"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let show_path = location(&response).to_string();
    assert!(show_path.starts_with("/show?id="));

    let html = browser.get(&show_path).await.text().await.unwrap();
    assert!(html.contains("<h1>Buy milk</h1>"));
    assert!(html.contains("Two litres"));

    let id = show_path.trim_start_matches("/show?id=").to_string();
    let token = browser.csrf_token(&format!("/edit?id={id}")).await;
    let response = browser
        .post(
            "/edit",
            &[
                ("_csrf", token.as_str()),
                ("id", id.as_str()),
                ("descriptionInput", "Three litres"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), show_path);

    let todo = repo.get_todo(id.parse().unwrap()).await.unwrap();
    assert_eq!(todo.description_str(), "Three litres");
    assert_eq!(todo.title_str(), "Buy milk");
}

#[tokio::test]
async fn test_create_rejects_blank_title() {
    let repo = memory_repo();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let token = browser.csrf_token("/new").await;
    let response = browser
        .post(
            "/new",
            &[
                ("_csrf", token.as_str()),
                ("titleInput", "   "),
                ("descriptionInput", "something"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.count_todos().await.unwrap(), 0);
}

#[tokio::test]
async fn test_show_status_codes() {
    let repo = memory_repo();
    let id = repo
        .create_todo(CreateTodoParams::new("Exists", "yes"))
        .await
        .unwrap();
    let base = spawn_server(Arc::new(repo), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let response = browser.get(&format!("/show?id={id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = browser.get("/show?id=999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("404 Not Found"));

    for path in ["/show", "/show?id=abc", "/show?id=0", "/edit?id=-1"] {
        let response = browser.get(path).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn test_edit_missing_todo_is_404() {
    let base = spawn_server(Arc::new(memory_repo()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let response = browser.get("/edit?id=999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("404 Not Found"));
}

#[tokio::test]
async fn test_edit_rejects_bad_forms() {
    let repo = memory_repo();
    let id = repo
        .create_todo(CreateTodoParams::new("Keep", "original"))
        .await
        .unwrap()
        .to_string();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);
    let token = browser.csrf_token(&format!("/edit?id={id}")).await;

    let bad_forms: [&[(&str, &str)]; 4] = [
        &[("descriptionInput", "no id")],
        &[("id", "abc"), ("descriptionInput", "bad id")],
        &[("id", id.as_str()), ("descriptionInput", "   ")],
        &[("id", id.as_str())],
    ];
    for form in bad_forms {
        let mut fields = vec![("_csrf", token.as_str())];
        fields.extend_from_slice(form);
        let response = browser.post("/edit", &fields).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{form:?}");
    }

    let todo = repo.get_todo(id.parse().unwrap()).await.unwrap();
    assert_eq!(todo.description_str(), "original");
}

#[tokio::test]
async fn test_edit_missing_todo_redirects_without_change() {
    let repo = memory_repo();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let token = browser.csrf_token("/new").await;
    let response = browser
        .post(
            "/edit",
            &[
                ("_csrf", token.as_str()),
                ("id", "404"),
                ("descriptionInput", "nobody home"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/show?id=404");
    assert_eq!(repo.count_todos().await.unwrap(), 0);
}

#[tokio::test]
async fn test_store_failure_renders_500() {
    let base = spawn_server(Arc::new(FailingRepo), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let response = browser.get("/show?id=1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("500 Internal Server Error"));

    let response = browser.get("/index").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// CSRF
// ============================================================================

#[tokio::test]
async fn test_post_without_token_is_rejected() {
    let repo = memory_repo();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    browser.get("/new").await;
    let response = browser
        .post(
            "/new",
            &[("titleInput", "Sneaky"), ("descriptionInput", "no token")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "CSRF token mismatch");
    assert_eq!(repo.count_todos().await.unwrap(), 0);
}

#[tokio::test]
async fn test_token_from_other_session_is_rejected() {
    let repo = memory_repo();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;

    let mut alice = Browser::new(base.clone());
    let mut mallory = Browser::new(base);
    let stolen = mallory.csrf_token("/new").await;
    alice.get("/new").await;

    let response = alice
        .post(
            "/new",
            &[
                ("_csrf", stolen.as_str()),
                ("titleInput", "Forged"),
                ("descriptionInput", "cross-session"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.count_todos().await.unwrap(), 0);
}

#[tokio::test]
async fn test_skip_csrf_mode_accepts_bare_posts() {
    let repo = memory_repo();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions { skip_csrf: true }).await;
    let mut browser = Browser::new(base);

    let response = browser
        .post(
            "/new",
            &[("titleInput", "Test"), ("descriptionInput", "harness")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(repo.count_todos().await.unwrap(), 1);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_single_and_bulk() {
    let repo = memory_repo();
    let mut ids = Vec::new();
    for n in 1..=4 {
        let id = repo
            .create_todo(CreateTodoParams::new(format!("Todo {n}"), "x"))
            .await
            .unwrap();
        ids.push(id.to_string());
    }
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let token = browser.csrf_token(&format!("/show?id={}", ids[0])).await;
    let response = browser
        .post("/delete", &[("_csrf", token.as_str()), ("id", ids[0].as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/index");
    assert_eq!(repo.count_todos().await.unwrap(), 3);

    let token = browser.csrf_token("/index").await;
    let bulk = format!("{},{}", ids[1], ids[2]);
    let response = browser
        .post("/delete", &[("_csrf", token.as_str()), ("ids", bulk.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let remaining = repo
        .list_todos(ListTodoParams {
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id.to_string(), ids[3]);

    let response = browser
        .post("/delete", &[("_csrf", token.as_str()), ("ids", "1,oops")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_with_nothing_selected_redirects() {
    let repo = memory_repo();
    repo.create_todo(CreateTodoParams::new("Stays", "x"))
        .await
        .unwrap();
    let base = spawn_server(Arc::new(repo.clone()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let token = browser.csrf_token("/index").await;
    let response = browser.post("/delete", &[("_csrf", token.as_str())]).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/index");
    assert_eq!(repo.count_todos().await.unwrap(), 1);
}

#[tokio::test]
async fn test_index_page_at_i64_max_is_rejected() {
    let repo = memory_repo();
    for n in 1..=10 {
        repo.create_todo(CreateTodoParams::new(format!("Item {n}"), "x"))
            .await
            .unwrap();
    }
    let base = spawn_server(Arc::new(repo), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let response = browser.get(&format!("/index?page={}", i64::MAX)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_index_pagination() {
    let repo = memory_repo();
    for n in 1..=12 {
        repo.create_todo(CreateTodoParams::new(format!("Item {n:02}"), "x"))
            .await
            .unwrap();
    }
    let base = spawn_server(Arc::new(repo), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let response = browser.get("/").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/index");

    let html = browser.get("/index?page=2").await.text().await.unwrap();
    assert!(html.contains("Item 06"));
    assert!(html.contains("Item 10"));
    assert!(!html.contains("Item 05"));
    assert!(!html.contains("Item 11"));
    assert!(html.contains(r#"<span class="current">2</span>"#));
    assert!(html.contains(r#"<a href="/index?page=3">3</a>"#));
    assert!(html.contains("(3 pages)"));

    let response = browser.get("/index?page=zero").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_index_empty_store() {
    let base = spawn_server(Arc::new(memory_repo()), ServerOptions::default()).await;
    let mut browser = Browser::new(base);

    let response = browser.get("/index").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Nothing to do."));
    assert!(!html.contains(r#"class="pages""#));
}
