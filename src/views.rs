//! HTML pages
//!
//! Page templates are compiled into the binary from `templates/`. Every
//! page is rendered into `layout.html` as its `body`.

use crate::database::Todo;
use crate::error::Result;
use crate::pagination::{Page, PageInfo};
use crate::template::{self, TemplateContext};
use serde::Serialize;

const LAYOUT: &str = include_str!("../templates/layout.html");
const INDEX: &str = include_str!("../templates/index.html");
const INDEX_ROW: &str = include_str!("../templates/index_row.html");
const INDEX_EMPTY: &str = include_str!("../templates/index_empty.html");
const NAV: &str = include_str!("../templates/nav.html");
const NAV_LINK: &str = include_str!("../templates/nav_link.html");
const NAV_CURRENT: &str = include_str!("../templates/nav_current.html");
const NEW: &str = include_str!("../templates/new.html");
const SHOW: &str = include_str!("../templates/show.html");
const EDIT: &str = include_str!("../templates/edit.html");
const ERROR: &str = include_str!("../templates/error.html");

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Display form of a [`Todo`]
#[derive(Debug, Serialize)]
struct TodoView<'a> {
    id: i64,
    title: &'a str,
    description: &'a str,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a Todo> for TodoView<'a> {
    fn from(todo: &'a Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title_str(),
            description: todo.description_str(),
            created_at: todo.created_at.format(DISPLAY_TIME_FORMAT).to_string(),
            updated_at: todo.updated_at.format(DISPLAY_TIME_FORMAT).to_string(),
        }
    }
}

/// Wrap a page body in the shared layout
fn layout(title: &str, body: String) -> Result<String> {
    let mut ctx = TemplateContext::new();
    ctx.set_str("title", title).set_str("body", body);
    template::render(LAYOUT, &ctx)
}

/// The to-do list with its page navigation
pub fn index_page(todos: &[Todo], page_info: &PageInfo, token: &str) -> Result<String> {
    let rows = if todos.is_empty() {
        INDEX_EMPTY.to_string()
    } else {
        template::render_each(INDEX_ROW, todos, |todo, ctx| {
            let view = TodoView::from(todo);
            ctx.set("id", view.id)?
                .set_str("title", view.title)
                .set_str("description", view.description)
                .set_str("created_at", view.created_at);
            Ok(())
        })?
    };

    let mut ctx = TemplateContext::new();
    ctx.set_str("title", "Todo List")
        .set_str("token", token)
        .set_str("rows", rows)
        .set_str("nav", page_nav(page_info)?);

    layout("Todo List", template::render(INDEX, &ctx)?)
}

/// Navigation links for `page_info`; empty when there is a single window
/// with nothing to link to
pub fn page_nav(page_info: &PageInfo) -> Result<String> {
    if page_info.is_empty() {
        return Ok(String::new());
    }

    let links = page_info
        .pages
        .iter()
        .map(page_entry)
        .collect::<Result<Vec<_>>>()?
        .concat();

    let previous = match page_info.previous_link() {
        Some(page) => nav_link(page, "\u{ab} Prev")?,
        None => String::new(),
    };
    let next = match page_info.next_link() {
        Some(page) => nav_link(page, "Next \u{bb}")?,
        None => String::new(),
    };

    let mut ctx = TemplateContext::new();
    ctx.set_str("previous", previous)
        .set_str("links", links)
        .set_str("next", next)
        .set("total_pages", page_info.total_pages)?;
    template::render(NAV, &ctx)
}

fn page_entry(page: &Page) -> Result<String> {
    if page.is_selected {
        let mut ctx = TemplateContext::new();
        ctx.set("page", page.page_num)?;
        template::render(NAV_CURRENT, &ctx)
    } else {
        nav_link(page.page_num, &page.page_num.to_string())
    }
}

fn nav_link(page: i64, label: &str) -> Result<String> {
    let mut ctx = TemplateContext::new();
    ctx.set("page", page)?.set_str("label", label);
    template::render(NAV_LINK, &ctx)
}

/// Form for a new to-do
pub fn new_page(token: &str) -> Result<String> {
    let mut ctx = TemplateContext::new();
    ctx.set_str("token", token);
    layout("New todo", template::render(NEW, &ctx)?)
}

/// One to-do
pub fn show_page(todo: &Todo, token: &str) -> Result<String> {
    let mut ctx = TemplateContext::new();
    ctx.set("todo", TodoView::from(todo))?.set_str("token", token);
    layout(todo.title_str(), template::render(SHOW, &ctx)?)
}

/// Edit form for one to-do
pub fn edit_page(todo: &Todo, token: &str) -> Result<String> {
    let mut ctx = TemplateContext::new();
    ctx.set("todo", TodoView::from(todo))?.set_str("token", token);
    layout("Edit todo", template::render(EDIT, &ctx)?)
}

/// Error page for `status`; falls back to plain text if rendering fails
pub fn error_page(status: u16) -> String {
    let (reason, message) = match status {
        400 => ("Bad Request", "The request could not be understood."),
        404 => ("Not Found", "The requested todo does not exist."),
        _ => (
            "Internal Server Error",
            "Something went wrong on our side. Please try again later.",
        ),
    };

    let mut ctx = TemplateContext::new();
    ctx.set_str("status", status.to_string())
        .set_str("reason", reason)
        .set_str("message", message);

    template::render(ERROR, &ctx)
        .and_then(|body| layout(reason, body))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to render error page");
            format!("{status} {reason}")
        })
}
