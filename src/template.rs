//! Template interpolation for HTML pages
//!
//! Handles `{{ variable }}` interpolation with HTML escaping and
//! `{{{ variable }}}` for pre-rendered fragments that must be inserted
//! verbatim. Supports nested access like `{{ todo.title }}`.
//!
//! Substitution is a single pass over the template; inserted values are
//! never scanned for further placeholders.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Regex for `{{{ raw.path }}}` (group 1) or `{{ escaped.path }}` (group 2)
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}\}|\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}",
    )
    .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: Map<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, serialized to JSON
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<&mut Self> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.into(), value);
        Ok(self)
    }

    /// Set a string value
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Get a value by path (e.g., "todo.title")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            match current {
                Value::Object(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut errors = Vec::new();
    let mut last = 0;

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        result.push_str(&template[last..full_match.start()]);
        last = full_match.end();

        let (var_path, raw) = match (cap.get(1), cap.get(2)) {
            (Some(raw), _) => (raw.as_str(), true),
            (None, Some(escaped)) => (escaped.as_str(), false),
            (None, None) => continue,
        };

        match ctx.get(var_path) {
            Some(value) => {
                let text = value_to_string(value);
                if raw {
                    result.push_str(&text);
                } else {
                    result.push_str(&escape_html(&text));
                }
            }
            None => errors.push(var_path.to_string()),
        }
    }
    result.push_str(&template[last..]);

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Render every item of `items` with `template` and concatenate
pub fn render_each<T, F>(template: &str, items: &[T], mut fill: F) -> Result<String>
where
    F: FnMut(&T, &mut TemplateContext) -> Result<()>,
{
    let mut out = String::new();
    for item in items {
        let mut ctx = TemplateContext::new();
        fill(item, &mut ctx)?;
        out.push_str(&render(template, &ctx)?);
    }
    Ok(out)
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For complex types, use JSON serialization
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
