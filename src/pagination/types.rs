//! Pagination types
//!
//! Plain data returned by the calculator and consumed by the views.

use serde::Serialize;

/// A single entry of the navigation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 1-based page number shown in the link
    pub page_num: i64,
    /// Whether this entry is the page being viewed
    pub is_selected: bool,
}

impl Page {
    /// Create a new page entry
    pub fn new(page_num: i64, is_selected: bool) -> Self {
        Self {
            page_num,
            is_selected,
        }
    }
}

/// Navigation window for one listing request
///
/// The all-zero default is what the calculator returns when there is
/// nothing to link to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Page entries in display order
    pub pages: Vec<Page>,
    /// Total number of pages for the row count
    pub total_pages: i64,
    /// Navigation window length
    pub nav_len: i64,
    /// First displayed page number
    pub first_page: i64,
    /// Last displayed page number
    pub last_page: i64,
    /// Start of the previous window (may be zero or negative)
    pub previous: i64,
    /// Start of the next window (may be past `total_pages`)
    pub next: i64,
}

impl PageInfo {
    /// Check if there are no page links to render
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of entries in the window
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// The selected entry, if the requested page is inside the window
    pub fn selected(&self) -> Option<&Page> {
        self.pages.iter().find(|p| p.is_selected)
    }

    /// Previous window link, only when it points at a real page
    pub fn previous_link(&self) -> Option<i64> {
        (!self.is_empty() && self.previous >= 1).then_some(self.previous)
    }

    /// Next window link, only when it points at a real page
    pub fn next_link(&self) -> Option<i64> {
        (!self.is_empty() && self.next <= self.total_pages).then_some(self.next)
    }
}
