//! Pagination module
//!
//! Computes the page navigation window shown under the to-do list.
//!
//! # Overview
//!
//! Given the requested page, the navigation window length, the total row
//! count and the page size, [`compute`] yields the page numbers to link to
//! plus first/last/previous/next pointers. The calculation is pure and
//! cheap, so it is recomputed on every request.

mod calculator;
mod types;

pub use calculator::{compute, offset};
pub use types::{Page, PageInfo};
