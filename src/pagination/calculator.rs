//! Navigation window calculation

use super::types::{Page, PageInfo};
use crate::error::{Error, Result};

/// Compute the navigation window for `page`.
///
/// The window starts at `(page / nav_len) * nav_len`, i.e. it divides the
/// raw 1-based page number. For a page that is an exact multiple of
/// `nav_len` this selects the following window, so the current page is not
/// part of it. Callers clamp `previous` and `next` themselves (see
/// [`PageInfo::previous_link`] and [`PageInfo::next_link`]).
pub fn compute(page: i64, nav_len: i64, total: i64, limit: i64) -> Result<PageInfo> {
    if nav_len <= 0 {
        return Err(Error::invalid_argument(format!(
            "nav_len must be positive, got {nav_len}"
        )));
    }
    if limit <= 0 {
        return Err(Error::invalid_argument(format!(
            "limit must be positive, got {limit}"
        )));
    }
    if page < 1 {
        return Err(Error::invalid_argument(format!(
            "page must be at least 1, got {page}"
        )));
    }
    if total < 0 {
        return Err(Error::invalid_argument(format!(
            "total must not be negative, got {total}"
        )));
    }

    let mut total_pages = total / limit;
    if total % limit != 0 {
        total_pages += 1;
    }

    let window_start = (page / nav_len) * nav_len;
    let window_end = if window_start.saturating_add(nav_len) < total_pages {
        window_start + nav_len
    } else {
        window_start.saturating_add(total_pages % nav_len)
    };

    let pages: Vec<Page> = (window_start..window_end)
        .map(|i| Page::new(i + 1, i + 1 == page))
        .collect();

    let (Some(first), Some(last)) = (pages.first().copied(), pages.last().copied()) else {
        return Ok(PageInfo::default());
    };

    let next = last
        .page_num
        .checked_add(1)
        .ok_or_else(|| Error::invalid_argument(format!("page {page} is out of range")))?;

    Ok(PageInfo {
        pages,
        total_pages,
        nav_len,
        first_page: first.page_num,
        last_page: last.page_num,
        previous: first.page_num - nav_len,
        next,
    })
}

/// Row offset of the first record on `page`
pub fn offset(page: i64, limit: i64) -> Result<i64> {
    if page < 1 || limit <= 0 {
        return Err(Error::invalid_argument(format!(
            "cannot compute offset for page {page} with limit {limit}"
        )));
    }
    (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| Error::invalid_argument(format!("page {page} is out of range")))
}
