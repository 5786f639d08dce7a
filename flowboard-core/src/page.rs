//! Pagination types for column task listings.
//!
//! The server speaks the full cursor envelope ([`Paginated`]) with
//! first/prev/next/last markers; the client folds it into the simpler
//! [`Page`] shape its infinite-scroll loop consumes.

use serde::{Deserialize, Serialize};

/// A fetched page of items plus the cursor for the next one, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// 1-based number of the next page, or `None` on the last page.
    pub next_page: Option<u32>,
}

/// The paginated wire envelope served for `?page=`-style listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// First page number (always 1).
    pub first: u32,
    /// Previous page number, if any.
    pub prev: Option<u32>,
    /// Next page number, if any.
    pub next: Option<u32>,
    /// Last page number.
    pub last: u32,
    /// Total number of pages.
    pub pages: u32,
    /// Total number of items across all pages.
    pub items: u64,
    /// The items on this page.
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    /// Slices `all` into the requested page and builds the envelope.
    ///
    /// Pages are 1-based; `page` of 0 is treated as 1, and a page past the
    /// end yields an empty `data`. `per_page` of 0 is treated as 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn paginate(all: Vec<T>, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total = all.len() as u64;
        let pages = (all.len().div_ceil(per_page as usize)) as u32;

        let start = (page as usize - 1).saturating_mul(per_page as usize);
        let data: Vec<T> = all
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Self {
            first: 1,
            prev: (page > 1 && page <= pages).then(|| page - 1),
            next: (page < pages).then(|| page + 1),
            last: pages,
            pages,
            items: total,
            data,
        }
    }

    /// Folds the envelope into the flat page the client consumes.
    #[must_use]
    pub fn into_page(self) -> Page<T> {
        Page {
            items: self.data,
            next_page: self.next,
        }
    }
}
