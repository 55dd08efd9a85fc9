//! Page arithmetic for the post list.
//!
//! Page numbers are 1-based. Requests for a page that is not a number get
//! page 1; numbers outside `1..=num_pages` get the last page. An empty result
//! is still one (empty) page.

use serde::Serialize;

pub const PAGE_SIZE: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self { count, per_page: per_page.max(1) }
    }

    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw `page` query value to a valid page number.
    pub fn page_number(&self, raw: Option<&str>) -> u64 {
        match raw.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n >= 1 && (n as u64) <= self.num_pages() => n as u64,
            Some(Ok(_)) => self.num_pages(),
            Some(Err(_)) | None => 1,
        }
    }

    /// Rows to skip for `number`.
    pub fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1) * self.per_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn page<T>(&self, number: u64, object_list: Vec<T>) -> Page<T> {
        Page { object_list, number, num_pages: self.num_pages(), count: self.count }
    }
}

/// One page of results.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    /// `?page=N` link to the previous page, or `""` on the first page.
    pub fn prev_url(&self, search: Option<&str>) -> String {
        if self.has_previous() { page_link(search, self.number - 1) } else { String::new() }
    }

    /// `?page=N` link to the next page, or `""` on the last page.
    pub fn next_url(&self, search: Option<&str>) -> String {
        if self.has_next() { page_link(search, self.number + 1) } else { String::new() }
    }
}

/// Query string for `number`, carrying the search term along when present.
fn page_link(search: Option<&str>, number: u64) -> String {
    let number = number.to_string();
    let pairs: Vec<(&str, &str)> = match search {
        Some(term) if !term.is_empty() => vec![("search", term), ("page", &number)],
        _ => vec![("page", &number)],
    };
    format!("?{}", serde_urlencoded::to_string(pairs).unwrap_or_default())
}
