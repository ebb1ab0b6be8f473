use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

/// Every feed is cut into pages of this many posts.
pub const PAGE_SIZE: usize = 10;

/// `?page=` query parameter. Kept as a raw string so that garbage input falls
/// back to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
}

/// One page of an ordered collection plus navigation metadata.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }
}

pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
}

impl<T> Paginator<T> {
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        Self {
            items,
            per_page: per_page.max(1),
        }
    }

    /// At least one page, even when there is nothing to show.
    pub fn num_pages(&self) -> usize {
        self.items.len().div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw page request the lenient way: missing or non-numeric
    /// input means page 1, anything out of range means the last page. Numbers
    /// too large for `i64` are still numbers, so they are out of range too.
    pub fn get_page(self, requested: Option<&str>) -> Page<T> {
        let num_pages = self.num_pages();
        let number = match requested.map(|raw| raw.trim().parse::<i64>()) {
            None => 1,
            Some(Err(e)) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => num_pages,
                _ => 1,
            },
            Some(Ok(n)) if n < 1 || n as usize > num_pages => num_pages,
            Some(Ok(n)) => n as usize,
        };
        self.page(number, num_pages)
    }

    fn page(self, number: usize, num_pages: usize) -> Page<T> {
        let count = self.items.len();
        let start = (number - 1) * self.per_page;
        let items: Vec<T> = self
            .items
            .into_iter()
            .skip(start)
            .take(self.per_page)
            .collect();

        let has_next = number < num_pages;
        let has_previous = number > 1;
        Page {
            items,
            number,
            num_pages,
            count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then_some(number - 1),
        }
    }
}

/// Shorthand for the fixed-size feed pages.
pub fn paginate<T>(items: Vec<T>, params: &PaginationParams) -> Page<T> {
    Paginator::new(items, PAGE_SIZE).get_page(params.page.as_deref())
}
