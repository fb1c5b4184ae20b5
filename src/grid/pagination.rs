//! Client-side pagination

use std::ops::Range;

use serde::Serialize;

/// One page button; exactly one is active when any exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub number: usize,
    pub active: bool,
}

/// Page cursor over `total` items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    total: usize,
    per_page: usize,
    current: usize,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
            current: 1,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    /// Change the page size and go back to the first page
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.current = 1;
    }

    /// Select a page (1-based); pages past the end render empty
    pub fn go_to(&mut self, page: usize) {
        self.current = page.max(1);
    }

    /// Item indices shown on `page`
    pub fn page_range(&self, page: usize) -> Range<usize> {
        let start = page.saturating_sub(1).saturating_mul(self.per_page);
        let end = start.saturating_add(self.per_page);
        start.min(self.total)..end.min(self.total)
    }

    /// Items of the current page
    pub fn current_slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.page_range(self.current);
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }

    pub fn buttons(&self) -> Vec<PageButton> {
        (1..=self.total_pages())
            .map(|number| PageButton {
                number,
                active: number == self.current,
            })
            .collect()
    }
}
