//! Fixed-size pages over an in-memory collection

use std::ops::Range;

/// Shared page navigation behaviour; pages are numbered from 1
pub trait Paginated {
    /// Current page number (1-based)
    fn current_page(&self) -> usize;

    /// Move to `page`, clamped to the valid range; returns the page landed on
    fn set_page(&mut self, page: usize) -> usize;

    /// Total number of pages, never less than 1
    fn total_pages(&self) -> usize;

    fn next_page(&mut self) -> usize {
        let next = self.current_page() + 1;
        self.set_page(next)
    }

    fn previous_page(&mut self) -> usize {
        let previous = self.current_page().saturating_sub(1);
        self.set_page(previous)
    }

    fn go_to_first_page(&mut self) -> usize {
        self.set_page(1)
    }

    fn go_to_last_page(&mut self) -> usize {
        let last = self.total_pages();
        self.set_page(last)
    }

    fn has_next_page(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    fn has_previous_page(&self) -> bool {
        self.current_page() > 1
    }

    /// Pagination controls are only useful with more than one page
    fn controls_enabled(&self) -> bool {
        self.total_pages() > 1
    }
}

/// Page index and size; the collection length is supplied per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView {
    page: usize,
    page_size: usize,
}

impl PageView {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    /// Re-clamp after the collection length changed
    pub fn clamp(&mut self, len: usize) {
        self.page = self.page.clamp(1, self.total_pages(len));
    }

    pub fn set_page(&mut self, page: usize, len: usize) -> usize {
        self.page = page;
        self.clamp(len);
        self.page
    }

    /// Index range of the current page, always within `0..len`
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(len);
        let end = (start + self.page_size).min(len);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }
}
