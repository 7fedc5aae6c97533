//! Fixed-size page navigation over the matched (filtered) record count.

use shared::error::ValidationError;

pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageState {
    current_page: usize,
    page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PageState {
    /// A zero page size is raised to one so slicing always advances.
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Pages past the last one are accepted and render as empty.
    pub fn go_to_page(&mut self, page: usize) -> Result<(), ValidationError> {
        if page == 0 {
            return Err(ValidationError::PageOutOfRange);
        }
        self.current_page = page;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Half-open `[start, end)` record positions for the current page,
    /// clamped to `total`. An out-of-range page yields an empty range.
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        let start = (self.current_page - 1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size);
        (start.min(total), end.min(total))
    }

    pub fn page_count(&self, total_matched: usize) -> usize {
        page_count(total_matched, self.page_size)
    }
}

/// Page count for navigation controls; never less than one.
pub fn page_count(total_matched: usize, page_size: usize) -> usize {
    total_matched.div_ceil(page_size.max(1)).max(1)
}

#[cfg(test)]
#[path = "tests/paging_tests.rs"]
mod tests;
