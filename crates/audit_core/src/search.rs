use shared::domain::{RecordField, UserRecord};

use crate::paging::PageState;

/// Free-text search term. Empty means no filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchTerm {
    raw: String,
    folded: String,
}

impl SearchTerm {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let folded = raw.to_lowercase();
        Self { raw, folded }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Case-insensitive substring match against any searchable field.
    pub fn matches(&self, record: &UserRecord) -> bool {
        if self.is_empty() {
            return true;
        }
        RecordField::SEARCHABLE
            .into_iter()
            .any(|field| record.field(field).to_lowercase().contains(&self.folded))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchController {
    term: SearchTerm,
}

impl SearchController {
    pub fn term(&self) -> &SearchTerm {
        &self.term
    }

    /// Stores `term` and returns to page 1, even when the term is unchanged.
    pub fn set_search(&mut self, term: impl Into<String>, page: &mut PageState) {
        self.term = SearchTerm::new(term);
        page.reset();
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
