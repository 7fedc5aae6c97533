//! Filter, sort and paginate a record snapshot into the rows to render.
//!
//! [`derive`] is pure: it borrows the collection, never reorders it, and
//! produces the same output for the same inputs. [`ViewCache`] memoizes the
//! result keyed on collection version and control values.

use shared::domain::{SortSpec, UserRecord};

use crate::{paging::PageState, search::SearchTerm, sort::compare_records};

/// Control inputs to one derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewQuery {
    pub search: SearchTerm,
    pub sort: SortSpec,
    pub page: PageState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedView<'a> {
    pub rows: Vec<&'a UserRecord>,
    /// Filtered count before pagination.
    pub total_matched: usize,
}

pub fn derive<'a>(records: &'a [UserRecord], query: &ViewQuery) -> DerivedView<'a> {
    let (positions, total_matched) = derive_positions(records, query);
    DerivedView {
        rows: positions.into_iter().map(|pos| &records[pos]).collect(),
        total_matched,
    }
}

/// Same pipeline as [`derive`], yielding indices into `records`.
pub fn derive_positions(records: &[UserRecord], query: &ViewQuery) -> (Vec<usize>, usize) {
    let mut matched: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| query.search.matches(record))
        .map(|(pos, _)| pos)
        .collect();
    let total_matched = matched.len();

    if query.sort.is_active() {
        matched.sort_by(|&a, &b| compare_records(&records[a], &records[b], query.sort));
    }

    let (start, end) = query.page.bounds(total_matched);
    matched.truncate(end);
    let page = matched.split_off(start);
    (page, total_matched)
}

#[derive(Debug, Default)]
pub struct ViewCache {
    entry: Option<CachedView>,
    recomputations: u64,
}

#[derive(Debug)]
struct CachedView {
    version: u64,
    query: ViewQuery,
    positions: Vec<usize>,
    total_matched: usize,
}

impl ViewCache {
    /// Returns `(positions, total_matched)` for `query` over the collection
    /// at `version`, recomputing when either differs from the cached key.
    pub fn get_or_derive(
        &mut self,
        version: u64,
        records: &[UserRecord],
        query: &ViewQuery,
    ) -> (&[usize], usize) {
        let fresh = matches!(
            &self.entry,
            Some(entry) if entry.version == version && entry.query == *query
        );
        if !fresh {
            let (positions, total_matched) = derive_positions(records, query);
            self.recomputations += 1;
            self.entry = Some(CachedView {
                version,
                query: query.clone(),
                positions,
                total_matched,
            });
        }
        match &self.entry {
            Some(entry) => (&entry.positions, entry.total_matched),
            None => (&[], 0),
        }
    }

    /// Number of full derivations performed so far.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
