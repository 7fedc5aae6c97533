use std::sync::Arc;

use shared::{
    domain::{SortSpec, TimeFormat, UserId, UserRecord},
    error::ValidationError,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    delete::{DeleteLifecycle, DeleteResolution, DeleteToken},
    directory::UserDirectory,
    format::format_timestamp,
    paging::{PageState, PAGE_SIZE},
    search::SearchController,
    sort::{ColumnSet, SortController, SortPagePolicy},
    store::{FetchApplied, FetchToken, RecordStatus, RecordStore},
    view::{ViewCache, ViewQuery},
};

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub columns: ColumnSet,
    pub sort_page_policy: SortPagePolicy,
    pub page_size: usize,
    pub time_format: TimeFormat,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            columns: ColumnSet::default(),
            sort_page_policy: SortPagePolicy::Keep,
            page_size: PAGE_SIZE,
            time_format: TimeFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    Loaded { count: usize },
    LoadFailed { reason: String },
    Deleted { id: UserId },
    DeleteFailed { id: UserId, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub record: UserRecord,
    pub status: RecordStatus,
}

/// One consistent read of everything the rendering layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub rows: Vec<TableRow>,
    pub total_matched: usize,
    pub current_page: usize,
    pub page_count: usize,
    pub search: String,
    pub sort: SortSpec,
    pub time_format: TimeFormat,
}

/// Synchronous table state. Every setter documents its side effects; the
/// async shell in [`AuditTable`] serializes access to it.
#[derive(Debug)]
pub struct TableState {
    store: RecordStore,
    deletes: DeleteLifecycle,
    search: SearchController,
    sort: SortController,
    page: PageState,
    cache: ViewCache,
    time_format: TimeFormat,
}

impl TableState {
    pub fn new(options: TableOptions) -> Self {
        Self {
            store: RecordStore::new(),
            deletes: DeleteLifecycle::new(),
            search: SearchController::default(),
            sort: SortController::new(options.columns, options.sort_page_policy),
            page: PageState::new(options.page_size),
            cache: ViewCache::default(),
            time_format: options.time_format,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Sets the search term. Side effect: page returns to 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search.set_search(term, &mut self.page);
    }

    /// Selects a sort column. Side effect: page returns to 1 only under
    /// [`SortPagePolicy::Reset`]. Rejected columns change nothing.
    pub fn set_sort(&mut self, key: &str) -> Result<SortSpec, ValidationError> {
        self.sort.set_sort(key, &mut self.page)
    }

    /// Moves to `page`. Pages past the end are allowed and show no rows.
    pub fn go_to_page(&mut self, page: usize) -> Result<(), ValidationError> {
        self.page.go_to_page(page)
    }

    /// Display-only; does not touch records or the derived view.
    pub fn set_time_format(&mut self, mode: TimeFormat) {
        self.time_format = mode;
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    pub fn current_page(&self) -> usize {
        self.page.current_page()
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort.spec()
    }

    pub fn columns(&self) -> &ColumnSet {
        self.sort.columns()
    }

    fn query(&self) -> ViewQuery {
        ViewQuery {
            search: self.search.term().clone(),
            sort: self.sort.spec(),
            page: self.page,
        }
    }

    pub fn visible_rows(&mut self) -> Vec<TableRow> {
        let query = self.query();
        let records = self.store.records();
        let (positions, _) = self
            .cache
            .get_or_derive(self.store.version(), records, &query);
        positions
            .iter()
            .map(|&pos| {
                let record = &records[pos];
                TableRow {
                    record: record.clone(),
                    status: self.store.status(&record.id),
                }
            })
            .collect()
    }

    pub fn total_matched(&mut self) -> usize {
        let query = self.query();
        self.cache
            .get_or_derive(self.store.version(), self.store.records(), &query)
            .1
    }

    pub fn page_count(&mut self) -> usize {
        let total = self.total_matched();
        self.page.page_count(total)
    }

    pub fn snapshot(&mut self) -> TableSnapshot {
        let rows = self.visible_rows();
        let total_matched = self.total_matched();
        TableSnapshot {
            loading: self.store.is_loading(),
            error: self.store.error().map(str::to_string),
            rows,
            total_matched,
            current_page: self.page.current_page(),
            page_count: self.page.page_count(total_matched),
            search: self.search.term().as_str().to_string(),
            sort: self.sort.spec(),
            time_format: self.time_format,
        }
    }

    pub fn begin_fetch(&mut self) -> FetchToken {
        self.store.begin_fetch()
    }

    pub fn apply_fetch(
        &mut self,
        token: FetchToken,
        outcome: Result<Vec<UserRecord>, String>,
    ) -> FetchApplied {
        let applied = self.store.apply_fetch(token, outcome);
        if matches!(applied, FetchApplied::Loaded { .. }) {
            self.deletes.forget_absent(&self.store);
        }
        applied
    }

    /// Marks `id` Deleting. `None` when the record is absent.
    pub fn request_delete(&mut self, id: &UserId) -> Option<DeleteToken> {
        self.deletes.request(&mut self.store, id)
    }

    pub fn resolve_delete(
        &mut self,
        id: &UserId,
        token: DeleteToken,
        outcome: Result<(), String>,
    ) -> DeleteResolution {
        self.deletes.resolve(&mut self.store, id, token, outcome)
    }
}

/// Table controller shared between the rendering layer and spawned
/// fetch/delete tasks.
pub struct AuditTable {
    directory: Arc<dyn UserDirectory>,
    inner: Mutex<TableState>,
    initialized: Mutex<bool>,
    events: broadcast::Sender<TableEvent>,
}

impl AuditTable {
    pub fn new(directory: Arc<dyn UserDirectory>, options: TableOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            directory,
            inner: Mutex::new(TableState::new(options)),
            initialized: Mutex::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    /// Performs the initial load. Later calls return `false` without
    /// fetching; use [`AuditTable::refresh`] to reload.
    pub async fn initialize(&self) -> bool {
        {
            let mut initialized = self.initialized.lock().await;
            if *initialized {
                return false;
            }
            *initialized = true;
        }
        self.refresh().await;
        true
    }

    /// Fetches the full collection. Failures land in the collection error;
    /// an outcome overtaken by a newer fetch is dropped.
    pub async fn refresh(&self) {
        let token = self.inner.lock().await.begin_fetch();
        let outcome = self
            .directory
            .fetch_all()
            .await
            .map_err(|err| err.to_string());

        let (applied, error) = {
            let mut state = self.inner.lock().await;
            let applied = state.apply_fetch(token, outcome);
            (applied, state.store().error().map(str::to_string))
        };
        match applied {
            FetchApplied::Loaded { count } => {
                info!(fetch_token = token.0, count, "table: records loaded");
                let _ = self.events.send(TableEvent::Loaded { count });
            }
            FetchApplied::Failed => {
                let reason = error.unwrap_or_default();
                warn!(fetch_token = token.0, %reason, "table: fetch failed");
                let _ = self.events.send(TableEvent::LoadFailed { reason });
            }
            FetchApplied::Stale => {
                debug!(fetch_token = token.0, "table: discarding stale fetch outcome");
            }
        }
    }

    pub async fn set_search(&self, term: impl Into<String>) {
        self.inner.lock().await.set_search(term);
    }

    /// Unknown or non-sortable columns are ignored.
    pub async fn set_sort(&self, key: &str) {
        if let Err(err) = self.inner.lock().await.set_sort(key) {
            debug!(column = key, %err, "table: ignoring sort request");
        }
    }

    /// Page zero is ignored.
    pub async fn go_to_page(&self, page: usize) {
        if let Err(err) = self.inner.lock().await.go_to_page(page) {
            debug!(page, %err, "table: ignoring page request");
        }
    }

    pub async fn set_time_format(&self, mode: TimeFormat) {
        self.inner.lock().await.set_time_format(mode);
    }

    pub async fn time_format(&self) -> TimeFormat {
        self.inner.lock().await.time_format()
    }

    pub async fn format_row_timestamp(&self, record: &UserRecord) -> String {
        let mode = self.time_format().await;
        format_timestamp(&record.created_date, mode)
    }

    pub async fn visible_rows(&self) -> Vec<TableRow> {
        self.inner.lock().await.visible_rows()
    }

    pub async fn total_matched(&self) -> usize {
        self.inner.lock().await.total_matched()
    }

    pub async fn page_count(&self) -> usize {
        self.inner.lock().await.page_count()
    }

    pub async fn current_page(&self) -> usize {
        self.inner.lock().await.current_page()
    }

    pub async fn snapshot(&self) -> TableSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Marks the record Deleting and spawns the directory call. Returns
    /// `None` without side effects when the record is absent.
    pub async fn request_delete(self: &Arc<Self>, id: &UserId) -> Option<JoinHandle<()>> {
        let token = self.inner.lock().await.request_delete(id)?;
        let table = Arc::clone(self);
        let id = id.clone();
        Some(tokio::spawn(async move {
            table.complete_delete(id, token).await;
        }))
    }

    /// Deletes `id` and waits for the outcome to be applied.
    pub async fn delete(&self, id: &UserId) -> Option<DeleteResolution> {
        let token = self.inner.lock().await.request_delete(id)?;
        Some(self.complete_delete(id.clone(), token).await)
    }

    async fn complete_delete(&self, id: UserId, token: DeleteToken) -> DeleteResolution {
        let outcome = self
            .directory
            .delete_by_id(&id)
            .await
            .map_err(|err| err.to_string());
        let resolution = self.inner.lock().await.resolve_delete(&id, token, outcome);

        match &resolution {
            DeleteResolution::Removed => {
                info!(record_id = %id, delete_token = token.0, "table: record deleted");
                let _ = self.events.send(TableEvent::Deleted { id });
            }
            DeleteResolution::Failed(reason) => {
                warn!(record_id = %id, delete_token = token.0, %reason, "table: delete failed");
                let _ = self.events.send(TableEvent::DeleteFailed {
                    id,
                    reason: reason.clone(),
                });
            }
            DeleteResolution::Superseded | DeleteResolution::Vanished => {
                debug!(
                    record_id = %id,
                    delete_token = token.0,
                    ?resolution,
                    "table: discarding delete outcome"
                );
            }
        }
        resolution
    }
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
