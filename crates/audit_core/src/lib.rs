//! Client-side controller for the user audit table: search, single-field
//! sort, fixed-size paging and per-row delete over a fetched user collection.

pub mod delete;
pub mod directory;
pub mod error;
pub mod format;
pub mod paging;
pub mod search;
pub mod sort;
pub mod store;
pub mod table;
pub mod view;

pub use delete::{DeletePhase, DeleteResolution};
pub use directory::{HttpUserDirectory, MissingUserDirectory, UserDirectory};
pub use error::DirectoryError;
pub use format::format_timestamp;
pub use paging::{page_count, PAGE_SIZE};
pub use sort::{ColumnSet, SortPagePolicy};
pub use store::RecordStatus;
pub use table::{AuditTable, TableEvent, TableOptions, TableRow, TableSnapshot, TableState};
pub use view::{derive, DerivedView, ViewQuery};
