use std::{cmp::Ordering, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{RecordField, SortOrder, SortSpec, UserRecord},
    error::ValidationError,
};

use crate::paging::PageState;

/// What happens to the current page when an accepted sort changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPagePolicy {
    #[default]
    Keep,
    Reset,
}

impl FromStr for SortPagePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(SortPagePolicy::Keep),
            "reset" => Ok(SortPagePolicy::Reset),
            other => Err(format!("unknown sort page policy '{other}', expected keep or reset")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub key: &'static str,
    /// `None` for action columns such as delete.
    pub field: Option<RecordField>,
    pub sortable: bool,
}

impl Column {
    const fn data(name: &'static str, field: RecordField, key: &'static str, sortable: bool) -> Self {
        Self {
            name,
            key,
            field: Some(field),
            sortable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self {
            columns: vec![
                Column::data("Id", RecordField::Id, "id", true),
                Column::data("Role", RecordField::Role, "role", false),
                Column::data("Created Date", RecordField::CreatedDate, "createdDate", false),
                Column::data("First Name", RecordField::FirstName, "firstName", false),
                Column::data("Last Name", RecordField::LastName, "lastName", false),
                Column {
                    name: "Delete",
                    key: "delete",
                    field: None,
                    sortable: false,
                },
            ],
        }
    }
}

impl ColumnSet {
    /// Default columns with exactly the data columns named in `keys` sortable.
    /// Unknown keys and action columns are rejected.
    pub fn with_sortable<S: AsRef<str>>(keys: &[S]) -> Result<Self, ValidationError> {
        let mut set = Self::default();
        for column in &mut set.columns {
            column.sortable = false;
        }
        for key in keys {
            let key = key.as_ref();
            let column = set
                .columns
                .iter_mut()
                .find(|column| column.key == key)
                .ok_or_else(|| ValidationError::UnknownColumn(key.to_string()))?;
            if column.field.is_none() {
                return Err(ValidationError::NotSortable(key.to_string()));
            }
            column.sortable = true;
        }
        Ok(set)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn sortable_field(&self, key: &str) -> Result<RecordField, ValidationError> {
        let column = self
            .columns
            .iter()
            .find(|column| column.key == key)
            .ok_or_else(|| ValidationError::UnknownColumn(key.to_string()))?;
        match column.field {
            Some(field) if column.sortable => Ok(field),
            _ => Err(ValidationError::NotSortable(key.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortController {
    spec: SortSpec,
    columns: ColumnSet,
    page_policy: SortPagePolicy,
}

impl SortController {
    pub fn new(columns: ColumnSet, page_policy: SortPagePolicy) -> Self {
        Self {
            spec: SortSpec::default(),
            columns,
            page_policy,
        }
    }

    pub fn spec(&self) -> SortSpec {
        self.spec
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Selects the column named `key`. A new field sorts ascending; the
    /// current field flips direction. Under [`SortPagePolicy::Reset`] the
    /// page returns to 1; otherwise it is left alone.
    pub fn set_sort(&mut self, key: &str, page: &mut PageState) -> Result<SortSpec, ValidationError> {
        let field = self.columns.sortable_field(key)?;
        self.spec = if self.spec.field == Some(field) {
            SortSpec {
                field: Some(field),
                order: self.spec.order.toggled(),
            }
        } else {
            SortSpec::ascending(field)
        };
        if self.page_policy == SortPagePolicy::Reset {
            page.reset();
        }
        Ok(self.spec)
    }
}

/// Ordinal comparison of the spec's field; `Equal` when no field is set.
pub fn compare_records(a: &UserRecord, b: &UserRecord, spec: SortSpec) -> Ordering {
    let Some(field) = spec.field else {
        return Ordering::Equal;
    };
    let ordering = a.field(field).cmp(b.field(field));
    match spec.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
#[path = "tests/sort_tests.rs"]
mod tests;
