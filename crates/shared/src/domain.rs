use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id_newtype!(UserId);

/// One user entry as the directory returns it.
///
/// Fields other than `id` default to the empty string when absent or `null`
/// so that search and sort never observe a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl UserRecord {
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Id => self.id.as_str(),
            RecordField::Role => &self.role,
            RecordField::CreatedDate => &self.created_date,
            RecordField::FirstName => &self.first_name,
            RecordField::LastName => &self.last_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordField {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "role")]
    Role,
    #[serde(rename = "createdDate")]
    CreatedDate,
    #[serde(rename = "firstName")]
    FirstName,
    #[serde(rename = "lastName")]
    LastName,
}

impl RecordField {
    pub const ALL: [RecordField; 5] = [
        RecordField::Id,
        RecordField::Role,
        RecordField::CreatedDate,
        RecordField::FirstName,
        RecordField::LastName,
    ];

    /// Fields consulted by free-text search.
    pub const SEARCHABLE: [RecordField; 4] = [
        RecordField::Id,
        RecordField::Role,
        RecordField::FirstName,
        RecordField::LastName,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::Role => "role",
            RecordField::CreatedDate => "createdDate",
            RecordField::FirstName => "firstName",
            RecordField::LastName => "lastName",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Active single-field sort. `field == None` keeps collection order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: Option<RecordField>,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn ascending(field: RecordField) -> Self {
        Self {
            field: Some(field),
            order: SortOrder::Asc,
        }
    }

    pub fn is_active(&self) -> bool {
        self.field.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12hr")]
    TwelveHour,
    #[default]
    #[serde(rename = "24hr")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12hr",
            TimeFormat::TwentyFourHour => "24hr",
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "12hr" | "12" => Ok(TimeFormat::TwelveHour),
            "24hr" | "24" => Ok(TimeFormat::TwentyFourHour),
            other => Err(format!("unknown time format '{other}', expected 12hr or 24hr")),
        }
    }
}
