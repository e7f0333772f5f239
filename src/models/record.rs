//! Record-related data models.
//!
//! These types describe the columns of the record/timestamp table pair and the
//! rows read back from it.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Semantic kind of a column value, mapped to a dialect column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Date,
    Int32,
    Int64,
    /// Large binary payload (record bodies)
    Binary,
    /// Anything unrecognized; maps to the bounded default text type
    Other,
}

impl ValueKind {
    pub const ALL: [ValueKind; 6] = [
        ValueKind::Text,
        ValueKind::Date,
        ValueKind::Int32,
        ValueKind::Int64,
        ValueKind::Binary,
        ValueKind::Other,
    ];
}

/// Column of the record table that can be projected by a field query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordColumn {
    Id,
    Nc,
    Value,
    Deleted,
}

impl RecordColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Nc => "nc",
            Self::Value => "value",
            Self::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for RecordColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "nc" => Ok(Self::Nc),
            "value" => Ok(Self::Value),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!(
                "unknown record column '{other}' (expected id, nc, value or deleted)"
            )),
        }
    }
}

impl std::fmt::Display for RecordColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of an incremental query: a record revision joined with the
/// current state of its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRevision {
    /// Natural record identifier
    pub nc: String,
    /// Soft-deletion flag from the timestamp table (0, 1 or null)
    pub deleted: Option<i16>,
    /// Last-modification date from the timestamp table
    pub timestamp: Option<NaiveDate>,
    /// Surrogate id of the revision, usable as the next pagination cursor
    pub id: i64,
    /// Record payload, only present when the full record was requested
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_payload"
    )]
    pub payload: Option<Vec<u8>>,
}

impl RecordRevision {
    pub fn is_deleted(&self) -> bool {
        self.deleted == Some(1)
    }
}

/// A single projected value from a field query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Id(i64),
    Nc(String),
    #[serde(serialize_with = "serialize_payload")]
    Value(Option<Vec<u8>>),
    Deleted(Option<i16>),
}

/// Payloads are serialized as base64 to keep JSON output binary-safe.
fn serialize_payload<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    match bytes {
        Some(b) => serializer.serialize_str(&STANDARD.encode(b)),
        None => serializer.serialize_none(),
    }
}
