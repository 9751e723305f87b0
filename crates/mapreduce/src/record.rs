//! Keyed records flowing from the per-record phase into the grouping stage.

use serde::{Deserialize, Serialize};

use crate::tag::TableTag;

/// A projected row annotated with the join side it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRow {
    pub table: TableTag,
    pub row: String,
}

/// Value side of a keyed record.
///
/// Non-join jobs emit `Plain` projected strings; join mappers emit `Tagged`
/// so the reducer can separate the two sides within one grouped batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordValue {
    Plain(String),
    Tagged(TaggedRow),
}

/// One `(key, value)` pair emitted by the per-record phase and consumed
/// exactly once by the grouping stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedRecord {
    pub key: String,
    pub value: RecordValue,
}

impl KeyedRecord {
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: RecordValue::Plain(value.into()),
        }
    }

    pub fn tagged(key: impl Into<String>, table: TableTag, row: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: RecordValue::Tagged(TaggedRow {
                table,
                row: row.into(),
            }),
        }
    }
}
