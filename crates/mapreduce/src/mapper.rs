//! Per-record transforms: stateless, one input line in, zero or more keyed
//! records out.

use fmr_common::Result;

use crate::conf::{JoinConf, SelectConf};
use crate::filter::FilterSpec;
use crate::record::KeyedRecord;
use crate::row::{ColumnSelector, Row, KEY_JOINER, VALUE_JOINER};
use crate::tag::tag_source;

/// One input record: a line of one shard, with its originating path and
/// byte offset.
#[derive(Debug, Clone, Copy)]
pub struct MapInput<'a> {
    /// Path of the shard this line was read from (used for join tagging).
    pub source_path: &'a str,
    /// Byte offset of the line within the shard.
    pub offset: u64,
    /// The raw line, without its trailing newline.
    pub line: &'a str,
}

/// The per-record phase contract.
///
/// Implementations are stateless across records and may run on any number
/// of parallel workers; any error aborts the job.
pub trait RecordMapper: Send + Sync {
    fn map(&self, input: &MapInput<'_>) -> Result<Vec<KeyedRecord>>;
}

/// Filter, then project the key (`+`-joined) and value (`,`-joined).
///
/// Returns `None` only when the filter rejects the row; selector evaluation
/// itself never suppresses a record.
fn extract(
    row: &Row,
    filter: Option<&FilterSpec>,
    key_columns: &ColumnSelector,
    target_columns: &ColumnSelector,
) -> Result<Option<(String, String)>> {
    if let Some(filter) = filter {
        if !filter.evaluate(row)? {
            return Ok(None);
        }
    }
    let key = row.project(key_columns, KEY_JOINER)?;
    let value = row.project(target_columns, VALUE_JOINER)?;
    Ok(Some((key, value)))
}

/// Mapper for select/count jobs: one table, one delimiter, optional filter.
///
/// Combined with the identity reducer this is `SELECT .. WHERE .. GROUP BY`;
/// combined with the count reducer it is `SELECT count(*) .. GROUP BY`.
#[derive(Debug, Clone)]
pub struct SelectMapper {
    conf: SelectConf,
}

impl SelectMapper {
    pub fn new(conf: SelectConf) -> Self {
        Self { conf }
    }
}

impl RecordMapper for SelectMapper {
    fn map(&self, input: &MapInput<'_>) -> Result<Vec<KeyedRecord>> {
        let row = Row::parse(input.line, self.conf.delimiter);
        let extracted = extract(
            &row,
            self.conf.filter.as_ref(),
            &self.conf.key_columns,
            &self.conf.target_columns,
        )?;
        Ok(match extracted {
            Some((key, value)) => vec![KeyedRecord::plain(key, value)],
            None => vec![],
        })
    }
}

/// Mapper for join jobs: resolves the shard's table first, then applies that
/// table's delimiter/filter/selectors and tags the emitted value.
///
/// Re-keying both tables by their join columns is what makes matching rows
/// arrive in the same per-key batch downstream.
#[derive(Debug, Clone)]
pub struct JoinMapper {
    conf: JoinConf,
}

impl JoinMapper {
    pub fn new(conf: JoinConf) -> Self {
        Self { conf }
    }
}

impl RecordMapper for JoinMapper {
    fn map(&self, input: &MapInput<'_>) -> Result<Vec<KeyedRecord>> {
        let tag = tag_source(
            input.source_path,
            &self.conf.table_1.paths,
            &self.conf.table_2.paths,
        )?;
        let table = self.conf.table(tag);
        let row = Row::parse(input.line, table.delimiter);
        let extracted = extract(
            &row,
            table.filter.as_ref(),
            &table.key_columns,
            &table.target_columns,
        )?;
        Ok(match extracted {
            Some((key, value)) => vec![KeyedRecord::tagged(key, tag, value)],
            None => vec![],
        })
    }
}

/// Passes every line through unchanged, keyed by its byte offset.
///
/// Used when all the work happens in the per-key phase (interlacing).
#[derive(Debug, Clone, Default)]
pub struct IdentityMapper;

impl RecordMapper for IdentityMapper {
    fn map(&self, input: &MapInput<'_>) -> Result<Vec<KeyedRecord>> {
        Ok(vec![KeyedRecord::plain(
            input.offset.to_string(),
            input.line,
        )])
    }
}

/// Splits each line on whitespace and emits `(token, "1")` per token.
///
/// With the count reducer this implements wordcount.
#[derive(Debug, Clone, Default)]
pub struct TokenCountMapper;

impl RecordMapper for TokenCountMapper {
    fn map(&self, input: &MapInput<'_>) -> Result<Vec<KeyedRecord>> {
        Ok(input
            .line
            .split_whitespace()
            .map(|token| KeyedRecord::plain(token, "1"))
            .collect())
    }
}
