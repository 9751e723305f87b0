//! The flat string-keyed job parameter map and its typed codecs.
//!
//! This map is the boundary with the job-launching platform: builders encode
//! typed configs into it, and the per-record/per-key phases parse it exactly
//! once before any record is processed. Recognized keys:
//!
//! | key | meaning |
//! |---|---|
//! | `delimiter` / `table_{1,2}_delimiter` | single-character field separator |
//! | `key_columns` / `table_{1,2}_key_columns` | `*` or comma-separated 0-based indices |
//! | `target_columns` / `table_{1,2}_target_columns` | `*` or comma-separated 0-based indices |
//! | `filter_columns` / `table_{1,2}_filter_columns` | pipe-separated column indices |
//! | `filter_vals` / `table_{1,2}_filter_vals` | pipe-separated comma-separated value groups |
//! | `invert_filter_vals` / `table_{1,2}_invert_filter_vals` | pipe-separated `0`/`1` flags |
//! | `table_{1,2}_path` | comma-separated path prefixes of that table's shards |

use std::collections::HashMap;

use fmr_common::{FmrError, Result};

use crate::filter::FilterSpec;
use crate::row::ColumnSelector;
use crate::tag::TableTag;

/// Flat string-keyed job parameters, immutable for the lifetime of one job.
#[derive(Debug, Clone, Default)]
pub struct JobConf {
    entries: HashMap<String, String>,
}

impl JobConf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| FmrError::InvalidConfig(format!("missing required job parameter {key:?}")))
    }
}

impl FromIterator<(String, String)> for JobConf {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parameters of a non-join (select/count) job.
#[derive(Debug, Clone)]
pub struct SelectConf {
    pub delimiter: char,
    pub key_columns: ColumnSelector,
    pub target_columns: ColumnSelector,
    pub filter: Option<FilterSpec>,
}

impl SelectConf {
    pub fn from_conf(conf: &JobConf) -> Result<Self> {
        Ok(Self {
            delimiter: parse_delimiter(conf.require("delimiter")?, "delimiter")?,
            key_columns: ColumnSelector::parse(conf.require("key_columns")?)?,
            target_columns: ColumnSelector::parse(conf.require("target_columns")?)?,
            filter: parse_filter(conf, "filter_columns", "filter_vals", "invert_filter_vals")?,
        })
    }

    pub fn to_conf(&self) -> JobConf {
        let mut conf = JobConf::new();
        conf.set("delimiter", self.delimiter.to_string());
        conf.set("key_columns", self.key_columns.to_string());
        conf.set("target_columns", self.target_columns.to_string());
        encode_filter(
            &mut conf,
            self.filter.as_ref(),
            "filter_columns",
            "filter_vals",
            "invert_filter_vals",
        );
        conf
    }
}

/// Per-side parameters of a join job.
#[derive(Debug, Clone)]
pub struct TableConf {
    /// Path prefixes identifying this table's source shards.
    pub paths: Vec<String>,
    pub delimiter: char,
    pub key_columns: ColumnSelector,
    pub target_columns: ColumnSelector,
    pub filter: Option<FilterSpec>,
}

/// Parameters of a two-table join job.
#[derive(Debug, Clone)]
pub struct JoinConf {
    pub table_1: TableConf,
    pub table_2: TableConf,
}

impl JoinConf {
    pub fn from_conf(conf: &JobConf) -> Result<Self> {
        Ok(Self {
            table_1: table_from_conf(conf, 1)?,
            table_2: table_from_conf(conf, 2)?,
        })
    }

    pub fn to_conf(&self) -> JobConf {
        let mut conf = JobConf::new();
        table_to_conf(&mut conf, &self.table_1, 1);
        table_to_conf(&mut conf, &self.table_2, 2);
        conf
    }

    /// The side configuration a resolved tag selects.
    pub fn table(&self, tag: TableTag) -> &TableConf {
        match tag {
            TableTag::Table1 => &self.table_1,
            TableTag::Table2 => &self.table_2,
        }
    }
}

fn table_from_conf(conf: &JobConf, side: u8) -> Result<TableConf> {
    let path_key = format!("table_{side}_path");
    let raw_paths = conf.require(&path_key)?;
    let paths: Vec<String> = raw_paths
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if paths.is_empty() {
        return Err(FmrError::InvalidConfig(format!(
            "{path_key} must list at least one path prefix"
        )));
    }
    let delim_key = format!("table_{side}_delimiter");
    Ok(TableConf {
        paths,
        delimiter: parse_delimiter(conf.require(&delim_key)?, &delim_key)?,
        key_columns: ColumnSelector::parse(conf.require(&format!("table_{side}_key_columns"))?)?,
        target_columns: ColumnSelector::parse(
            conf.require(&format!("table_{side}_target_columns"))?,
        )?,
        filter: parse_filter(
            conf,
            &format!("table_{side}_filter_columns"),
            &format!("table_{side}_filter_vals"),
            &format!("table_{side}_invert_filter_vals"),
        )?,
    })
}

fn table_to_conf(conf: &mut JobConf, table: &TableConf, side: u8) {
    conf.set(format!("table_{side}_path"), table.paths.join(","));
    conf.set(
        format!("table_{side}_delimiter"),
        table.delimiter.to_string(),
    );
    conf.set(
        format!("table_{side}_key_columns"),
        table.key_columns.to_string(),
    );
    conf.set(
        format!("table_{side}_target_columns"),
        table.target_columns.to_string(),
    );
    encode_filter(
        conf,
        table.filter.as_ref(),
        &format!("table_{side}_filter_columns"),
        &format!("table_{side}_filter_vals"),
        &format!("table_{side}_invert_filter_vals"),
    );
}

fn parse_delimiter(raw: &str, key: &str) -> Result<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FmrError::InvalidConfig(format!(
            "{key} must be exactly one character, got {raw:?}"
        ))),
    }
}

/// Parse the three positionally aligned filter keys into a spec.
///
/// All three keys must be present together (absent together means no
/// filtering). Flags are `0`/`1`; anything else is a configuration fault.
fn parse_filter(
    conf: &JobConf,
    cols_key: &str,
    vals_key: &str,
    invert_key: &str,
) -> Result<Option<FilterSpec>> {
    let cols = conf.get(cols_key);
    let vals = conf.get(vals_key);
    let inverts = conf.get(invert_key);
    let (cols, vals, inverts) = match (cols, vals, inverts) {
        (Some(c), Some(v), Some(i)) => (c, v, i),
        (None, None, None) => return Ok(None),
        _ => {
            return Err(FmrError::InvalidConfig(format!(
                "{cols_key}, {vals_key}, and {invert_key} must be provided together"
            )))
        }
    };

    let columns = cols
        .split('|')
        .map(|t| {
            t.trim().parse::<usize>().map_err(|_| {
                FmrError::InvalidConfig(format!("bad filter column index {t:?} in {cols_key}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let groups: Vec<Vec<String>> = vals
        .split('|')
        .map(|g| g.split(',').map(|v| v.to_string()).collect())
        .collect();
    let flags = inverts
        .split('|')
        .map(|f| match f.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(FmrError::InvalidConfig(format!(
                "bad invert flag {other:?} in {invert_key} (expected 0 or 1)"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    FilterSpec::compile(&columns, &groups, &flags).map(Some)
}

fn encode_filter(
    conf: &mut JobConf,
    filter: Option<&FilterSpec>,
    cols_key: &str,
    vals_key: &str,
    invert_key: &str,
) {
    let Some(filter) = filter else { return };
    if filter.is_empty() {
        return;
    }
    let mut cols = Vec::new();
    let mut groups = Vec::new();
    let mut flags = Vec::new();
    for entry in filter.entries() {
        cols.push(entry.column.to_string());
        groups.push(entry.values.join(","));
        flags.push(if entry.invert { "1" } else { "0" });
    }
    conf.set(cols_key, cols.join("|"));
    conf.set(vals_key, groups.join("|"));
    conf.set(invert_key, flags.join("|"));
}
