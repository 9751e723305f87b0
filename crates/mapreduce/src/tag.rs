//! Source tagging: which logical table does a shard belong to.

use std::fmt;

use serde::{Deserialize, Serialize};

use fmr_common::{FmrError, Result};

/// The side of a join a record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableTag {
    Table1,
    Table2,
}

impl fmt::Display for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableTag::Table1 => write!(f, "table 1"),
            TableTag::Table2 => write!(f, "table 2"),
        }
    }
}

/// Resolve which table a shard belongs to by path-prefix matching.
///
/// `source_path` must start with a prefix from exactly one of the two sets.
/// Matching neither set means the input set is inconsistent with the
/// declared table partitioning; matching both means the prefixes overlap.
/// Either way the whole join is misconfigured, so both cases fault instead
/// of defaulting to a table.
///
/// Prefix matching is string-literal: glob/asterisk input paths are not
/// expanded here and will not match their expansions. Pass fully expanded
/// path prefixes.
pub fn tag_source(
    source_path: &str,
    table_1_prefixes: &[String],
    table_2_prefixes: &[String],
) -> Result<TableTag> {
    let in_1 = table_1_prefixes.iter().any(|p| source_path.starts_with(p.as_str()));
    let in_2 = table_2_prefixes.iter().any(|p| source_path.starts_with(p.as_str()));
    match (in_1, in_2) {
        (true, false) => Ok(TableTag::Table1),
        (false, true) => Ok(TableTag::Table2),
        (true, true) => Err(FmrError::Tagging(format!(
            "shard {source_path:?} matches both table path sets ({table_1_prefixes:?} and {table_2_prefixes:?})"
        ))),
        (false, false) => Err(FmrError::Tagging(format!(
            "shard {source_path:?} matches neither table path set ({table_1_prefixes:?} vs {table_2_prefixes:?})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{tag_source, TableTag};

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_each_side_by_prefix() {
        let t1 = paths(&["/data/orders"]);
        let t2 = paths(&["/data/customers", "/archive/customers"]);
        assert_eq!(
            tag_source("/data/orders/part-0.csv", &t1, &t2).expect("tag"),
            TableTag::Table1
        );
        assert_eq!(
            tag_source("/archive/customers/part-3.csv", &t1, &t2).expect("tag"),
            TableTag::Table2
        );
    }

    #[test]
    fn unmatched_path_faults() {
        let err = tag_source(
            "/elsewhere/part-0.csv",
            &paths(&["/data/a"]),
            &paths(&["/data/b"]),
        )
        .expect_err("must fault");
        assert!(err.to_string().contains("table tagging failed"));
    }

    #[test]
    fn overlapping_prefixes_fault() {
        let err = tag_source(
            "/data/orders/part-0.csv",
            &paths(&["/data"]),
            &paths(&["/data/orders"]),
        )
        .expect_err("must fault");
        assert!(err.to_string().contains("both"));
    }
}
