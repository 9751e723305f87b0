//! Per-key reductions over the complete grouped batch of one key.

use fmr_common::{FmrError, Result};

use crate::conf::JoinConf;
use crate::record::{RecordValue, TaggedRow};
use crate::tag::TableTag;

/// The per-key phase contract.
///
/// The batch is materialized and order-unconstrained: the grouping stage
/// delivers every value sharing the key in one invocation, and a key is
/// never revisited. Reducers may take multiple passes over the batch.
pub trait KeyReducer: Send + Sync {
    fn reduce(&self, key: &str, values: Vec<RecordValue>) -> Result<Vec<(String, String)>>;
}

/// One output `(key, value)` per input value.
#[derive(Debug, Clone, Default)]
pub struct IdentityReducer;

impl KeyReducer for IdentityReducer {
    fn reduce(&self, key: &str, values: Vec<RecordValue>) -> Result<Vec<(String, String)>> {
        values
            .into_iter()
            .map(|v| Ok((key.to_string(), expect_plain(key, v)?)))
            .collect()
    }
}

/// Emits `(trimmed value, "")` per value, discarding the key.
///
/// This is the interlace primitive: unioning independently produced result
/// sets into one table while suppressing accidental key collisions between
/// sources.
#[derive(Debug, Clone, Default)]
pub struct ConcatReducer;

impl KeyReducer for ConcatReducer {
    fn reduce(&self, key: &str, values: Vec<RecordValue>) -> Result<Vec<(String, String)>> {
        values
            .into_iter()
            .map(|v| Ok((expect_plain(key, v)?.trim().to_string(), String::new())))
            .collect()
    }
}

/// Emits `(key, N)` where `N` is the batch size.
///
/// The count is the number of values in the group, not a sum of numeric
/// payloads, so it composes with any mapper.
#[derive(Debug, Clone, Default)]
pub struct CountReducer;

impl KeyReducer for CountReducer {
    fn reduce(&self, key: &str, values: Vec<RecordValue>) -> Result<Vec<(String, String)>> {
        Ok(vec![(key.to_string(), values.len().to_string())])
    }
}

/// Join flavor, fixed per job. Controls reducer behavior only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Inner,
    Left,
}

/// Reconstructs a relational join from one grouped batch of tagged values.
///
/// The batch is partitioned by table tag; the table-2 key must be unique.
/// Matched pairs are re-split on each table's own delimiter and re-joined
/// uniformly by `,` regardless of the source delimiters.
#[derive(Debug, Clone)]
pub struct JoinReducer {
    mode: JoinMode,
    table_1_delimiter: char,
    table_2_delimiter: char,
}

impl JoinReducer {
    pub fn new(mode: JoinMode, conf: &JoinConf) -> Self {
        Self {
            mode,
            table_1_delimiter: conf.table_1.delimiter,
            table_2_delimiter: conf.table_2.delimiter,
        }
    }

    fn pair(&self, left: &str, right: &str) -> String {
        let mut fields: Vec<&str> = left.split(self.table_1_delimiter).collect();
        fields.extend(right.split(self.table_2_delimiter));
        fields.join(",")
    }
}

impl KeyReducer for JoinReducer {
    fn reduce(&self, key: &str, values: Vec<RecordValue>) -> Result<Vec<(String, String)>> {
        let (rows_1, rows_2) = split_by_table(key, values)?;
        match rows_2.len() {
            0 => match self.mode {
                // Both sides must be present for an inner match.
                JoinMode::Inner => Ok(Vec::new()),
                // Unmatched left rows pass through unmodified.
                JoinMode::Left => Ok(rows_1
                    .into_iter()
                    .map(|row| (key.to_string(), row))
                    .collect()),
            },
            1 => Ok(rows_1
                .into_iter()
                .map(|row| (key.to_string(), self.pair(&row, &rows_2[0])))
                .collect()),
            n => Err(FmrError::JoinKey(format!(
                "{n} table 2 rows share join key {key:?}"
            ))),
        }
    }
}

/// Partition a grouped batch into table-1 and table-2 rows.
fn split_by_table(key: &str, values: Vec<RecordValue>) -> Result<(Vec<String>, Vec<String>)> {
    let mut rows_1 = Vec::new();
    let mut rows_2 = Vec::new();
    for value in values {
        match value {
            RecordValue::Tagged(TaggedRow {
                table: TableTag::Table1,
                row,
            }) => rows_1.push(row),
            RecordValue::Tagged(TaggedRow {
                table: TableTag::Table2,
                row,
            }) => rows_2.push(row),
            RecordValue::Plain(_) => {
                return Err(FmrError::Execution(format!(
                    "join reducer received an untagged value for key {key:?}; \
                     the job was not mapped with the join mapper"
                )))
            }
        }
    }
    Ok((rows_1, rows_2))
}

fn expect_plain(key: &str, value: RecordValue) -> Result<String> {
    match value {
        RecordValue::Plain(v) => Ok(v),
        RecordValue::Tagged(_) => Err(FmrError::Execution(format!(
            "reducer received a tagged value for key {key:?} outside a join job"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConcatReducer, CountReducer, IdentityReducer, JoinMode, JoinReducer, KeyReducer,
    };
    use crate::conf::{JoinConf, TableConf};
    use crate::record::{KeyedRecord, RecordValue};
    use crate::row::ColumnSelector;
    use crate::tag::TableTag;

    fn plain(v: &str) -> RecordValue {
        RecordValue::Plain(v.to_string())
    }

    fn tagged(table: TableTag, row: &str) -> RecordValue {
        match KeyedRecord::tagged("k", table, row).value {
            v @ RecordValue::Tagged(_) => v,
            _ => unreachable!(),
        }
    }

    fn join_reducer(mode: JoinMode) -> JoinReducer {
        let table = |paths: &str| TableConf {
            paths: vec![paths.to_string()],
            delimiter: ',',
            key_columns: ColumnSelector::Columns(vec![0]),
            target_columns: ColumnSelector::All,
            filter: None,
        };
        JoinReducer::new(
            mode,
            &JoinConf {
                table_1: table("/in/t1"),
                table_2: table("/in/t2"),
            },
        )
    }

    #[test]
    fn count_is_batch_size_regardless_of_contents_or_order() {
        let out = CountReducer
            .reduce("k", vec![plain("x"), plain("x"), plain("zzz")])
            .expect("reduce");
        assert_eq!(out, vec![("k".to_string(), "3".to_string())]);

        let reversed = CountReducer
            .reduce("k", vec![plain("zzz"), plain("x"), plain("x")])
            .expect("reduce");
        assert_eq!(out, reversed);
    }

    #[test]
    fn identity_passes_each_value_through() {
        let out = IdentityReducer
            .reduce("k", vec![plain("a"), plain("b")])
            .expect("reduce");
        assert_eq!(
            out,
            vec![
                ("k".to_string(), "a".to_string()),
                ("k".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn concat_trims_and_discards_keys() {
        let mut out = ConcatReducer
            .reduce("ignored", vec![plain("  x  "), plain("y")])
            .expect("reduce");
        out.sort();
        assert_eq!(
            out,
            vec![
                ("x".to_string(), String::new()),
                ("y".to_string(), String::new())
            ]
        );
    }

    #[test]
    fn inner_join_pairs_each_left_row_with_the_single_right_row() {
        // Table 1 rows "k1,A","k2,B" keyed on column 0; table 2 row "k1,X".
        let out = join_reducer(JoinMode::Inner)
            .reduce(
                "k1",
                vec![
                    tagged(TableTag::Table1, "k1,A"),
                    tagged(TableTag::Table2, "k1,X"),
                ],
            )
            .expect("reduce");
        assert_eq!(out, vec![("k1".to_string(), "k1,A,k1,X".to_string())]);

        // Key k2 has no table-2 row: nothing is emitted.
        let missed = join_reducer(JoinMode::Inner)
            .reduce("k2", vec![tagged(TableTag::Table1, "k2,B")])
            .expect("reduce");
        assert!(missed.is_empty());
    }

    #[test]
    fn inner_join_emits_nothing_when_left_side_is_empty() {
        let out = join_reducer(JoinMode::Inner)
            .reduce("k1", vec![tagged(TableTag::Table2, "k1,X")])
            .expect("reduce");
        assert!(out.is_empty());
    }

    #[test]
    fn left_join_passes_unmatched_left_rows_through() {
        let out = join_reducer(JoinMode::Left)
            .reduce("k2", vec![tagged(TableTag::Table1, "k2,B")])
            .expect("reduce");
        assert_eq!(out, vec![("k2".to_string(), "k2,B".to_string())]);

        let matched = join_reducer(JoinMode::Left)
            .reduce(
                "k1",
                vec![
                    tagged(TableTag::Table1, "k1,A"),
                    tagged(TableTag::Table2, "k1,X"),
                ],
            )
            .expect("reduce");
        assert_eq!(matched, vec![("k1".to_string(), "k1,A,k1,X".to_string())]);
    }

    #[test]
    fn joins_re_delimit_to_commas() {
        let table_1 = TableConf {
            paths: vec!["/in/t1".to_string()],
            delimiter: '|',
            key_columns: ColumnSelector::Columns(vec![0]),
            target_columns: ColumnSelector::All,
            filter: None,
        };
        let table_2 = TableConf {
            delimiter: ';',
            paths: vec!["/in/t2".to_string()],
            ..table_1.clone()
        };
        let reducer = JoinReducer::new(JoinMode::Inner, &JoinConf { table_1, table_2 });
        let out = reducer
            .reduce(
                "k",
                vec![
                    tagged(TableTag::Table1, "k|A"),
                    tagged(TableTag::Table2, "k;X;Y"),
                ],
            )
            .expect("reduce");
        assert_eq!(out, vec![("k".to_string(), "k,A,k,X,Y".to_string())]);
    }

    #[test]
    fn duplicate_right_side_keys_fault_in_both_modes() {
        for mode in [JoinMode::Inner, JoinMode::Left] {
            let err = join_reducer(mode)
                .reduce(
                    "k1",
                    vec![
                        tagged(TableTag::Table1, "k1,A"),
                        tagged(TableTag::Table2, "k1,X"),
                        tagged(TableTag::Table2, "k1,Y"),
                    ],
                )
                .expect_err("must fault");
            assert!(err.to_string().contains("non-unique join key"));
        }
    }

    #[test]
    fn join_reducer_rejects_untagged_values() {
        let err = join_reducer(JoinMode::Inner)
            .reduce("k", vec![plain("a,b")])
            .expect_err("must fault");
        assert!(err.to_string().contains("untagged"));
    }
}
