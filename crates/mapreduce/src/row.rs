//! Row parsing and field projection for delimited text lines.

use std::fmt;

use fmr_common::{FmrError, Result};

/// Joiner for group keys produced by the per-record phase.
pub const KEY_JOINER: char = '+';

/// Joiner for projected values produced by the per-record phase.
///
/// Join reducers later re-split projected values on the source table's own
/// delimiter, so this must never be chosen as a table delimiter whose fields
/// can carry `,`. The format has no escaping; see [`Row::parse`].
pub const VALUE_JOINER: char = ',';

const QUOTE: char = '"';

/// An ordered sequence of string fields split out of one input line.
///
/// Field order corresponds 1:1 to the on-disk column order. No schema is
/// enforced; referencing a column beyond the row's width is a
/// [`FmrError::Schema`] fault at evaluation time, not a recoverable
/// condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    /// Split `line` on the single-character delimiter, stripping literal `"`
    /// from every field.
    ///
    /// There is no escaping: a delimiter or quote character embedded in a
    /// field is not handled. This is a known limitation of the flat-file
    /// format, preserved because filter and join logic assume a fixed column
    /// layout.
    pub fn parse(line: &str, delimiter: char) -> Row {
        let fields = line
            .split(delimiter)
            .map(|f| f.replace(QUOTE, ""))
            .collect();
        Row { fields }
    }

    /// Number of fields in the row.
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Field at `index`, or a schema fault if the row is narrower.
    pub fn field(&self, index: usize) -> Result<&str> {
        self.fields.get(index).map(String::as_str).ok_or_else(|| {
            FmrError::Schema(format!(
                "column {index} out of range for row with {} fields",
                self.fields.len()
            ))
        })
    }

    /// Join the selected fields with `joiner`, in selector order.
    pub fn project(&self, selector: &ColumnSelector, joiner: char) -> Result<String> {
        let sep = joiner.to_string();
        match selector {
            ColumnSelector::All => Ok(self.fields.join(&sep)),
            ColumnSelector::Columns(cols) => {
                let mut picked = Vec::with_capacity(cols.len());
                for &c in cols {
                    picked.push(self.field(c)?);
                }
                Ok(picked.join(&sep))
            }
        }
    }
}

/// Column selection: every column, or an explicit ordered index list.
///
/// Indices are zero-based and may repeat; order determines field order in
/// the projected output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// The `"*"` sentinel: all columns in on-disk order.
    All,
    /// Explicit ordered, possibly repeating, column indices.
    Columns(Vec<usize>),
}

impl ColumnSelector {
    /// Parse the wire form: `"*"` or a comma-separated index list.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == "*" {
            return Ok(ColumnSelector::All);
        }
        raw.split(',')
            .map(|t| {
                t.trim().parse::<usize>().map_err(|_| {
                    FmrError::InvalidConfig(format!(
                        "bad column index {t:?} in selector {raw:?}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(ColumnSelector::Columns)
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::All => write!(f, "*"),
            ColumnSelector::Columns(cols) => {
                let rendered = cols
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{rendered}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnSelector, Row};

    #[test]
    fn parses_and_strips_quotes() {
        let row = Row::parse("\"a\",b,\"c\"", ',');
        assert_eq!(row.width(), 3);
        assert_eq!(row.field(0).expect("field"), "a");
        assert_eq!(row.field(2).expect("field"), "c");
    }

    #[test]
    fn projects_all_columns_like_explicit_full_list() {
        let row = Row::parse("a|b|c", '|');
        let all = row.project(&ColumnSelector::All, '+').expect("all");
        let explicit = row
            .project(&ColumnSelector::Columns(vec![0, 1, 2]), '+')
            .expect("explicit");
        assert_eq!(all, explicit);
        assert_eq!(all, "a+b+c");
    }

    #[test]
    fn projects_in_selector_order_with_repeats() {
        let row = Row::parse("a,b,c", ',');
        let v = row
            .project(&ColumnSelector::Columns(vec![2, 0, 2]), ',')
            .expect("project");
        assert_eq!(v, "c,a,c");
    }

    #[test]
    fn out_of_range_projection_is_a_schema_fault() {
        let row = Row::parse("a,b", ',');
        let err = row
            .project(&ColumnSelector::Columns(vec![5]), ',')
            .expect_err("must fault");
        assert!(err.to_string().contains("schema mismatch"));
    }

    #[test]
    fn selector_wire_forms_round_trip() {
        for raw in ["*", "0", "1,2,3", "2,0,2"] {
            let sel = ColumnSelector::parse(raw).expect("parse");
            assert_eq!(sel.to_string(), raw);
        }
        assert!(ColumnSelector::parse("1,x").is_err());
    }
}
