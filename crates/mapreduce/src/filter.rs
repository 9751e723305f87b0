//! Per-column inclusion/exclusion predicate evaluated against parsed rows.

use fmr_common::{FmrError, Result};

use crate::row::Row;

/// One conjunct: the value at `column` must (or, inverted, must not) be one
/// of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub column: usize,
    pub values: Vec<String>,
    pub invert: bool,
}

/// A compiled WHERE clause: the conjunction of all entries.
///
/// Entries may repeat a column index; two entries with different invert
/// flags express "in A but not in B" for one column. An empty spec passes
/// every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    entries: Vec<FilterEntry>,
}

impl FilterSpec {
    /// Compile positionally aligned parallel lists into a spec.
    ///
    /// `value_groups[i]` is the acceptable value list for `columns[i]` under
    /// `inverts[i]`. Differing list lengths are an [`FmrError::InvalidConfig`]
    /// fault: they indicate the job parameters were assembled inconsistently.
    pub fn compile(
        columns: &[usize],
        value_groups: &[Vec<String>],
        inverts: &[bool],
    ) -> Result<FilterSpec> {
        if columns.len() != value_groups.len() || columns.len() != inverts.len() {
            return Err(FmrError::InvalidConfig(format!(
                "filter lists are not aligned: {} columns, {} value groups, {} invert flags",
                columns.len(),
                value_groups.len(),
                inverts.len()
            )));
        }
        let entries = columns
            .iter()
            .zip(value_groups)
            .zip(inverts)
            .map(|((&column, values), &invert)| FilterEntry {
                column,
                values: values.clone(),
                invert,
            })
            .collect();
        Ok(FilterSpec { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// True iff the row satisfies every entry.
    ///
    /// A row referencing a column beyond its width propagates the schema
    /// fault: filtering failures abort the job rather than silently skip the
    /// record, since they indicate a dataset-wide configuration mismatch.
    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        for entry in &self.entries {
            let value = row.field(entry.column)?;
            let matched = entry.values.iter().any(|v| v == value);
            if matched == entry.invert {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
