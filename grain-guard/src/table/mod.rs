//! The table abstraction the classifiers and the granularity search read from.
//!
//! The core never owns or mutates a table. Anything that can answer the
//! questions in [`Table`] can be analysed; [`ArrowTable`] is the shipped
//! implementation over an Arrow `RecordBatch`.

mod arrow_table;
mod summary;

pub use arrow_table::ArrowTable;
pub use summary::{ColumnSummary, TableSummary};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Coarse value kind of a column, as far as role detection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Integers, floats, decimals and booleans.
    Numeric,
    /// Values already typed as dates or timestamps.
    Temporal,
    /// Everything else, typically strings.
    Text,
}

impl ColumnKind {
    /// Returns the kind name used in summaries.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Text => "text",
        }
    }
}

/// Read-only view of an in-memory table.
///
/// Column names are unique and ordered, and every column holds exactly
/// [`row_count`](Table::row_count) nullable values.
///
/// [`distinct_count`](Table::distinct_count) groups rows by the given columns
/// with null equal to null. Float zeros of either sign fall in one group, as
/// do all NaNs. An implementation that cannot group a column must
/// fail for every column set containing it; the search relies on failures
/// being inherited by supersets.
pub trait Table {
    /// Column names in table order.
    fn column_names(&self) -> Vec<&str>;

    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Value kind of the named column.
    fn column_kind(&self, column: &str) -> Result<ColumnKind>;

    /// Textual rendering of every cell of the named column, `None` for nulls.
    fn text_values(&self, column: &str) -> Result<Vec<Option<String>>>;

    /// Number of distinct value tuples across the given columns.
    fn distinct_count(&self, columns: &[&str]) -> Result<usize>;

    /// Returns true if the table has a column with this name.
    fn has_column(&self, column: &str) -> bool {
        self.column_names().iter().any(|name| *name == column)
    }
}
