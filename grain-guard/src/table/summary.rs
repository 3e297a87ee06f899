//! Shape summary of a loaded table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ColumnKind, Table};

/// Name and kind of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
}

/// Row count, column count and per-column kinds of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

impl TableSummary {
    /// Summarizes any table. Columns whose kind cannot be read are reported as text.
    pub fn from_table(table: &dyn Table) -> Self {
        let columns = table
            .column_names()
            .into_iter()
            .map(|name| ColumnSummary {
                name: name.to_string(),
                kind: table.column_kind(name).unwrap_or(ColumnKind::Text),
            })
            .collect();

        Self {
            row_count: table.row_count(),
            columns,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names grouped by kind, each group in table order.
    pub fn columns_by_kind(&self) -> BTreeMap<&'static str, Vec<&str>> {
        let mut groups: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for column in &self.columns {
            groups
                .entry(column.kind.name())
                .or_default()
                .push(column.name.as_str());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ArrowTable;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_summary_groups_by_kind() {
        let table = ArrowTable::try_from_iter(vec![
            ("sku", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
            ("qty", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("store", Arc::new(StringArray::from(vec!["x", "y"])) as ArrayRef),
        ])
        .unwrap();

        let summary = TableSummary::from_table(&table);
        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.column_count(), 3);

        let groups = summary.columns_by_kind();
        assert_eq!(groups["text"], vec!["sku", "store"]);
        assert_eq!(groups["numeric"], vec!["qty"]);
    }
}
