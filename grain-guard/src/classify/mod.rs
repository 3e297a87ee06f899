//! Column role heuristics.
//!
//! Three independent, read-only classifiers tag columns that must never be
//! part of a grouping key:
//!
//! - **Date**: non-numeric columns whose values mostly parse as calendar dates,
//!   or whose name contains a date word.
//! - **Metric**: columns whose name contains a business or statistical measure
//!   term (price, quantity, score...). Content is ignored.
//! - **AggregatedKey**: columns whose name already reads like a composite key
//!   (`"sku+store"`, `"chave"`, `"produto estado"`).
//!
//! The roles are computed independently, so a column may carry several. All
//! heuristics lean towards over-forbidding: a false positive only removes one
//! dimension from the search, a false negative lets a measure or a
//! pre-aggregated label into a proposed key.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int64Array, StringArray};
//! use grain_guard::classify::{classify_dates, classify_metrics, ColumnClassifier, ColumnRole};
//! use grain_guard::table::ArrowTable;
//!
//! let table = ArrowTable::try_from_iter(vec![
//!     ("Product", Arc::new(StringArray::from(vec!["A", "B"])) as ArrayRef),
//!     ("Price", Arc::new(Int64Array::from(vec![10, 20])) as ArrayRef),
//!     ("Date", Arc::new(StringArray::from(vec!["2024-01-01", "2024-01-02"])) as ArrayRef),
//! ])
//! .unwrap();
//!
//! assert!(classify_metrics(&table).contains("Price"));
//! assert!(classify_dates(&table).contains("Date"));
//!
//! let classification = ColumnClassifier::new().classify(&table);
//! assert!(!classification.is_forbidden("Product"));
//! assert_eq!(classification.roles_of("Price"), vec![ColumnRole::Metric]);
//! ```

mod dates;
mod vocabulary;

pub use dates::parse_date;
pub use vocabulary::ClassifierVocabulary;

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::table::{ColumnKind, Table};

/// Default share of parseable values above which a column is a date.
pub const DEFAULT_DATE_THRESHOLD: f64 = 0.9;

static DEFAULT_CLASSIFIER: Lazy<ColumnClassifier> = Lazy::new(ColumnClassifier::new);

/// Role that excludes a column from key candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnRole {
    Date,
    Metric,
    AggregatedKey,
}

/// Per-role column sets produced by [`ColumnClassifier::classify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnClassification {
    pub dates: BTreeSet<String>,
    pub metrics: BTreeSet<String>,
    pub aggregated: BTreeSet<String>,
}

impl ColumnClassification {
    /// Union of all roles.
    pub fn forbidden(&self) -> BTreeSet<String> {
        self.dates
            .iter()
            .chain(&self.metrics)
            .chain(&self.aggregated)
            .cloned()
            .collect()
    }

    pub fn is_forbidden(&self, column: &str) -> bool {
        self.dates.contains(column)
            || self.metrics.contains(column)
            || self.aggregated.contains(column)
    }

    /// Roles carried by `column`, in declaration order.
    pub fn roles_of(&self, column: &str) -> Vec<ColumnRole> {
        let mut roles = Vec::new();
        if self.dates.contains(column) {
            roles.push(ColumnRole::Date);
        }
        if self.metrics.contains(column) {
            roles.push(ColumnRole::Metric);
        }
        if self.aggregated.contains(column) {
            roles.push(ColumnRole::AggregatedKey);
        }
        roles
    }
}

/// Applies the role heuristics of a [`ClassifierVocabulary`].
#[derive(Debug, Clone)]
pub struct ColumnClassifier {
    vocabulary: ClassifierVocabulary,
    date_pattern: Option<Regex>,
    metric_pattern: Option<Regex>,
    date_threshold: f64,
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnClassifier {
    /// Creates a classifier with the default vocabulary.
    pub fn new() -> Self {
        let vocabulary = ClassifierVocabulary::default();
        // The default word lists are plain escaped literals.
        let date_pattern = vocabulary
            .date_pattern()
            .expect("default date vocabulary compiles");
        let metric_pattern = vocabulary
            .metric_pattern()
            .expect("default metric vocabulary compiles");

        Self {
            vocabulary,
            date_pattern,
            metric_pattern,
            date_threshold: DEFAULT_DATE_THRESHOLD,
        }
    }

    /// Creates a classifier with a custom vocabulary.
    pub fn with_vocabulary(vocabulary: ClassifierVocabulary) -> Result<Self> {
        vocabulary.validate()?;
        Ok(Self {
            date_pattern: vocabulary.date_pattern()?,
            metric_pattern: vocabulary.metric_pattern()?,
            vocabulary,
            date_threshold: DEFAULT_DATE_THRESHOLD,
        })
    }

    /// Sets the parse-success ratio that makes a column a date.
    pub fn date_threshold(mut self, threshold: f64) -> Self {
        self.date_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn vocabulary(&self) -> &ClassifierVocabulary {
        &self.vocabulary
    }

    /// Runs all three classifiers.
    #[instrument(skip(self, table))]
    pub fn classify(&self, table: &dyn Table) -> ColumnClassification {
        let classification = ColumnClassification {
            dates: self.classify_dates(table),
            metrics: self.classify_metrics(table),
            aggregated: self.classify_aggregated(table),
        };
        debug!(
            dates = classification.dates.len(),
            metrics = classification.metrics.len(),
            aggregated = classification.aggregated.len(),
            "Classified columns"
        );
        classification
    }

    /// Columns that hold dates, by content or by name.
    pub fn classify_dates(&self, table: &dyn Table) -> BTreeSet<String> {
        let row_count = table.row_count();
        let mut dates = BTreeSet::new();

        for column in table.column_names() {
            let kind = match table.column_kind(column) {
                Ok(kind) => kind,
                Err(e) => {
                    debug!(column, error = %e, "Skipping column with unreadable kind");
                    continue;
                }
            };
            if kind == ColumnKind::Numeric {
                continue;
            }

            let by_name = self
                .date_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(column));
            let ratio = parsed_ratio(table, column, kind, row_count);
            let by_content = ratio.is_some_and(|ratio| ratio >= self.date_threshold);

            debug!(column, by_name, ratio, "Date check");
            if by_name || by_content {
                dates.insert(column.to_string());
            }
        }

        dates
    }

    /// Columns whose name contains a metric term.
    pub fn classify_metrics(&self, table: &dyn Table) -> BTreeSet<String> {
        let Some(pattern) = &self.metric_pattern else {
            return BTreeSet::new();
        };
        table
            .column_names()
            .into_iter()
            .filter(|column| pattern.is_match(column))
            .map(str::to_string)
            .collect()
    }

    /// Columns whose name already reads like a composite grouping key.
    pub fn classify_aggregated(&self, table: &dyn Table) -> BTreeSet<String> {
        table
            .column_names()
            .into_iter()
            .filter(|column| self.is_aggregated_name(column))
            .map(str::to_string)
            .collect()
    }

    fn is_aggregated_name(&self, column: &str) -> bool {
        let normalized = column.trim().to_lowercase();
        if normalized.contains('+') {
            return true;
        }
        if self
            .vocabulary
            .grouping_synonyms
            .iter()
            .any(|synonym| synonym.trim().to_lowercase() == normalized)
        {
            return true;
        }

        let hits = self
            .vocabulary
            .dimension_words
            .iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty() && normalized.contains(word.as_str()))
            .count();
        hits >= self.vocabulary.min_dimension_hits
    }
}

/// Share of rows holding a parseable date; `None` for empty tables or unreadable columns.
fn parsed_ratio(
    table: &dyn Table,
    column: &str,
    kind: ColumnKind,
    row_count: usize,
) -> Option<f64> {
    if row_count == 0 {
        return None;
    }

    let values = match table.text_values(column) {
        Ok(values) => values,
        Err(e) => {
            debug!(column, error = %e, "Could not read column values");
            return None;
        }
    };

    let parsed = if kind == ColumnKind::Temporal {
        values.iter().filter(|value| value.is_some()).count()
    } else {
        let mut cache: HashMap<&str, bool> = HashMap::new();
        values
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|value| {
                *cache
                    .entry(*value)
                    .or_insert_with(|| parse_date(value).is_some())
            })
            .count()
    };

    Some(parsed as f64 / row_count as f64)
}

/// Shared classifier with the default vocabulary.
pub(crate) fn default_classifier() -> &'static ColumnClassifier {
    &DEFAULT_CLASSIFIER
}

/// Date columns under the default vocabulary and threshold.
pub fn classify_dates(table: &dyn Table) -> BTreeSet<String> {
    DEFAULT_CLASSIFIER.classify_dates(table)
}

/// Date columns under the default vocabulary with a custom parse threshold.
pub fn classify_dates_with_threshold(table: &dyn Table, threshold: f64) -> BTreeSet<String> {
    DEFAULT_CLASSIFIER
        .clone()
        .date_threshold(threshold)
        .classify_dates(table)
}

/// Metric columns under the default vocabulary.
pub fn classify_metrics(table: &dyn Table) -> BTreeSet<String> {
    DEFAULT_CLASSIFIER.classify_metrics(table)
}

/// Aggregated-key columns under the default vocabulary.
pub fn classify_aggregated(table: &dyn Table) -> BTreeSet<String> {
    DEFAULT_CLASSIFIER.classify_aggregated(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ArrowTable;
    use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn strings(values: Vec<Option<&str>>) -> ArrayRef {
        Arc::new(StringArray::from(values))
    }

    #[test]
    fn test_metric_columns() {
        let table = ArrowTable::try_from_iter(vec![
            ("Product", strings(vec![Some("A"), Some("B")])),
            ("Price", Arc::new(Int64Array::from(vec![10, 20])) as ArrayRef),
            ("Quantity", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("Date", strings(vec![Some("2024-01-01"), Some("2024-01-02")])),
        ])
        .unwrap();

        let metrics = classify_metrics(&table);
        assert!(metrics.contains("Price"));
        assert!(metrics.contains("Quantity"));
        assert!(!metrics.contains("Product"));
        assert!(!metrics.contains("Date"));
    }

    #[test]
    fn test_date_columns_by_content_and_name() {
        let table = ArrowTable::try_from_iter(vec![
            ("Date", strings(vec![Some("2024-01-01"), Some("2024-01-02")])),
            ("Product", strings(vec![Some("A"), Some("B")])),
            ("shipped", strings(vec![Some("03/04/2024"), Some("25/12/2023")])),
            ("Data Venda", strings(vec![Some("n/a"), Some("soon")])),
        ])
        .unwrap();

        let dates = classify_dates(&table);
        assert!(dates.contains("Date"));
        assert!(dates.contains("shipped"));
        assert!(dates.contains("Data Venda"));
        assert!(!dates.contains("Product"));
    }

    #[test]
    fn test_date_threshold_counts_nulls_against_ratio() {
        let table = ArrowTable::try_from_iter(vec![(
            "shipped",
            strings(vec![
                Some("2024-01-01"),
                Some("2024-01-02"),
                Some("2024-01-03"),
                Some("2024-01-04"),
                None,
            ]),
        )])
        .unwrap();

        // 4 of 5 rows parse
        assert!(classify_dates(&table).is_empty());
        assert!(classify_dates_with_threshold(&table, 0.8).contains("shipped"));
    }

    #[test]
    fn test_numeric_columns_are_never_dates() {
        let table = ArrowTable::try_from_iter(vec![
            (
                "data",
                Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef,
            ),
            (
                "opened",
                Arc::new(Date32Array::from(vec![Some(19000), Some(19001)])) as ArrayRef,
            ),
        ])
        .unwrap();

        let dates = classify_dates(&table);
        assert!(!dates.contains("data"));
        assert!(dates.contains("opened"));
    }

    #[test]
    fn test_aggregated_columns() {
        let table = ArrowTable::try_from_iter(vec![
            ("chave", strings(vec![Some("x")])),
            (" Key ", strings(vec![Some("x")])),
            ("sku+loja", strings(vec![Some("x")])),
            ("produto_estado", strings(vec![Some("x")])),
            ("Product", strings(vec![Some("x")])),
            ("keyword", strings(vec![Some("x")])),
        ])
        .unwrap();

        let aggregated = classify_aggregated(&table);
        assert!(aggregated.contains("chave"));
        assert!(aggregated.contains(" Key "));
        assert!(aggregated.contains("sku+loja"));
        assert!(aggregated.contains("produto_estado"));
        assert!(!aggregated.contains("Product"));
        assert!(!aggregated.contains("keyword"));
    }

    #[test]
    fn test_roles_are_independent() {
        let table = ArrowTable::try_from_iter(vec![
            (
                "data preço",
                strings(vec![Some("2024-01-01"), Some("2024-01-02")]),
            ),
            ("loja", strings(vec![Some("a"), Some("b")])),
        ])
        .unwrap();

        let classification = ColumnClassifier::new().classify(&table);
        assert_eq!(
            classification.roles_of("data preço"),
            vec![ColumnRole::Date, ColumnRole::Metric]
        );
        assert!(classification.roles_of("loja").is_empty());
        assert_eq!(
            classification.forbidden(),
            BTreeSet::from(["data preço".to_string()])
        );
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = ClassifierVocabulary::from_json_str(
            r#"{"metric_terms": ["importe"], "grouping_synonyms": ["clave"]}"#,
        )
        .unwrap();
        let classifier = ColumnClassifier::with_vocabulary(vocabulary).unwrap();

        let table = ArrowTable::try_from_iter(vec![
            ("importe", strings(vec![Some("1")])),
            ("price", strings(vec![Some("1")])),
            ("clave", strings(vec![Some("1")])),
        ])
        .unwrap();

        assert_eq!(
            classifier.classify_metrics(&table),
            BTreeSet::from(["importe".to_string()])
        );
        assert_eq!(
            classifier.classify_aggregated(&table),
            BTreeSet::from(["clave".to_string()])
        );
    }

    #[test]
    fn test_vocabulary_built_in_code_is_validated() {
        let vocabulary = ClassifierVocabulary {
            min_dimension_hits: 0,
            ..Default::default()
        };
        assert!(matches!(
            ColumnClassifier::with_vocabulary(vocabulary),
            Err(crate::error::GrainError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_table_classifies_dates_by_name_only() {
        let table = ArrowTable::try_from_iter(vec![
            ("validade", strings(vec![])),
            ("shipped", strings(vec![])),
        ])
        .unwrap();

        assert_eq!(
            classify_dates(&table),
            BTreeSet::from(["validade".to_string()])
        );
    }
}
