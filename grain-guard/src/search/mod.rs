//! Granularity search: which column combinations best identify a row.
//!
//! Columns carrying a role (dates, metrics, aggregated keys) are removed from
//! the candidates, every remaining column combination is grouped, and the
//! combinations are ranked by how many distinct tuples they produce. Wider
//! combinations that tie a narrower, already accepted one are discarded.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int64Array, StringArray};
//! use grain_guard::search::evaluate_granularities;
//! use grain_guard::table::ArrowTable;
//!
//! let table = ArrowTable::try_from_iter(vec![
//!     ("Product", Arc::new(StringArray::from(vec!["A", "A", "B", "B"])) as ArrayRef),
//!     ("Store", Arc::new(StringArray::from(vec!["X", "Y", "X", "Y"])) as ArrayRef),
//!     ("Price", Arc::new(Int64Array::from(vec![10, 20, 30, 40])) as ArrayRef),
//! ])
//! .unwrap();
//!
//! let candidates = evaluate_granularities(&table, &["Product", "Store", "Price"], 2);
//! assert_eq!(candidates[0].columns, vec!["Product", "Store"]);
//! assert_eq!(candidates[0].distinct_count, 4);
//! assert!(candidates[0].is_unique_key());
//! ```

mod candidate;
mod config;
mod lattice;

pub use candidate::{GranularityCandidate, GranularityQuality, SearchOutcome, SearchStats};
pub use config::{SearchConfig, SearchStrategy, MAX_SEARCH_COLUMNS};

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use crate::classify::{default_classifier, ColumnClassifier};
use crate::logging::{truncate_field, LogConfig};
use crate::perf_debug;
use crate::table::Table;
use lattice::Budget;

/// Runs the classifiers and the subset search over a table.
#[derive(Debug, Clone)]
pub struct GranularitySearch {
    config: SearchConfig,
    classifier: ColumnClassifier,
    log_config: LogConfig,
}

impl Default for GranularitySearch {
    fn default() -> Self {
        Self::new()
    }
}

impl GranularitySearch {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            config,
            classifier: default_classifier().clone(),
            log_config: LogConfig::default(),
        }
    }

    /// Replaces the classifier, e.g. one built from a custom vocabulary.
    pub fn with_classifier(mut self, classifier: ColumnClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ColumnClassifier {
        &self.classifier
    }

    /// Searches the candidate columns and reports everything the run found.
    ///
    /// Never fails: unknown names, forbidden columns, grouping failures and
    /// budget exhaustion all degrade to a smaller or empty result.
    #[instrument(skip_all, fields(candidates = candidate_columns.len(), top_k = self.config.top_k))]
    pub fn run<S: AsRef<str>>(&self, table: &dyn Table, candidate_columns: &[S]) -> SearchOutcome {
        let row_count = table.row_count();
        let classification = self.classifier.classify(table);

        let mut seen = HashSet::new();
        let mut available: Vec<&str> = Vec::new();
        let mut ignored = Vec::new();
        let mut unknown = Vec::new();

        for column in candidate_columns {
            let column: &str = column.as_ref();
            if !seen.insert(column) {
                continue;
            }
            if !table.has_column(column) {
                warn!(column, "Candidate column not found in table, skipping");
                unknown.push(column.to_string());
            } else if classification.is_forbidden(column) {
                perf_debug!(self.log_config, column, roles = ?classification.roles_of(column), "Ignoring column");
                ignored.push(column.to_string());
            } else {
                available.push(column);
            }
        }

        // Zero rows identify nothing.
        if available.is_empty() || row_count == 0 || self.config.top_k == 0 {
            info!(
                ignored = ignored.len(),
                unknown = unknown.len(),
                "No usable key candidates"
            );
            return SearchOutcome::empty(classification, ignored, unknown, row_count);
        }

        let max_columns = self.config.effective_max_columns();
        let truncated = available.len() > max_columns;
        if truncated {
            warn!(
                available = available.len(),
                max_columns,
                dropped = %truncate_field(
                    &available[max_columns..].join(", "),
                    self.log_config.max_field_length
                ),
                "Too many candidate columns, searching only the first ones"
            );
            available.truncate(max_columns);
        }

        let mut budget = Budget::new(self.config.max_subsets, self.config.time_budget);
        let enumeration = lattice::enumerate(
            table,
            &available,
            self.config.strategy,
            &mut budget,
            &self.log_config,
        );
        if enumeration.budget_exhausted {
            warn!(
                evaluated = enumeration.stats.subsets_evaluated,
                "Search budget exhausted, reporting best candidates found so far"
            );
        }

        let candidates: Vec<GranularityCandidate> =
            lattice::rank(enumeration.evaluated, self.config.top_k)
                .into_iter()
                .map(|evaluated| GranularityCandidate {
                    columns: evaluated
                        .indices
                        .iter()
                        .map(|&i| available[i].to_string())
                        .collect(),
                    distinct_count: evaluated.distinct_count,
                    row_count,
                })
                .collect();

        info!(
            searched = available.len(),
            evaluated = enumeration.stats.subsets_evaluated,
            skipped = enumeration.stats.subsets_skipped,
            failed = enumeration.stats.subsets_failed,
            found = candidates.len(),
            "Granularity search completed"
        );

        SearchOutcome {
            candidates,
            classification,
            ignored_columns: ignored,
            unknown_columns: unknown,
            searched_columns: available.iter().map(|c| c.to_string()).collect(),
            row_count,
            stats: enumeration.stats,
            truncated,
            budget_exhausted: enumeration.budget_exhausted,
        }
    }

    /// Ranked candidates only.
    pub fn evaluate<S: AsRef<str>>(
        &self,
        table: &dyn Table,
        candidate_columns: &[S],
    ) -> Vec<GranularityCandidate> {
        self.run(table, candidate_columns).candidates
    }
}

/// Best `top_k` key candidates among `candidate_columns` with the default
/// classifier and limits.
pub fn evaluate_granularities<S: AsRef<str>>(
    table: &dyn Table,
    candidate_columns: &[S],
    top_k: usize,
) -> Vec<GranularityCandidate> {
    GranularitySearch::with_config(SearchConfig::default().with_top_k(top_k))
        .evaluate(table, candidate_columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ArrowTable;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn text(values: &[&str]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    fn sales_table() -> ArrowTable {
        ArrowTable::try_from_iter(vec![
            ("Product", text(&["A", "A", "B", "B"])),
            ("Store", text(&["X", "Y", "X", "Y"])),
            ("Price", Arc::new(Int64Array::from(vec![10, 20, 30, 40])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_metric_column_is_never_a_key() {
        let table = sales_table();
        let candidates = evaluate_granularities(&table, &["Product", "Store", "Price"], 2);

        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0],
            GranularityCandidate {
                columns: vec!["Product".to_string(), "Store".to_string()],
                distinct_count: 4,
                row_count: 4,
            }
        );
        assert_eq!(candidates[1].columns, vec!["Product"]);
        assert!(candidates
            .iter()
            .all(|c| !c.columns.contains(&"Price".to_string())));
    }

    #[test]
    fn test_date_column_is_never_a_key() {
        let table = ArrowTable::try_from_iter(vec![
            ("Date", text(&["2024-01-01", "2024-01-02"])),
            ("Loja", text(&["N", "N"])),
        ])
        .unwrap();

        let outcome = GranularitySearch::new().run(&table, &["Date", "Loja"]);
        assert!(outcome.classification.dates.contains("Date"));
        assert_eq!(outcome.ignored_columns, vec!["Date"]);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].columns, vec!["Loja"]);
        assert_eq!(outcome.candidates[0].distinct_count, 1);
    }

    #[test]
    fn test_grouping_synonym_is_excluded() {
        let table = ArrowTable::try_from_iter(vec![
            ("chave", text(&["1", "2", "3"])),
            ("loja", text(&["a", "b", "b"])),
        ])
        .unwrap();

        let candidates = evaluate_granularities(&table, &["chave", "loja"], 5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].columns, vec!["loja"]);
    }

    #[test]
    fn test_wider_ties_are_filtered() {
        let a = ["a0", "a1", "a2", "a3", "a4", "a0", "a1", "a2", "a3", "a4"];
        let b = ["p0", "p1", "p0", "p1", "p0", "p0", "p1", "p0", "p1", "p0"];
        let c = ["c1", "c1", "c0", "c0", "c0", "c1", "c1", "c0", "c0", "c0"];
        let table = ArrowTable::try_from_iter(vec![
            ("A", text(&a)),
            ("B", text(&b)),
            ("C", text(&c)),
        ])
        .unwrap();

        let candidates = evaluate_granularities(&table, &["A", "B", "C"], 10);
        let at_five: Vec<&GranularityCandidate> =
            candidates.iter().filter(|c| c.distinct_count == 5).collect();
        assert_eq!(at_five.len(), 1);
        assert_eq!(at_five[0].columns, vec!["A"]);
        assert_eq!(at_five[0].row_count, 10);

        let summary: Vec<(Vec<String>, usize)> = candidates
            .into_iter()
            .map(|c| (c.columns, c.distinct_count))
            .collect();
        assert_eq!(
            summary,
            vec![
                (vec!["A".to_string()], 5),
                (vec!["B".to_string(), "C".to_string()], 4),
                (vec!["B".to_string()], 2),
                (vec!["C".to_string()], 2),
            ]
        );
    }

    #[test]
    fn test_no_usable_columns() {
        let table = sales_table();
        let outcome = GranularitySearch::new().run(&table, &["Price"]);
        assert!(outcome.is_empty());
        assert_eq!(outcome.ignored_columns, vec!["Price"]);
        assert!(outcome.searched_columns.is_empty());

        let none: [&str; 0] = [];
        assert!(evaluate_granularities(&table, &none, 2).is_empty());
        assert!(evaluate_granularities(&table, &["Product", "Store"], 0).is_empty());
    }

    #[test]
    fn test_unknown_and_duplicate_candidates() {
        let table = sales_table();
        let outcome = GranularitySearch::new().run(&table, &["Store", "Missing", "Store", "Product"]);

        assert_eq!(outcome.unknown_columns, vec!["Missing"]);
        assert_eq!(outcome.searched_columns, vec!["Store", "Product"]);
        assert_eq!(outcome.candidates[0].columns, vec!["Store", "Product"]);
    }

    #[test]
    fn test_truncates_to_max_columns() {
        let table = sales_table();
        let search = GranularitySearch::with_config(SearchConfig::default().with_max_columns(1));
        let outcome = search.run(&table, &["Product", "Store"]);

        assert!(outcome.truncated);
        assert_eq!(outcome.searched_columns, vec!["Product"]);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].distinct_count, 2);
    }

    #[test]
    fn test_budget_exhaustion_returns_partial_result() {
        let table = sales_table();
        let search = GranularitySearch::with_config(
            SearchConfig::default().with_max_subsets(Some(1)).with_top_k(5),
        );
        let outcome = search.run(&table, &["Product", "Store"]);

        assert!(outcome.budget_exhausted);
        assert_eq!(outcome.stats.subsets_evaluated, 1);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].columns, vec!["Product"]);
    }

    #[test]
    fn test_strategies_agree() {
        let table = sales_table();
        let columns = ["Product", "Store"];
        let pruned = GranularitySearch::new().evaluate(&table, &columns);
        let exhaustive = GranularitySearch::with_config(SearchConfig::exhaustive().with_top_k(2))
            .evaluate(&table, &columns);
        assert_eq!(pruned, exhaustive);
    }

    #[test]
    fn test_empty_table_has_no_candidates() {
        let table = ArrowTable::try_from_iter(vec![("Loja", text(&[]))]).unwrap();
        let outcome = GranularitySearch::new().run(&table, &["Loja"]);
        assert!(outcome.is_empty());
        assert_eq!(outcome.row_count, 0);
    }

    #[test]
    fn test_deterministic() {
        let table = sales_table();
        let search = GranularitySearch::new();
        let first = search.run(&table, &["Product", "Store"]);
        let second = search.run(&table, &["Product", "Store"]);
        assert_eq!(first, second);
    }
}
