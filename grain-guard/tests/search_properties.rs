//! Property-based tests for the granularity search.
//!
//! Random small tables are searched with the pruned and the exhaustive
//! strategies, and both are checked against a brute-force reference that
//! groups every subset, sorts, and applies the dominance filter directly.

use std::collections::BTreeSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use grain_guard::error::{GrainError, Result};
use grain_guard::prelude::*;
use grain_guard::search::SearchStrategy;
use grain_guard::table::ColumnKind;
use proptest::prelude::*;

const VALUES: [&str; 3] = ["v0", "v1", "v2"];

fn columns_of(cells: &[Vec<Option<u8>>]) -> Vec<(String, ArrayRef)> {
    cells
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let values: Vec<Option<&str>> = column
                .iter()
                .map(|cell| cell.map(|v| VALUES[v as usize]))
                .collect();
            (format!("k{i}"), Arc::new(StringArray::from(values)) as ArrayRef)
        })
        .collect()
}

fn build_table(cells: &[Vec<Option<u8>>]) -> ArrowTable {
    ArrowTable::try_from_iter(columns_of(cells)).unwrap()
}

fn table_strategy() -> impl Strategy<Value = Vec<Vec<Option<u8>>>> {
    (1usize..=5, 1usize..=12).prop_flat_map(|(ncols, nrows)| {
        prop::collection::vec(
            prop::collection::vec(prop::option::weighted(0.85, 0u8..3), nrows),
            ncols,
        )
    })
}

/// Groups every subset, sorts, filters; the definition the search must match.
fn reference(table: &dyn Table, columns: &[&str], top_k: usize) -> Vec<(Vec<String>, usize)> {
    let n = columns.len();
    let mut all: Vec<(Vec<usize>, usize)> = Vec::new();
    for size in 1..=n {
        let mut subsets: Vec<Vec<usize>> = (1u64..(1 << n))
            .map(|mask| (0..n).filter(|i| mask & (1 << i) != 0).collect::<Vec<_>>())
            .filter(|subset: &Vec<usize>| subset.len() == size)
            .collect();
        subsets.sort();
        for subset in subsets {
            let names: Vec<&str> = subset.iter().map(|&i| columns[i]).collect();
            if let Ok(count) = table.distinct_count(&names) {
                all.push((subset, count));
            }
        }
    }
    all.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.len().cmp(&b.0.len())));

    let mut kept: Vec<(Vec<usize>, usize)> = Vec::new();
    for (subset, count) in all {
        let dominated = kept.iter().any(|(k, kc)| {
            *kc == count && k.iter().all(|i| subset.contains(i))
        });
        if !dominated {
            kept.push((subset, count));
        }
    }

    kept.into_iter()
        .take(top_k)
        .map(|(subset, count)| {
            (
                subset.iter().map(|&i| columns[i].to_string()).collect(),
                count,
            )
        })
        .collect()
}

fn summarize(candidates: &[GranularityCandidate]) -> Vec<(Vec<String>, usize)> {
    candidates
        .iter()
        .map(|c| (c.columns.clone(), c.distinct_count))
        .collect()
}

fn search(strategy: SearchStrategy, top_k: usize) -> GranularitySearch {
    let config = match strategy {
        SearchStrategy::Pruned => SearchConfig::default(),
        SearchStrategy::Exhaustive => SearchConfig::exhaustive(),
    };
    GranularitySearch::with_config(config.with_top_k(top_k))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_pruned_matches_reference(cells in table_strategy(), top_k in 1usize..8) {
        let table = build_table(&cells);
        let names = table.column_names();

        let expected = reference(&table, &names, top_k);
        let pruned = search(SearchStrategy::Pruned, top_k).evaluate(&table, &names);
        let exhaustive = search(SearchStrategy::Exhaustive, top_k).evaluate(&table, &names);

        prop_assert_eq!(summarize(&pruned), expected.clone());
        prop_assert_eq!(summarize(&exhaustive), expected);
    }

    #[test]
    fn prop_result_invariants(cells in table_strategy()) {
        let mut columns = columns_of(&cells);
        let copied = columns[0].1.clone();
        columns.push(("unit_price".to_string(), copied));
        let table = ArrowTable::try_from_iter(columns).unwrap();
        let row_count = table.row_count();
        let mut candidates_names = table.column_names();
        candidates_names.push("missing");

        let outcome = GranularitySearch::with_config(SearchConfig::default().with_top_k(64))
            .run(&table, &candidates_names);
        let forbidden = outcome.classification.forbidden();
        prop_assert!(forbidden.contains("unit_price"));
        prop_assert_eq!(&outcome.unknown_columns, &vec!["missing".to_string()]);

        for candidate in &outcome.candidates {
            prop_assert!(candidate.distinct_count >= 1);
            prop_assert!(candidate.distinct_count <= row_count);
            prop_assert_eq!(candidate.row_count, row_count);
            prop_assert!(candidate.columns.iter().all(|c| !forbidden.contains(c)));
        }

        for pair in outcome.candidates.windows(2) {
            prop_assert!(pair[0].distinct_count >= pair[1].distinct_count);
            if pair[0].distinct_count == pair[1].distinct_count {
                prop_assert!(pair[0].columns.len() <= pair[1].columns.len());
            }
        }

        for (i, a) in outcome.candidates.iter().enumerate() {
            for b in &outcome.candidates[i + 1..] {
                if a.distinct_count == b.distinct_count {
                    let a_set: BTreeSet<&String> = a.columns.iter().collect();
                    let b_set: BTreeSet<&String> = b.columns.iter().collect();
                    prop_assert!(!a_set.is_subset(&b_set));
                    prop_assert!(!b_set.is_subset(&a_set));
                }
            }
        }

        let again = GranularitySearch::with_config(SearchConfig::default().with_top_k(64))
            .run(&table, &candidates_names);
        prop_assert_eq!(outcome, again);
    }
}

/// Wraps a table and refuses to group any column set containing `broken`.
struct PartiallyGroupable {
    inner: ArrowTable,
    broken: &'static str,
}

impl Table for PartiallyGroupable {
    fn column_names(&self) -> Vec<&str> {
        self.inner.column_names()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_kind(&self, column: &str) -> Result<ColumnKind> {
        self.inner.column_kind(column)
    }

    fn text_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        self.inner.text_values(column)
    }

    fn distinct_count(&self, columns: &[&str]) -> Result<usize> {
        if columns.contains(&self.broken) {
            return Err(GrainError::grouping(columns, "values are not comparable"));
        }
        self.inner.distinct_count(columns)
    }
}

#[test]
fn test_grouping_failures_are_skipped() {
    let table = PartiallyGroupable {
        inner: build_table(&[
            vec![Some(0), Some(1), Some(0), Some(1)],
            vec![Some(0), Some(0), Some(1), Some(2)],
            vec![Some(0), Some(1), Some(2), Some(0)],
        ]),
        broken: "k1",
    };
    let names = ["k0", "k1", "k2"];

    let pruned = search(SearchStrategy::Pruned, 10).run(&table, &names);
    let exhaustive = search(SearchStrategy::Exhaustive, 10).run(&table, &names);

    assert_eq!(pruned.candidates, exhaustive.candidates);
    assert_eq!(summarize(&pruned.candidates), reference(&table, &names, 10));
    assert!(pruned
        .candidates
        .iter()
        .all(|c| !c.columns.contains(&"k1".to_string())));

    // Only k1 itself is grouped and fails; its supersets are skipped.
    assert_eq!(pruned.stats.subsets_failed, 1);
    assert_eq!(exhaustive.stats.subsets_failed, 4);
}

#[test]
fn test_search_budget_on_wide_table() {
    let cells: Vec<Vec<Option<u8>>> = (0..12)
        .map(|i| (0..20).map(|row| Some(((row * (i + 1)) % 3) as u8)).collect())
        .collect();
    let table = build_table(&cells);
    let names = table.column_names();

    let outcome = GranularitySearch::with_config(
        SearchConfig::default().with_max_subsets(Some(30)).with_top_k(3),
    )
    .run(&table, &names);

    assert!(outcome.budget_exhausted);
    assert_eq!(outcome.stats.subsets_evaluated, 30);
    assert!(!outcome.candidates.is_empty());
}
