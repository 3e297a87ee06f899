//! Subset enumeration, ranking and the dominance filter.
//!
//! Subsets of the searched columns are bitmasks over their positions and are
//! generated level by level (size 1, then 2, ...), each level in
//! lexicographic order of positions. Generation order breaks ranking ties.
//!
//! Pruning relies on two facts about distinct counts:
//!
//! 1. Adding a column never lowers the count.
//! 2. A subset with a proper subset of equal count is always removed by the
//!    dominance filter, and so is every superset of it.
//!
//! A subset is therefore skipped when a parent (the subset minus one column)
//! is saturated (count equals the row count), was itself redundant, or failed
//! to group. A computed subset whose count equals a parent's is redundant and
//! not emitted. The surviving list is exactly what the exhaustive walk yields
//! after ranking and filtering.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use super::candidate::SearchStats;
use super::config::SearchStrategy;
use crate::log_subset;
use crate::logging::LogConfig;
use crate::table::Table;

/// A subset whose distinct count was computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Evaluated {
    pub mask: u64,
    pub indices: Vec<usize>,
    pub distinct_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubsetState {
    Counted(usize),
    Redundant,
    Failed,
}

/// Result of walking the lattice.
#[derive(Debug, Default)]
pub(crate) struct Enumeration {
    /// Emitted subsets in generation order.
    pub evaluated: Vec<Evaluated>,
    pub stats: SearchStats,
    pub budget_exhausted: bool,
}

/// Limits on how many groupings a walk may perform.
#[derive(Debug)]
pub(crate) struct Budget {
    max_subsets: Option<u64>,
    deadline: Option<Instant>,
    spent: u64,
}

impl Budget {
    pub fn new(max_subsets: Option<u64>, time_budget: Option<Duration>) -> Self {
        Self {
            max_subsets,
            deadline: time_budget.map(|budget| Instant::now() + budget),
            spent: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// Reserves one grouping, false once the budget is used up.
    fn try_spend(&mut self) -> bool {
        if self.max_subsets.is_some_and(|max| self.spent >= max) {
            return false;
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return false;
        }
        self.spent += 1;
        true
    }
}

/// Lexicographic k-combinations of `0..n`.
#[derive(Debug)]
pub(crate) struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k == 0 || k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let k = self.indices.len();
        for i in (0..k).rev() {
            if self.indices[i] < i + self.n - k {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(self.indices.clone());
            }
        }

        self.done = true;
        None
    }
}

fn mask_of(indices: &[usize]) -> u64 {
    indices.iter().fold(0u64, |mask, &i| mask | (1u64 << i))
}

fn parents(mask: u64, indices: &[usize]) -> impl Iterator<Item = u64> + '_ {
    indices.iter().map(move |&i| mask & !(1u64 << i))
}

fn group(table: &dyn Table, columns: &[&str], indices: &[usize]) -> crate::error::Result<usize> {
    let selected: Vec<&str> = indices.iter().map(|&i| columns[i]).collect();
    table.distinct_count(&selected)
}

/// Walks the subsets of `columns` with the given strategy.
pub(crate) fn enumerate(
    table: &dyn Table,
    columns: &[&str],
    strategy: SearchStrategy,
    budget: &mut Budget,
    log: &LogConfig,
) -> Enumeration {
    match strategy {
        SearchStrategy::Pruned => enumerate_pruned(table, columns, budget, log),
        SearchStrategy::Exhaustive => enumerate_exhaustive(table, columns, budget, log),
    }
}

fn enumerate_exhaustive(
    table: &dyn Table,
    columns: &[&str],
    budget: &mut Budget,
    log: &LogConfig,
) -> Enumeration {
    let mut out = Enumeration::default();

    'levels: for size in 1..=columns.len() {
        for indices in Combinations::new(columns.len(), size) {
            if !budget.try_spend() {
                out.budget_exhausted = true;
                break 'levels;
            }
            match group(table, columns, &indices) {
                Ok(distinct_count) => {
                    out.stats.subsets_evaluated += 1;
                    log_subset!(log, ?indices, distinct_count, "Grouped subset");
                    out.evaluated.push(Evaluated {
                        mask: mask_of(&indices),
                        indices,
                        distinct_count,
                    });
                }
                Err(e) => {
                    out.stats.subsets_failed += 1;
                    debug!(?indices, error = %e, "Subset could not be grouped");
                }
            }
        }
    }

    out
}

fn enumerate_pruned(
    table: &dyn Table,
    columns: &[&str],
    budget: &mut Budget,
    log: &LogConfig,
) -> Enumeration {
    let row_count = table.row_count();
    let mut out = Enumeration::default();
    let mut previous: HashMap<u64, SubsetState> = HashMap::new();

    'levels: for size in 1..=columns.len() {
        let mut current = HashMap::new();
        let mut any_counted = false;

        for indices in Combinations::new(columns.len(), size) {
            let mask = mask_of(&indices);

            let inherited = parents(mask, &indices).find_map(|parent| match previous.get(&parent) {
                Some(SubsetState::Redundant) => Some(SubsetState::Redundant),
                Some(SubsetState::Failed) => Some(SubsetState::Failed),
                Some(SubsetState::Counted(count)) if *count == row_count => {
                    Some(SubsetState::Redundant)
                }
                _ => None,
            });

            let state = match inherited {
                Some(state) => {
                    out.stats.subsets_skipped += 1;
                    state
                }
                None => {
                    if !budget.try_spend() {
                        out.budget_exhausted = true;
                        break 'levels;
                    }
                    match group(table, columns, &indices) {
                        Ok(distinct_count) => {
                            out.stats.subsets_evaluated += 1;
                            let ties_parent = parents(mask, &indices).any(|parent| {
                                previous.get(&parent)
                                    == Some(&SubsetState::Counted(distinct_count))
                            });
                            log_subset!(log, ?indices, distinct_count, ties_parent, "Grouped subset");

                            if ties_parent {
                                SubsetState::Redundant
                            } else {
                                out.evaluated.push(Evaluated {
                                    mask,
                                    indices,
                                    distinct_count,
                                });
                                SubsetState::Counted(distinct_count)
                            }
                        }
                        Err(e) => {
                            out.stats.subsets_failed += 1;
                            debug!(?indices, error = %e, "Subset could not be grouped");
                            SubsetState::Failed
                        }
                    }
                }
            };

            any_counted |= matches!(state, SubsetState::Counted(_));
            current.insert(mask, state);
        }

        // Every wider subset would be redundant or failing.
        if !any_counted {
            break;
        }
        previous = current;
    }

    out
}

/// Orders by descending count, then ascending size, then generation order, and
/// keeps the first `top_k` subsets not dominated by an already kept one.
pub(crate) fn rank(mut evaluated: Vec<Evaluated>, top_k: usize) -> Vec<Evaluated> {
    evaluated.sort_by_key(|e| (Reverse(e.distinct_count), e.indices.len()));

    let mut kept: Vec<Evaluated> = Vec::with_capacity(top_k);
    for candidate in evaluated {
        if kept.len() >= top_k {
            break;
        }
        let dominated = kept.iter().any(|k| {
            k.distinct_count == candidate.distinct_count && k.mask & candidate.mask == k.mask
        });
        if !dominated {
            kept.push(candidate);
        }
    }
    kept
}
