//! Search limits and strategy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Subsets are tracked as `u64` bitmasks.
pub const MAX_SEARCH_COLUMNS: usize = 63;

/// How the subset lattice is walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Skip supersets whose fate is decided by their parents.
    #[default]
    Pruned,
    /// Group every non-empty subset, then rank and filter.
    Exhaustive,
}

/// Configuration for [`GranularitySearch`](super::GranularitySearch).
///
/// The search is exponential in the number of usable columns. `max_columns`
/// bounds the lattice up front; `max_subsets` and `time_budget` stop a run
/// early and keep the best candidates found so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of candidates returned.
    pub top_k: usize,
    /// Usable columns beyond this many are dropped (caller order).
    pub max_columns: usize,
    /// Maximum number of subsets to group.
    pub max_subsets: Option<u64>,
    /// Wall-clock budget for the enumeration.
    pub time_budget: Option<Duration>,
    pub strategy: SearchStrategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            max_columns: 24,
            max_subsets: None,
            time_budget: None,
            strategy: SearchStrategy::Pruned,
        }
    }
}

impl SearchConfig {
    /// Visits every subset of up to [`MAX_SEARCH_COLUMNS`] columns with no budget.
    pub fn exhaustive() -> Self {
        Self {
            max_columns: MAX_SEARCH_COLUMNS,
            strategy: SearchStrategy::Exhaustive,
            ..Self::default()
        }
    }

    /// Bounded search that answers within a few seconds on wide tables.
    pub fn interactive() -> Self {
        Self {
            max_columns: 20,
            max_subsets: Some(100_000),
            time_budget: Some(Duration::from_secs(5)),
            ..Self::default()
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns.min(MAX_SEARCH_COLUMNS);
        self
    }

    pub fn with_max_subsets(mut self, max_subsets: Option<u64>) -> Self {
        self.max_subsets = max_subsets;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Column limit actually applied, never above [`MAX_SEARCH_COLUMNS`].
    pub fn effective_max_columns(&self) -> usize {
        self.max_columns.min(MAX_SEARCH_COLUMNS)
    }
}
