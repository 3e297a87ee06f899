//! Search results and the quality bands derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::ColumnClassification;

/// A proposed key: columns in caller order plus how finely they split the rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GranularityCandidate {
    pub columns: Vec<String>,
    /// Distinct value tuples across `columns`, null-containing tuples included.
    pub distinct_count: usize,
    /// Table rows when the candidate was evaluated.
    pub row_count: usize,
}

impl GranularityCandidate {
    /// Share of rows that are distinguishable, in `[0, 1]`.
    pub fn coverage(&self) -> f64 {
        if self.row_count == 0 {
            1.0
        } else {
            self.distinct_count as f64 / self.row_count as f64
        }
    }

    pub fn quality(&self) -> GranularityQuality {
        GranularityQuality::from_counts(self.distinct_count, self.row_count)
    }

    /// True when every row is its own group.
    pub fn is_unique_key(&self) -> bool {
        self.distinct_count == self.row_count
    }
}

/// Human-facing band for a `(distinct_count, row_count)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GranularityQuality {
    /// Fewer than half the rows are distinguishable.
    Low,
    /// More than half.
    Reasonable,
    /// More than 90%.
    Great,
    /// Every row is unique.
    Maximum,
}

impl GranularityQuality {
    pub fn from_counts(distinct_count: usize, row_count: usize) -> Self {
        let distinct = distinct_count as f64;
        let rows = row_count as f64;
        if distinct_count == row_count {
            Self::Maximum
        } else if distinct > rows * 0.9 {
            Self::Great
        } else if distinct > rows * 0.5 {
            Self::Reasonable
        } else {
            Self::Low
        }
    }

    /// One-line verdict shown next to a candidate.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Maximum => "Each row is unique: maximum granularity.",
            Self::Great => "Most rows are unique: great granularity.",
            Self::Reasonable => "Reasonable granularity.",
            Self::Low => "Low granularity.",
        }
    }
}

impl fmt::Display for GranularityQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Maximum => "maximum",
            Self::Great => "great",
            Self::Reasonable => "reasonable",
            Self::Low => "low",
        };
        f.write_str(name)
    }
}

/// Counters describing how much of the subset lattice was visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Subsets whose distinct count was computed.
    pub subsets_evaluated: u64,
    /// Subsets whose grouping failed.
    pub subsets_failed: u64,
    /// Subsets decided from their parents without grouping.
    pub subsets_skipped: u64,
}

/// Everything a search run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Ranked candidates, best first.
    pub candidates: Vec<GranularityCandidate>,
    pub classification: ColumnClassification,
    /// Requested columns dropped because they carry a role.
    pub ignored_columns: Vec<String>,
    /// Requested names that are not columns of the table.
    pub unknown_columns: Vec<String>,
    /// Columns the search enumerated, in caller order.
    pub searched_columns: Vec<String>,
    pub row_count: usize,
    pub stats: SearchStats,
    /// Some usable columns were left out by `max_columns`.
    pub truncated: bool,
    /// The subset or time budget ran out; candidates are the best found so far.
    pub budget_exhausted: bool,
}

impl SearchOutcome {
    pub(crate) fn empty(
        classification: ColumnClassification,
        ignored_columns: Vec<String>,
        unknown_columns: Vec<String>,
        row_count: usize,
    ) -> Self {
        Self {
            candidates: Vec::new(),
            classification,
            ignored_columns,
            unknown_columns,
            searched_columns: Vec::new(),
            row_count,
            stats: SearchStats::default(),
            truncated: false,
            budget_exhausted: false,
        }
    }

    pub fn best(&self) -> Option<&GranularityCandidate> {
        self.candidates.first()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bands() {
        assert_eq!(GranularityQuality::from_counts(10, 10), GranularityQuality::Maximum);
        assert_eq!(GranularityQuality::from_counts(95, 100), GranularityQuality::Great);
        assert_eq!(GranularityQuality::from_counts(90, 100), GranularityQuality::Reasonable);
        assert_eq!(GranularityQuality::from_counts(51, 100), GranularityQuality::Reasonable);
        assert_eq!(GranularityQuality::from_counts(50, 100), GranularityQuality::Low);
        assert_eq!(GranularityQuality::from_counts(0, 0), GranularityQuality::Maximum);
    }

    #[test]
    fn test_candidate_helpers() {
        let candidate = GranularityCandidate {
            columns: vec!["sku".to_string(), "store".to_string()],
            distinct_count: 3,
            row_count: 4,
        };
        assert_eq!(candidate.coverage(), 0.75);
        assert_eq!(candidate.quality(), GranularityQuality::Reasonable);
        assert!(!candidate.is_unique_key());
        assert_eq!(candidate.quality().to_string(), "reasonable");
    }
}
