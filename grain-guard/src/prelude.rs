//! Prelude for commonly used types and traits in grain-guard.

pub use crate::classify::{ClassifierVocabulary, ColumnClassification, ColumnClassifier, ColumnRole};
pub use crate::error::{ErrorContext, GrainError, Result};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
pub use crate::search::{
    evaluate_granularities, GranularityCandidate, GranularityQuality, GranularitySearch,
    SearchConfig, SearchOutcome,
};
pub use crate::sources::LoadOptions;
pub use crate::table::{ArrowTable, Table};
