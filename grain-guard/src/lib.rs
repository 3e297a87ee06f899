//! # grain-guard - Granularity analysis for tabular data
//!
//! grain-guard answers one question about a dataset: which combination of
//! columns best identifies a row? It tags columns that must never be part of
//! a key (dates, metrics, columns that already encode a composite key), then
//! searches the remaining column combinations for the ones that split the
//! rows most finely with the fewest columns.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int64Array, StringArray};
//! use grain_guard::prelude::*;
//!
//! let table = ArrowTable::try_from_iter(vec![
//!     ("Product", Arc::new(StringArray::from(vec!["A", "A", "B", "B"])) as ArrayRef),
//!     ("Store", Arc::new(StringArray::from(vec!["X", "Y", "X", "Y"])) as ArrayRef),
//!     ("Price", Arc::new(Int64Array::from(vec![10, 20, 30, 40])) as ArrayRef),
//! ])
//! .unwrap();
//!
//! let outcome = GranularitySearch::new().run(&table, &table.column_names());
//!
//! let best = outcome.best().unwrap();
//! assert_eq!(best.columns, vec!["Product", "Store"]);
//! assert_eq!(best.quality(), GranularityQuality::Maximum);
//! assert_eq!(outcome.ignored_columns, vec!["Price"]);
//! ```
//!
//! ## Loading Data
//!
//! ```rust,no_run
//! use grain_guard::prelude::*;
//! use grain_guard::sources::load_table;
//!
//! # async fn example() -> grain_guard::error::Result<()> {
//! // Labels on the third line of the file
//! let table = load_table("sales.csv", &LoadOptions::default().with_header_row(2)).await?;
//! let candidates = evaluate_granularities(&table, &table.column_names(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Search Cost
//!
//! The number of column combinations grows as `2^n`. The search skips
//! combinations whose outcome is already decided by a smaller one, and
//! [`SearchConfig`](search::SearchConfig) caps the number of columns, the
//! number of groupings and the wall-clock time. A capped run returns the best
//! candidates found so far and says so in its
//! [`SearchOutcome`](search::SearchOutcome).
//!
//! ## Architecture
//!
//! - **`table`**: the [`Table`](table::Table) trait and its Arrow implementation
//! - **`classify`**: date, metric and aggregated-key heuristics
//! - **`search`**: subset enumeration, ranking and the dominance filter
//! - **`sources`**: CSV/TSV, Parquet and JSON loading
//! - **`formatters`**: human, JSON and Markdown output
//! - **`logging`**: `tracing` configuration

pub mod classify;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod search;
pub mod sources;
pub mod table;
