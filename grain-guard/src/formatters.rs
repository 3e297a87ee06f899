//! Rendering of search outcomes and table summaries.
//!
//! Three formatters share the [`ResultFormatter`] trait: plain console text,
//! JSON for tooling, and Markdown for reports.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, StringArray};
//! use grain_guard::formatters::{HumanFormatter, ResultFormatter};
//! use grain_guard::search::GranularitySearch;
//! use grain_guard::table::ArrowTable;
//!
//! let table = ArrowTable::try_from_iter(vec![
//!     ("Product", Arc::new(StringArray::from(vec!["A", "B"])) as ArrayRef),
//! ])
//! .unwrap();
//! let outcome = GranularitySearch::new().run(&table, &["Product"]);
//!
//! let output = HumanFormatter::new().format(&outcome).unwrap();
//! assert!(output.contains("Option 1: Product"));
//! ```

use std::fmt::Write;

use serde::Serialize;

use crate::classify::ColumnClassification;
use crate::error::{GrainError, Result};
use crate::search::{GranularityCandidate, GranularityQuality, SearchOutcome, SearchStats};
use crate::table::TableSummary;

/// Shown when no candidate could be formed.
pub const NO_CANDIDATES_MESSAGE: &str = "Could not calculate granularities.";

/// Above this many columns a summary lists columns grouped by kind.
pub const COMPACT_SUMMARY_THRESHOLD: usize = 25;

/// Configuration options for formatting search outcomes.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// List the columns excluded by role
    pub include_classification: bool,
    /// Include subset counters and truncation notices
    pub include_stats: bool,
    /// Maximum number of candidates to display (`None` for all)
    pub max_candidates: Option<usize>,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_classification: true,
            include_stats: true,
            max_candidates: None,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Candidates only.
    pub fn minimal() -> Self {
        Self {
            include_classification: false,
            include_stats: false,
            max_candidates: None,
            use_colors: false,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_classification: true,
            include_stats: true,
            max_candidates: Some(10),
            use_colors: false,
        }
    }

    pub fn with_classification(mut self, include: bool) -> Self {
        self.include_classification = include;
        self
    }

    pub fn with_stats(mut self, include: bool) -> Self {
        self.include_stats = include;
        self
    }

    pub fn with_max_candidates(mut self, max: Option<usize>) -> Self {
        self.max_candidates = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn visible<'a>(&self, candidates: &'a [GranularityCandidate]) -> &'a [GranularityCandidate] {
        match self.max_candidates {
            Some(max) => &candidates[..max.min(candidates.len())],
            None => candidates,
        }
    }
}

/// Formats a [`SearchOutcome`] into a string.
pub trait ResultFormatter {
    fn format(&self, outcome: &SearchOutcome) -> Result<String>;

    /// Formats with an explicit configuration; the default ignores it.
    fn format_with_config(&self, outcome: &SearchOutcome, _config: &FormatterConfig) -> Result<String> {
        self.format(outcome)
    }
}

fn render_error(e: std::fmt::Error) -> GrainError {
    GrainError::Internal(format!("Failed to render output: {e}"))
}

fn join_columns(columns: &[String]) -> String {
    columns.join(" + ")
}

/// Formats outcomes as JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonCandidate<'a> {
    columns: &'a [String],
    distinct_count: usize,
    row_count: usize,
    coverage: f64,
    quality: GranularityQuality,
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    row_count: usize,
    candidates: Vec<JsonCandidate<'a>>,
    searched_columns: &'a [String],
    ignored_columns: &'a [String],
    unknown_columns: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<&'a ColumnClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a SearchStats>,
    truncated: bool,
    budget_exhausted: bool,
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, outcome: &SearchOutcome) -> Result<String> {
        self.format_with_config(outcome, &self.config)
    }

    fn format_with_config(&self, outcome: &SearchOutcome, config: &FormatterConfig) -> Result<String> {
        let report = JsonOutcome {
            row_count: outcome.row_count,
            candidates: config
                .visible(&outcome.candidates)
                .iter()
                .map(|candidate| JsonCandidate {
                    columns: &candidate.columns,
                    distinct_count: candidate.distinct_count,
                    row_count: candidate.row_count,
                    coverage: candidate.coverage(),
                    quality: candidate.quality(),
                })
                .collect(),
            searched_columns: &outcome.searched_columns,
            ignored_columns: &outcome.ignored_columns,
            unknown_columns: &outcome.unknown_columns,
            classification: config
                .include_classification
                .then_some(&outcome.classification),
            stats: config.include_stats.then_some(&outcome.stats),
            truncated: outcome.truncated,
            budget_exhausted: outcome.budget_exhausted,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }
}

/// Formats outcomes for a terminal.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// Renders row and column counts, then the columns with their kinds.
    ///
    /// Wide tables list column names grouped by kind instead.
    pub fn format_summary(&self, summary: &TableSummary) -> Result<String> {
        let mut output = String::new();
        write_summary(&mut output, summary).map_err(render_error)?;
        Ok(output)
    }

    fn paint(&self, config: &FormatterConfig, quality: GranularityQuality, text: &str) -> String {
        if !config.use_colors {
            return text.to_string();
        }
        let color = match quality {
            GranularityQuality::Maximum => "32",
            GranularityQuality::Great => "34",
            GranularityQuality::Reasonable => "33",
            GranularityQuality::Low => "31",
        };
        format!("\x1b[{color}m{text}\x1b[0m")
    }

    fn render(
        &self,
        output: &mut String,
        outcome: &SearchOutcome,
        config: &FormatterConfig,
    ) -> std::fmt::Result {
        writeln!(output)?;

        if config.include_classification && !outcome.ignored_columns.is_empty() {
            writeln!(
                output,
                "ℹ️  These columns seem to be dates, metrics or already aggregated keys and will not be used as key:"
            )?;
            for column in &outcome.ignored_columns {
                let roles: Vec<String> = outcome
                    .classification
                    .roles_of(column)
                    .iter()
                    .map(|role| format!("{role:?}").to_lowercase())
                    .collect();
                writeln!(output, "   - {column} ({})", roles.join(", "))?;
            }
            writeln!(output)?;
        }

        if !outcome.unknown_columns.is_empty() {
            writeln!(
                output,
                "⚠️  Not columns of this table: {}",
                outcome.unknown_columns.join(", ")
            )?;
            writeln!(output)?;
        }

        if outcome.candidates.is_empty() {
            writeln!(output, "{NO_CANDIDATES_MESSAGE}")?;
        } else {
            writeln!(output, "Granularity analysis result:")?;
            let visible = config.visible(&outcome.candidates);
            for (i, candidate) in visible.iter().enumerate() {
                let marker = if i == 0 { "✅" } else { "🔍" };
                writeln!(output)?;
                writeln!(
                    output,
                    "{marker} Option {}: {}",
                    i + 1,
                    join_columns(&candidate.columns)
                )?;
                writeln!(
                    output,
                    "   • {} unique combinations in {} rows.",
                    candidate.distinct_count, candidate.row_count
                )?;
                let quality = candidate.quality();
                writeln!(output, "   {}", self.paint(config, quality, quality.message()))?;
            }

            if outcome.candidates.len() > visible.len() {
                writeln!(output)?;
                writeln!(
                    output,
                    "   ... and {} more options",
                    outcome.candidates.len() - visible.len()
                )?;
            }
        }

        if config.include_stats && !outcome.searched_columns.is_empty() {
            let stats = &outcome.stats;
            writeln!(output)?;
            writeln!(
                output,
                "Searched {} columns: {} subsets grouped, {} skipped, {} failed.",
                outcome.searched_columns.len(),
                stats.subsets_evaluated,
                stats.subsets_skipped,
                stats.subsets_failed
            )?;
            if outcome.truncated {
                writeln!(
                    output,
                    "⚠️  Only the first {} usable columns were searched.",
                    outcome.searched_columns.len()
                )?;
            }
            if outcome.budget_exhausted {
                writeln!(
                    output,
                    "⚠️  Search budget exhausted; showing the best options found so far."
                )?;
            }
        }

        Ok(())
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, outcome: &SearchOutcome) -> Result<String> {
        self.format_with_config(outcome, &self.config)
    }

    fn format_with_config(&self, outcome: &SearchOutcome, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, outcome, config)
            .map_err(render_error)?;
        Ok(output)
    }
}

fn write_summary(output: &mut String, summary: &TableSummary) -> std::fmt::Result {
    writeln!(output, "Number of rows: {}", summary.row_count)?;
    writeln!(output, "Number of columns: {}", summary.column_count())?;
    writeln!(output, "Columns:")?;

    if summary.column_count() > COMPACT_SUMMARY_THRESHOLD {
        for (kind, columns) in summary.columns_by_kind() {
            writeln!(output, "  {kind} columns ({}):", columns.len())?;
            for column in columns {
                writeln!(output, "    - {column}")?;
            }
        }
    } else {
        for column in &summary.columns {
            writeln!(output, "  - {} ({})", column.name, column.kind.name())?;
        }
    }
    Ok(())
}

/// Formats outcomes as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(
        &self,
        output: &mut String,
        outcome: &SearchOutcome,
        config: &FormatterConfig,
    ) -> std::fmt::Result {
        let h = "#".repeat(self.heading_level as usize);

        writeln!(output, "{h} Granularity Report")?;
        writeln!(output)?;
        writeln!(output, "**Rows:** {}", outcome.row_count)?;
        writeln!(output)?;

        if outcome.candidates.is_empty() {
            writeln!(output, "> {NO_CANDIDATES_MESSAGE}")?;
        } else {
            writeln!(output, "| Option | Columns | Unique combinations | Coverage | Quality |")?;
            writeln!(output, "|--------|---------|---------------------|----------|---------|")?;
            for (i, candidate) in config.visible(&outcome.candidates).iter().enumerate() {
                writeln!(
                    output,
                    "| {} | {} | {} | {:.1}% | {} |",
                    i + 1,
                    join_columns(&candidate.columns),
                    candidate.distinct_count,
                    candidate.coverage() * 100.0,
                    candidate.quality()
                )?;
            }
        }

        if config.include_classification && !outcome.ignored_columns.is_empty() {
            writeln!(output)?;
            writeln!(output, "{h}# Excluded Columns")?;
            writeln!(output)?;
            for column in &outcome.ignored_columns {
                let roles: Vec<String> = outcome
                    .classification
                    .roles_of(column)
                    .iter()
                    .map(|role| format!("{role:?}"))
                    .collect();
                writeln!(output, "- `{column}`: {}", roles.join(", "))?;
            }
        }

        if config.include_stats && !outcome.searched_columns.is_empty() {
            writeln!(output)?;
            writeln!(output, "{h}# Search")?;
            writeln!(output)?;
            writeln!(output, "| Metric | Value |")?;
            writeln!(output, "|--------|-------|")?;
            writeln!(output, "| Columns searched | {} |", outcome.searched_columns.len())?;
            writeln!(output, "| Subsets grouped | {} |", outcome.stats.subsets_evaluated)?;
            writeln!(output, "| Subsets skipped | {} |", outcome.stats.subsets_skipped)?;
            writeln!(output, "| Subsets failed | {} |", outcome.stats.subsets_failed)?;
            if outcome.truncated || outcome.budget_exhausted {
                writeln!(output)?;
                writeln!(
                    output,
                    "> **Note:** the search was limited; results may not cover every column combination."
                )?;
            }
        }

        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for MarkdownFormatter {
    fn format(&self, outcome: &SearchOutcome) -> Result<String> {
        self.format_with_config(outcome, &self.config)
    }

    fn format_with_config(&self, outcome: &SearchOutcome, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, outcome, config)
            .map_err(render_error)?;
        Ok(output)
    }
}
