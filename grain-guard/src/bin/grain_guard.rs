//! grain-guard command line
//!
//! Loads a file, excludes date/metric/aggregated-key columns and prints the
//! column combinations that best identify a row.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use datafusion::arrow::util::pretty::pretty_format_batches;
use grain_guard::classify::{ClassifierVocabulary, ColumnClassifier};
use grain_guard::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ResultFormatter,
};
use grain_guard::log_data_op;
use grain_guard::logging::setup::{init_logging, LoggingConfig};
use grain_guard::logging::LogConfig;
use grain_guard::search::{GranularitySearch, SearchConfig};
use grain_guard::sources::{load_table, preview_file, LoadOptions};
use grain_guard::table::{Table, TableSummary};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to analyse (.csv, .tsv, .txt, .parquet, .json)
    file: PathBuf,

    /// Zero-based row holding the column labels
    #[arg(long, default_value_t = 0)]
    header_row: usize,

    /// Candidate columns, comma separated (default: every column)
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Number of options to report
    #[arg(long, default_value_t = 2)]
    top_k: usize,

    /// Search at most this many usable columns
    #[arg(long)]
    max_columns: Option<usize>,

    /// Stop after grouping this many column combinations
    #[arg(long)]
    max_subsets: Option<u64>,

    /// Stop the search after this many seconds
    #[arg(long)]
    time_budget: Option<u64>,

    /// JSON file replacing the built-in keyword lists
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Print the first rows of the file without a header, then exit
    #[arg(long, num_args = 0..=1, default_missing_value = "15")]
    preview: Option<usize>,

    /// Print row, column and type counts before the result
    #[arg(long)]
    summary: bool,

    #[arg(long)]
    no_color: bool,

    /// Debug logging, including every grouped combination
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON on stderr
    #[arg(long)]
    log_json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };
    init_logging(logging.with_json_format(args.log_json))
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;
    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let options = LoadOptions::default().with_header_row(args.header_row);

    if let Some(nrows) = args.preview {
        let preview = preview_file(&args.file, &options, nrows)
            .await
            .with_context(|| format!("failed to preview {}", args.file.display()))?;
        println!("{}", pretty_format_batches(&[preview.into_inner()])?);
        return Ok(());
    }

    let table = load_table(&args.file, &options)
        .await
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    log_data_op!(
        log_config,
        rows = table.row_count(),
        columns = table.column_names().len(),
        "Table ready for analysis"
    );

    let mut config = SearchConfig::default()
        .with_top_k(args.top_k)
        .with_max_subsets(args.max_subsets)
        .with_time_budget(args.time_budget.map(Duration::from_secs));
    if let Some(max_columns) = args.max_columns {
        config = config.with_max_columns(max_columns);
    }

    let mut search = GranularitySearch::with_config(config).with_log_config(log_config);
    if let Some(path) = &args.vocabulary {
        let vocabulary = ClassifierVocabulary::from_path(path)
            .with_context(|| format!("failed to read vocabulary {}", path.display()))?;
        search = search.with_classifier(ColumnClassifier::with_vocabulary(vocabulary)?);
    }

    let candidates: Vec<String> = match &args.columns {
        Some(columns) => columns.iter().map(|c| c.trim().to_string()).collect(),
        None => table.column_names().into_iter().map(String::from).collect(),
    };
    let outcome = search.run(&table, &candidates);

    let formatter_config =
        FormatterConfig::default().with_colors(!args.no_color && std::io::stdout().is_terminal());
    let output = match args.format {
        OutputFormat::Human => {
            let formatter = HumanFormatter::with_config(formatter_config);
            let mut text = String::new();
            if args.summary {
                text.push_str(&formatter.format_summary(&TableSummary::from_table(&table))?);
            }
            text.push_str(&formatter.format(&outcome)?);
            text
        }
        OutputFormat::Json => JsonFormatter::with_config(formatter_config).format(&outcome)?,
        OutputFormat::Markdown => {
            MarkdownFormatter::with_config(formatter_config).format(&outcome)?
        }
    };

    println!("{output}");
    Ok(())
}
