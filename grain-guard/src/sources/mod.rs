//! Loading tables from files.
//!
//! Delimited text is parsed directly with `csv` so the header row can
//! be chosen by the caller. Parquet and newline-delimited JSON go through a
//! DataFusion session. Spreadsheets are recognized but rejected.

use std::path::Path;

use datafusion::prelude::{NdJsonReadOptions, ParquetReadOptions, SessionContext};
use tracing::{debug, info, instrument};

use crate::error::{GrainError, Result};
use crate::table::ArrowTable;

mod delimited;

pub use delimited::{preview_delimited, read_delimited, DEFAULT_PREVIEW_ROWS};

const TABLE_NAME: &str = "data";

/// File formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// CSV, TSV and plain text with the given field delimiter
    Delimited { delimiter: u8 },
    /// Apache Parquet
    Parquet,
    /// Newline-delimited JSON
    Json,
    /// Excel or OpenDocument workbooks
    Spreadsheet,
}

impl SourceFormat {
    /// Detects the format from the file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                GrainError::not_supported(format!("'{}' has no file extension", path.display()))
            })?;

        match extension.as_str() {
            "csv" | "txt" => Ok(Self::Delimited { delimiter: b',' }),
            "tsv" => Ok(Self::Delimited { delimiter: b'\t' }),
            "parquet" => Ok(Self::Parquet),
            "json" | "ndjson" | "jsonl" => Ok(Self::Json),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            other => Err(GrainError::not_supported(format!(
                "Unsupported file extension '.{other}'"
            ))),
        }
    }

    /// Returns the format name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delimited { .. } => "delimited",
            Self::Parquet => "parquet",
            Self::Json => "json",
            Self::Spreadsheet => "spreadsheet",
        }
    }
}

/// Options for loading a table.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Zero-based row holding the column labels (delimited input only)
    pub header_row: usize,
    /// Field delimiter; `None` picks one from the file extension
    pub delimiter: Option<u8>,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Drop all-null columns, then all-null rows, after loading
    pub prune_empty: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header_row: 0,
            delimiter: None,
            quote: b'"',
            prune_empty: true,
        }
    }
}

impl LoadOptions {
    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_prune_empty(mut self, prune_empty: bool) -> Self {
        self.prune_empty = prune_empty;
        self
    }

    pub(crate) fn delimiter_or_default(&self) -> u8 {
        self.delimiter.unwrap_or(b',')
    }

    fn for_format(&self, format: SourceFormat) -> Self {
        let mut options = self.clone();
        if let SourceFormat::Delimited { delimiter } = format {
            options.delimiter = options.delimiter.or(Some(delimiter));
        }
        options
    }
}

/// Loads a whole file into memory as a table.
///
/// # Examples
///
/// ```rust,no_run
/// use grain_guard::sources::{load_table, LoadOptions};
/// use grain_guard::table::Table;
///
/// # async fn example() -> grain_guard::error::Result<()> {
/// let table = load_table("sales.csv", &LoadOptions::default().with_header_row(2)).await?;
/// println!("{} rows", table.row_count());
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_table(path: impl AsRef<Path>, options: &LoadOptions) -> Result<ArrowTable> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;

    let table = match format {
        SourceFormat::Delimited { .. } => {
            let data = read_file(path, format).await?;
            read_delimited(data.as_slice(), &options.for_format(format))?
        }
        SourceFormat::Parquet | SourceFormat::Json => read_with_datafusion(path, format).await?,
        SourceFormat::Spreadsheet => {
            return Err(GrainError::not_supported(
                "Spreadsheet files cannot be read; export the sheet to CSV first",
            ))
        }
    };

    let table = if options.prune_empty {
        table.prune_empty()?
    } else {
        table
    };

    info!(format = format.name(), "Loaded table");
    Ok(table)
}

/// Reads the first `nrows` raw rows of a file, for choosing the header row.
///
/// Delimited files come back with every cell as text and columns named
/// `Column1..ColumnN`. Other formats have typed columns and their own names.
#[instrument(skip_all, fields(path = %path.as_ref().display(), nrows = nrows))]
pub async fn preview_file(
    path: impl AsRef<Path>,
    options: &LoadOptions,
    nrows: usize,
) -> Result<ArrowTable> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;

    match format {
        SourceFormat::Delimited { .. } => {
            let data = read_file(path, format).await?;
            preview_delimited(data.as_slice(), &options.for_format(format), nrows)
        }
        SourceFormat::Parquet | SourceFormat::Json => {
            let table = read_with_datafusion(path, format).await?;
            let batch = table.batch();
            ArrowTable::new(batch.slice(0, nrows.min(batch.num_rows())))
        }
        SourceFormat::Spreadsheet => Err(GrainError::not_supported(
            "Spreadsheet files cannot be read; export the sheet to CSV first",
        )),
    }
}

async fn read_file(path: &Path, format: SourceFormat) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        GrainError::data_source_with_source(
            format.name(),
            format!("Cannot read '{}'", path.display()),
            Box::new(e),
        )
    })
}

async fn read_with_datafusion(path: &Path, format: SourceFormat) -> Result<ArrowTable> {
    let location = path
        .to_str()
        .ok_or_else(|| GrainError::Configuration("Path contains invalid UTF-8".to_string()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let ctx = SessionContext::new();
    match format {
        SourceFormat::Parquet => {
            let options = ParquetReadOptions {
                file_extension: &extension,
                ..Default::default()
            };
            ctx.register_parquet(TABLE_NAME, location, options).await?;
        }
        SourceFormat::Json => {
            let options = NdJsonReadOptions {
                file_extension: &extension,
                ..Default::default()
            };
            ctx.register_json(TABLE_NAME, location, options).await?;
        }
        other => {
            return Err(GrainError::Internal(format!(
                "{} is not read through DataFusion",
                other.name()
            )))
        }
    }

    debug!(format = format.name(), "Registered file with DataFusion");
    ArrowTable::from_context(&ctx, TABLE_NAME).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            SourceFormat::from_path("sales.csv").unwrap(),
            SourceFormat::Delimited { delimiter: b',' }
        );
        assert_eq!(
            SourceFormat::from_path("sales.TSV").unwrap(),
            SourceFormat::Delimited { delimiter: b'\t' }
        );
        assert_eq!(
            SourceFormat::from_path("sales.parquet").unwrap(),
            SourceFormat::Parquet
        );
        assert_eq!(
            SourceFormat::from_path("sales.ndjson").unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            SourceFormat::from_path("sales.xlsx").unwrap(),
            SourceFormat::Spreadsheet
        );
    }

    #[test]
    fn test_unsupported_extensions() {
        assert!(matches!(
            SourceFormat::from_path("sales.pdf"),
            Err(GrainError::NotSupported(_))
        ));
        assert!(matches!(
            SourceFormat::from_path("sales"),
            Err(GrainError::NotSupported(_))
        ));
    }

    #[test]
    fn test_options_delimiter_follows_format() {
        let tsv = SourceFormat::Delimited { delimiter: b'\t' };
        assert_eq!(LoadOptions::default().for_format(tsv).delimiter, Some(b'\t'));
        assert_eq!(
            LoadOptions::default()
                .with_delimiter(b';')
                .for_format(tsv)
                .delimiter,
            Some(b';')
        );
    }

    #[tokio::test]
    async fn test_spreadsheets_are_rejected() {
        let err = load_table("book.xlsx", &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GrainError::NotSupported(_)));
    }
}
