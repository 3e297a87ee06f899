//! Error types for grain-guard.
//!
//! Errors only surface at the loading boundary and from the `Table` capability
//! methods. The classification and search operations never return them: a
//! failing column or subset is logged and skipped.

use thiserror::Error;

/// The main error type for grain-guard.
#[derive(Error, Debug)]
pub enum GrainError {
    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "Parquet")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON (de)serialization, e.g. vocabulary files.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error when a required column is not found in the table.
    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// Error when a set of columns cannot be grouped.
    #[error("Cannot group by [{columns}]: {message}")]
    Grouping { columns: String, message: String },

    /// Error when an operation or format is not supported.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, GrainError>`.
pub type Result<T> = std::result::Result<T, GrainError>;

impl GrainError {
    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a grouping error for the given columns.
    pub fn grouping(columns: &[&str], message: impl Into<String>) -> Self {
        Self::Grouping {
            columns: columns.join(", "),
            message: message.into(),
        }
    }

    /// Creates a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported(message.into())
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<GrainError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            GrainError::Internal(inner) => GrainError::Internal(format!("{msg}: {inner}")),
            other => GrainError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                GrainError::Internal(inner) => GrainError::Internal(format!("{msg}: {inner}")),
                other => GrainError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_data_source_error() {
        let err = GrainError::data_source("CSV", "Header row 12 is past the end of the file");
        assert_eq!(
            err.to_string(),
            "Data source error: Header row 12 is past the end of the file"
        );
    }

    #[test]
    fn test_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = GrainError::data_source_with_source("CSV", "Could not open", Box::new(source));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_grouping_error() {
        let err = GrainError::grouping(&["region", "store"], "unsupported type");
        assert_eq!(
            err.to_string(),
            "Cannot group by [region, store]: unsupported type"
        );
    }

    #[test]
    fn test_column_not_found() {
        let err = GrainError::column_not_found("sku");
        assert_eq!(err.to_string(), "Column 'sku' not found in table");
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(GrainError::Internal("boom".to_string()))
        }

        let err = failing_operation()
            .context("While loading sales.csv")
            .unwrap_err();
        assert_eq!(err.to_string(), "Internal error: While loading sales.csv: boom");
    }
}
