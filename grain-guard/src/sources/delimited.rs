//! Delimited text (CSV, TSV) reading.
//!
//! Every cell is first read as nullable text so the header row can be chosen
//! after the fact; column types are inferred once the data rows are known.

use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::{debug, instrument};

use super::LoadOptions;
use crate::error::{GrainError, Result};
use crate::table::ArrowTable;

/// Rows shown by a preview when the caller does not choose.
pub const DEFAULT_PREVIEW_ROWS: usize = 15;

/// Reads a delimited file into a table.
///
/// Row `options.header_row` supplies the column labels and the rows after it
/// are data. Empty labels become `Unnamed: i` and repeated labels get `.1`,
/// `.2`... suffixes. When every label is a plain number the file is taken to
/// have no header at all: every row, from the first, is data and the columns
/// are named `Column1..ColumnN`.
///
/// Columns whose non-null values all parse as integers become `Int64`, as
/// floats `Float64`; the rest stay text. Empty cells are null.
///
/// # Examples
///
/// ```rust
/// use grain_guard::sources::{read_delimited, LoadOptions};
/// use grain_guard::table::Table;
///
/// let data = "report,,\nsku,store,qty\nA,1,3\nB,2,5\n";
/// let table = read_delimited(data.as_bytes(), &LoadOptions::default().with_header_row(1)).unwrap();
///
/// assert_eq!(table.column_names(), vec!["sku", "store", "qty"]);
/// assert_eq!(table.row_count(), 2);
/// ```
#[instrument(skip(reader, options), fields(header_row = options.header_row))]
pub fn read_delimited<R: Read>(mut reader: R, options: &LoadOptions) -> Result<ArrowTable> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let raw = read_raw(&data, options)?;
    let num_rows = raw.num_rows();
    if raw.num_columns() == 0 || num_rows == 0 {
        return Err(GrainError::data_source("delimited", "File contains no rows"));
    }

    let header_row = options.header_row;
    if header_row >= num_rows {
        return Err(GrainError::Configuration(format!(
            "Header row {header_row} is past the end of the file ({num_rows} rows)"
        )));
    }

    let labels: Vec<Option<&str>> = raw
        .columns()
        .iter()
        .map(|column| {
            let values = column.as_string::<i32>();
            (!values.is_null(header_row)).then(|| values.value(header_row))
        })
        .collect();

    let (names, rows) = if labels.iter().all(|label| label.is_some_and(is_numeric_label)) {
        debug!("Header row holds only numbers, treating every row as data");
        (synthetic_names(raw.num_columns()), raw.clone())
    } else {
        let start = header_row + 1;
        (header_names(&labels), raw.slice(start, num_rows - start))
    };

    let columns: Vec<ArrayRef> = rows
        .columns()
        .iter()
        .map(|column| infer_column(column.as_string::<i32>()))
        .collect();

    debug!(
        columns = names.len(),
        rows = rows.num_rows(),
        "Read delimited table"
    );
    ArrowTable::try_from_iter(names.into_iter().zip(columns))
}

/// Reads the first `nrows` raw rows as text, with no header and columns named
/// `Column1..ColumnN`. Used to pick the header row before loading.
#[instrument(skip(reader, options))]
pub fn preview_delimited<R: Read>(
    mut reader: R,
    options: &LoadOptions,
    nrows: usize,
) -> Result<ArrowTable> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let raw = read_raw(&data, options)?;
    if raw.num_columns() == 0 {
        return ArrowTable::new(raw);
    }

    let head = raw.slice(0, nrows.min(raw.num_rows()));
    let names = synthetic_names(head.num_columns());
    ArrowTable::try_from_iter(names.into_iter().zip(head.columns().iter().cloned()))
}

/// Every row of the input as nullable `Utf8` columns.
///
/// Rows may have any number of fields; the batch is as wide as the widest
/// row and shorter rows are padded with nulls. Blank lines are skipped.
fn read_raw(data: &[u8], options: &LoadOptions) -> Result<RecordBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter_or_default())
        .quote(options.quote)
        .from_reader(data);

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            GrainError::data_source_with_source("delimited", "Malformed delimited input", Box::new(e))
        })?;
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);

    let fields: Vec<Field> = (0..width)
        .map(|idx| Field::new(format!("c{idx}"), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    if width == 0 {
        return Ok(RecordBatch::new_empty(schema));
    }

    let columns: Vec<ArrayRef> = (0..width)
        .map(|idx| {
            let cells: StringArray = rows
                .iter()
                .map(|row| row.get(idx).filter(|cell| !cell.is_empty()))
                .collect();
            Arc::new(cells) as ArrayRef
        })
        .collect();

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn is_numeric_label(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_digit())
}

fn synthetic_names(count: usize) -> Vec<String> {
    (1..=count).map(|idx| format!("Column{idx}")).collect()
}

fn header_names(labels: &[Option<&str>]) -> Vec<String> {
    let mut used = HashSet::new();
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let base = match label {
                Some(label) if !label.is_empty() => (*label).to_string(),
                _ => format!("Unnamed: {idx}"),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while used.contains(&name) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

fn infer_column(values: &StringArray) -> ArrayRef {
    if values.null_count() == values.len() {
        return Arc::new(values.clone());
    }

    let present = || values.iter().flatten().map(str::trim);
    if present().all(|value| value.parse::<i64>().is_ok()) {
        let parsed: Int64Array = values
            .iter()
            .map(|value| value.and_then(|v| v.trim().parse::<i64>().ok()))
            .collect();
        return Arc::new(parsed);
    }
    if present().all(|value| value.parse::<f64>().is_ok()) {
        let parsed: Float64Array = values
            .iter()
            .map(|value| value.and_then(|v| v.trim().parse::<f64>().ok()))
            .collect();
        return Arc::new(parsed);
    }

    Arc::new(values.clone())
}
