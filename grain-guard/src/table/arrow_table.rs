//! Arrow-backed [`Table`] implementation.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::compute::kernels::boolean::{is_not_null, or};
use arrow::datatypes::{DataType, Float32Type, Float64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::row::{Row, RowConverter, SortField};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use datafusion::prelude::SessionContext;
use tracing::{debug, instrument};

use super::{ColumnKind, Table};
use crate::error::{GrainError, Result};

/// A fully materialized table held as a single Arrow `RecordBatch`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use arrow::array::{ArrayRef, StringArray};
/// use grain_guard::table::{ArrowTable, Table};
///
/// let table = ArrowTable::try_from_iter(vec![
///     ("Product", Arc::new(StringArray::from(vec!["A", "A", "B"])) as ArrayRef),
///     ("Store", Arc::new(StringArray::from(vec!["X", "Y", "X"])) as ArrayRef),
/// ])
/// .unwrap();
///
/// assert_eq!(table.row_count(), 3);
/// assert_eq!(table.distinct_count(&["Product"]).unwrap(), 2);
/// assert_eq!(table.distinct_count(&["Product", "Store"]).unwrap(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ArrowTable {
    batch: RecordBatch,
}

impl ArrowTable {
    /// Wraps a record batch, rejecting duplicate column names.
    pub fn new(batch: RecordBatch) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in batch.schema().fields() {
            if !seen.insert(field.name().clone()) {
                return Err(GrainError::Configuration(format!(
                    "Duplicate column name '{}'",
                    field.name()
                )));
            }
        }
        Ok(Self { batch })
    }

    /// Builds a table from `(name, array)` pairs.
    pub fn try_from_iter<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: AsRef<str>,
    {
        let batch = RecordBatch::try_from_iter(columns)?;
        Self::new(batch)
    }

    /// Concatenates batches sharing `schema` into one table.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = arrow::compute::concat_batches(&schema, batches)?;
        Self::new(batch)
    }

    /// Materializes a table registered in a DataFusion session.
    #[instrument(skip(ctx))]
    pub async fn from_context(ctx: &SessionContext, table_name: &str) -> Result<Self> {
        let df = ctx.table(table_name).await?;
        let declared: SchemaRef = df.schema().inner().clone();
        let batches = df.collect().await?;

        let schema = batches
            .first()
            .map(|batch| batch.schema())
            .unwrap_or(declared);

        debug!(
            table = table_name,
            batches = batches.len(),
            "Collected table from session context"
        );
        Self::from_batches(schema, &batches)
    }

    /// The underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consumes the table, returning the record batch.
    pub fn into_inner(self) -> RecordBatch {
        self.batch
    }

    /// Drops columns whose every value is null, then rows whose every value is null.
    ///
    /// An empty table is returned unchanged.
    pub fn prune_empty(&self) -> Result<Self> {
        let num_rows = self.batch.num_rows();
        if num_rows == 0 {
            return Ok(self.clone());
        }

        let keep: Vec<usize> = self
            .batch
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, array)| array.null_count() < num_rows)
            .map(|(idx, _)| idx)
            .collect();
        let projected = self.batch.project(&keep)?;

        let mut mask: Option<BooleanArray> = None;
        for array in projected.columns() {
            let present = is_not_null(array.as_ref())?;
            mask = Some(match mask {
                Some(acc) => or(&acc, &present)?,
                None => present,
            });
        }

        let pruned = match mask {
            Some(mask) => filter_record_batch(&projected, &mask)?,
            None => projected,
        };

        debug!(
            columns_before = self.batch.num_columns(),
            columns_after = pruned.num_columns(),
            rows_before = num_rows,
            rows_after = pruned.num_rows(),
            "Pruned empty rows and columns"
        );
        Ok(Self { batch: pruned })
    }

    fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| GrainError::column_not_found(name))
    }
}

impl TryFrom<RecordBatch> for ArrowTable {
    type Error = GrainError;

    fn try_from(batch: RecordBatch) -> Result<Self> {
        Self::new(batch)
    }
}

/// Maps `-0.0` to `0.0` and every NaN to one NaN, so they group together.
fn canonical_floats(array: &ArrayRef) -> ArrayRef {
    match array.data_type() {
        DataType::Float32 => Arc::new(array.as_primitive::<Float32Type>().unary::<_, Float32Type>(
            |v| if v.is_nan() { f32::NAN } else { v + 0.0 },
        )),
        DataType::Float64 => Arc::new(array.as_primitive::<Float64Type>().unary::<_, Float64Type>(
            |v| if v.is_nan() { f64::NAN } else { v + 0.0 },
        )),
        _ => Arc::clone(array),
    }
}

fn kind_of(data_type: &DataType) -> ColumnKind {
    match data_type {
        DataType::Boolean => ColumnKind::Numeric,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => ColumnKind::Temporal,
        DataType::Dictionary(_, value) => kind_of(value),
        other if other.is_numeric() => ColumnKind::Numeric,
        _ => ColumnKind::Text,
    }
}

impl Table for ArrowTable {
    fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| field.name().as_str())
            .collect()
    }

    fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    fn column_kind(&self, column: &str) -> Result<ColumnKind> {
        Ok(kind_of(self.column(column)?.data_type()))
    }

    fn text_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        let array = self.column(column)?;
        let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;

        Ok((0..array.len())
            .map(|idx| {
                if array.is_null(idx) {
                    None
                } else {
                    Some(formatter.value(idx).to_string())
                }
            })
            .collect())
    }

    fn distinct_count(&self, columns: &[&str]) -> Result<usize> {
        if columns.is_empty() {
            return Err(GrainError::grouping(columns, "no columns given"));
        }

        let arrays = columns
            .iter()
            .map(|name| self.column(name).map(canonical_floats))
            .collect::<Result<Vec<ArrayRef>>>()?;
        let fields = arrays
            .iter()
            .map(|array| SortField::new(array.data_type().clone()))
            .collect();

        let converter =
            RowConverter::new(fields).map_err(|e| GrainError::grouping(columns, e.to_string()))?;
        let rows = converter
            .convert_columns(&arrays)
            .map_err(|e| GrainError::grouping(columns, e.to_string()))?;

        let distinct: HashSet<Row<'_>> = rows.iter().collect();
        Ok(distinct.len())
    }
}
