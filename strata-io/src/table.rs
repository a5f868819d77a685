use std::sync::Arc;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use rustc_hash::FxHashSet;
use strata_result::{Error, Result};

/// Columnar exchange container: a schema plus zero or more record batches.
///
/// Every codec reads into and writes out of a `Table`; batches are kept as
/// produced so large datasets never have to be concatenated just to pass
/// through. Consumers that need a single batch call [`Table::to_batch`].
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// An empty table with the given schema.
    pub fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    /// A table over pre-built batches. All batches must share `schema`.
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// A table over a non-empty batch list, borrowing the first batch's
    /// schema.
    pub fn try_from_batches(batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches.first().map(RecordBatch::schema).ok_or_else(|| {
            Error::invalid_argument("cannot build a table from zero batches without a schema")
        })?;
        Ok(Self { schema, batches })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Concatenate all batches into one.
    pub fn to_batch(&self) -> Result<RecordBatch> {
        Ok(compute::concat_batches(&self.schema, &self.batches)?)
    }

    /// Project to the named columns, in the requested order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|name| self.schema.index_of(name.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let schema = Arc::new(self.schema.project(&indices)?);
        let batches = self
            .batches
            .iter()
            .map(|batch| batch.project(&indices))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Table { schema, batches })
    }

    /// Drop duplicate rows, keeping the first occurrence of each.
    ///
    /// Rows are compared by their rendered cell values, which keeps the
    /// comparison type-agnostic; the surviving rows are gathered with the
    /// `take` kernel so column types pass through unchanged.
    pub fn distinct(&self) -> Result<Table> {
        let batch = self.to_batch()?;
        let mut seen = FxHashSet::default();
        let mut keep: Vec<u32> = Vec::new();
        for row in 0..batch.num_rows() {
            let mut key = String::new();
            for column in batch.columns() {
                key.push_str(&array_value_to_string(column, row)?);
                key.push('\u{1f}');
            }
            if seen.insert(key) {
                keep.push(row as u32);
            }
        }
        let indices = UInt32Array::from(keep);
        let columns = batch
            .columns()
            .iter()
            .map(|column| compute::take(column, &indices, None))
            .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;
        let deduped = RecordBatch::try_new(self.schema.clone(), columns)?;
        Ok(Table {
            schema: self.schema.clone(),
            batches: vec![deduped],
        })
    }
}
