//! Normalizing an arbitrary batch (a freshly-read part or compacted file)
//! to the canonical column set, order, and types: missing columns become
//! nulls, extra columns are dropped, mismatched types are cast. Every
//! writer in this pipeline already emits canonical batches -- this exists
//! so the reader and compactor tolerate a hand-edited or older-format
//! file without crashing the whole query.

use std::sync::Arc;

use arrow::array::new_null_array;
use arrow::compute::cast;
use arrow::record_batch::RecordBatch;
use heartbeat_core::schema::canonical_schema_arc;

use crate::error::StorageError;

pub fn normalize_to_canonical(batch: &RecordBatch) -> Result<RecordBatch, StorageError> {
    let schema = canonical_schema_arc();
    let num_rows = batch.num_rows();
    let mut columns = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let column = match batch.column_by_name(field.name()) {
            Some(array) if array.data_type() == field.data_type() => Arc::clone(array),
            Some(array) => cast(array, field.data_type())?,
            None => new_null_array(field.data_type(), num_rows),
        };
        columns.push(column);
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}
