//! The merge pass for one `(user_id, date)`: read the existing compacted
//! file plus a snapshot of current part files, resolve device-priority
//! ties at each exact timestamp, write a fresh compacted file, and
//! archive the parts that were folded in.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use heartbeat_core::priority_for;
use heartbeat_core::schema::{canonical_schema_arc, DEVICE_ID, HEART_RATE, TIMESTAMP_MS, USER_ID};
use heartbeat_storage::{atomic_write, normalize_to_canonical, read_parquet_file, StorageLayout};

use crate::error::CompactorError;

struct Row {
    timestamp_ms: i64,
    heart_rate: i64,
    device_id: String,
    user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub rows_written: usize,
    pub parts_archived: usize,
}

pub fn merge_parts(layout: &StorageLayout, user_id: &str, date_str: &str) -> Result<MergeOutcome, CompactorError> {
    let mut rows = Vec::new();

    let compacted_path = layout.compacted_path(user_id, date_str);
    if compacted_path.exists() {
        match read_and_normalize(&compacted_path) {
            Ok(batch) => rows.extend(extract_rows(&batch)),
            Err(e) => tracing::warn!(path = %compacted_path.display(), error = %e, "could not read existing compacted file"),
        }
    }

    let parts = layout.list_part_files(user_id, date_str)?;
    let mut readable_parts = Vec::new();
    for part in &parts {
        match read_and_normalize(part) {
            Ok(batch) => {
                rows.extend(extract_rows(&batch));
                readable_parts.push(part.clone());
            }
            Err(e) => tracing::warn!(path = %part.display(), error = %e, "skipping unreadable part"),
        }
    }

    if rows.is_empty() {
        return Ok(MergeOutcome::default());
    }

    // Sort by (timestamp_ms, priority) so the first row seen per exact
    // timestamp during the keep-first pass below is the highest-priority one.
    rows.sort_by_key(|r| (r.timestamp_ms, priority_for(&r.device_id)));

    let mut kept: HashMap<i64, Row> = HashMap::new();
    let mut order = Vec::new();
    for row in rows {
        if let std::collections::hash_map::Entry::Vacant(slot) = kept.entry(row.timestamp_ms) {
            order.push(row.timestamp_ms);
            slot.insert(row);
        }
    }
    let mut output: Vec<Row> = order.into_iter().map(|ts| kept.remove(&ts).unwrap()).collect();
    output.sort_by_key(|r| r.timestamp_ms);

    let rows_written = output.len();
    let batch = build_batch(&output)?;
    atomic_write(&batch, &compacted_path)?;

    let mut parts_archived = 0;
    for part in &readable_parts {
        match layout.archive_part(user_id, date_str, part) {
            Ok(_) => parts_archived += 1,
            Err(e) => tracing::error!(path = %part.display(), error = %e, "failed to archive consumed part"),
        }
    }

    Ok(MergeOutcome { rows_written, parts_archived })
}

fn read_and_normalize(path: &Path) -> Result<RecordBatch, CompactorError> {
    Ok(normalize_to_canonical(&read_parquet_file(path)?)?)
}

fn extract_rows(batch: &RecordBatch) -> Vec<Row> {
    let columns = (
        batch.column_by_name(TIMESTAMP_MS).and_then(|c| c.as_any().downcast_ref::<Int64Array>()),
        batch.column_by_name(HEART_RATE).and_then(|c| c.as_any().downcast_ref::<Int64Array>()),
        batch.column_by_name(DEVICE_ID).and_then(|c| c.as_any().downcast_ref::<StringArray>()),
        batch.column_by_name(USER_ID).and_then(|c| c.as_any().downcast_ref::<StringArray>()),
    );
    let (Some(timestamp_ms), Some(heart_rate), Some(device_id), Some(user_id)) = columns else {
        return Vec::new();
    };

    (0..batch.num_rows())
        .filter_map(|i| {
            if timestamp_ms.is_null(i) || heart_rate.is_null(i) || device_id.is_null(i) || user_id.is_null(i) {
                return None;
            }
            Some(Row {
                timestamp_ms: timestamp_ms.value(i),
                heart_rate: heart_rate.value(i),
                device_id: device_id.value(i).to_string(),
                user_id: user_id.value(i).to_string(),
            })
        })
        .collect()
}

fn build_batch(rows: &[Row]) -> Result<RecordBatch, CompactorError> {
    let schema = canonical_schema_arc();
    let timestamps: Vec<i64> = rows.iter().map(|r| r.timestamp_ms).collect();
    let heart_rates: Vec<i64> = rows.iter().map(|r| r.heart_rate).collect();
    let device_ids: Vec<&str> = rows.iter().map(|r| r.device_id.as_str()).collect();
    let user_ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(timestamps)),
            Arc::new(Int64Array::from(heart_rates)),
            Arc::new(StringArray::from(device_ids)),
            Arc::new(StringArray::from(user_ids)),
        ],
    )?)
}
