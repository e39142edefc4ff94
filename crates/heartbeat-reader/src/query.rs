//! Reads every compacted + part file relevant to a `(user, date range)`
//! query, normalizes them, and runs the aggregation pipeline.

use arrow::array::{Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use heartbeat_core::clock::epoch_ms_to_date_str;
use heartbeat_core::schema::{DEVICE_ID, HEART_RATE, TIMESTAMP_MS, USER_ID};
use heartbeat_storage::{normalize_to_canonical, read_parquet_file, StorageLayout};

use crate::error::ReaderError;
use crate::pipeline::{aggregate_by_minute, dedup_same_device_instant, filter_by_range, resolve_devices, to_output_rows, OutputRow, RawRow};

const DAY_MS: i64 = 86_400_000;

pub struct QueryParams<'a> {
    pub user_id: &'a str,
    pub start_ms: i64,
    pub end_ms: i64,
    pub device_id: Option<&'a str>,
}

pub fn query_heart_rate(layout: &StorageLayout, params: &QueryParams<'_>) -> Result<Vec<OutputRow>, ReaderError> {
    let mut rows = Vec::new();

    for date_str in dates_spanning(params.start_ms, params.end_ms) {
        let compacted = layout.compacted_path(params.user_id, &date_str);
        if compacted.exists() {
            append_rows_from(&compacted, &mut rows);
        }
        for part in layout.list_part_files(params.user_id, &date_str)? {
            append_rows_from(&part, &mut rows);
        }
    }

    let rows = filter_by_range(rows, params.start_ms, params.end_ms);
    let rows = dedup_same_device_instant(rows);
    let rows = resolve_devices(rows, params.device_id);
    let rows = aggregate_by_minute(rows);
    Ok(to_output_rows(rows))
}

/// Reads and normalizes one file, appending its rows. A file that fails
/// to read or normalize is logged and skipped -- one bad file does not
/// fail the whole query (spec §7).
fn append_rows_from(path: &std::path::Path, rows: &mut Vec<RawRow>) {
    let batch = match read_parquet_file(path).and_then(|b| normalize_to_canonical(&b)) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file during query");
            return;
        }
    };
    rows.extend(extract_rows(&batch));
}

fn extract_rows(batch: &RecordBatch) -> Vec<RawRow> {
    let columns = (
        batch.column_by_name(TIMESTAMP_MS).and_then(|c| c.as_any().downcast_ref::<Int64Array>()),
        batch.column_by_name(HEART_RATE).and_then(|c| c.as_any().downcast_ref::<Int64Array>()),
        batch.column_by_name(DEVICE_ID).and_then(|c| c.as_any().downcast_ref::<StringArray>()),
        batch.column_by_name(USER_ID).and_then(|c| c.as_any().downcast_ref::<StringArray>()),
    );
    let (Some(timestamp_ms), Some(heart_rate), Some(device_id), Some(user_id)) = columns else {
        tracing::warn!("batch missing a canonical column after normalization, skipping");
        return Vec::new();
    };

    (0..batch.num_rows())
        .filter_map(|i| {
            if timestamp_ms.is_null(i) || heart_rate.is_null(i) || device_id.is_null(i) || user_id.is_null(i) {
                return None;
            }
            Some(RawRow {
                timestamp_ms: timestamp_ms.value(i),
                heart_rate: heart_rate.value(i) as f64,
                device_id: device_id.value(i).to_string(),
                user_id: user_id.value(i).to_string(),
            })
        })
        .collect()
}

fn dates_spanning(start_ms: i64, end_ms: i64) -> Vec<String> {
    let mut day_ms = start_ms - start_ms.rem_euclid(DAY_MS);
    let end_day_ms = end_ms - end_ms.rem_euclid(DAY_MS);
    let mut dates = Vec::new();
    while day_ms <= end_day_ms {
        dates.push(epoch_ms_to_date_str(day_ms));
        day_ms += DAY_MS;
    }
    dates
}
