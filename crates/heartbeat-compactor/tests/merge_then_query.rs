//! Merges a set of part files into a compacted file, then hands the same
//! layout to `heartbeat_reader::query_heart_rate` to confirm the
//! compacted output is actually queryable, not just structurally valid.

use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use heartbeat_compactor::merge_parts;
use heartbeat_core::schema::canonical_schema_arc;
use heartbeat_reader::{query_heart_rate, QueryParams};
use heartbeat_storage::{atomic_write, StorageLayout};

fn write_part(layout: &StorageLayout, user_id: &str, date_str: &str, ts: i64, device: &str, heart_rate: i64) {
    let schema = canonical_schema_arc();
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![ts])),
            Arc::new(Int64Array::from(vec![heart_rate])),
            Arc::new(StringArray::from(vec![device])),
            Arc::new(StringArray::from(vec![user_id])),
        ],
    )
    .unwrap();
    let path = layout.new_part_path(user_id, date_str).unwrap();
    atomic_write(&batch, &path).unwrap();
}

#[test]
fn merged_output_is_queryable_and_parts_are_gone() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));

    write_part(&layout, "u1", "2025-06-01", 1_748_822_400_000, "device_a", 70);
    write_part(&layout, "u1", "2025-06-01", 1_748_822_460_000, "device_a", 74);

    let outcome = merge_parts(&layout, "u1", "2025-06-01").unwrap();
    assert_eq!(outcome.rows_written, 2);
    assert_eq!(outcome.parts_archived, 2);
    assert!(layout.list_part_files("u1", "2025-06-01").unwrap().is_empty());

    let params = QueryParams {
        user_id: "u1",
        start_ms: 1_748_822_340_000,
        end_ms: 1_748_822_520_000,
        device_id: None,
    };
    let rows = query_heart_rate(&layout, &params).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].heart_rate, 70);
    assert_eq!(rows[1].heart_rate, 74);
}
