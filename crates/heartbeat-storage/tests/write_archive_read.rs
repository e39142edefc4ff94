//! Drives layout, atomic writes, normalization, and archival together
//! against real files on disk -- the inline unit tests in each module
//! exercise one piece at a time against its own scratch tempdir.

use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use heartbeat_core::schema::canonical_schema_arc;
use heartbeat_storage::{atomic_write, normalize_to_canonical, read_parquet_file, StorageLayout};

fn part_batch() -> RecordBatch {
    let schema = canonical_schema_arc();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1_705_315_200_000i64])),
            Arc::new(Int64Array::from(vec![72i64])),
            Arc::new(StringArray::from(vec!["device_a"])),
            Arc::new(StringArray::from(vec!["u1"])),
        ],
    )
    .unwrap()
}

#[test]
fn write_normalize_read_and_archive_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));

    let part_path = layout.new_part_path("u1", "2025-01-15").unwrap();
    atomic_write(&part_batch(), &part_path).unwrap();

    let parts = layout.list_part_files("u1", "2025-01-15").unwrap();
    assert_eq!(parts, vec![part_path.clone()]);

    let read_back = read_parquet_file(&part_path).unwrap();
    let normalized = normalize_to_canonical(&read_back).unwrap();
    assert_eq!(normalized.num_rows(), 1);
    let names: Vec<&str> = normalized.schema().fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, heartbeat_core::schema::CANONICAL_COLUMNS.to_vec());

    let dirs = layout.list_user_date_dirs().unwrap();
    assert_eq!(dirs.len(), 1);
    assert_eq!(dirs[0].user_id, "u1");

    let archived = layout.archive_part("u1", "2025-01-15", &part_path).unwrap();
    assert!(!part_path.exists());
    assert!(archived.exists());
    assert!(layout.list_part_files("u1", "2025-01-15").unwrap().is_empty());
}
