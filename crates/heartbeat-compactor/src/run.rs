//! The sleep loop that periodically sweeps every user/date directory and
//! compacts the ones with enough accumulated parts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use heartbeat_storage::StorageLayout;

use crate::merge::merge_parts;

pub async fn run_once(layout: &StorageLayout, min_parts_to_compact: usize) {
    let dirs = match layout.list_user_date_dirs() {
        Ok(dirs) => dirs,
        Err(e) => {
            tracing::error!(error = %e, "failed to list user/date directories");
            return;
        }
    };

    for dir in dirs {
        let parts = match layout.list_part_files(&dir.user_id, &dir.date_str) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!(user_id = %dir.user_id, date_str = %dir.date_str, error = %e, "failed to list parts");
                continue;
            }
        };
        if parts.len() < min_parts_to_compact {
            continue;
        }

        tracing::info!(user_id = %dir.user_id, date_str = %dir.date_str, parts = parts.len(), "compacting");
        match merge_parts(layout, &dir.user_id, &dir.date_str) {
            Ok(outcome) => tracing::info!(
                user_id = %dir.user_id,
                date_str = %dir.date_str,
                rows_written = outcome.rows_written,
                parts_archived = outcome.parts_archived,
                "compaction complete"
            ),
            Err(e) => tracing::error!(user_id = %dir.user_id, date_str = %dir.date_str, error = %e, "compaction failed"),
        }
    }
}

pub async fn run(layout: StorageLayout, min_parts_to_compact: usize, sleep_seconds: u64, shutdown: Arc<AtomicBool>) {
    tracing::info!("compactor loop started");
    while !shutdown.load(Ordering::Relaxed) {
        run_once(&layout, min_parts_to_compact).await;
        sleep_with_shutdown_check(Duration::from_secs(sleep_seconds), &shutdown).await;
    }
    tracing::info!("compactor shutting down");
}

async fn sleep_with_shutdown_check(total: Duration, shutdown: &AtomicBool) {
    let step = Duration::from_secs(1).min(total.max(Duration::from_millis(1)));
    let mut waited = Duration::ZERO;
    while waited < total {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;
    use heartbeat_core::schema::canonical_schema_arc;
    use heartbeat_storage::atomic_write;
    use std::sync::Arc as StdArc;

    #[tokio::test]
    async fn run_once_skips_directories_below_the_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));
        let schema = canonical_schema_arc();
        let batch = RecordBatch::try_new(
            schema,
            vec![
                StdArc::new(Int64Array::from(vec![1_705_315_200_000i64])),
                StdArc::new(Int64Array::from(vec![70i64])),
                StdArc::new(StringArray::from(vec!["device_a"])),
                StdArc::new(StringArray::from(vec!["u1"])),
            ],
        )
        .unwrap();
        let path = layout.new_part_path("u1", "2025-01-15").unwrap();
        atomic_write(&batch, &path).unwrap();

        run_once(&layout, 5).await;

        assert_eq!(layout.list_part_files("u1", "2025-01-15").unwrap().len(), 1);
    }
}
