//! Grouping pending items by `(user_id, date)` and writing one part file
//! per group, mirroring `flush_batch_to_parts` in the original consumer.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use heartbeat_core::clock::epoch_ms_to_date_str;
use heartbeat_core::schema::canonical_schema_arc;
use heartbeat_storage::{atomic_write, StorageLayout};

use crate::accumulator::PendingItem;
use crate::error::ConsumerError;

/// Writes one part file per `(user_id, date)` group. Returns the raw
/// payloads that were durably written -- the caller acks only those; a
/// group whose write fails is logged and its items are left un-acked so
/// they remain in the queue's in-flight list for a future retry (spec §7,
/// "batch write failure never drops data").
pub fn flush_to_parts(layout: &StorageLayout, items: Vec<PendingItem>) -> Vec<Vec<u8>> {
    let mut groups: HashMap<(String, String), Vec<PendingItem>> = HashMap::new();
    for pending in items {
        let date_str = epoch_ms_to_date_str(pending.item.bucketing_timestamp_ms());
        let key = (pending.item.user_id.clone(), date_str);
        groups.entry(key).or_default().push(pending);
    }

    let mut acked = Vec::new();
    for ((user_id, date_str), group) in groups {
        let row_count = group.len();
        let raws: Vec<Vec<u8>> = group.iter().map(|p| p.raw.clone()).collect();
        if let Err(e) = write_group(layout, &user_id, &date_str, group) {
            tracing::error!(user_id = %user_id, date_str = %date_str, error = %e, "failed to flush batch; leaving items in processing for retry");
            continue;
        }
        tracing::info!(user_id = %user_id, date_str = %date_str, rows = row_count, "wrote part file");
        acked.extend(raws);
    }
    acked
}

fn write_group(layout: &StorageLayout, user_id: &str, date_str: &str, group: Vec<PendingItem>) -> Result<(), ConsumerError> {
    let batch = build_batch(&group)?;
    let path = layout.new_part_path(user_id, date_str)?;
    atomic_write(&batch, &path)?;
    Ok(())
}

fn build_batch(group: &[PendingItem]) -> Result<RecordBatch, ConsumerError> {
    let schema = canonical_schema_arc();
    let mut timestamps = Vec::with_capacity(group.len());
    let mut heart_rates = Vec::with_capacity(group.len());
    let mut device_ids = Vec::with_capacity(group.len());
    let mut user_ids = Vec::with_capacity(group.len());

    for pending in group {
        timestamps.push(pending.item.bucketing_timestamp_ms());
        heart_rates.push(pending.item.heart_rate as i64);
        device_ids.push(pending.item.device_id.clone());
        user_ids.push(pending.item.user_id.clone());
    }

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(timestamps)),
            Arc::new(Int64Array::from(heart_rates)),
            Arc::new(StringArray::from(device_ids)),
            Arc::new(StringArray::from(user_ids)),
        ],
    )?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartbeat_core::QueueItem;

    fn pending(user_id: &str, date_ms: i64, device_id: &str) -> PendingItem {
        let item = QueueItem {
            device_id: device_id.into(),
            user_id: user_id.into(),
            timestamp_ms: Some(date_ms),
            heart_rate: 70,
            enqueued_at: date_ms,
        };
        PendingItem {
            raw: item.to_json_bytes().unwrap(),
            item,
        }
    }

    #[test]
    fn writes_one_part_per_user_date_group_and_acks_written_items() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));

        let items = vec![
            pending("u1", 1_705_315_200_000, "device_a"),
            pending("u1", 1_705_315_205_000, "device_a"),
            pending("u2", 1_705_315_200_000, "device_b"),
        ];

        let acked = flush_to_parts(&layout, items);
        assert_eq!(acked.len(), 3);

        let u1_parts = layout.list_part_files("u1", "2025-01-15").unwrap();
        let u2_parts = layout.list_part_files("u2", "2025-01-15").unwrap();
        assert_eq!(u1_parts.len(), 1);
        assert_eq!(u2_parts.len(), 1);
    }
}
