//! The in-memory aggregation pipeline applied after all relevant files for
//! a query have been read and normalized: dedup same device/instant,
//! resolve device priority (or filter to one device), then aggregate to
//! one row per device per minute.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use heartbeat_core::clock::{format_timestamp_z, truncate_to_minute_ms};
use heartbeat_core::priority_for;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRow {
    pub timestamp_ms: i64,
    pub heart_rate: f64,
    pub device_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub timestamp: String,
    pub heart_rate: i64,
    pub device_id: String,
}

pub(crate) fn filter_by_range(rows: Vec<RawRow>, start_ms: i64, end_ms: i64) -> Vec<RawRow> {
    rows.into_iter()
        .filter(|r| r.timestamp_ms >= start_ms && r.timestamp_ms <= end_ms)
        .collect()
}

/// Averages readings from the same device landing at the exact same
/// millisecond before any cross-device tie-breaking happens.
pub(crate) fn dedup_same_device_instant(rows: Vec<RawRow>) -> Vec<RawRow> {
    group_and_mean(rows, |r| (r.timestamp_ms, r.device_id.clone()))
}

/// Either keeps only one device's readings, or -- when no device filter
/// was requested -- resolves readings from different devices at the same
/// instant by priority (lower number wins).
pub(crate) fn resolve_devices(rows: Vec<RawRow>, device_filter: Option<&str>) -> Vec<RawRow> {
    if let Some(device_id) = device_filter {
        return rows.into_iter().filter(|r| r.device_id == device_id).collect();
    }

    let mut best: HashMap<i64, (i64, RawRow)> = HashMap::new();
    let mut order = Vec::new();
    for row in rows {
        let priority = priority_for(&row.device_id);
        match best.entry(row.timestamp_ms) {
            Entry::Vacant(slot) => {
                order.push(row.timestamp_ms);
                slot.insert((priority, row));
            }
            Entry::Occupied(mut slot) => {
                if priority < slot.get().0 {
                    slot.insert((priority, row));
                }
            }
        }
    }
    order.into_iter().map(|ts| best.remove(&ts).unwrap().1).collect()
}

/// Truncates each reading to the start of its minute and averages heart
/// rate per `(minute, device)` bucket.
pub(crate) fn aggregate_by_minute(rows: Vec<RawRow>) -> Vec<RawRow> {
    group_and_mean(rows, |r| (truncate_to_minute_ms(r.timestamp_ms), r.device_id.clone()))
}

fn group_and_mean(rows: Vec<RawRow>, key_of: impl Fn(&RawRow) -> (i64, String)) -> Vec<RawRow> {
    let mut groups: HashMap<(i64, String), (f64, usize, String)> = HashMap::new();
    let mut order = Vec::new();
    for row in rows {
        let key = key_of(&row);
        match groups.entry(key.clone()) {
            Entry::Vacant(slot) => {
                order.push(key);
                slot.insert((row.heart_rate, 1, row.user_id));
            }
            Entry::Occupied(mut slot) => {
                let (sum, count, _) = slot.get_mut();
                *sum += row.heart_rate;
                *count += 1;
            }
        }
    }
    order
        .into_iter()
        .map(|(timestamp_ms, device_id)| {
            let (sum, count, user_id) = groups.remove(&(timestamp_ms, device_id.clone())).unwrap();
            RawRow {
                timestamp_ms,
                heart_rate: sum / count as f64,
                device_id,
                user_id,
            }
        })
        .collect()
}

/// Formats timestamps, truncates heart rate to an integer, and sorts
/// chronologically (ISO-8601 strings sort lexicographically in time order).
pub(crate) fn to_output_rows(rows: Vec<RawRow>) -> Vec<OutputRow> {
    let mut out: Vec<OutputRow> = rows
        .into_iter()
        .map(|row| OutputRow {
            timestamp: format_timestamp_z(row.timestamp_ms),
            heart_rate: row.heart_rate as i64,
            device_id: row.device_id,
        })
        .collect();
    out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    out
}
