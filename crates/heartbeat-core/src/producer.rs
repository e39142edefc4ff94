//! The enqueue path: validates HTTP-edge fields into a `Sample` and
//! stamps it into the queue's wire format. The HTTP handler that calls
//! this is a thin adapter -- all producer-side validation lives here.

use crate::sample::{now_epoch_ms, QueueItem, Sample, SampleError};

/// Builds the `QueueItem` a producer pushes for one heartbeat reading,
/// validating device/user ids, timestamp, and heart-rate range.
pub fn build_queue_item(
    device_id: String,
    user_id: String,
    timestamp: &str,
    heart_rate: i32,
) -> Result<QueueItem, SampleError> {
    let sample = Sample::from_wire(device_id, user_id, timestamp, heart_rate)?;
    Ok(QueueItem::from_sample(&sample, now_epoch_ms()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_queue_item_from_valid_fields() {
        let item = build_queue_item("device_a".into(), "u1".into(), "2025-01-15T10:00:30Z", 75).unwrap();
        assert_eq!(item.device_id, "device_a");
        assert_eq!(item.heart_rate, 75);
        assert!(item.timestamp_ms.is_some());
    }

    #[test]
    fn rejects_out_of_range_heart_rate() {
        let err = build_queue_item("device_a".into(), "u1".into(), "2025-01-15T10:00:30Z", 25).unwrap_err();
        assert_eq!(err, SampleError::HeartRateOutOfRange(25));
    }
}
