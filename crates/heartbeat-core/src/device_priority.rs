//! Device priority table used to break ties when multiple devices report
//! at the same `timestamp_ms`. Lower number wins.

/// Sentinel priority assigned to any device not in the known table.
pub const SENTINEL_PRIORITY: i64 = 999;

const KNOWN_DEVICES: &[(&str, i64)] = &[("device_a", 1), ("device_b", 2)];

/// Looks up the priority for a device, falling back to [`SENTINEL_PRIORITY`]
/// for unknown devices (never an error -- see spec §7, "Unknown device").
pub fn priority_for(device_id: &str) -> i64 {
    KNOWN_DEVICES
        .iter()
        .find(|(id, _)| *id == device_id)
        .map(|(_, priority)| *priority)
        .unwrap_or(SENTINEL_PRIORITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_devices_rank_by_priority() {
        assert_eq!(priority_for("device_a"), 1);
        assert_eq!(priority_for("device_b"), 2);
        assert!(priority_for("device_a") < priority_for("device_b"));
    }

    #[test]
    fn unknown_device_gets_sentinel() {
        assert_eq!(priority_for("some_unknown_wearable"), SENTINEL_PRIORITY);
    }
}
