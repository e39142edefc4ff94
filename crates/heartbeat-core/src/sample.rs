//! The Sample type and its wire representation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{datetime_to_epoch_ms, parse_iso8601_to_epoch_ms};

pub const HEART_RATE_MIN: i32 = 30;
pub const HEART_RATE_MAX: i32 = 220;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("device_id must not be empty")]
    EmptyDeviceId,
    #[error("user_id must not be empty")]
    EmptyUserId,
    #[error("heart_rate {0} out of range [{HEART_RATE_MIN}, {HEART_RATE_MAX}]")]
    HeartRateOutOfRange(i32),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// One heart-rate measurement, already normalized to UTC epoch
/// milliseconds. This is the canonical, in-process representation --
/// the HTTP edge is the only place an ISO-8601 string is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub device_id: String,
    pub user_id: String,
    pub timestamp_ms: i64,
    pub heart_rate: i32,
}

impl Sample {
    /// Validates a fully-constructed Sample (range + non-empty ids).
    /// `timestamp_ms` is trusted once it reaches here -- it was derived
    /// by `from_wire` or by a decoded queue item.
    pub fn validate(&self) -> Result<(), SampleError> {
        if self.device_id.is_empty() {
            return Err(SampleError::EmptyDeviceId);
        }
        if self.user_id.is_empty() {
            return Err(SampleError::EmptyUserId);
        }
        if self.heart_rate < HEART_RATE_MIN || self.heart_rate > HEART_RATE_MAX {
            return Err(SampleError::HeartRateOutOfRange(self.heart_rate));
        }
        Ok(())
    }

    /// Builds and validates a Sample from HTTP-edge fields, where the
    /// timestamp is still an ISO-8601 string (naive inputs assumed UTC).
    pub fn from_wire(
        device_id: String,
        user_id: String,
        timestamp: &str,
        heart_rate: i32,
    ) -> Result<Self, SampleError> {
        let timestamp_ms = parse_iso8601_to_epoch_ms(timestamp)
            .map_err(|e| SampleError::InvalidTimestamp(e.to_string()))?;
        let sample = Sample {
            device_id,
            user_id,
            timestamp_ms,
            heart_rate,
        };
        sample.validate()?;
        Ok(sample)
    }
}

/// The queue wire payload: a Sample plus the producer-assigned
/// `enqueued_at`, used only as a fallback date-bucketing source when a
/// malformed producer omits `timestamp_ms` (spec §3, Sample).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub device_id: String,
    pub user_id: String,
    pub timestamp_ms: Option<i64>,
    pub heart_rate: i32,
    pub enqueued_at: i64,
}

impl QueueItem {
    pub fn from_sample(sample: &Sample, enqueued_at_ms: i64) -> Self {
        Self {
            device_id: sample.device_id.clone(),
            user_id: sample.user_id.clone(),
            timestamp_ms: Some(sample.timestamp_ms),
            heart_rate: sample.heart_rate,
            enqueued_at: enqueued_at_ms,
        }
    }

    /// The epoch-ms used to bucket this item into a `(user, date)` group:
    /// `timestamp_ms` when present, else `enqueued_at` (spec §9, open
    /// question on cross-day samples / missing timestamp_ms fallback).
    pub fn bucketing_timestamp_ms(&self) -> i64 {
        self.timestamp_ms.unwrap_or(self.enqueued_at)
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

pub fn now_epoch_ms() -> i64 {
    datetime_to_epoch_ms(chrono::Utc::now())
}
