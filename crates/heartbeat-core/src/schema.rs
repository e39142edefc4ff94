//! The canonical Arrow schema every part file, compacted file, and
//! normalized in-memory frame conforms to (spec §3, invariant I3):
//! `[timestamp_ms:i64, heart_rate:i64, device_id:utf8, user_id:utf8]`.

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::{Arc, OnceLock};

pub const TIMESTAMP_MS: &str = "timestamp_ms";
pub const HEART_RATE: &str = "heart_rate";
pub const DEVICE_ID: &str = "device_id";
pub const USER_ID: &str = "user_id";

/// Column order is load-bearing: every writer selects into this exact
/// order before calling `atomic_write` (spec §4.1).
pub const CANONICAL_COLUMNS: [&str; 4] = [TIMESTAMP_MS, HEART_RATE, DEVICE_ID, USER_ID];

pub fn canonical_schema() -> Schema {
    canonical_schema_arc().as_ref().clone()
}

pub fn canonical_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        Arc::new(Schema::new(vec![
            Field::new(TIMESTAMP_MS, DataType::Int64, false),
            Field::new(HEART_RATE, DataType::Int64, false),
            Field::new(DEVICE_ID, DataType::Utf8, false),
            Field::new(USER_ID, DataType::Utf8, false),
        ]))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_matches_canonical_column_order() {
        let schema = canonical_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, CANONICAL_COLUMNS.to_vec());
    }
}
