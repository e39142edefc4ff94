//! Atomic parquet writes: encode to a temp file in the destination's own
//! directory, then rename into place, so a reader never observes a
//! partially-written file (invariant I2).

use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{EnabledStatistics, WriterProperties};

use crate::error::StorageError;

/// Snappy over the teacher's default Zstd: matches the throughput profile
/// of small, frequent part-file writes rather than archival compaction.
pub fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .build()
}

pub fn atomic_write(batch: &RecordBatch, dest: &Path) -> Result<(), StorageError> {
    let dir = dest
        .parent()
        .ok_or_else(|| StorageError::InvalidPath(format!("{} has no parent directory", dest.display())))?;
    std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".parquet")
        .tempfile_in(dir)
        .map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let props = writer_properties();
    let mut writer = ArrowWriter::try_new(&mut tmp, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    tmp.persist(dest).map_err(|e| StorageError::Io {
        path: dest.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("timestamp_ms", DataType::Int64, false),
            Field::new("device_id", DataType::Utf8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["a", "b", "c"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn writes_readable_parquet_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.parquet");
        atomic_write(&sample_batch(), &dest).unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert_eq!(&bytes[0..4], b"PAR1");
    }

    #[test]
    fn leaves_no_temp_file_behind_on_success() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.parquet");
        atomic_write(&sample_batch(), &dest).unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn rejects_a_destination_with_no_parent() {
        let batch = sample_batch();
        let err = atomic_write(&batch, Path::new("")).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }
}
