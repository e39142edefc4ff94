//! On-disk layout: `data_dir/<date>/user-<id>/{compacted,part-*}.parquet`,
//! with consumed parts archived under the mirror structure in `archive_dir`.

use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub const COMPACTED_FILE_NAME: &str = "compacted.parquet";
const PART_PREFIX: &str = "part-";
const PART_SUFFIX: &str = ".parquet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDateDir {
    pub user_id: String,
    pub date_str: String,
}

#[derive(Debug, Clone)]
pub struct StorageLayout {
    data_dir: PathBuf,
    archive_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(data_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn from_config(config: &heartbeat_config::StorageConfig) -> Self {
        Self::new(config.data_dir.clone(), config.archive_dir.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn user_date_dir(&self, user_id: &str, date_str: &str) -> PathBuf {
        self.data_dir.join(date_str).join(format!("user-{user_id}"))
    }

    pub fn compacted_path(&self, user_id: &str, date_str: &str) -> PathBuf {
        self.user_date_dir(user_id, date_str).join(COMPACTED_FILE_NAME)
    }

    /// Creates the user/date directory if missing and returns a fresh,
    /// collision-free part-file path inside it.
    pub fn new_part_path(&self, user_id: &str, date_str: &str) -> Result<PathBuf, StorageError> {
        let dir = self.user_date_dir(user_id, date_str);
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        let name = format!("{PART_PREFIX}{}{PART_SUFFIX}", uuid::Uuid::new_v4().simple());
        Ok(dir.join(name))
    }

    /// Lists `part-*.parquet` files for a user/date, sorted for
    /// deterministic iteration. A missing directory yields an empty list,
    /// not an error -- a user who never wrote on that date simply has none.
    pub fn list_part_files(&self, user_id: &str, date_str: &str) -> Result<Vec<PathBuf>, StorageError> {
        list_parts_in_dir(&self.user_date_dir(user_id, date_str))
    }

    /// Walks `data_dir` for every `<date>/user-<id>` directory on disk, used
    /// by the compactor to discover work without being told in advance.
    pub fn list_user_date_dirs(&self) -> Result<Vec<UserDateDir>, StorageError> {
        let mut out = Vec::new();
        let date_entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.data_dir.clone(),
                    source,
                })
            }
        };

        for date_entry in date_entries {
            let date_entry = date_entry.map_err(|source| StorageError::Io {
                path: self.data_dir.clone(),
                source,
            })?;
            if !date_entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Ok(date_str) = date_entry.file_name().into_string() else {
                continue;
            };
            let date_path = date_entry.path();
            let user_entries = std::fs::read_dir(&date_path).map_err(|source| StorageError::Io {
                path: date_path.clone(),
                source,
            })?;
            for user_entry in user_entries {
                let user_entry = user_entry.map_err(|source| StorageError::Io {
                    path: date_path.clone(),
                    source,
                })?;
                if !user_entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    continue;
                }
                let Ok(name) = user_entry.file_name().into_string() else {
                    continue;
                };
                if let Some(user_id) = name.strip_prefix("user-") {
                    out.push(UserDateDir {
                        user_id: user_id.to_string(),
                        date_str: date_str.clone(),
                    });
                }
            }
        }

        out.sort_by(|a, b| (&a.date_str, &a.user_id).cmp(&(&b.date_str, &b.user_id)));
        Ok(out)
    }

    /// Moves a consumed part file under `archive_dir`, preserving its
    /// `<date>/user-<id>` structure so a bad compaction run can be audited
    /// rather than leaving consumed parts silently deleted.
    pub fn archive_part(&self, user_id: &str, date_str: &str, part_path: &Path) -> Result<PathBuf, StorageError> {
        let dest_dir = self.archive_dir.join(date_str).join(format!("user-{user_id}"));
        std::fs::create_dir_all(&dest_dir).map_err(|source| StorageError::Io {
            path: dest_dir.clone(),
            source,
        })?;
        let file_name = part_path
            .file_name()
            .ok_or_else(|| StorageError::InvalidPath(format!("{} has no file name", part_path.display())))?
            .to_string_lossy()
            .into_owned();
        let dest = dest_dir.join(format!("{file_name}.done"));
        std::fs::rename(part_path, &dest).map_err(|source| StorageError::Io {
            path: part_path.to_path_buf(),
            source,
        })?;
        Ok(dest)
    }
}

fn list_parts_in_dir(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut parts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(PART_PREFIX) && name.ends_with(PART_SUFFIX) {
            parts.push(entry.path());
        }
    }
    parts.sort();
    Ok(parts)
}
