use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::storage::KeyValueStorage;

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSONファイルによるKeyValueStorage実装。
/// 全キーを1つのJSONオブジェクト（`{"KEY": "value", ...}`）として保持する。
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, JsonStoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), JsonStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for JsonFileStorage {
    type Error = JsonStoreError;

    fn is_available(&self) -> bool {
        if self.path.is_dir() {
            return false;
        }
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).is_ok()
            }
            _ => true,
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let mut entries = self.read_all()?;
        Ok(entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        // 壊れたファイルは上書きして復旧する
        let mut entries = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "replacing unreadable storage file"
            );
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_get_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shelf.json");
        let storage = JsonFileStorage::new(&path);

        assert!(storage.is_available());
        // 初回getはNone
        assert!(storage.get("BOOK_SHELF").unwrap().is_none());

        storage.set("BOOK_SHELF", "[]").unwrap();
        storage.set("OTHER", "x").unwrap();
        storage.set("BOOK_SHELF", "[1]").unwrap();

        assert_eq!(storage.get("BOOK_SHELF").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.get("OTHER").unwrap().as_deref(), Some("x"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn directory_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(!storage.is_available());
    }

    #[test]
    fn corrupt_file_is_an_error_on_get_and_replaced_on_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.json");
        std::fs::write(&path, "{not json").unwrap();
        let storage = JsonFileStorage::new(&path);

        assert!(matches!(
            storage.get("BOOK_SHELF"),
            Err(JsonStoreError::Json(_))
        ));

        storage.set("BOOK_SHELF", "[]").unwrap();
        assert_eq!(storage.get("BOOK_SHELF").unwrap().as_deref(), Some("[]"));
    }
}
