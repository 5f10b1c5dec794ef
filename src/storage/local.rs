use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
};

use fs2::FileExt;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::storage::{LocalStorage, StorageError};

/// Key/value settings kept in one JSON object on disk. There is no
/// schema version: every value is whatever its owner last wrote.
pub struct JsonFileLocalStorage {
    path: PathBuf,
}

impl JsonFileLocalStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                    path: self.path.clone(),
                    source: e,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(StorageError::LoadFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Writes through a temp file and an atomic rename so a crash never
    /// leaves a half-written object behind
    fn write_all(&self, items: &Map<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| StorageError::SerializeFailed { source: e })?;

        let temp_path = PathBuf::from(format!("{}.tmp.{}", self.path.display(), Uuid::new_v4()));
        fs::write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Read-modify-write under an exclusive lock on `<file>.lock`. The
    /// closure reports whether anything changed.
    fn update(
        &self,
        change: impl FnOnce(&mut Map<String, Value>) -> bool,
    ) -> Result<(), StorageError> {
        let lock_file_path = self.path.with_extension("lock");
        let lock_err = |e| StorageError::SaveFailed {
            path: lock_file_path.clone(),
            source: e,
        };
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(lock_err)?;
        lock_file.lock_exclusive().map_err(lock_err)?;

        let mut items = self.read_all()?;
        if change(&mut items) {
            self.write_all(&items)?;
        }

        lock_file.unlock().map_err(lock_err)?;
        Ok(())
    }
}

impl LocalStorage for JsonFileLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_string(), value);
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| items.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let path = std::env::temp_dir().join(format!("adcamp-local-{}.json", Uuid::new_v4()));
        let storage = JsonFileLocalStorage::new(path.clone());

        assert_eq!(storage.get_item("theme").unwrap(), None);

        storage.set_item("theme", Value::from("dark")).unwrap();
        storage.set_item("sidebar", serde_json::json!({"collapsed": true})).unwrap();
        assert_eq!(storage.get_item("theme").unwrap(), Some(Value::from("dark")));

        storage.remove_item("theme").unwrap();
        assert_eq!(storage.get_item("theme").unwrap(), None);
        assert!(storage.get_item("sidebar").unwrap().is_some());

        fs::remove_file(&path).unwrap();
        fs::remove_file(path.with_extension("lock")).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("adcamp-local-{}.json", Uuid::new_v4()));
        fs::write(&path, "not json").unwrap();

        let result = JsonFileLocalStorage::new(path.clone()).get_item("menuConfig");
        assert!(matches!(result, Err(StorageError::ParseFailed { .. })));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_writes_leave_no_temp_files() {
        let dir = std::env::temp_dir().join(format!("adcamp-local-dir-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let storage = JsonFileLocalStorage::new(dir.join("local_storage.json"));

        storage.set_item("menuConfig", serde_json::json!({"sections": []})).unwrap();
        storage.set_item("theme", Value::from("dark")).unwrap();
        storage.remove_item("theme").unwrap();

        let mut names: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["local_storage.json", "local_storage.lock"]);

        let content = fs::read_to_string(dir.join("local_storage.json")).unwrap();
        let parsed: Map<String, Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains_key("menuConfig"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
