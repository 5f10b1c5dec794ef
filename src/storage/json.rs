use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::{
    models::store::{CURRENT_VERSION, Store},
    storage::{
        Storage, StorageError,
        migrations::{apply_migrations, detect_version},
    },
};

const MAX_BACKUPS: usize = 5;

/// Store persisted as a single pretty-printed JSON document.
///
/// Saves go through a temp file and an atomic rename while holding an
/// exclusive lock on `<store>.lock`; the previous file is copied into
/// `backups/` first and only the newest `MAX_BACKUPS` copies are kept.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn backup_dir(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        parent.join("backups")
    }

    fn backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("store");
        // Colons are not valid in Windows file names
        let timestamp = jiff::Timestamp::now().to_string().replace(':', "-");

        self.backup_dir().join(format!("{}-{}.json", stem, timestamp))
    }

    fn create_backup(&self) -> Result<Option<PathBuf>, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(None);
        }

        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir).map_err(|e| StorageError::BackupFailed {
            path: backup_dir,
            source: e,
        })?;

        let backup_path = self.backup_path();
        fs::copy(&self.path, &backup_path).map_err(|e| StorageError::BackupFailed {
            path: backup_path.clone(),
            source: e,
        })?;

        Ok(Some(backup_path))
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.backup_dir();
        let cleanup_err = |e| StorageError::CleanupFailed {
            dir: backup_dir.clone(),
            source: e,
        };

        if !fs::exists(&backup_dir).map_err(cleanup_err)? {
            return Ok(());
        }

        let mut backups = fs::read_dir(&backup_dir)
            .map_err(cleanup_err)?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        if backups.len() <= MAX_BACKUPS {
            return Ok(());
        }

        // Timestamped names sort chronologically
        backups.sort();
        let excess = backups.len() - MAX_BACKUPS;
        for path in &backups[..excess] {
            tracing::debug!(path = %path.display(), "removing old backup");
            fs::remove_file(path).map_err(cleanup_err)?;
        }

        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store file yet, starting empty");
                return Ok(Store::default());
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let parse_err = |e| StorageError::ParseFailed {
            path: self.path.clone(),
            source: e,
        };

        let mut data: serde_json::Value = serde_json::from_str(&content).map_err(parse_err)?;
        let file_version = detect_version(&data)?;

        if file_version > CURRENT_VERSION {
            return Err(StorageError::FutureVersion(file_version));
        }

        if file_version < CURRENT_VERSION {
            data = apply_migrations(data, file_version, CURRENT_VERSION)?;
        }

        if let Some(obj) = data.as_object_mut() {
            obj.insert("version".to_string(), serde_json::json!(CURRENT_VERSION));
        }

        let store: Store = serde_json::from_value(data).map_err(parse_err)?;
        tracing::debug!(
            path = %self.path.display(),
            campaigns = store.campaigns.len(),
            "store loaded"
        );

        Ok(store)
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let json =
            to_string_pretty(store).map_err(|e| StorageError::SerializeFailed { source: e })?;

        let temp_path = PathBuf::from(format!("{}.tmp.{}", self.path.display(), Uuid::new_v4()));
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

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

        if let Some(backup) = self.create_backup()? {
            tracing::debug!(path = %backup.display(), "backup written");
        }
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(lock_err)?;
        tracing::debug!(path = %self.path.display(), "store saved");

        Ok(())
    }
}
