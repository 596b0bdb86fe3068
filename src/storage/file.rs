use super::KeyValueStore;
use crate::errors::StoreError;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Directory-backed store: every key is one `{key}.json` file under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Config(format!("Invalid storage key: '{}'", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }

    fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => StoreError::Io(format!(
                "Permission denied: cannot create directory {:?}",
                self.root
            )),
            _ => StoreError::Io(format!(
                "Failed to create directory {:?}: {}",
                self.root, e
            )),
        })
    }

    /// Persist the directory entry of a freshly renamed file.
    #[cfg(unix)]
    fn sync_root(&self) -> Result<(), StoreError> {
        File::open(&self.root)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| StoreError::Io(format!("Failed to sync {:?}: {}", self.root, e)))
    }

    #[cfg(not(unix))]
    fn sync_root(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(format!("Failed to read {:?}: {}", path, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        self.ensure_root()?;

        // Write beside the target and rename so readers never see a torn file
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = write_synced(&tmp, value) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::Io(format!("Failed to write to {:?}: {}", tmp, e)));
        }
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(format!("Failed to replace {:?}: {}", path, e))
        })?;
        self.sync_root()?;

        log::debug!("Persisted '{}' ({} bytes)", key, value.len());
        Ok(())
    }
}

/// Write `value` to `path` and flush it to disk before returning.
fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}
