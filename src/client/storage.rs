use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::ClientError;

/// Where the client keeps its access token between app loads.
///
/// Calls are synchronous and expected to be quick.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// Token held for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl InMemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStorage for InMemoryTokenStorage {
    fn load(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// Token persisted in a single file, surviving restarts.
///
/// I/O is synchronous `std::fs` on one small file and runs on the calling
/// thread, including from `SessionClient`'s async methods. Wrap it in
/// `tokio::task::spawn_blocking` if the path may sit on slow storage.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_storage() {
        let storage = InMemoryTokenStorage::new();
        assert!(storage.load().is_none());

        storage.save("abc").unwrap();
        assert_eq!(storage.load().as_deref(), Some("abc"));

        storage.clear().unwrap();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_file_storage_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("token");

        FileTokenStorage::new(&path).save("abc").unwrap();
        assert_eq!(FileTokenStorage::new(&path).load().as_deref(), Some("abc"));

        let storage = FileTokenStorage::new(&path);
        storage.clear().unwrap();
        assert!(storage.load().is_none());
        // clearing twice is fine
        storage.clear().unwrap();
    }
}
