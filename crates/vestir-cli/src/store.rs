//! A directory of JSON files as a [`KeyValueStore`].
//!
//! Each key is stored in `<dir>/<key>.json`. The directory is created on
//! the first write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use vestir_pipeline::{KeyValueStore, PersistenceError};

/// File-backed store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the value of `key`.
    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(PersistenceError::Unavailable(format!(
                "invalid storage key {key:?}"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, err: &io::Error) -> PersistenceError {
    PersistenceError::Io(format!("{}: {err}", path.display()))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, &e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, &e))?;
        fs::write(&path, value).map_err(|e| io_error(&path, &e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vestir_pipeline::{AlbumStore, ImagePayload};

    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("vestir.album").unwrap(), None);
    }

    #[test]
    fn set_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut store = FileStore::new(&nested);
        store.set("vestir.album", "[]").unwrap();
        assert_eq!(
            fs::read_to_string(nested.join("vestir.album.json")).unwrap(),
            "[]"
        );
        assert_eq!(store.get("vestir.album").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(store.set(key, "x").is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn album_persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut album = AlbumStore::load(FileStore::new(dir.path()));
        album.save(ImagePayload::new("AAAA", "image/png")).unwrap();

        let reloaded = AlbumStore::load(FileStore::new(dir.path()));
        assert_eq!(reloaded.entries(), &[ImagePayload::new("AAAA", "image/png")]);
    }

    #[test]
    fn unwritable_directory_keeps_album_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let mut album = AlbumStore::load(FileStore::new(&blocker));
        let err = album.save(ImagePayload::new("AAAA", "image/png")).unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
        assert_eq!(album.len(), 1);
    }
}
