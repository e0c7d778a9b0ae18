use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use super::r#trait::{DocumentKind, DocumentStore, StoreError};

/// One `<collection>.json` file per collection under a data directory.
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if missing) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            collection: "data directory",
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }
}

impl DocumentStore for JsonFileStore {
    fn read(&self, kind: DocumentKind) -> Result<Option<JsonValue>, StoreError> {
        let bytes = match fs::read(self.path(kind)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(kind, err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StoreError::serde(kind, err))
    }

    fn write(&self, kind: DocumentKind, document: &JsonValue) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document).map_err(|err| StoreError::serde(kind, err))?;
        let target = self.path(kind);
        let staging = self.dir.join(format!(".{kind}.json.tmp"));

        let mut file = fs::File::create(&staging).map_err(|err| StoreError::io(kind, err))?;
        file.write_all(&bytes).map_err(|err| StoreError::io(kind, err))?;
        file.sync_all().map_err(|err| StoreError::io(kind, err))?;
        drop(file);
        fs::rename(&staging, &target).map_err(|err| StoreError::io(kind, err))?;

        tracing::debug!(collection = %kind, bytes = bytes.len(), "collection written");
        Ok(())
    }
}
