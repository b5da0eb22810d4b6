use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::document::Document;
use crate::error::Result;

/// Server-side persistence: one JSON document in one file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the data file, creating it with the built-in plan on first run.
    pub fn open_or_init(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };

        if !store.path.exists() {
            if let Some(parent) = store.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            store.write(&Document::builtin_default())?;
            info!(path = %store.path.display(), "Created data file with default meal plan");
        }

        Ok(store)
    }

    /// Open an existing data file without seeding it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Document> {
        let json = fs::read_to_string(&self.path)?;
        Document::from_json(&json)
    }

    /// Replace the whole file. No merge with what was there before.
    pub fn write(&self, doc: &Document) -> Result<()> {
        fs::write(&self.path, doc.to_json_pretty()?)?;
        Ok(())
    }
}
