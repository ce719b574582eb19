//! Persistence of uploaded documents.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;

/// Somewhere uploaded documents can be kept.
pub trait DocumentStore {
    /// Locator for a stored document.
    type Locator;

    /// Store a document under a fresh unique name derived from
    /// `original_name`'s extension.
    fn put(&self, original_name: &str, data: &[u8]) -> Result<Self::Locator, StoreError>;
}

/// Stores documents as files in a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unique_name(original_name: &str) -> String {
        let id = Uuid::new_v4();
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));

        match extension {
            Some(ext) => format!("{}.{}", id, ext.to_ascii_lowercase()),
            None => id.to_string(),
        }
    }
}

impl DocumentStore for LocalStore {
    type Locator = PathBuf;

    fn put(&self, original_name: &str, data: &[u8]) -> Result<PathBuf, StoreError> {
        let name = Self::unique_name(original_name);
        let path = self.root.join(&name);

        std::fs::create_dir_all(&self.root)
            .and_then(|()| std::fs::write(&path, data))
            .map_err(|source| StoreError::Write {
                name: name.clone(),
                source,
            })?;

        info!("Stored {} as {}", original_name, path.display());
        Ok(path)
    }
}
