use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Filesystem store for uploaded files.
///
/// Files are written under a single root directory with randomized names so
/// that concurrent uploads and repeated original filenames never collide;
/// the original name is kept in the database for display only.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the backing directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Build a randomized on-disk name, preserving a sanitized extension of
    /// the original filename.
    pub fn random_name(prefix: &str, original_name: &str) -> String {
        let ext: String = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                e.chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .take(8)
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .unwrap_or_default();

        let stem = format!("{}-{}", prefix, Uuid::new_v4().simple());
        if ext.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, ext)
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, ServiceError> {
        // Stored names are generated by us; anything with a path separator is
        // not one of ours.
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid stored filename: {}",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    /// Persist file contents under the given stored name.
    pub async fn save(&self, name: &str, contents: &[u8]) -> Result<(), ServiceError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, contents).await?;
        Ok(())
    }

    /// Remove a stored file, logging instead of failing when it is already
    /// gone; callers treat file cleanup as best-effort.
    pub async fn remove_quiet(&self, name: &str) {
        let path = match self.resolve(name) {
            Ok(path) => path,
            Err(err) => {
                warn!(name, error = %err, "refusing to remove suspicious stored filename");
                return;
            }
        };
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(name, error = %err, "failed to remove stored file");
            }
        }
    }
}
