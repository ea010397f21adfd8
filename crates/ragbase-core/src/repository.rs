//! Filesystem persistence for RAG systems.
//!
//! Each RAG lives in its own directory under the repository root:
//!
//! ```text
//! <root>/<name>/info.json      metadata and documents, no vectors
//! <root>/<name>/vectors.json   vector store items
//! ```
//!
//! A RAG exists when its `info.json` exists. [`Repository::save`] writes
//! `info.json` last so an interrupted save never looks like a usable RAG.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::RagError;
use crate::rag::RagSystem;

const INFO_FILE: &str = "info.json";
const VECTORS_FILE: &str = "vectors.json";

/// Directory-per-name store of RAG systems.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Create a repository rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rag_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn info_path(&self, name: &str) -> PathBuf {
        self.rag_dir(name).join(INFO_FILE)
    }

    fn vectors_path(&self, name: &str) -> PathBuf {
        self.rag_dir(name).join(VECTORS_FILE)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.info_path(name).is_file()
    }

    /// Persist `rag`, overwriting any previous state under its name.
    ///
    /// If the directory did not exist before and writing fails, it is
    /// removed again.
    pub fn save(&self, rag: &RagSystem) -> Result<(), RagError> {
        validate_name(&rag.name)?;
        let dir = self.rag_dir(&rag.name);
        let created = !dir.exists();

        std::fs::create_dir_all(&dir).map_err(|e| RagError::io(&dir, e))?;

        let result = self.write_files(rag);
        if result.is_err() && created {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("could not clean up {}: {}", dir.display(), e);
            }
        }
        result
    }

    fn write_files(&self, rag: &RagSystem) -> Result<(), RagError> {
        let vectors_path = self.vectors_path(&rag.name);
        rag.vector_store.save(&vectors_path)?;

        let info_path = self.info_path(&rag.name);
        let info = serde_json::to_vec_pretty(rag)
            .map_err(|e| RagError::serialization(&info_path, e))?;
        std::fs::write(&info_path, info).map_err(|e| RagError::io(&info_path, e))?;

        debug!(
            "saved RAG '{}' ({} documents, {} vectors) to {}",
            rag.name,
            rag.documents.len(),
            rag.vector_store.len(),
            self.rag_dir(&rag.name).display()
        );
        Ok(())
    }

    /// Load a RAG and its vector store.
    pub fn load(&self, name: &str) -> Result<RagSystem, RagError> {
        validate_name(name)?;
        if !self.exists(name) {
            return Err(RagError::NotFound(name.to_string()));
        }

        let info_path = self.info_path(name);
        let bytes = std::fs::read(&info_path).map_err(|e| RagError::io(&info_path, e))?;
        let mut rag: RagSystem =
            serde_json::from_slice(&bytes).map_err(|e| RagError::serialization(&info_path, e))?;

        rag.vector_store.load(&self.vectors_path(name))?;
        Ok(rag)
    }

    /// Names of all stored RAGs, sorted.
    pub fn list(&self) -> Result<Vec<String>, RagError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RagError::io(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RagError::io(&self.root, e))?;
            let path = entry.path();
            if path.is_dir() && path.join(INFO_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove a RAG and everything under its directory.
    pub fn delete(&self, name: &str) -> Result<(), RagError> {
        validate_name(name)?;
        if !self.exists(name) {
            return Err(RagError::NotFound(name.to_string()));
        }
        let dir = self.rag_dir(name);
        std::fs::remove_dir_all(&dir).map_err(|e| RagError::io(&dir, e))
    }
}

/// Reject names that would escape the repository root or hide the directory.
pub fn validate_name(name: &str) -> Result<(), RagError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.starts_with('.') {
        Some("name starts with a dot")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(RagError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
