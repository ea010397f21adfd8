//! Error types for ragbase.
//!
//! [`RagError`] is the single error surfaced by the repository and the
//! pipelines. Collaborators report their own narrower errors
//! ([`ExtractError`], [`ProviderError`]) which the pipelines wrap.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ragbase operations.
#[derive(Error, Debug)]
pub enum RagError {
    /// No RAG with this name exists in the repository.
    #[error("RAG '{0}' not found")]
    NotFound(String),

    /// A RAG with this name already exists.
    #[error("a RAG named '{0}' already exists")]
    AlreadyExists(String),

    /// The name cannot be used as a directory name.
    #[error("invalid RAG name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The folder has no supported document with extractable text.
    #[error("no supported documents found in {}", .0.display())]
    NoDocumentsFound(PathBuf),

    /// The input folder is missing or is not a directory.
    #[error("cannot read folder {}: {reason}", .path.display())]
    FolderUnreadable { path: PathBuf, reason: String },

    /// Text extraction failed for a single file.
    #[error("extraction failed for {}: {source}", .path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    /// The embedding backend failed for a document or a question.
    #[error("embedding failed for {subject}: {source}")]
    Embedding {
        subject: String,
        #[source]
        source: ProviderError,
    },

    /// The completion backend failed.
    #[error("generation failed: {0}")]
    Generation(#[source] ProviderError),

    /// The question embedding does not match the stored vectors.
    #[error(
        "embedding dimension mismatch: RAG vectors have {expected} dimensions, query has {actual}"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    /// Filesystem error while reading or writing persisted state.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking scan or extraction task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Worker(String),

    /// Persisted state could not be serialized or deserialized.
    #[error("serialization error on {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RagError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        RagError::Serialization {
            path: path.into(),
            source,
        }
    }

    /// True for filesystem and (de)serialization failures of persisted state.
    pub fn is_persistence(&self) -> bool {
        matches!(self, RagError::Io { .. } | RagError::Serialization { .. })
    }

    /// True when the error reports a collaborator backend failure.
    pub fn is_backend(&self) -> bool {
        matches!(self, RagError::Embedding { .. } | RagError::Generation(_))
    }
}

/// Text extraction errors.
///
/// Extraction is best-effort: the ingestion pipeline logs these and skips
/// the file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),

    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("no text could be extracted")]
    NoText,
}

/// Errors reported by embedding and completion backends.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered with a body we could not use.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// The requested model is not installed on the backend.
    #[error("model '{0}' is not available")]
    ModelNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = RagError::NotFound("docs".to_string());
        assert_eq!(err.to_string(), "RAG 'docs' not found");
    }

    #[test]
    fn test_embedding_error_names_subject() {
        let err = RagError::Embedding {
            subject: "notes/a.md".to_string(),
            source: ProviderError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("notes/a.md"));
        assert!(msg.contains("500"));
        assert!(err.is_backend());
        assert!(!err.is_persistence());
    }

    #[test]
    fn test_persistence_classification() {
        let err = RagError::io(
            "/tmp/x/info.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_persistence());
        assert!(err.to_string().contains("info.json"));
    }

    #[test]
    fn test_extract_error_display() {
        let err = ExtractError::TooLarge { size: 10, limit: 5 };
        assert_eq!(err.to_string(), "file too large: 10 bytes (limit 5)");
    }
}
