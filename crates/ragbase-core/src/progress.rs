//! Ingestion progress events.
//!
//! The ingestion pipeline reports what it is doing through an
//! [`IngestProgress`] reporter. The CLI renders these on stderr; library
//! callers can pass [`NoProgress`].

/// A single progress event emitted by the ingestion pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum IngestEvent {
    /// Folder scan finished with `total` candidate files.
    Discovered { rag: String, total: u64 },
    /// `n` of `total` files went through extraction.
    Extracted { rag: String, n: u64, total: u64 },
    /// `n` of `total` documents have an embedding.
    Embedded { rag: String, n: u64, total: u64 },
    /// The RAG was written to disk.
    Saved { rag: String, documents: u64 },
}

/// Receives ingestion progress.
pub trait IngestProgress: Send + Sync {
    fn report(&self, event: IngestEvent);
}

/// Reporter that drops every event.
pub struct NoProgress;

impl IngestProgress for NoProgress {
    fn report(&self, _event: IngestEvent) {}
}
