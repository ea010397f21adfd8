//! # ragbase-core
//!
//! Core library for building and querying local retrieval-augmented
//! generation (RAG) knowledge bases.
//!
//! A RAG system is a named set of [`Document`]s, each embedded into a
//! vector and stored in an exact in-memory [`VectorStore`]. Answering a
//! question embeds it, retrieves the most similar documents by cosine
//! similarity, and asks a completion model to answer from that context.
//!
//! This crate holds the data model and the two pipelines. It does no
//! network or file-format work itself: callers provide an
//! [`EmbeddingProvider`], a [`CompletionProvider`] and a [`TextExtractor`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`document`] | Document model and text cleaning |
//! | [`vector`] | Exact cosine-similarity vector store |
//! | [`rag`] | The RAG aggregate |
//! | [`repository`] | Directory-per-RAG persistence |
//! | [`ingest`] | Folder → RAG creation pipeline |
//! | [`query`] | Question answering pipeline |
//! | [`traits`] | Collaborator traits |
//! | [`progress`] | Ingestion progress events |
//! | [`error`] | Error types |

pub mod document;
pub mod error;
pub mod ingest;
pub mod progress;
pub mod query;
pub mod rag;
pub mod repository;
pub mod traits;
pub mod vector;

pub use document::Document;
pub use error::{ExtractError, ProviderError, RagError};
pub use ingest::IngestionPipeline;
pub use progress::{IngestEvent, IngestProgress, NoProgress};
pub use query::{Answer, QueryPipeline, RetrievedDocument};
pub use rag::{RagSummary, RagSystem};
pub use repository::Repository;
pub use traits::{CompletionProvider, EmbeddingProvider, TextExtractor};
pub use vector::{SearchHit, VectorStore};
