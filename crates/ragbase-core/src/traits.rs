//! Collaborator traits consumed by the pipelines.
//!
//! The core never talks to a model server or parses file formats itself.
//! Applications plug in implementations of these traits:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌────────────┐
//! │ TextExtractor│──▶│ IngestionPipeline │──▶│ Repository │
//! └──────────────┘   └─────────┬─────────┘   └────────────┘
//!                              │ embed
//!                    ┌─────────▼─────────┐
//!                    │ EmbeddingProvider │
//!                    └─────────▲─────────┘
//!                              │ embed question
//!                    ┌─────────┴─────────┐   ┌────────────────────┐
//!                    │   QueryPipeline   │──▶│ CompletionProvider │
//!                    └───────────────────┘   └────────────────────┘
//! ```

use std::path::Path;

use async_trait::async_trait;

use crate::error::{ExtractError, ProviderError};

/// Turns text into a fixed-length vector.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use ragbase_core::{EmbeddingProvider, ProviderError};
///
/// struct LengthEmbedder;
///
/// #[async_trait]
/// impl EmbeddingProvider for LengthEmbedder {
///     async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
///         Ok(vec![text.len() as f32, 1.0])
///     }
/// }
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Generates text from a prompt.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Best-effort text extraction from files.
///
/// `supports` decides which files a folder scan picks up; `extract` may
/// fail or return blank text, both of which the ingestion pipeline
/// tolerates.
pub trait TextExtractor: Send + Sync {
    fn supports(&self, path: &Path) -> bool;

    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}
