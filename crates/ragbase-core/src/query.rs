//! Question answering over a loaded RAG.
//!
//! One embedding call for the question, a top-k cosine search, a context
//! block built from the matching documents, and one completion call.

use serde::Serialize;
use tracing::debug;

use crate::document::Document;
use crate::error::{ProviderError, RagError};
use crate::rag::RagSystem;
use crate::traits::{CompletionProvider, EmbeddingProvider};

/// Number of documents placed in the prompt context.
pub const TOP_K: usize = 3;

/// Per-document content limit in the prompt context, in characters.
pub const MAX_CONTEXT_CHARS: usize = 1000;

const CONTEXT_HEADER: &str = "Relevant information:\n\n";

/// A document matched by a question, with its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDocument<'a> {
    pub document: &'a Document,
    pub score: f64,
}

/// A generated answer and the documents it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer<'a> {
    pub response: String,
    pub sources: Vec<RetrievedDocument<'a>>,
}

/// Answers questions against a [`RagSystem`].
pub struct QueryPipeline<'a> {
    embedder: &'a dyn EmbeddingProvider,
    completer: &'a dyn CompletionProvider,
}

impl<'a> QueryPipeline<'a> {
    pub fn new(embedder: &'a dyn EmbeddingProvider, completer: &'a dyn CompletionProvider) -> Self {
        Self { embedder, completer }
    }

    /// Answer `question` from the RAG's documents.
    ///
    /// The response is returned verbatim from the completion backend.
    pub async fn answer(&self, rag: &RagSystem, question: &str) -> Result<String, RagError> {
        Ok(self.answer_with_sources(rag, question).await?.response)
    }

    /// Like [`answer`](Self::answer), also returning the retrieved documents.
    pub async fn answer_with_sources<'r>(
        &self,
        rag: &'r RagSystem,
        question: &str,
    ) -> Result<Answer<'r>, RagError> {
        let sources = self.retrieve(rag, question).await?;
        let prompt = build_prompt(&build_context(&sources), question);
        debug!(
            "querying '{}' with {} context documents ({} prompt chars)",
            rag.name,
            sources.len(),
            prompt.chars().count()
        );

        let response = self
            .completer
            .complete(&rag.model_name, &prompt)
            .await
            .map_err(RagError::Generation)?;

        Ok(Answer { response, sources })
    }

    /// Embed `question` and resolve the top [`TOP_K`] documents.
    ///
    /// Hits whose id has no document are dropped.
    pub async fn retrieve<'r>(
        &self,
        rag: &'r RagSystem,
        question: &str,
    ) -> Result<Vec<RetrievedDocument<'r>>, RagError> {
        let query = self
            .embedder
            .embed(&rag.model_name, question)
            .await
            .map_err(|source| RagError::Embedding {
                subject: "question".to_string(),
                source,
            })?;
        if query.is_empty() {
            return Err(RagError::Embedding {
                subject: "question".to_string(),
                source: ProviderError::InvalidResponse("empty embedding".to_string()),
            });
        }

        if let Some(expected) = rag.vector_store.dimensions() {
            if expected != query.len() {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let retrieved = rag
            .vector_store
            .search(&query, TOP_K)
            .into_iter()
            .filter_map(|hit| {
                rag.document_by_id(&hit.id).map(|document| RetrievedDocument {
                    document,
                    score: hit.score,
                })
            })
            .collect();
        Ok(retrieved)
    }
}

/// Render retrieved documents into the prompt context block.
pub fn build_context(sources: &[RetrievedDocument<'_>]) -> String {
    let mut context = String::from(CONTEXT_HEADER);
    for source in sources {
        context.push_str("--- Document: ");
        context.push_str(&source.document.name);
        context.push_str(" ---\n");
        context.push_str(&truncate_chars(&source.document.content, MAX_CONTEXT_CHARS));
        context.push_str("\n\n");
    }
    context
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful AI assistant. Use the information below to answer the question.\n\n\
         {context}\n\n\
         Question: {question}\n\n\
         Answer concisely based only on the information provided above:"
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
