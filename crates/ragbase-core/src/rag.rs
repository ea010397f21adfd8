//! The RAG aggregate: documents and their vectors, kept in lockstep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::vector::VectorStore;

/// A named knowledge base bound to one embedding/completion model.
///
/// Serializes to the `info.json` view: everything except the vector store.
/// Every document that carries an embedding has exactly one vector in
/// [`vector_store`](RagSystem::vector_store) under the document's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSystem {
    pub name: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(skip)]
    pub vector_store: VectorStore,
}

/// Lightweight listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagSummary {
    pub name: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub document_count: usize,
}

impl RagSystem {
    pub fn new(name: &str, model_name: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            model_name: model_name.to_string(),
            created_at: now,
            updated_at: now,
            description: String::new(),
            documents: Vec::new(),
            vector_store: VectorStore::new(),
        }
    }

    /// Append a document, indexing its embedding when present.
    pub fn add_document(&mut self, doc: Document) {
        if let Some(embedding) = &doc.embedding {
            self.vector_store.add(&doc.id, embedding.clone());
        }
        self.documents.push(doc);
        self.updated_at = Utc::now();
    }

    /// First document with this id, in insertion order.
    pub fn document_by_id(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn summary(&self) -> RagSummary {
        RagSummary {
            name: self.name.clone(),
            model_name: self.model_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            document_count: self.documents.len(),
        }
    }
}
