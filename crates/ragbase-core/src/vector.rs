//! Exact in-memory vector store.
//!
//! Holds `(id, vector)` pairs and ranks them against a query by brute-force
//! cosine similarity. There is no index: every search is an O(N·D) scan,
//! which is fine for personal document collections.
//!
//! The store persists as a JSON array of [`VectorItem`]s (`vectors.json`
//! inside a RAG directory).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// One stored vector, keyed by document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorItem {
    pub id: String,
    pub vector: Vec<f32>,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
}

/// Ordered collection of vectors with unique ids.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    items: Vec<VectorItem>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vector, replacing any existing vector stored under `id`.
    pub fn add(&mut self, id: &str, vector: Vec<f32>) {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(existing) => existing.vector = vector,
            None => self.items.push(VectorItem {
                id: id.to_string(),
                vector,
            }),
        }
    }

    /// Rank every stored vector against `query`, best first.
    ///
    /// A `limit` of 0 returns every item.
    pub fn search(&self, query: &[f32], limit: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .items
            .iter()
            .map(|item| SearchHit {
                id: item.id.clone(),
                score: cosine_similarity(query, &item.vector),
            })
            .collect();

        hits.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

        if limit > 0 && limit < hits.len() {
            hits.truncate(limit);
        }
        hits
    }

    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.vector.as_slice())
    }

    pub fn items(&self) -> &[VectorItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Dimensionality of the stored vectors, taken from the first item.
    pub fn dimensions(&self) -> Option<usize> {
        self.items.first().map(|item| item.vector.len())
    }

    /// Write the full item list to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        let json = serde_json::to_vec_pretty(&self.items)
            .map_err(|e| RagError::serialization(path, e))?;
        std::fs::write(path, json).map_err(|e| RagError::io(path, e))
    }

    /// Replace the contents of the store with the items stored at `path`.
    ///
    /// A missing file leaves the store empty.
    pub fn load(&mut self, path: &Path) -> Result<(), RagError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.items.clear();
                return Ok(());
            }
            Err(e) => return Err(RagError::io(path, e)),
        };

        self.items = serde_json::from_slice(&bytes).map_err(|e| RagError::serialization(path, e))?;
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns `0.0` when the lengths differ or either vector has zero norm.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
