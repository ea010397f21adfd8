//! RAG creation pipeline.
//!
//! Runs the linear flow: name check → folder scan → extraction → document
//! construction → sequential embedding → assembly → persistence.
//!
//! Extraction failures are tolerated per file (logged and skipped). An
//! embedding failure aborts the whole run: a RAG is either fully embedded
//! and saved, or nothing is written.
//!
//! The folder scan and text extraction block (PDF parsing, external tools),
//! so they run on tokio's blocking pool. Embedding stays on the caller's task.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::document::Document;
use crate::error::{ExtractError, ProviderError, RagError};
use crate::progress::{IngestEvent, IngestProgress, NoProgress};
use crate::rag::RagSystem;
use crate::repository::{validate_name, Repository};
use crate::traits::{EmbeddingProvider, TextExtractor};

/// Builds and persists new RAG systems.
pub struct IngestionPipeline<'a> {
    repository: &'a Repository,
    extractor: Arc<dyn TextExtractor>,
    embedder: &'a dyn EmbeddingProvider,
    progress: &'a dyn IngestProgress,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(
        repository: &'a Repository,
        extractor: Arc<dyn TextExtractor>,
        embedder: &'a dyn EmbeddingProvider,
    ) -> Self {
        Self {
            repository,
            extractor,
            embedder,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn IngestProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Index every supported file under `folder` into a new RAG named `name`.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidName`] / [`RagError::AlreadyExists`] before any
    ///   file is read.
    /// - [`RagError::FolderUnreadable`] if `folder` is not a directory.
    /// - [`RagError::NoDocumentsFound`] if no file yields text.
    /// - [`RagError::Embedding`] on the first embedding failure.
    /// - [`RagError::Worker`] if the blocking scan or extraction task dies.
    /// - Persistence errors from [`Repository::save`].
    pub async fn create(
        &self,
        model: &str,
        name: &str,
        folder: &Path,
    ) -> Result<RagSystem, RagError> {
        validate_name(name)?;
        if self.repository.exists(name) {
            return Err(RagError::AlreadyExists(name.to_string()));
        }

        let files = {
            let extractor = Arc::clone(&self.extractor);
            let folder = folder.to_path_buf();
            tokio::task::spawn_blocking(move || collect_files(&folder, extractor.as_ref()))
                .await
                .map_err(|e| RagError::Worker(e.to_string()))??
        };
        self.progress.report(IngestEvent::Discovered {
            rag: name.to_string(),
            total: files.len() as u64,
        });
        if files.is_empty() {
            return Err(RagError::NoDocumentsFound(folder.to_path_buf()));
        }
        info!("found {} supported files in {}", files.len(), folder.display());

        let documents = self.extract_documents(name, files).await?;
        if documents.is_empty() {
            return Err(RagError::NoDocumentsFound(folder.to_path_buf()));
        }

        let documents = self.embed_documents(name, model, documents).await?;

        let mut rag = RagSystem::new(name, model);
        for doc in documents {
            rag.add_document(doc);
        }

        self.repository.save(&rag)?;
        self.progress.report(IngestEvent::Saved {
            rag: name.to_string(),
            documents: rag.documents.len() as u64,
        });
        info!(
            "created RAG '{}' with {} documents using model '{}'",
            rag.name,
            rag.documents.len(),
            rag.model_name
        );
        Ok(rag)
    }

    async fn extract_documents(
        &self,
        rag: &str,
        files: Vec<PathBuf>,
    ) -> Result<Vec<Document>, RagError> {
        let total = files.len() as u64;
        let mut documents = Vec::with_capacity(files.len());
        let mut seen_ids = HashSet::new();

        let (tx, mut rx) = mpsc::unbounded_channel::<(PathBuf, Result<Document, ExtractError>)>();
        let extractor = Arc::clone(&self.extractor);
        let worker = tokio::task::spawn_blocking(move || {
            for path in files {
                let result = extractor
                    .extract(&path)
                    .map(|text| Document::new(&path, &text));
                if tx.send((path, result)).is_err() {
                    break;
                }
            }
        });

        let mut n = 0;
        while let Some((path, result)) = rx.recv().await {
            match result {
                Ok(doc) if doc.is_empty() => {
                    debug!("no usable text in {}, skipping", path.display());
                }
                Ok(doc) => {
                    if !seen_ids.insert(doc.id.clone()) {
                        warn!(
                            "document id '{}' is shared by several files; {} replaces its vector",
                            doc.id,
                            path.display()
                        );
                    }
                    documents.push(doc);
                }
                Err(source) => {
                    let err = RagError::Extraction { path, source };
                    warn!("skipping file: {}", err);
                }
            }
            n += 1;
            self.progress.report(IngestEvent::Extracted {
                rag: rag.to_string(),
                n,
                total,
            });
        }
        worker.await.map_err(|e| RagError::Worker(e.to_string()))?;

        Ok(documents)
    }

    async fn embed_documents(
        &self,
        rag: &str,
        model: &str,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>, RagError> {
        let total = documents.len() as u64;
        let mut embedded = Vec::with_capacity(documents.len());

        for (i, doc) in documents.into_iter().enumerate() {
            let subject = doc.path.display().to_string();
            let vector = self
                .embedder
                .embed(model, &doc.content)
                .await
                .map_err(|source| RagError::Embedding {
                    subject: subject.clone(),
                    source,
                })?;
            if vector.is_empty() {
                return Err(RagError::Embedding {
                    subject,
                    source: ProviderError::InvalidResponse("empty embedding".to_string()),
                });
            }

            debug!("embedded {} ({} dimensions)", doc.id, vector.len());
            embedded.push(doc.with_embedding(vector));
            self.progress.report(IngestEvent::Embedded {
                rag: rag.to_string(),
                n: i as u64 + 1,
                total,
            });
        }

        Ok(embedded)
    }
}

/// List the files under `folder` that the extractor supports.
///
/// Hidden files and directories are skipped. Symbolic links are followed;
/// entries that cannot be read (including link cycles) are logged and
/// skipped. Results are sorted by path.
pub fn collect_files(
    folder: &Path,
    extractor: &dyn TextExtractor,
) -> Result<Vec<PathBuf>, RagError> {
    let metadata = std::fs::metadata(folder).map_err(|e| RagError::FolderUnreadable {
        path: folder.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(RagError::FolderUnreadable {
            path: folder.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("cannot read entry under {}: {}", folder.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if extractor.supports(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
