//! Indexed documents.
//!
//! A [`Document`] is created once from extracted text and never changes
//! afterwards, except for the embedding attached by the ingestion pipeline.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Content type used for extensions missing from the table.
pub const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

static CONTROL_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x09\x0B\x0C\x0E-\x1F\x7F]+").expect("valid regex"));
static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));
static WORDLIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]{2,}").expect("valid regex"));

/// A document indexed in a RAG system.
///
/// The embedding is kept out of the serialized form; vectors are persisted
/// separately by the [`VectorStore`](crate::vector::VectorStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    pub name: String,
    pub content: String,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub content_type: String,
    pub size: u64,
}

impl Document {
    /// Build a document from a source path and its raw extracted text.
    ///
    /// The id and name are the file's base name.
    pub fn new(path: &Path, raw_text: &str) -> Self {
        let name = base_name(path);
        let content = clean_extracted_text(raw_text);
        let size = content.len() as u64;

        Self {
            id: name.clone(),
            path: path.to_path_buf(),
            name,
            content,
            embedding: None,
            created_at: Utc::now(),
            content_type: content_type_for(path).to_string(),
            size,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Map a file extension to a MIME type.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "csv" => "text/csv",
        "json" => "application/json",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "ppt" => "application/vnd.ms-powerpoint",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "rtf" => "application/rtf",
        "odt" => "application/vnd.oasis.opendocument.text",
        _ => GENERIC_CONTENT_TYPE,
    }
}

/// Normalize extracted text before indexing.
///
/// Control characters become spaces, runs of blanks collapse, and lines
/// that carry no word-like content (no two consecutive ASCII letters and at
/// most 20 bytes long) are dropped along with empty lines.
pub fn clean_extracted_text(text: &str) -> String {
    let text = CONTROL_RUNS.replace_all(text, " ");
    let text = BLANK_LINE_RUNS.replace_all(&text, "\n\n");
    let text = SPACE_RUNS.replace_all(&text, " ");

    text.split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && (WORDLIKE.is_match(trimmed) || trimmed.len() > 20)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_name_from_base_name() {
        let doc = Document::new(Path::new("/data/notes/ideas.md"), "Some ideas here");
        assert_eq!(doc.id, "ideas.md");
        assert_eq!(doc.name, "ideas.md");
        assert_eq!(doc.path, PathBuf::from("/data/notes/ideas.md"));
        assert!(doc.embedding.is_none());
    }

    #[test]
    fn test_size_is_cleaned_byte_length() {
        let doc = Document::new(Path::new("a.txt"), "hello   world\x00\x01");
        assert_eq!(doc.content, "hello world ");
        assert_eq!(doc.size, doc.content.len() as u64);
    }

    #[test]
    fn test_content_type_table() {
        assert_eq!(content_type_for(Path::new("a.MD")), "text/markdown");
        assert_eq!(content_type_for(Path::new("a.pdf")), "application/pdf");
        assert_eq!(content_type_for(Path::new("a.htm")), "text/html");
        assert_eq!(content_type_for(Path::new("a.rs")), GENERIC_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("Makefile")), GENERIC_CONTENT_TYPE);
    }

    #[test]
    fn test_clean_drops_noise_lines() {
        let raw = "Title line\n\n\n\n12 34\n----\nA real sentence with words.\n";
        assert_eq!(
            clean_extracted_text(raw),
            "Title line\nA real sentence with words."
        );
    }

    #[test]
    fn test_clean_keeps_long_symbol_lines() {
        let raw = "1234567890 1234567890 12";
        assert_eq!(clean_extracted_text(raw), raw);
    }

    #[test]
    fn test_clean_collapses_tabs_and_spaces() {
        assert_eq!(clean_extracted_text("a\t\tb  c   dd"), "a b c dd");
    }

    #[test]
    fn test_embedding_not_serialized() {
        let doc = Document::new(Path::new("x.txt"), "some text").with_embedding(vec![1.0, 2.0]);
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["id"], "x.txt");
        assert_eq!(json["content_type"], "text/plain");

        let back: Document = serde_json::from_value(json).unwrap();
        assert!(back.embedding.is_none());
        assert_eq!(back.content, "some text");
    }
}
