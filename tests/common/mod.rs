//! In-process Ollama stand-in for integration tests.
//!
//! Embeddings are keyword-presence vectors over [`KEYWORDS`], so similarity
//! is predictable. Generation echoes the model name and the first context
//! document.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};

pub const KEYWORDS: &[&str] = &["rust", "python", "garden"];
pub const MODEL: &str = "mock";

#[derive(Default)]
pub struct MockState {
    pub embed_calls: AtomicUsize,
    pub generate_requests: Mutex<Vec<Value>>,
}

pub struct MockOllama {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockOllama {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    KEYWORDS
        .iter()
        .map(|k| if text.contains(k) { 1.0 } else { 0.05 })
        .collect()
}

async fn tags() -> Json<Value> {
    Json(json!({ "models": [{ "name": "mock:latest" }, { "name": "other:7b" }] }))
}

async fn embeddings(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    state.embed_calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["prompt"].as_str().unwrap_or_default();
    if body["model"] != MODEL {
        return Err((StatusCode::NOT_FOUND, "model not found".to_string()));
    }
    Ok(Json(json!({ "embedding": keyword_vector(prompt) })))
}

async fn generate(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    state.generate_requests.lock().unwrap().push(body.clone());
    let first_doc = prompt
        .split("--- Document: ")
        .nth(1)
        .and_then(|rest| rest.split(" ---").next())
        .unwrap_or("none")
        .to_string();
    let model = body["model"].as_str().unwrap_or("?");
    Json(json!({
        "response": format!("answer from {} using {}", model, first_doc),
        "done": true
    }))
}

pub async fn spawn_mock_ollama() -> MockOllama {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/api/tags", get(tags))
        .route("/api/embeddings", post(embeddings))
        .route("/api/generate", post(generate))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockOllama { addr, state }
}

/// Folder with three documents, one per keyword.
pub fn write_docs(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("lang")).unwrap();
    std::fs::write(dir.join("lang/rust.md"), "# Rust\nRust has ownership and borrowing.").unwrap();
    std::fs::write(dir.join("lang/python.txt"), "Python uses indentation for blocks.").unwrap();
    std::fs::write(dir.join("garden.txt"), "The garden needs water every morning.").unwrap();
    std::fs::write(dir.join("ignored.bin"), [0u8, 1, 2, 3]).unwrap();
}
