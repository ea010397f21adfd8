//! Binary-level tests for the `ragbase` CLI.
//!
//! Each test gets its own data directory and config file. Commands that
//! talk to Ollama run against the in-process mock server.

mod common;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

struct Env {
    root: TempDir,
}

impl Env {
    fn new(ollama_url: &str) -> Self {
        let env = Env {
            root: TempDir::new().unwrap(),
        };
        env.point_at(ollama_url);
        common::write_docs(&env.docs());
        env
    }

    /// Rewrite the config file to use another Ollama server.
    fn point_at(&self, ollama_url: &str) {
        let config = format!(
            "[storage]\ndata_dir = {:?}\n\n\
             [ollama]\nurl = {:?}\ntimeout_secs = 10\n\n\
             [extraction]\nexternal_tools = false\n",
            self.data_dir().to_string_lossy(),
            ollama_url
        );
        std::fs::write(self.config(), config).unwrap();
    }

    fn config(&self) -> PathBuf {
        self.root.path().join("config.toml")
    }

    fn docs(&self) -> PathBuf {
        self.root.path().join("docs")
    }

    fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(ragbase_binary());
        cmd.arg("--config")
            .arg(self.config())
            .args(args)
            .env("HOME", self.root.path())
            .env_remove("OLLAMA_HOST")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    async fn run(&self, args: &[&str]) -> (String, String, bool) {
        let output = self.command(args).output().await.unwrap();
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        )
    }

    async fn run_with_stdin(&self, args: &[&str], input: &str) -> (String, String, bool) {
        let mut child = self.command(args).stdin(Stdio::piped()).spawn().unwrap();
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(input.as_bytes()).await.unwrap();
        drop(stdin);
        let output = child.wait_with_output().await.unwrap();
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        )
    }
}

fn ragbase_binary() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_ragbase"))
}

fn docs_arg(env: &Env) -> String {
    env.docs().to_string_lossy().to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_empty() {
    let env = Env::new("http://127.0.0.1:9");
    let (stdout, stderr, ok) = env.run(&["list"]).await;
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("No RAG systems found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_lifecycle() {
    let mock = common::spawn_mock_ollama().await;
    let env = Env::new(&mock.url());
    let docs = docs_arg(&env);

    let (stdout, stderr, ok) = env
        .run(&["--progress", "json", "rag", "mock", "langs", &docs])
        .await;
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("RAG 'langs' created with 3 documents"));
    assert!(stderr.contains("\"phase\":\"embedding\""));
    assert!(env.data_dir().join("langs/info.json").is_file());
    assert!(env.data_dir().join("langs/vectors.json").is_file());

    let (stdout, _, ok) = env.run(&["list"]).await;
    assert!(ok);
    assert!(stdout.contains("NAME"));
    assert!(stdout.contains("langs"));
    assert!(stdout.contains("mock"));

    let (stdout, _, ok) = env.run(&["info", "langs"]).await;
    assert!(ok);
    assert!(stdout.contains("Documents:   3"));
    assert!(stdout.contains("rust.md"));
    assert!(stdout.contains("3 dimensions"));

    let (stdout, stderr, ok) = env
        .run(&["query", "langs", "how does the garden grow?", "--show-sources"])
        .await;
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.starts_with("answer from mock using garden.txt"));
    assert!(stdout.contains("Sources:"));

    let (stdout, _, ok) = env.run(&["delete", "langs", "--force"]).await;
    assert!(ok);
    assert!(stdout.contains("RAG 'langs' deleted."));
    assert!(!env.data_dir().join("langs").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rag_name_taken() {
    let mock = common::spawn_mock_ollama().await;
    let env = Env::new(&mock.url());
    let docs = docs_arg(&env);

    let (_, _, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(ok);
    let (_, stderr, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(!ok);
    assert!(stderr.contains("already exists"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rag_name_taken_is_reported_before_contacting_ollama() {
    let mock = common::spawn_mock_ollama().await;
    let env = Env::new(&mock.url());
    let docs = docs_arg(&env);
    let (_, _, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(ok);

    env.point_at("http://127.0.0.1:9");
    let (_, stderr, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(!ok);
    assert!(stderr.contains("a RAG named 'langs' already exists"), "stderr: {}", stderr);
    assert!(!stderr.contains("Is Ollama running"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rag_invalid_name_is_reported_before_contacting_ollama() {
    let env = Env::new("http://127.0.0.1:9");
    let docs = docs_arg(&env);

    let (_, stderr, ok) = env.run(&["rag", "mock", ".hidden", &docs]).await;
    assert!(!ok);
    assert!(stderr.contains("invalid RAG name"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rag_unknown_model() {
    let mock = common::spawn_mock_ollama().await;
    let env = Env::new(&mock.url());
    let docs = docs_arg(&env);

    let (_, stderr, ok) = env.run(&["rag", "missing-model", "langs", &docs]).await;
    assert!(!ok);
    assert!(stderr.contains("ollama pull missing-model"), "stderr: {}", stderr);
    assert!(!env.data_dir().join("langs").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rag_ollama_unreachable() {
    let env = Env::new("http://127.0.0.1:9");
    let docs = docs_arg(&env);

    let (_, stderr, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(!ok);
    assert!(stderr.contains("Is Ollama running"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_missing_rag() {
    let env = Env::new("http://127.0.0.1:9");
    let (_, stderr, ok) = env.run(&["query", "ghost", "anything"]).await;
    assert!(!ok);
    assert!(stderr.contains("RAG 'ghost' not found"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_session() {
    let mock = common::spawn_mock_ollama().await;
    let env = Env::new(&mock.url());
    let docs = docs_arg(&env);
    let (_, _, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(ok);

    let (stdout, stderr, ok) = env
        .run_with_stdin(&["run", "langs"], "tell me about python\n\nexit\nnever asked\n")
        .await;
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("RAG 'langs' loaded (3 documents"));
    assert!(stdout.contains("answer from mock using python.txt"));
    assert_eq!(mock.state.generate_requests.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_requires_confirmation() {
    let mock = common::spawn_mock_ollama().await;
    let env = Env::new(&mock.url());
    let docs = docs_arg(&env);
    let (_, _, ok) = env.run(&["rag", "mock", "langs", &docs]).await;
    assert!(ok);

    let (stdout, _, ok) = env.run_with_stdin(&["delete", "langs"], "n\n").await;
    assert!(ok);
    assert!(stdout.contains("Deletion cancelled."));
    assert!(env.data_dir().join("langs/info.json").is_file());

    let (stdout, _, ok) = env.run_with_stdin(&["delete", "langs"], "y\n").await;
    assert!(ok);
    assert!(stdout.contains("RAG 'langs' deleted."));

    let (_, stderr, ok) = env.run(&["delete", "langs", "--force"]).await;
    assert!(!ok);
    assert!(stderr.contains("not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_config_is_rejected() {
    let env = Env::new("http://127.0.0.1:9");
    std::fs::write(env.config(), "[generation]\ntop_p = 3.0\n").unwrap();

    let (_, stderr, ok) = env.run(&["list"]).await;
    assert!(!ok);
    assert!(stderr.contains("top_p"), "stderr: {}", stderr);
}
