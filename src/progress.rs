//! Ingestion progress reporting for `ragbase rag`.
//!
//! Progress goes to **stderr** so stdout stays parseable for scripts.

use std::io::Write;

use ragbase_core::{IngestEvent, IngestProgress, NoProgress};

/// Human-friendly progress: "rag docs  embedding  12 / 1,234 documents".
pub struct StderrProgress;

impl IngestProgress for StderrProgress {
    fn report(&self, event: IngestEvent) {
        let line = match &event {
            IngestEvent::Discovered { rag, total } => {
                format!("rag {}  found {} files\n", rag, format_number(*total))
            }
            IngestEvent::Extracted { rag, n, total } => format!(
                "rag {}  extracting  {} / {} files\n",
                rag,
                format_number(*n),
                format_number(*total)
            ),
            IngestEvent::Embedded { rag, n, total } => format!(
                "rag {}  embedding  {} / {} documents\n",
                rag,
                format_number(*n),
                format_number(*total)
            ),
            IngestEvent::Saved { rag, documents } => {
                format!("rag {}  saved {} documents\n", rag, format_number(*documents))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line.
pub struct JsonProgress;

impl IngestProgress for JsonProgress {
    fn report(&self, event: IngestEvent) {
        let obj = event_json(&event);
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn event_json(event: &IngestEvent) -> serde_json::Value {
    match event {
        IngestEvent::Discovered { rag, total } => serde_json::json!({
            "event": "progress",
            "rag": rag,
            "phase": "discovered",
            "total": total
        }),
        IngestEvent::Extracted { rag, n, total } => serde_json::json!({
            "event": "progress",
            "rag": rag,
            "phase": "extracting",
            "n": n,
            "total": total
        }),
        IngestEvent::Embedded { rag, n, total } => serde_json::json!({
            "event": "progress",
            "rag": rag,
            "phase": "embedding",
            "n": n,
            "total": total
        }),
        IngestEvent::Saved { rag, documents } => serde_json::json!({
            "event": "saved",
            "rag": rag,
            "documents": documents
        }),
    }
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IngestProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn json_event_shape() {
        let obj = event_json(&IngestEvent::Embedded {
            rag: "docs".to_string(),
            n: 2,
            total: 5,
        });
        assert_eq!(obj["phase"], "embedding");
        assert_eq!(obj["rag"], "docs");
        assert_eq!(obj["n"], 2);
        assert_eq!(obj["total"], 5);

        let obj = event_json(&IngestEvent::Saved {
            rag: "docs".to_string(),
            documents: 5,
        });
        assert_eq!(obj["event"], "saved");
    }
}
