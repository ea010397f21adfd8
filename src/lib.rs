//! # ragbase
//!
//! Local retrieval-augmented generation on top of Ollama.
//!
//! The data model and pipelines live in [`ragbase_core`]. This crate adds
//! the concrete collaborators and the outer surfaces:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌─────────────────┐
//! │ FileExtractor│──▶│ ragbase-core      │◀──│ OllamaClient    │
//! │ txt/pdf/ooxml│   │ ingest + query    │   │ embed + generate│
//! └──────────────┘   └─────────┬─────────┘   └─────────────────┘
//!                              │
//!                  ┌───────────┴───────────┐
//!                  ▼                       ▼
//!             ┌──────────┐           ┌──────────┐
//!             │   CLI    │           │   HTTP   │
//!             │ ragbase  │           │   API    │
//!             └──────────┘           └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`extract`] | File text extraction |
//! | [`ollama`] | Ollama embedding and completion client |
//! | [`progress`] | Ingestion progress on stderr |
//! | [`commands`] | CLI subcommands |
//! | [`server`] | HTTP API |

pub mod commands;
pub mod config;
pub mod extract;
pub mod ollama;
pub mod progress;
pub mod server;

pub use ragbase_core;
