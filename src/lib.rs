//! Wikipedia retrieval-augmented generation pipeline.
//!
//! ```text
//! Topic list ──► wiki::WikiClient ──► FetchOutcome ──┬─► store::PageStore
//!                                                    │   (ingest::scrape_topics
//!                                                    │    drives both)
//! Stored page ──► chunker::TextChunker ──► [Chunk]   │
//!                                                    │
//! [Chunk] ──► index::VectorIndex ──► vectorstore/  ◄─┘
//!                   (embeddings + sqlite-vec)
//!
//! Question ──► index search ──► answer::answer_question ──► printed answer
//! ```
//!
//! The binary in `src/main.rs` wires the stages together in a strict
//! sequence; each stage is also usable on its own.

pub mod answer;
pub mod chunker;
pub mod config;
pub mod index;
pub mod ingest;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod wiki;

pub use chunker::{Chunk, TextChunker};
pub use config::Settings;
pub use index::VectorIndex;
pub use ingest::ScrapeReport;
pub use store::PageStore;
pub use types::RagError;
pub use wiki::{FetchOutcome, WikiClient, WikiPage};
