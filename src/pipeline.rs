//! End-to-end orchestration: scrape, chunk, index, answer.
//!
//! The run is a strict linear sequence with no retries or branching beyond
//! the per-topic skip inside the batch scrape. A configuration flag selects
//! between answering one demonstration question and an interactive loop
//! reading questions from stdin.

use reqwest::Client;
use rig::embeddings::EmbeddingModel;
use rig::prelude::*;
use rig::providers::gemini;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::answer::{self, GeminiAnswerer};
use crate::chunker::{self, TextChunker};
use crate::config::Settings;
use crate::index::VectorIndex;
use crate::ingest;
use crate::store::PageStore;
use crate::types::RagError;
use crate::wiki::WikiClient;

const USER_AGENT: &str = concat!("wikismith/", env!("CARGO_PKG_VERSION"));

/// Runs the whole pipeline for the configured topic.
pub async fn run(settings: &Settings) -> Result<(), RagError> {
    let http = Client::builder()
        .user_agent(USER_AGENT)
        .use_rustls_tls()
        .build()?;
    let wiki = WikiClient::new(http, &settings.language)?;
    let store = PageStore::new(settings.pages_dir.clone());

    let topics = vec![settings.topic.clone()];
    let report = ingest::scrape_topics(&wiki, &store, &topics, settings.summary_only).await;
    info!(
        status = report.status,
        scraped = report.pages_scraped,
        saved = report.pages_saved,
        "scrape report"
    );
    if report.pages_saved == 0 {
        return Err(RagError::Scrape(format!(
            "no page could be saved for topic '{}'",
            settings.topic
        )));
    }

    let chunker = TextChunker::new(settings.chunk_size, settings.chunk_overlap)?;
    let chunks = chunker::chunk_stored_page(&store, &settings.topic, &chunker).await?;

    let gemini = gemini::Client::new(&settings.api_key)
        .map_err(|e| RagError::Config(e.to_string()))?;
    let embedding_model = gemini.embedding_model(&settings.embedding_model);

    let index = VectorIndex::create(&settings.vector_store_dir, embedding_model.clone()).await?;
    index.index_chunks(&settings.topic, &chunks).await?;

    // Query time always goes through the persisted file, the same way a
    // separate process would.
    let index = VectorIndex::open(&settings.vector_store_dir, embedding_model).await?;
    let answerer = GeminiAnswerer::new(&gemini, &settings.chat_model);

    if settings.interactive {
        run_interactive(&index, &answerer, settings.top_k).await
    } else {
        let question = format!("What are the main goals of {}?", settings.topic);
        info!(question = %question, "answering demonstration question");
        let text = answer::answer_question(&index, &answerer, &question, settings.top_k).await?;
        println!("{text}");
        Ok(())
    }
}

async fn run_interactive<E>(
    index: &VectorIndex<E>,
    answerer: &GeminiAnswerer,
    top_k: usize,
) -> Result<(), RagError>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Ask a question (blank line to exit):");
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            break;
        }
        let text = answer::answer_question(index, answerer, question, top_k).await?;
        println!("{text}\n");
        println!("Ask a question (blank line to exit):");
    }
    Ok(())
}
