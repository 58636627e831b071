//! Batch scrape behavior: skip-and-continue, report counts, files on disk.

use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;
use tempfile::tempdir;
use url::Url;
use wikismith::chunker::{TextChunker, chunk_stored_page};
use wikismith::ingest::scrape_topics;
use wikismith::store::PageStore;
use wikismith::wiki::WikiClient;

fn test_client(server: &MockServer) -> WikiClient {
    let endpoint = Url::parse(&server.url("/w/api.php")).unwrap();
    WikiClient::with_endpoint(Client::new(), endpoint)
}

async fn mock_article(server: &MockServer, title: &str, text: &str) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search")
                .query_param("srsearch", title);
            then.status(200)
                .json_body(json!({"query": {"search": [{"title": title}]}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|pageprops")
                .query_param("titles", title);
            then.status(200).json_body(json!({
                "query": {"pages": [{"title": title, "extract": text}]}
            }));
        })
        .await;
}

#[tokio::test]
async fn one_failing_topic_does_not_abort_the_batch() {
    let server = MockServer::start_async().await;
    mock_article(&server, "Rust", "Rust is a systems programming language.").await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search")
                .query_param("srsearch", "Zzyzx Nonsense");
            then.status(200).json_body(json!({"query": {"search": []}}));
        })
        .await;

    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path());
    let client = test_client(&server);

    let topics = vec!["Rust".to_string(), "Zzyzx Nonsense".to_string()];
    let report = scrape_topics(&client, &store, &topics, false).await;

    assert_eq!(report.status, "completed");
    assert_eq!(report.pages_scraped, 2);
    assert_eq!(report.pages_saved, 1);
    assert!(report.pages_saved <= report.pages_scraped);

    let saved = store.load("Rust").await.unwrap();
    assert!(saved.contains("systems programming"));
    assert!(store.load("Zzyzx Nonsense").await.is_err());
}

#[tokio::test]
async fn all_successes_save_every_requested_page() {
    let server = MockServer::start_async().await;
    mock_article(&server, "Ada Lovelace", "Ada Lovelace was a mathematician.").await;
    mock_article(&server, "Alan Turing", "Alan Turing was a computer scientist.").await;

    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path());
    let client = test_client(&server);

    let topics = vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()];
    let report = scrape_topics(&client, &store, &topics, false).await;

    assert_eq!(report.pages_saved, report.pages_scraped);
    assert_eq!(report.pages_saved, 2);
}

#[tokio::test]
async fn stored_pages_chunk_at_their_conventional_path() {
    let text = "b".repeat(1200);
    let server = MockServer::start_async().await;
    mock_article(&server, "Long Article", &text).await;

    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path());
    let client = test_client(&server);

    let topics = vec!["Long Article".to_string()];
    let report = scrape_topics(&client, &store, &topics, false).await;
    assert_eq!(report.pages_saved, 1);

    let chunker = TextChunker::new(500, 100).unwrap();
    let chunks = chunk_stored_page(&store, "Long Article", &chunker)
        .await
        .unwrap();
    let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
    assert_eq!(offsets, vec![0, 400, 800]);
}

#[tokio::test]
async fn chunking_an_unscraped_topic_fails_fast() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path());

    let chunker = TextChunker::new(500, 100).unwrap();
    let err = chunk_stored_page(&store, "Never Scraped", &chunker)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Never Scraped"));
}
