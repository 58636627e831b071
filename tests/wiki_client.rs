//! Classification tests for the Wikipedia lookup boundary, driven against
//! a mock MediaWiki endpoint.

use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;
use url::Url;
use wikismith::wiki::{FetchOutcome, WikiClient};

fn test_client(server: &MockServer) -> WikiClient {
    let endpoint = Url::parse(&server.url("/w/api.php")).unwrap();
    WikiClient::with_endpoint(Client::new(), endpoint)
}

#[tokio::test]
async fn empty_search_classifies_as_not_found() {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search");
            then.status(200).json_body(json!({"query": {"search": []}}));
        })
        .await;

    let client = test_client(&server);
    let outcome = client.fetch_topic("Zzyzx Nonsense", false).await;

    search.assert_async().await;
    assert!(matches!(outcome, FetchOutcome::NotFound { ref query } if query == "Zzyzx Nonsense"));
}

#[tokio::test]
async fn successful_lookup_returns_the_extract() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search");
            then.status(200).json_body(json!({
                "query": {"search": [{"title": "Artificial intelligence"}]}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|pageprops")
                .query_param("titles", "Artificial intelligence");
            then.status(200).json_body(json!({
                "query": {"pages": [{
                    "title": "Artificial intelligence",
                    "extract": "Artificial intelligence is the capability of machines."
                }]}
            }));
        })
        .await;

    let client = test_client(&server);
    let outcome = client.fetch_topic("Artificial Intelligence", false).await;

    let page = outcome.page().expect("expected a page outcome");
    assert_eq!(page.title, "Artificial intelligence");
    assert!(page.text.contains("capability of machines"));
    assert!(!page.summary_only);
}

#[tokio::test]
async fn summary_mode_requests_only_the_intro() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search");
            then.status(200)
                .json_body(json!({"query": {"search": [{"title": "Rust"}]}}));
        })
        .await;
    let extract = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|pageprops")
                .query_param("exintro", "1");
            then.status(200).json_body(json!({
                "query": {"pages": [{"title": "Rust", "extract": "Lead section only."}]}
            }));
        })
        .await;

    let client = test_client(&server);
    let outcome = client.fetch_topic("Rust", true).await;

    extract.assert_async().await;
    let page = outcome.page().expect("expected a page outcome");
    assert!(page.summary_only);
    assert_eq!(page.text, "Lead section only.");
}

#[tokio::test]
async fn disambiguation_pages_surface_up_to_five_candidates() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search");
            then.status(200)
                .json_body(json!({"query": {"search": [{"title": "Mercury"}]}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|pageprops");
            then.status(200).json_body(json!({
                "query": {"pages": [{
                    "title": "Mercury",
                    "extract": "Mercury may refer to:",
                    "pageprops": {"disambiguation": ""}
                }]}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "links");
            then.status(200).json_body(json!({
                "query": {"pages": [{
                    "title": "Mercury",
                    "links": [
                        {"title": "Mercury (planet)"},
                        {"title": "Mercury (element)"},
                        {"title": "Mercury (mythology)"},
                        {"title": "Mercury Records"},
                        {"title": "Mercury (automobile)"},
                        {"title": "Mercury Marine"}
                    ]
                }]}
            }));
        })
        .await;

    let client = test_client(&server);
    let outcome = client.fetch_topic("Mercury", false).await;

    match outcome {
        FetchOutcome::Ambiguous { query, candidates } => {
            assert_eq!(query, "Mercury");
            assert_eq!(candidates.len(), 5);
            assert_eq!(candidates[0], "Mercury (planet)");
        }
        other => panic!("expected an ambiguous outcome, got: {}", other.describe()),
    }
}

#[tokio::test]
async fn missing_page_classifies_as_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search");
            then.status(200)
                .json_body(json!({"query": {"search": [{"title": "Ghost"}]}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|pageprops");
            then.status(200).json_body(json!({
                "query": {"pages": [{"title": "Ghost", "missing": true}]}
            }));
        })
        .await;

    let client = test_client(&server);
    let outcome = client.fetch_topic("Ghost", false).await;
    assert!(matches!(outcome, FetchOutcome::NotFound { .. }));
}

#[tokio::test]
async fn transport_failures_become_failed_outcomes() {
    // Discard port: connections are refused immediately.
    let endpoint = Url::parse("http://127.0.0.1:9/w/api.php").unwrap();
    let client = WikiClient::with_endpoint(Client::new(), endpoint);

    let outcome = client.fetch_topic("Anything", false).await;
    match outcome {
        FetchOutcome::Failed { query, message } => {
            assert_eq!(query, "Anything");
            assert!(!message.is_empty());
        }
        other => panic!("expected a failed outcome, got: {}", other.describe()),
    }
}

#[tokio::test]
async fn server_errors_become_failed_outcomes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/w/api.php");
            then.status(503);
        })
        .await;

    let client = test_client(&server);
    let outcome = client.fetch_topic("Anything", false).await;
    assert!(matches!(outcome, FetchOutcome::Failed { .. }));
}
