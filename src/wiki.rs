//! Wikipedia lookup: title search, article fetch, failure classification.
//!
//! The client performs a title search first and fetches the top hit as a
//! plain-text extract. Every failure mode is classified into a
//! [`FetchOutcome`] value; the fetch boundary never returns an error to its
//! caller.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::types::RagError;

/// Maximum number of candidate titles carried by an ambiguous outcome.
const MAX_CANDIDATES: usize = 5;
const SEARCH_LIMIT: &str = "5";
const LINK_LIMIT: &str = "10";

/// Result of looking up one topic.
#[derive(Clone, Debug)]
pub enum FetchOutcome {
    /// The topic resolved to an article.
    Page(WikiPage),
    /// The top hit is a disambiguation page; `candidates` lists up to five
    /// alternative titles to try instead.
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },
    /// The search produced no usable article.
    NotFound { query: String },
    /// Transport or decoding failure, carried as a human-readable message.
    Failed { query: String, message: String },
}

impl FetchOutcome {
    pub fn page(&self) -> Option<&WikiPage> {
        match self {
            FetchOutcome::Page(page) => Some(page),
            _ => None,
        }
    }

    /// One-line description used in batch logs.
    pub fn describe(&self) -> String {
        match self {
            FetchOutcome::Page(page) => {
                format!("fetched '{}' ({} chars)", page.title, page.text.chars().count())
            }
            FetchOutcome::Ambiguous { query, candidates } => format!(
                "'{query}' has multiple meanings; try one of: {}",
                candidates.join(", ")
            ),
            FetchOutcome::NotFound { query } => format!("no page found for '{query}'"),
            FetchOutcome::Failed { query, message } => {
                format!("error fetching '{query}': {message}")
            }
        }
    }
}

/// A successfully fetched article.
#[derive(Clone, Debug)]
pub struct WikiPage {
    /// Resolved article title (after search and redirects).
    pub title: String,
    pub text: String,
    /// `true` when only the lead section was requested.
    pub summary_only: bool,
}

/// Thin client over the MediaWiki action API.
#[derive(Clone, Debug)]
pub struct WikiClient {
    http: Client,
    endpoint: Url,
}

impl WikiClient {
    pub fn new(http: Client, language: &str) -> Result<Self, RagError> {
        let endpoint = Url::parse(&format!("https://{language}.wikipedia.org/w/api.php"))
            .map_err(|err| {
                RagError::Config(format!("invalid wikipedia language '{language}': {err}"))
            })?;
        Ok(Self { http, endpoint })
    }

    /// Builds a client against an explicit API endpoint. Used by tests and
    /// self-hosted MediaWiki installations.
    pub fn with_endpoint(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Looks up `query` and classifies the result. Never returns an error:
    /// transport and decoding failures become [`FetchOutcome::Failed`].
    pub async fn fetch_topic(&self, query: &str, summary_only: bool) -> FetchOutcome {
        match self.resolve(query, summary_only).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(query = %query, error = %err, "wikipedia lookup failed");
                FetchOutcome::Failed {
                    query: query.to_string(),
                    message: err.to_string(),
                }
            }
        }
    }

    async fn resolve(&self, query: &str, summary_only: bool) -> Result<FetchOutcome, RagError> {
        let hits = self.search(query).await?;
        let Some(title) = hits.into_iter().next() else {
            return Ok(FetchOutcome::NotFound {
                query: query.to_string(),
            });
        };
        info!(query = %query, title = %title, "search resolved title");
        self.fetch_page(query, &title, summary_only).await
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, RagError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", SEARCH_LIMIT),
        ];
        let response = self.call(&params).await?;
        Ok(response
            .query
            .search
            .into_iter()
            .map(|hit| hit.title)
            .collect())
    }

    async fn fetch_page(
        &self,
        query: &str,
        title: &str,
        summary_only: bool,
    ) -> Result<FetchOutcome, RagError> {
        let mut params = vec![
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "extracts|pageprops"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
        ];
        if summary_only {
            params.push(("exintro", "1"));
        }
        let response = self.call(&params).await?;

        let Some(page) = response.query.pages.into_iter().next() else {
            return Ok(FetchOutcome::NotFound {
                query: query.to_string(),
            });
        };
        if page.missing {
            return Ok(FetchOutcome::NotFound {
                query: query.to_string(),
            });
        }
        if page.pageprops.contains_key("disambiguation") {
            let candidates = self
                .disambiguation_candidates(&page.title)
                .await
                .unwrap_or_default();
            return Ok(FetchOutcome::Ambiguous {
                query: query.to_string(),
                candidates,
            });
        }

        let text = page.extract.unwrap_or_default();
        if text.trim().is_empty() {
            return Ok(FetchOutcome::Failed {
                query: query.to_string(),
                message: format!("page '{}' returned an empty extract", page.title),
            });
        }

        Ok(FetchOutcome::Page(WikiPage {
            title: page.title,
            text,
            summary_only,
        }))
    }

    /// Mainspace links of a disambiguation page, capped at
    /// [`MAX_CANDIDATES`].
    async fn disambiguation_candidates(&self, title: &str) -> Result<Vec<String>, RagError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "links"),
            ("plnamespace", "0"),
            ("pllimit", LINK_LIMIT),
            ("titles", title),
        ];
        let response = self.call(&params).await?;
        let mut candidates: Vec<String> = response
            .query
            .pages
            .into_iter()
            .next()
            .map(|page| page.links.into_iter().map(|link| link.title).collect())
            .unwrap_or_default();
        candidates.truncate(MAX_CANDIDATES);
        Ok(candidates)
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<ApiResponse, RagError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

// Wire format for the slices of the action API this client touches.

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: QueryPayload,
}

#[derive(Debug, Default, Deserialize)]
struct QueryPayload {
    #[serde(default)]
    search: Vec<SearchHit>,
    #[serde(default)]
    pages: Vec<PageNode>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageNode {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
    #[serde(default)]
    pageprops: HashMap<String, serde_json::Value>,
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    title: String,
}
