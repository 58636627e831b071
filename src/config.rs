//! Environment-driven configuration.
//!
//! Settings are resolved from the process environment (with a `.env` file
//! honored when present) and validated up front so the pipeline can fail
//! fast on a missing API key or incoherent chunking parameters.

use std::path::PathBuf;

use tokio::fs;

use crate::types::RagError;

pub const DEFAULT_TOPIC: &str = "Artificial Intelligence";
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_PAGES_DIR: &str = "wikipedia_pages";
pub const DEFAULT_VECTOR_STORE_DIR: &str = "vectorstore";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_TOP_K: usize = 3;

/// File created on first run so operators have a template to copy from.
pub const ENV_TEMPLATE_FILE: &str = ".env_example";

const ENV_TEMPLATE: &str = r#"# Example environment variables for the wikismith pipeline

# API key for the hosted Gemini models (required)
GOOGLE_API_KEY=""

# Wikipedia topic to scrape
WIKIPEDIA_TOPIC="Artificial Intelligence"

# Chunking parameters
CHUNK_SIZE=500
CHUNK_OVERLAP=100

# Optional overrides
# WIKIPEDIA_LANG="en"
# SUMMARY_ONLY=false
# PAGES_DIR="wikipedia_pages"
# VECTOR_STORE_DIR="vectorstore"
# GEMINI_CHAT_MODEL="gemini-2.0-flash"
# GEMINI_EMBEDDING_MODEL="text-embedding-004"
# RAG_TOP_K=3
# RAG_INTERACTIVE=false
"#;

/// Fully resolved runtime configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_key: String,
    pub topic: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub language: String,
    pub summary_only: bool,
    pub pages_dir: PathBuf,
    pub vector_store_dir: PathBuf,
    pub chat_model: String,
    pub embedding_model: String,
    pub top_k: usize,
    pub interactive: bool,
}

impl Settings {
    /// Resolves settings from the process environment, loading a `.env`
    /// file first when one exists.
    pub fn from_env() -> Result<Self, RagError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary lookup function. Tests inject
    /// a map here instead of mutating the process environment.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, RagError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("GOOGLE_API_KEY").ok_or_else(|| {
            RagError::Config(
                "GOOGLE_API_KEY is not set; add it to your environment or .env file".to_string(),
            )
        })?;

        let chunk_size = parse_usize(&get, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_usize(&get, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        if chunk_size == 0 {
            return Err(RagError::Config(
                "CHUNK_SIZE must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "CHUNK_OVERLAP ({chunk_overlap}) must be smaller than CHUNK_SIZE ({chunk_size})"
            )));
        }

        let top_k = parse_usize(&get, "RAG_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(RagError::Config(
                "RAG_TOP_K must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            topic: get("WIKIPEDIA_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            chunk_size,
            chunk_overlap,
            language: get("WIKIPEDIA_LANG").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            summary_only: parse_flag(&get, "SUMMARY_ONLY", false)?,
            pages_dir: get("PAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES_DIR)),
            vector_store_dir: get("VECTOR_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VECTOR_STORE_DIR)),
            chat_model: get("GEMINI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: get("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            top_k,
            interactive: parse_flag(&get, "RAG_INTERACTIVE", false)?,
        })
    }
}

fn parse_usize(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, RagError> {
    match get(key) {
        Some(raw) => raw.trim().parse::<usize>().map_err(|err| {
            RagError::Config(format!("failed to parse {key} ('{raw}'): {err}"))
        }),
        None => Ok(default),
    }
}

fn parse_flag(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, RagError> {
    match get(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(RagError::Config(format!(
                "{key} must be a boolean, got '{other}'"
            ))),
        },
        None => Ok(default),
    }
}

/// Writes the example environment file on first run. Returns `true` when
/// the file was created.
pub async fn ensure_env_template() -> Result<bool, RagError> {
    if fs::try_exists(ENV_TEMPLATE_FILE).await? {
        return Ok(false);
    }
    fs::write(ENV_TEMPLATE_FILE, ENV_TEMPLATE).await?;
    Ok(true)
}
