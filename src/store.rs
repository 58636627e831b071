//! Persistence for fetched article text.
//!
//! Pages land as UTF-8 text files under a flat directory, named by a
//! filesystem-safe slug of the topic. Re-scraping a topic overwrites its
//! file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::types::RagError;

/// Derives a filesystem-safe file name stem from an article title: keeps
/// alphanumerics, spaces, underscores, and hyphens, then trims trailing
/// whitespace.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Directory of stored article text files.
#[derive(Clone, Debug)]
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Conventional on-disk path for a topic's text file.
    pub fn page_path(&self, title: &str) -> PathBuf {
        self.root.join(format!("{}.txt", sanitize_title(title)))
    }

    /// Writes `content` for `title`, creating the directory if needed and
    /// overwriting any previous version.
    pub async fn save(&self, title: &str, content: &str) -> Result<PathBuf, RagError> {
        fs::create_dir_all(&self.root).await?;
        let path = self.page_path(title);
        fs::write(&path, content).await?;
        info!(path = %path.display(), "saved page");
        Ok(path)
    }

    /// Reads a stored page back, failing when the topic was never scraped.
    pub async fn load(&self, topic: &str) -> Result<String, RagError> {
        let path = self.page_path(topic);
        if !path.exists() {
            return Err(RagError::PageNotFound {
                topic: topic.to_string(),
                path,
            });
        }
        Ok(fs::read_to_string(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_drops_punctuation_and_trailing_whitespace() {
        assert_eq!(sanitize_title("AI: Overview?!"), "AI Overview");
        assert_eq!(sanitize_title("C++ (language)  "), "C language");
        assert_eq!(sanitize_title("snake_case-name"), "snake_case-name");
    }

    #[test]
    fn sanitize_keeps_non_ascii_letters() {
        assert_eq!(sanitize_title("Łódź"), "Łódź");
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path());

        store.save("Rust (programming language)", "fearless").await.unwrap();
        let text = store.load("Rust (programming language)").await.unwrap();
        assert_eq!(text, "fearless");
    }

    #[tokio::test]
    async fn save_overwrites_previous_content() {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path());

        store.save("Topic", "first").await.unwrap();
        store.save("Topic", "second").await.unwrap();
        assert_eq!(store.load("Topic").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn load_of_unscraped_topic_fails() {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path());

        let err = store.load("Never Fetched").await.unwrap_err();
        assert!(matches!(err, RagError::PageNotFound { .. }));
    }
}
