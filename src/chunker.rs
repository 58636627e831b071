//! Fixed-size overlapping text windows over stored pages.

use crate::store::PageStore;
use crate::types::RagError;

/// One retrieval unit: a window of the source text plus its position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this window in the sequence.
    pub index: usize,
    /// Character offset of the window start in the source text.
    pub offset: usize,
    pub text: String,
}

/// Splits text into windows of at most `chunk_size` characters, each window
/// starting `chunk_size - overlap` characters after the previous start.
#[derive(Clone, Copy, Debug)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Chunking(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(RagError::Chunking(format!(
                "overlap ({overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Splits `text` into ordered, overlapping windows. Offsets and sizes
    /// are measured in characters; windows never split a code point. The
    /// same input always yields the same sequence.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Byte boundary of every char, plus the end of the text, so windows
        // can be sliced without re-scanning.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            chunks.push(Chunk {
                index: chunks.len(),
                offset: start,
                text: text[boundaries[start]..boundaries[end]].to_string(),
            });
            if end == total_chars {
                break;
            }
            start += self.stride();
        }
        chunks
    }
}

/// Loads the stored page for `topic` and splits it. Fails fast when the
/// topic was never scraped.
pub async fn chunk_stored_page(
    store: &PageStore,
    topic: &str,
    chunker: &TextChunker,
) -> Result<Vec<Chunk>, RagError> {
    let text = store.load(topic).await?;
    let chunks = chunker.split(&text);
    tracing::info!(topic = %topic, chunks = chunks.len(), "chunked stored page");
    Ok(chunks)
}
