//! SQLite-backed vector index over chunk embeddings.
//!
//! The index lives as a single database file inside the vector-store
//! directory: a `chunks` table for documents and a `chunks_embeddings`
//! vec0 virtual table for their vectors. Similarity search runs through
//! `sqlite-vec`'s cosine distance. The same embedding model identity must
//! be supplied when building and when querying, or distances are
//! meaningless.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};

use rig::OneOrMany;
use rig::embeddings::EmbeddingModel;
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio_rusqlite::{Connection, ffi};
use tracing::info;
use uuid::Uuid;

use crate::chunker::Chunk;
use crate::types::RagError;

/// File name of the index database inside the vector-store directory.
pub const INDEX_FILE: &str = "chunks.sqlite";

/// One indexed chunk as persisted in the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkDocument {
    pub id: String,
    pub topic: String,
    #[serde(deserialize_with = "deserialize_usize_field")]
    pub chunk_index: usize,
    /// Character offset of the chunk start in the source page.
    #[serde(deserialize_with = "deserialize_usize_field")]
    pub start_offset: usize,
    pub content: String,
}

impl SqliteVectorStoreTable for ChunkDocument {
    fn name() -> &'static str {
        "chunks"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("topic", "TEXT").indexed(),
            Column::new("chunk_index", "TEXT"),
            Column::new("start_offset", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("topic", Box::new(self.topic.clone())),
            ("chunk_index", Box::new(self.chunk_index.to_string())),
            ("start_offset", Box::new(self.start_offset.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

// The store keeps every column as TEXT, so numeric fields come back as
// strings when rows are deserialized.
fn deserialize_usize_field<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(value) => usize::try_from(value)
            .map_err(|_| de::Error::custom(format!("value {value} does not fit in usize"))),
        Repr::Text(text) => text
            .parse::<usize>()
            .map_err(|err| de::Error::custom(format!("unable to parse '{text}': {err}"))),
    }
}

/// Similarity hit returned by [`VectorIndex::search`], best first.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub document: ChunkDocument,
    /// Cosine similarity in `[-1, 1]`; higher is closer.
    pub similarity: f32,
}

/// Persisted similarity index bound to one embedding model.
#[derive(Clone)]
pub struct VectorIndex<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    store: SqliteVectorStore<E, ChunkDocument>,
    /// Separate handle for direct SQL not covered by the store wrapper.
    conn: Connection,
    model: E,
}

impl<E> std::fmt::Debug for VectorIndex<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex").finish_non_exhaustive()
    }
}

impl<E> VectorIndex<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Creates a fresh index in `dir`, replacing any previous database
    /// file there.
    pub async fn create(dir: impl AsRef<Path>, model: E) -> Result<Self, RagError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let db_path = dir.join(INDEX_FILE);
        if fs::try_exists(&db_path).await? {
            fs::remove_file(&db_path).await?;
        }
        Self::open_at(db_path, model).await
    }

    /// Opens the index previously persisted in `dir`. Missing index files
    /// are a fail-fast error: run the indexing step first.
    pub async fn open(dir: impl AsRef<Path>, model: E) -> Result<Self, RagError> {
        let db_path = dir.as_ref().join(INDEX_FILE);
        if !db_path.exists() {
            return Err(RagError::Storage(format!(
                "no vector index at {}; run the indexing step first",
                db_path.display()
            )));
        }
        Self::open_at(db_path, model).await
    }

    async fn open_at(db_path: PathBuf, model: E) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(&db_path)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map(|_| ())
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))?;

        // Clone the connection for direct queries before the store takes it.
        let conn_for_queries = conn.clone();
        let store = SqliteVectorStore::new(conn, &model)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        Ok(Self {
            store,
            conn: conn_for_queries,
            model,
        })
    }

    /// Embeds `chunks` through the configured model, batched to the model's
    /// document limit, and inserts them. Returns the number of documents
    /// written.
    pub async fn index_chunks(&self, topic: &str, chunks: &[Chunk]) -> Result<usize, RagError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let batch_size = E::MAX_DOCUMENTS.max(1);
        let mut rows = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = self
                .model
                .embed_texts(texts)
                .await
                .map_err(|err| RagError::Embedding(err.to_string()))?;
            if embeddings.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "embedding service returned {} vectors for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                let document = ChunkDocument {
                    id: Uuid::new_v4().to_string(),
                    topic: topic.to_string(),
                    chunk_index: chunk.index,
                    start_offset: chunk.offset,
                    content: chunk.text.clone(),
                };
                rows.push((document, OneOrMany::one(embedding)));
            }
        }

        let written = rows.len();
        self.store
            .add_rows(rows)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        info!(topic = %topic, written, "indexed chunks");
        Ok(written)
    }

    /// Embeds `query` and returns the `top_k` nearest chunks, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let embeddings = self
            .model
            .embed_texts(vec![query.to_string()])
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let Some(embedding) = embeddings.into_iter().next() else {
            return Err(RagError::Embedding(
                "embedding service returned no vector for the query".to_string(),
            ));
        };
        self.search_by_vector(&embedding.vec, top_k).await
    }

    async fn search_by_vector(
        &self,
        vector: &[f64],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        let query_vec: Vec<f32> = vector.iter().map(|v| *v as f32).collect();
        let encoded =
            serde_json::to_string(&query_vec).map_err(|err| RagError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT c.id, c.topic, c.chunk_index, c.start_offset, c.content, \
                         vec_distance_cosine(e.embedding, vec_f32(?)) AS distance \
                         FROM chunks c \
                         JOIN chunks_embeddings e ON e.rowid = c.rowid \
                         ORDER BY distance ASC \
                         LIMIT {top_k}"
                    ))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&encoded], |row| {
                        let document = ChunkDocument {
                            id: row.get(0)?,
                            topic: row.get(1)?,
                            chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            start_offset: row.get::<_, String>(3)?.parse().unwrap_or(0),
                            content: row.get(4)?,
                        };
                        let distance: f32 = row.get(5)?;
                        Ok(ScoredChunk {
                            document,
                            similarity: 1.0 - distance,
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    /// Number of chunks stored in the index.
    pub async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }
}

/// Registers the sqlite-vec extension for every connection opened by this
/// process. Safe to call repeatedly; the first result is cached.
fn register_sqlite_vec() -> Result<(), RagError> {
    use std::sync::OnceLock;

    static RESULT: OnceLock<Result<(), String>> = OnceLock::new();

    RESULT
        .get_or_init(|| unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != ffi::SQLITE_OK {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            } else {
                Ok(())
            }
        })
        .clone()
        .map_err(RagError::Storage)
}
