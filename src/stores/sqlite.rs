//! SQLite-backed embedding store.
//!
//! Rows live in `parsed_final`; vectors are mirrored into a `vec0` virtual
//! table (sqlite-vec) so they remain queryable for similarity search later,
//! even though no retrieval is performed here.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension, ffi};
use uuid::Uuid;

use super::{EmbeddingRecord, EmbeddingStore};
use crate::types::IngestError;

#[derive(Clone)]
pub struct SqliteEmbeddingStore {
    conn: Connection,
    dimensions: usize,
}

impl SqliteEmbeddingStore {
    /// Opens (or creates) the store at `path` for vectors of width `dimensions`.
    pub async fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self, IngestError> {
        register_sqlite_vec()?;

        let conn = Connection::open(path)
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;

        // Confirm the vec extension actually loaded before creating tables.
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map(|_| ())
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(|err| IngestError::Storage(err.to_string()))?;

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS parsed_final (
                     id TEXT PRIMARY KEY,
                     content TEXT NOT NULL,
                     embedding TEXT NOT NULL,
                     original_doc_id TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_parsed_final_doc
                     ON parsed_final (original_doc_id);
                 CREATE VIRTUAL TABLE IF NOT EXISTS parsed_final_vec USING vec0(
                     id TEXT PRIMARY KEY,
                     embedding FLOAT[{dimensions}]
                 );"
            ))
            .map_err(tokio_rusqlite::Error::Rusqlite)?;
            Ok(())
        })
        .await
        .map_err(|err| IngestError::Storage(err.to_string()))?;

        Ok(Self { conn, dimensions })
    }

    /// Total number of stored rows.
    pub async fn count(&self) -> Result<usize, IngestError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM parsed_final", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))
    }

    /// Looks up one row by chunk id.
    pub async fn get(&self, id: Uuid) -> Result<Option<EmbeddingRecord>, IngestError> {
        let key = id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, content, embedding, original_doc_id
                     FROM parsed_final WHERE id = ?1",
                    [&key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;

        row.map(decode_row).transpose()
    }

    /// Returns every row ingested from one document.
    pub async fn get_by_document(
        &self,
        doc_id: Uuid,
    ) -> Result<Vec<EmbeddingRecord>, IngestError> {
        let key = doc_id.to_string();
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, content, embedding, original_doc_id
                         FROM parsed_final WHERE original_doc_id = ?1",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map([&key], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let mut raw = Vec::new();
                for row in rows {
                    raw.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(raw)
            })
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;

        rows.into_iter().map(decode_row).collect()
    }
}

/// Decodes one raw row, refusing corrupt ids or vectors rather than
/// defaulting them.
fn decode_row(
    (id, content, embedding, original_doc_id): (String, String, String, String),
) -> Result<EmbeddingRecord, IngestError> {
    Ok(EmbeddingRecord {
        id: Uuid::parse_str(&id)
            .map_err(|err| IngestError::Storage(format!("corrupt id in row '{id}': {err}")))?,
        content,
        embedding: serde_json::from_str(&embedding).map_err(|err| {
            IngestError::Storage(format!("corrupt embedding in row '{id}': {err}"))
        })?,
        original_doc_id: Uuid::parse_str(&original_doc_id).map_err(|err| {
            IngestError::Storage(format!("corrupt document id in row '{id}': {err}"))
        })?,
    })
}

#[async_trait]
impl EmbeddingStore for SqliteEmbeddingStore {
    async fn insert(&self, record: EmbeddingRecord) -> Result<(), IngestError> {
        if record.embedding.len() != self.dimensions {
            return Err(IngestError::Storage(format!(
                "embedding has {} dimensions, store expects {}",
                record.embedding.len(),
                self.dimensions
            )));
        }

        let embedding_json = serde_json::to_string(&record.embedding)
            .map_err(|err| IngestError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let id = record.id.to_string();
                let tx = conn.transaction().map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.execute(
                    "INSERT INTO parsed_final (id, content, embedding, original_doc_id)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                         content = excluded.content,
                         embedding = excluded.embedding,
                         original_doc_id = excluded.original_doc_id",
                    (
                        &id,
                        &record.content,
                        &embedding_json,
                        record.original_doc_id.to_string(),
                    ),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                // vec0 tables have no upsert; replace the mirrored vector.
                tx.execute("DELETE FROM parsed_final_vec WHERE id = ?1", [&id])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.execute(
                    "INSERT INTO parsed_final_vec (id, embedding) VALUES (?1, vec_f32(?2))",
                    (&id, &embedding_json),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))
    }
}

/// Registers sqlite-vec as an auto extension, once per process.
fn register_sqlite_vec() -> Result<(), IngestError> {
    static REGISTER: Once = Once::new();
    static STATUS: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    REGISTER.call_once(|| {
        let rc = unsafe {
            type ExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *const c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init = transmute::<unsafe extern "C" fn(), ExtensionInit>(init);
            ffi::sqlite3_auto_extension(Some(init))
        };
        let outcome = if rc == 0 {
            Ok(())
        } else {
            Err(format!("sqlite-vec registration failed (code {rc})"))
        };
        *STATUS.lock().expect("sqlite-vec status lock poisoned") = Some(outcome);
    });

    STATUS
        .lock()
        .expect("sqlite-vec status lock poisoned")
        .clone()
        .unwrap_or(Ok(()))
        .map_err(IngestError::Storage)
}
