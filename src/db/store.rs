//! Single-document store.
//!
//! The site has exactly one document, addressed by [`DOCUMENT_ID`]. The store
//! only knows how to load it, replace it wholesale and seed it once; merging
//! sections is the caller's job.

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::models::{Document, SiteDataRow};
use super::DOCUMENT_ID;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// The row exists but its `data` is not a JSON object.
    #[error("stored document is not a JSON object: {0}")]
    Malformed(#[source] sqlx::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the backing table if it is missing.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Current document, or an empty one when nothing has been stored yet.
    async fn load_document(&self) -> Result<Document, StoreError>;

    /// Replaces the stored document. Last writer wins.
    async fn save_document(&self, doc: &Document) -> Result<(), StoreError>;

    /// Stores `default` only if no document exists. Returns whether it did.
    async fn seed_if_empty(&self, default: &Document) -> Result<bool, StoreError>;

    /// Round-trip latency to the backend.
    async fn health_check(&self) -> Result<Duration, StoreError>;
}

/// Postgres-backed store: one JSONB row in `site_data`.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        super::run_migrations(&self.pool).await?;
        Ok(())
    }

    async fn load_document(&self) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, SiteDataRow>(
            "SELECT id, data, updated_at FROM site_data WHERE id = $1",
        )
        .bind(DOCUMENT_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::ColumnDecode { .. } => StoreError::Malformed(e),
            other => StoreError::Unavailable(other),
        })?;

        match row {
            Some(row) => {
                tracing::debug!(updated_at = %row.updated_at, "loaded site document");
                Ok(row.data.0)
            }
            None => {
                tracing::debug!("no site document stored yet");
                Ok(Document::default())
            }
        }
    }

    async fn save_document(&self, doc: &Document) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO site_data (id, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = now()
            "#,
        )
        .bind(DOCUMENT_ID)
        .bind(Json(doc))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn seed_if_empty(&self, default: &Document) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO site_data (id, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(DOCUMENT_ID)
        .bind(Json(default))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<Duration, StoreError> {
        Ok(super::health_check(&self.pool).await?)
    }
}

/// In-process store for development runs without `DATABASE_URL` and for tests.
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    document: RwLock<Option<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            document: RwLock::new(Some(doc)),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_document(&self) -> Result<Document, StoreError> {
        Ok(self.document.read().await.clone().unwrap_or_default())
    }

    async fn save_document(&self, doc: &Document) -> Result<(), StoreError> {
        *self.document.write().await = Some(doc.clone());
        Ok(())
    }

    async fn seed_if_empty(&self, default: &Document) -> Result<bool, StoreError> {
        let mut slot = self.document.write().await;
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(default.clone());
        Ok(true)
    }

    async fn health_check(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _guard = self.document.read().await;
        Ok(start.elapsed())
    }
}
