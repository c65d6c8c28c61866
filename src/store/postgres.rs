use serde::{de::DeserializeOwned, Serialize};
use sqlx::{types::Json, PgPool, Row};
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// A Postgres table used as a document collection: one JSONB document per id.
///
/// Every operation touches a single row. [`PgDocuments::update`] reads the row
/// with `FOR UPDATE` and writes it back in the same transaction, which gives
/// per-document atomic read-modify-write without spanning documents.
#[derive(Clone)]
pub struct PgDocuments {
    pool: PgPool,
    table: &'static str,
}

fn db_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Document store operation failed");
    AppError::DatabaseError(e.to_string())
}

impl PgDocuments {
    pub fn new(pool: PgPool, table: &'static str) -> Self {
        Self { pool, table }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self), fields(table = self.table))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, doc JSONB NOT NULL)",
            self.table
        );
        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        debug!("Document table ready");
        Ok(())
    }

    /// Inserts a new document. Returns false if the id is already taken.
    #[instrument(skip(self, doc), fields(table = self.table))]
    pub async fn insert<T: Serialize + Sync>(&self, id: &str, doc: &T) -> Result<bool, AppError> {
        let statement = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            self.table
        );
        let result = sqlx::query(&statement)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict(db.message().to_string())
                }
                _ => db_error(e),
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(table = self.table))]
    pub async fn fetch<T: DeserializeOwned + Send + Unpin + 'static>(
        &self,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        let statement = format!("SELECT doc FROM {} WHERE id = $1", self.table);
        let row = sqlx::query(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => {
                let Json(doc) = row.try_get::<Json<T>, _>("doc").map_err(db_error)?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// Finds the first document whose top-level string `field` equals `value`
    #[instrument(skip(self), fields(table = self.table))]
    pub async fn find_by_field<T: DeserializeOwned + Send + Unpin + 'static>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, AppError> {
        let statement = format!("SELECT doc FROM {} WHERE doc->>$1 = $2 LIMIT 1", self.table);
        let row = sqlx::query(&statement)
            .bind(field)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => {
                let Json(doc) = row.try_get::<Json<T>, _>("doc").map_err(db_error)?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(table = self.table))]
    pub async fn fetch_all<T: DeserializeOwned + Send + Unpin + 'static>(
        &self,
    ) -> Result<Vec<T>, AppError> {
        let statement = format!("SELECT doc FROM {} ORDER BY id", self.table);
        let rows = sqlx::query(&statement)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<Json<T>, _>("doc")
                    .map(|Json(doc)| doc)
                    .map_err(db_error)
            })
            .collect()
    }

    #[instrument(skip(self), fields(table = self.table))]
    pub async fn fetch_ids(&self) -> Result<Vec<String>, AppError> {
        let statement = format!("SELECT id FROM {} ORDER BY id", self.table);
        let rows = sqlx::query(&statement)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("id").map_err(db_error))
            .collect()
    }

    #[instrument(skip(self), fields(table = self.table))]
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let statement = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&statement)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically applies `mutate` to one document. Returns `None` when the
    /// document does not exist.
    #[instrument(skip(self, mutate), fields(table = self.table))]
    pub async fn update<T, R, F>(&self, id: &str, mutate: F) -> Result<Option<R>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static,
        F: FnOnce(&mut T) -> R + Send,
        R: Send,
    {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let select = format!("SELECT doc FROM {} WHERE id = $1 FOR UPDATE", self.table);
        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

        let Some(row) = row else {
            tx.commit().await.map_err(db_error)?;
            debug!(id = %id, "Document not found for update");
            return Ok(None);
        };

        let Json(mut doc) = row.try_get::<Json<T>, _>("doc").map_err(db_error)?;
        let result = mutate(&mut doc);

        let write = format!("UPDATE {} SET doc = $2 WHERE id = $1", self.table);
        sqlx::query(&write)
            .bind(id)
            .bind(Json(&doc))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        debug!(id = %id, "Document updated");
        Ok(Some(result))
    }
}
