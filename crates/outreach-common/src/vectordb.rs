/// LanceDB vector database wrapper.
///
/// Provides a typed interface over a local LanceDB directory for storing and searching
/// vector embeddings. Table schemas are owned by the callers; this wrapper only assumes a
/// single vector column per table so `vector_search` can find it without being told.
use std::sync::Arc;

use arrow_array::{RecordBatch, RecordBatchIterator};
use arrow_schema::Schema;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::info;

use crate::error::CommonError;

pub struct VectorDb {
    db: lancedb::Connection,
}

impl VectorDb {
    /// Connect to a LanceDB database at the given filesystem path, creating it if absent.
    pub async fn connect(path: &str) -> Result<Self, CommonError> {
        let db = lancedb::connect(path)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("connection failed: {e}")))?;
        Ok(Self { db })
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool, CommonError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("listing tables failed: {e}")))?;
        Ok(names.iter().any(|n| n == table_name))
    }

    /// Number of rows in the table, optionally restricted by a SQL `filter`.
    ///
    /// A missing table counts as empty.
    pub async fn count_rows(
        &self,
        table_name: &str,
        filter: Option<String>,
    ) -> Result<usize, CommonError> {
        if !self.table_exists(table_name).await? {
            return Ok(0);
        }
        let table = self.open(table_name).await?;
        table
            .count_rows(filter)
            .await
            .map_err(|e| CommonError::VectorDb(format!("count rows failed: {e}")))
    }

    /// Create or replace a table with the given schema and data.
    ///
    /// This drops the existing table (if any) and creates a fresh one.
    pub async fn create_or_replace_table(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
        batches: Vec<RecordBatch>,
    ) -> Result<(), CommonError> {
        // Table may not exist yet
        let _ = self.db.drop_table(table_name).await;

        let batch_iter = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);
        self.db
            .create_table(table_name, Box::new(batch_iter))
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("create table failed: {e}")))?;

        info!(table = table_name, "vector table created");
        Ok(())
    }

    /// Search for the nearest vectors to the given query embedding.
    ///
    /// Returns up to `limit` results as RecordBatches, including a `_distance` column
    /// added by LanceDB.
    pub async fn search(
        &self,
        table_name: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RecordBatch>, CommonError> {
        let table = self.open(table_name).await?;

        let results = table
            .vector_search(query_embedding)
            .map_err(|e| CommonError::VectorDb(format!("vector search setup failed: {e}")))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("vector search failed: {e}")))?;

        futures::TryStreamExt::try_collect(results)
            .await
            .map_err(|e| CommonError::VectorDb(format!("collecting search results failed: {e}")))
    }

    /// Read every row of a table. Intended for small tables only.
    pub async fn scan(&self, table_name: &str) -> Result<Vec<RecordBatch>, CommonError> {
        let table = self.open(table_name).await?;
        let results = table
            .query()
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("scan failed: {e}")))?;

        futures::TryStreamExt::try_collect(results)
            .await
            .map_err(|e| CommonError::VectorDb(format!("collecting scan results failed: {e}")))
    }

    async fn open(&self, table_name: &str) -> Result<lancedb::Table, CommonError> {
        self.db
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("open table failed: {e}")))
    }
}
