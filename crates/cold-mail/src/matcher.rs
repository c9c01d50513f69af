/// Portfolio matching over a persistent LanceDB table.
///
/// The `portfolio` table holds one row per CSV row: a UUID, the tech-stack text that was
/// embedded, the link, the fingerprint of the CSV it came from, and the embedding. A
/// request's CSV is indexed only when the table is empty or was built from different CSV
/// bytes; otherwise the existing rows are reused as-is.
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use tokio::sync::Mutex;
use tracing::{info, warn};

use outreach_common::embedding::TextEmbedder;
use outreach_common::error::CommonError;
use outreach_common::vectordb::VectorDb;

use crate::error::AppError;
use crate::model::{JobPosting, LinkMatch, PortfolioLink, PortfolioSource};
use crate::portfolio::{self, PortfolioTable};

const VECTOR_TABLE_NAME: &str = "portfolio";
const MATCH_LIMIT: usize = 2;

/// What `ensure_indexed` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The table was (re)built from the CSV.
    Ingested { rows: usize },
    /// The table already held exactly this CSV.
    Skipped,
}

pub struct PortfolioMatcher {
    embedder: Arc<dyn TextEmbedder>,
    vectordb: Arc<VectorDb>,
    builtin_portfolio: PathBuf,
    // Serializes the check-then-ingest step between concurrent requests in this process.
    index_lock: Mutex<()>,
}

impl PortfolioMatcher {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        vectordb: Arc<VectorDb>,
        builtin_portfolio: PathBuf,
    ) -> Self {
        Self {
            embedder,
            vectordb,
            builtin_portfolio,
            index_lock: Mutex::new(()),
        }
    }

    pub fn table_name() -> &'static str {
        VECTOR_TABLE_NAME
    }

    /// Find the portfolio links closest to the job's skills.
    ///
    /// With no source selected nothing is indexed or searched and the match is empty.
    pub async fn match_links(
        &self,
        job: &JobPosting,
        source: Option<&PortfolioSource>,
    ) -> Result<LinkMatch, AppError> {
        let Some(source) = source else {
            warn!("no portfolio source selected, drafting without links");
            return Ok(LinkMatch::default());
        };

        let table = portfolio::load_portfolio(&self.source_path(source))?;

        // Held through the search so a concurrent rebuild cannot swap the table underneath it.
        let _guard = self.index_lock.lock().await;
        self.index_if_stale(&table).await?;
        self.search(&job.skills).await
    }

    /// Index `source` unless the table already holds the same CSV.
    pub async fn ensure_indexed(&self, source: &PortfolioSource) -> Result<IngestOutcome, AppError> {
        let table = portfolio::load_portfolio(&self.source_path(source))?;
        let _guard = self.index_lock.lock().await;
        self.index_if_stale(&table).await
    }

    /// Rebuild the table from `source` regardless of its current contents.
    pub async fn reindex(&self, source: &PortfolioSource) -> Result<usize, AppError> {
        let table = portfolio::load_portfolio(&self.source_path(source))?;
        let _guard = self.index_lock.lock().await;
        self.ingest(&table).await
    }

    /// Number of rows currently indexed.
    pub async fn indexed_rows(&self) -> Result<usize, AppError> {
        Ok(self.vectordb.count_rows(VECTOR_TABLE_NAME, None).await?)
    }

    /// Nearest portfolio rows to `query`, best first. Takes no lock; `match_links` is the
    /// guarded entry point.
    pub async fn search(&self, query: &str) -> Result<LinkMatch, AppError> {
        let query_embedding = self.embedder.embed_query(query).await?;
        let batches = self
            .vectordb
            .search(VECTOR_TABLE_NAME, &query_embedding, MATCH_LIMIT)
            .await?;

        let mut links = extract_links(&batches);
        links.truncate(MATCH_LIMIT);
        info!(query, matches = links.len(), "portfolio search complete");
        Ok(LinkMatch { links })
    }

    fn source_path(&self, source: &PortfolioSource) -> PathBuf {
        match source {
            PortfolioSource::Uploaded { path } => path.clone(),
            PortfolioSource::Builtin => self.builtin_portfolio.clone(),
        }
    }

    /// Caller holds `index_lock`.
    async fn index_if_stale(&self, table: &PortfolioTable) -> Result<IngestOutcome, AppError> {
        if !self.needs_update(&table.fingerprint).await? {
            info!(fingerprint = %table.fingerprint, "portfolio index up to date, skipping ingestion");
            return Ok(IngestOutcome::Skipped);
        }

        let rows = self.ingest(table).await?;
        Ok(IngestOutcome::Ingested { rows })
    }

    /// `true` when the table is empty or any row came from a different CSV.
    async fn needs_update(&self, fingerprint: &str) -> Result<bool, AppError> {
        let total = self.vectordb.count_rows(VECTOR_TABLE_NAME, None).await?;
        if total == 0 {
            return Ok(true);
        }
        // Fingerprints are hex digests, so they are safe to inline into the filter.
        let current = self
            .vectordb
            .count_rows(
                VECTOR_TABLE_NAME,
                Some(format!("fingerprint = '{fingerprint}'")),
            )
            .await?;
        if current != total {
            info!(total, current, "portfolio changed since last index");
        }
        Ok(current != total)
    }

    async fn ingest(&self, table: &PortfolioTable) -> Result<usize, AppError> {
        if table.entries.is_empty() {
            return Err(AppError::Portfolio("portfolio has no rows".to_string()));
        }

        let texts: Vec<String> = table.entries.iter().map(|e| e.tech_stack.clone()).collect();
        info!(rows = texts.len(), "embedding portfolio");
        let embeddings = self.embedder.embed_documents(&texts).await?;

        if embeddings.len() != texts.len() {
            return Err(CommonError::Embedding(format!(
                "embedding count mismatch: expected {}, got {}",
                texts.len(),
                embeddings.len()
            ))
            .into());
        }

        let batch = build_record_batch(table, &embeddings, self.embedder.dimensions())?;
        self.vectordb
            .create_or_replace_table(VECTOR_TABLE_NAME, batch.schema(), vec![batch])
            .await?;

        info!(
            rows = table.entries.len(),
            fingerprint = %table.fingerprint,
            "portfolio indexed"
        );
        Ok(table.entries.len())
    }
}

fn build_record_batch(
    table: &PortfolioTable,
    embeddings: &[Vec<f32>],
    dimensions: usize,
) -> Result<RecordBatch, AppError> {
    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
        return Err(CommonError::Embedding(format!(
            "embedding has {} dimensions, expected {dimensions}",
            bad.len()
        ))
        .into());
    }
    let embedding_dim = i32::try_from(dimensions)
        .map_err(|_| CommonError::Embedding(format!("unsupported dimension {dimensions}")))?;

    let ids: Vec<&str> = table.entries.iter().map(|e| e.id.as_str()).collect();
    let stacks: Vec<&str> = table.entries.iter().map(|e| e.tech_stack.as_str()).collect();
    let links: Vec<&str> = table.entries.iter().map(|e| e.link.as_str()).collect();
    let fingerprints = vec![table.fingerprint.as_str(); table.entries.len()];

    let id_array: ArrayRef = Arc::new(StringArray::from(ids));
    let stack_array: ArrayRef = Arc::new(StringArray::from(stacks));
    let link_array: ArrayRef = Arc::new(StringArray::from(links));
    let fingerprint_array: ArrayRef = Arc::new(StringArray::from(fingerprints));

    let item_field = Arc::new(Field::new("item", DataType::Float32, true));
    let flat_values: Vec<f32> = embeddings.iter().flat_map(|e| e.iter().copied()).collect();
    let embedding_array: ArrayRef = Arc::new(
        FixedSizeListArray::try_new(
            Arc::clone(&item_field),
            embedding_dim,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| CommonError::VectorDb(format!("failed to build embedding array: {e}")))?,
    );

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("tech_stack", DataType::Utf8, false),
        Field::new("links", DataType::Utf8, false),
        Field::new("fingerprint", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(item_field, embedding_dim),
            false,
        ),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            id_array,
            stack_array,
            link_array,
            fingerprint_array,
            embedding_array,
        ],
    )
    .map_err(|e| CommonError::VectorDb(format!("failed to build record batch: {e}")).into())
}

/// Expected columns: tech_stack (Utf8), links (Utf8), _distance (Float32)
fn extract_links(batches: &[RecordBatch]) -> Vec<PortfolioLink> {
    let mut results = Vec::new();

    for batch in batches {
        let stack_col = string_column(batch, "tech_stack");
        let link_col = string_column(batch, "links");
        let distance_col = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let (Some(stack_col), Some(link_col)) = (stack_col, link_col) else {
            warn!("search result batch missing expected columns");
            continue;
        };

        for row in 0..batch.num_rows() {
            let distance = distance_col.map(|c| c.value(row)).unwrap_or(0.0);
            results.push(PortfolioLink {
                link: link_col.value(row).to_string(),
                tech_stack: stack_col.value(row).to_string(),
                score: (1.0_f32 - distance).max(0.0),
            });
        }
    }

    results
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    batch
        .column_by_name(name)?
        .as_any()
        .downcast_ref::<StringArray>()
}
