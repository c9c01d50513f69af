/// Text embedding behind a small trait, with a fastembed-backed implementation.
///
/// `TextEmbedding` from fastembed is synchronous and CPU-bound. All embed calls go through
/// `tokio::task::spawn_blocking`, with the model shared through an `Arc`.
///
/// The default model is all-MiniLM-L6-v2 (384 dimensions). It takes raw text with no
/// task prefixes, so documents and queries are embedded the same way.
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CommonError;

const MINI_LM_DIMENSIONS: usize = 384;

/// Anything that can turn text into fixed-size vectors for the vector store.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed documents for indexing. Output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError>;

    /// Embed a single query for search.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError>;

    /// Dimensionality of every vector this embedder returns.
    fn dimensions(&self) -> usize;
}

/// Wraps fastembed's `TextEmbedding` model for generating vector embeddings.
pub struct Embedder {
    model: Arc<fastembed::TextEmbedding>,
}

impl Embedder {
    /// Initialize the embedding model (all-MiniLM-L6-v2).
    ///
    /// This downloads the model on first run (~90MB) into `cache_dir` when given, otherwise
    /// into fastembed's default cache location.
    pub async fn new(cache_dir: Option<PathBuf>) -> Result<Self, CommonError> {
        let model = tokio::task::spawn_blocking(move || {
            let mut options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(true);
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }
            fastembed::TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
        .map_err(|e| CommonError::Embedding(format!("model initialization failed: {e}")))?;

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    /// Documents are processed in small batches to bound peak memory during ONNX inference.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        let owned = texts.to_vec();
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(owned, Some(16)))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("document embedding failed: {e}")))
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError> {
        let input = vec![query.to_string()];
        let model = Arc::clone(&self.model);
        let mut results = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("query embedding failed: {e}")))?;
        results
            .pop()
            .ok_or_else(|| CommonError::Embedding("empty embedding result".to_string()))
    }

    fn dimensions(&self) -> usize {
        MINI_LM_DIMENSIONS
    }
}
