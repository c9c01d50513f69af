/// Error types for the infrastructure shared by the cold-mail pipeline.
///
/// These cover the embedded vector database and the embedding model. Application errors
/// live in the binary crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("vector db error: {0}")]
    VectorDb(String),

    #[error("embedding error: {0}")]
    Embedding(String),
}
