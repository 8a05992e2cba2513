use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid embedding configuration: {0}")]
    Config(String),
}

/// Embedding backend -- a black-box function from text to a fixed-dimension
/// vector, reached over HTTP. The same backend must be used at ingest and
/// query time so vectors are comparable.
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Embed a batch of texts, returning one vector per input, in order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}
