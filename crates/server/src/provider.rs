//! Lazily-initialized, process-wide embedding backend.
//!
//! The backend is built on first use and shared for the lifetime of the
//! process. Initialization is single-flight: when several queries arrive
//! before the first build completes, one caller performs it and the rest
//! await the same in-flight initialization.

use std::sync::Arc;

use tokio::sync::OnceCell;

use docvec_core::config::EmbeddingConfig;
use docvec_ingest::embedding::{create_embedder, Embedder, EmbeddingError};

pub struct EmbedderProvider {
    config: EmbeddingConfig,
    cell: OnceCell<Arc<dyn Embedder>>,
}

impl EmbedderProvider {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// The shared backend handle, building it on first call.
    pub async fn get(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let embedder = self
            .cell
            .get_or_try_init(|| async {
                tracing::info!(provider = %self.config.provider, "initializing embedding backend");
                create_embedder(&self.config)
            })
            .await?;
        Ok(embedder.clone())
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embedder = self.get().await?;
        let mut vectors = embedder.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Api("backend returned no vector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            dimensions: 8,
            batch_size: 4,
            openai_api_key: None,
            openai_base_url: None,
            openai_model: "text-embedding-3-small".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "nomic-embed-text".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_the_same_handle_on_every_call() {
        let provider = EmbedderProvider::new(test_config());
        let a = provider.get().await.unwrap();
        let b = provider.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_initialization() {
        let provider = Arc::new(EmbedderProvider::new(test_config()));
        let (a, b) = tokio::join!(provider.get(), provider.get());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn unknown_provider_surfaces_config_error() {
        let mut config = test_config();
        config.provider = "onnx".to_string();
        let provider = EmbedderProvider::new(config);
        let err = provider.get().await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Config(_)));
    }
}
