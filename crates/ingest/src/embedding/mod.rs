pub mod batcher;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use batcher::EmbeddingBatcher;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};

use std::sync::Arc;

use docvec_core::config::EmbeddingConfig;

/// Build the configured embedding backend. Ingest and query must agree on
/// this configuration for vectors to be comparable.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                EmbeddingError::Config("OPENAI_API_KEY is required for the openai provider".into())
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key,
                config.openai_model.clone(),
                config.openai_base_url.clone(),
                config.dimensions,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
            config.dimensions,
        ))),
        other => Err(EmbeddingError::Config(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}
