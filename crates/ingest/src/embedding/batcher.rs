use std::sync::Arc;

use docvec_core::{EmbeddedFragment, Fragment};

use super::traits::{Embedder, EmbeddingError};

/// Collects fragments and flushes them to the backend when the batch is
/// full, pairing each fragment with its vector.
pub struct EmbeddingBatcher {
    buffer: Vec<Fragment>,
    batch_size: usize,
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            embedder,
        }
    }

    /// Add a fragment to the batch. Returns embedded fragments if the batch
    /// filled up (auto-flush).
    pub async fn add(
        &mut self,
        fragment: Fragment,
    ) -> Result<Option<Vec<EmbeddedFragment>>, EmbeddingError> {
        self.buffer.push(fragment);
        if self.buffer.len() >= self.batch_size {
            Ok(Some(self.flush().await?))
        } else {
            Ok(None)
        }
    }

    /// Force-flush remaining fragments.
    pub async fn flush(&mut self) -> Result<Vec<EmbeddedFragment>, EmbeddingError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<Fragment> = self.buffer.drain(..).collect();
        let texts: Vec<&str> = batch.iter().map(|f| f.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        Ok(batch
            .into_iter()
            .zip(embeddings)
            .map(|(fragment, embedding)| EmbeddedFragment {
                fragment,
                embedding,
            })
            .collect())
    }

    /// Number of fragments currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docvec_core::FragmentKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeEmbedder {
        call_count: AtomicUsize,
        dims: usize,
    }

    impl FakeEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                dims,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![0.0; self.dims]).collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }
    }

    fn fragment(text: &str) -> Fragment {
        Fragment {
            text: text.to_string(),
            source_file: "doc.md".to_string(),
            category: "guides".to_string(),
            seq_index: 0,
            kind: FragmentKind::Markdown,
        }
    }

    #[tokio::test]
    async fn flush_on_batch_size() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 3);

        assert!(batcher.add(fragment("a")).await.unwrap().is_none());
        assert!(batcher.add(fragment("b")).await.unwrap().is_none());
        assert_eq!(batcher.pending(), 2);

        let result = batcher.add(fragment("c")).await.unwrap();
        let embedded = result.expect("third add should auto-flush");
        assert_eq!(embedded.len(), 3);
        assert_eq!(embedded[0].fragment.text, "a");
        assert_eq!(embedded[0].embedding.len(), 4);
        assert_eq!(batcher.pending(), 0);
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_flush_drains_tail() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 100);

        batcher.add(fragment("a")).await.unwrap();
        batcher.add(fragment("b")).await.unwrap();

        let result = batcher.flush().await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test]
    async fn flush_empty_is_noop() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 10);

        let result = batcher.flush().await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }
}
