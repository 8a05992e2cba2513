//! Offline ingestion pipeline: documentation tree → fragments → embeddings
//! → vector index.
//!
//! The pieces, in pipeline order:
//! - **walker**: collects `.md` files and screenshots from the category tree
//! - **chunker**: splits Markdown into bounded, context-preserving fragments
//! - **vision**: turns each screenshot into one description fragment
//! - **embedding**: pluggable backends plus a fixed-size batcher
//!
//! The `docvec-ingest` binary wires these into a one-shot full rebuild of
//! the index.

pub mod chunker;
pub mod embedding;
pub mod vision;
pub mod walker;

pub use chunker::{chunk_markdown, ChunkConfig};
pub use embedding::{Embedder, EmbeddingBatcher, EmbeddingError};
pub use vision::ImageDescriber;
pub use walker::{collect_sources, DocSources};
