//! Chunker configuration.

/// Configuration for the Markdown chunker.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Token budget per fragment (default: 500).
    pub max_tokens: usize,
    /// Carry the last seen section header into the fragment opened after a
    /// size-triggered split (default: true). This is the only context
    /// mechanism -- adjacent fragments never share body content.
    pub header_context: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            header_context: true,
        }
    }
}
