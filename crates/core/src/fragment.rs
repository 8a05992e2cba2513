use serde::{Deserialize, Serialize};

/// Distinguishes chunked Markdown text from image-derived descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Markdown,
    ImageDescription,
}

impl FragmentKind {
    /// Stable tag stored in the index (`kind` column).
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Markdown => "markdown",
            FragmentKind::ImageDescription => "image_description",
        }
    }

    /// Parse the stored tag. Unknown tags fall back to `Markdown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "image_description" => FragmentKind::ImageDescription,
            _ => FragmentKind::Markdown,
        }
    }

    /// Human-readable label used in search result listings.
    pub fn label(&self) -> &'static str {
        match self {
            FragmentKind::Markdown => "Document",
            FragmentKind::ImageDescription => "Image",
        }
    }
}

/// A bounded unit of text extracted from a document or generated from an
/// image -- the atomic unit of indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Non-empty text content (trimmed before emission).
    pub text: String,
    /// File name of the originating document or image.
    pub source_file: String,
    /// Name of the containing top-level directory.
    pub category: String,
    /// Zero-based position within the source document. Contiguous per
    /// document, not globally unique.
    pub seq_index: usize,
    pub kind: FragmentKind,
}

/// A fragment paired with its embedding vector. All vectors in one index
/// share the embedding model's dimension.
#[derive(Debug, Clone)]
pub struct EmbeddedFragment {
    pub fragment: Fragment,
    pub embedding: Vec<f32>,
}
