//! Markdown chunker.
//!
//! Splits a document into fragments that each fit a token budget, packing
//! greedily at paragraph granularity and falling back to line granularity
//! for paragraphs that alone exceed the budget. When a split is triggered
//! by the budget, the most recently seen section header is re-injected at
//! the start of the next fragment so every fragment stays self-describing
//! in a standalone relevance search.

mod heading;
mod types;

pub use heading::{heading_of, Heading};
pub use types::ChunkConfig;

use docvec_core::{Fragment, FragmentKind};


/// 1 word ≈ 1.3 tokens. The multiplier and the ceiling are load-bearing:
/// any index built under this estimate assumes the same budget arithmetic.
const TOKENS_PER_WORD: f64 = 1.3;

/// Estimate the token count of `text` from its whitespace-delimited words.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Accumulates parts for the fragment under construction and emits
/// completed fragments. The sequence counter advances only when a fragment
/// is actually emitted, keeping indices contiguous from zero.
struct FragmentBuffer<'a> {
    source_file: &'a str,
    category: &'a str,
    parts: Vec<String>,
    tokens: usize,
    emitted: Vec<Fragment>,
}

impl<'a> FragmentBuffer<'a> {
    fn new(source_file: &'a str, category: &'a str) -> Self {
        Self {
            source_file,
            category,
            parts: Vec::new(),
            tokens: 0,
            emitted: Vec::new(),
        }
    }

    fn push(&mut self, part: &str) {
        self.tokens += estimate_tokens(part);
        self.parts.push(part.to_string());
    }

    /// Emit the buffered parts as one fragment, if any non-blank content
    /// accumulated, and reset the buffer.
    fn flush(&mut self) {
        if self.parts.is_empty() {
            return;
        }
        let text = self.parts.join("\n\n").trim().to_string();
        self.parts.clear();
        self.tokens = 0;
        if text.is_empty() {
            return;
        }
        self.emitted.push(Fragment {
            text,
            source_file: self.source_file.to_string(),
            category: self.category.to_string(),
            seq_index: self.emitted.len(),
            kind: FragmentKind::Markdown,
        });
    }

    /// Start the next fragment with the carried header, when the caller
    /// has one to carry.
    fn restart_with(&mut self, header: &str) {
        if !header.is_empty() {
            self.push(header);
        }
    }
}

/// Split a Markdown document into ordered fragments within the token
/// budget. A single line that alone exceeds the budget becomes an
/// oversized fragment of its own rather than being cut mid-line.
pub fn chunk_markdown(
    text: &str,
    source_file: &str,
    category: &str,
    config: &ChunkConfig,
) -> Vec<Fragment> {
    let mut buf = FragmentBuffer::new(source_file, category);
    let mut last_header = String::new();

    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        if heading_of(para).is_some() {
            last_header = para.to_string();
        }

        let para_tokens = estimate_tokens(para);

        // A paragraph over the budget is re-segmented line by line with the
        // same greedy rule.
        if para_tokens > config.max_tokens {
            buf.flush();
            for line in para.lines() {
                let line_tokens = estimate_tokens(line);
                if buf.tokens + line_tokens > config.max_tokens && !buf.parts.is_empty() {
                    buf.flush();
                    if config.header_context {
                        buf.restart_with(&last_header);
                    }
                }
                if heading_of(line).is_some() {
                    last_header = line.trim().to_string();
                }
                buf.push(line);
            }
            continue;
        }

        if buf.tokens + para_tokens > config.max_tokens && !buf.parts.is_empty() {
            buf.flush();
            if config.header_context {
                buf.restart_with(&last_header);
            }
        }
        buf.push(para);
    }

    buf.flush();
    buf.emitted
}
