//! Screenshot captioning through a vision model.
//!
//! Each image becomes exactly one description fragment (`seq_index` 0).
//! Failures here are per-item: the pipeline logs and skips a bad image
//! rather than aborting the run.

use base64::Engine;
use serde_json::json;
use thiserror::Error;

use docvec_core::{Fragment, FragmentKind};

use crate::walker::ImageSource;

const VISION_PROMPT: &str = "You are analyzing a screenshot from a software product's \
documentation. Describe in detail what is visible: interface elements, buttons, menus, \
form fields, displayed data, error messages if any, and the overall context of the \
screen. Be specific and technical - the description will be used for semantic search.";

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("IO error reading image: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Model returned no description for {0}")]
    EmptyDescription(String),
}

/// Map a file extension to the mime type sent in the data URL.
fn mime_for(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// OpenAI-compatible vision client producing description fragments.
pub struct ImageDescriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ImageDescriber {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
            model,
        }
    }

    /// Caption one screenshot, returning its description fragment.
    pub async fn describe(&self, image: &ImageSource) -> Result<Fragment, VisionError> {
        let extension = image
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mime = mime_for(extension)
            .ok_or_else(|| VisionError::UnsupportedFormat(format!(".{extension}")))?;

        let bytes = tokio::fs::read(&image.path).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": VISION_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{mime};base64,{encoded}"),
                            "detail": "high"
                        }
                    }
                ]
            }],
            "max_tokens": 1024,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(format!("{status}: {text}")));
        }

        let resp: serde_json::Value = response.json().await?;
        let description = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();
        if description.is_empty() {
            return Err(VisionError::EmptyDescription(image.file_name.clone()));
        }

        Ok(Fragment {
            text: description,
            source_file: image.file_name.clone(),
            category: image.category.clone(),
            seq_index: 0,
            kind: FragmentKind::ImageDescription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_mapping_covers_allow_list() {
        assert_eq!(mime_for("png"), Some("image/png"));
        assert_eq!(mime_for("jpg"), Some("image/jpeg"));
        assert_eq!(mime_for("JPEG"), Some("image/jpeg"));
        assert_eq!(mime_for("gif"), Some("image/gif"));
        assert_eq!(mime_for("webp"), Some("image/webp"));
        assert_eq!(mime_for("svg"), None);
        assert_eq!(mime_for(""), None);
    }
}
