//! Documentation tree walker.
//!
//! The docs root has a fixed two-level shape: every top-level directory is
//! a category, holding `.md` files and optionally an `images/` subdirectory
//! of screenshots. Anything else is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use docvec_core::DocvecError;

/// Image formats accepted for captioning.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// One Markdown file to be chunked.
#[derive(Debug, Clone)]
pub struct MarkdownSource {
    pub path: PathBuf,
    pub file_name: String,
    pub category: String,
}

/// One screenshot to be captioned.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub path: PathBuf,
    pub file_name: String,
    pub category: String,
}

/// Everything the pipeline will ingest, in deterministic order.
#[derive(Debug, Default)]
pub struct DocSources {
    pub markdowns: Vec<MarkdownSource>,
    pub images: Vec<ImageSource>,
}

impl DocSources {
    pub fn is_empty(&self) -> bool {
        self.markdowns.is_empty() && self.images.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Collect Markdown and image sources under `docs_dir`, optionally
/// restricted to a single category.
pub fn collect_sources(
    docs_dir: &Path,
    category_filter: Option<&str>,
) -> Result<DocSources, DocvecError> {
    if !docs_dir.is_dir() {
        return Err(DocvecError::Config(format!(
            "docs directory not found: {}",
            docs_dir.display()
        )));
    }

    let mut sources = DocSources::default();

    for entry in sorted_entries(docs_dir)? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let category = entry.file_name().to_string_lossy().into_owned();
        if let Some(filter) = category_filter {
            if category != filter {
                continue;
            }
        }

        for item in sorted_entries(&path)? {
            let item_path = item.path();
            let name = item.file_name().to_string_lossy().into_owned();

            if item_path.is_file() && name.ends_with(".md") {
                sources.markdowns.push(MarkdownSource {
                    path: item_path,
                    file_name: name,
                    category: category.clone(),
                });
            } else if item_path.is_dir() && name == "images" {
                for img in sorted_entries(&item_path)? {
                    let img_path = img.path();
                    if img_path.is_file() && has_image_extension(&img_path) {
                        sources.images.push(ImageSource {
                            file_name: img.file_name().to_string_lossy().into_owned(),
                            path: img_path,
                            category: category.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};
    use std::io::Write;

    fn touch(path: &Path, content: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        create_dir_all(root.join("setup/images")).unwrap();
        touch(&root.join("setup/install.md"), "# Install");
        touch(&root.join("setup/upgrade.md"), "# Upgrade");
        touch(&root.join("setup/images/screen.png"), "png");
        touch(&root.join("setup/images/photo.JPG"), "jpg");
        touch(&root.join("setup/images/notes.txt"), "not an image");

        create_dir_all(root.join("billing")).unwrap();
        touch(&root.join("billing/invoices.md"), "# Invoices");
        touch(&root.join("billing/readme.txt"), "ignored");

        // Stray top-level file: not a category.
        touch(&root.join("README.md"), "ignored");

        dir
    }

    #[test]
    fn collects_markdowns_and_images_per_category() {
        let dir = sample_tree();
        let sources = collect_sources(dir.path(), None).unwrap();

        let md_names: Vec<_> = sources.markdowns.iter().map(|m| m.file_name.as_str()).collect();
        assert_eq!(md_names, vec!["invoices.md", "install.md", "upgrade.md"]);
        assert_eq!(sources.markdowns[0].category, "billing");
        assert_eq!(sources.markdowns[1].category, "setup");
        assert_eq!(sources.markdowns[2].category, "setup");

        let img_names: Vec<_> = sources.images.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(img_names, vec!["photo.JPG", "screen.png"]);
        assert_eq!(sources.images[0].category, "setup");
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        let dir = sample_tree();
        let sources = collect_sources(dir.path(), None).unwrap();
        assert!(sources.images.iter().any(|i| i.file_name == "photo.JPG"));
        assert!(!sources.images.iter().any(|i| i.file_name == "notes.txt"));
    }

    #[test]
    fn category_filter_restricts_collection() {
        let dir = sample_tree();
        let sources = collect_sources(dir.path(), Some("billing")).unwrap();
        assert_eq!(sources.markdowns.len(), 1);
        assert_eq!(sources.markdowns[0].category, "billing");
        assert!(sources.images.is_empty());
    }

    #[test]
    fn missing_root_is_a_config_error() {
        let err = collect_sources(Path::new("/nonexistent/docs"), None).unwrap_err();
        assert!(err.to_string().contains("docs directory not found"));
    }

    #[test]
    fn empty_root_yields_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let sources = collect_sources(dir.path(), None).unwrap();
        assert!(sources.is_empty());
    }
}
