//! Directory → documents.
//!
//! Files are loaded in name order so a run over the same directory always
//! sees the same document sequence. Unreadable or empty files are skipped
//! with a warning; they never abort the run.

use std::path::Path;

use docsift_core::config::LoaderConfig;
use docsift_core::error::{DocsiftError, Result};
use docsift_core::types::Document;

/// Per-file outcome, kept for verbose reporting and diagnostics.
#[derive(Debug, Clone)]
pub struct FileDetail {
    pub name: String,
    /// Character count for loaded files, 0 for skipped ones.
    pub chars: usize,
    /// Why the file was skipped, if it was.
    pub error: Option<String>,
}

/// Aggregate loading statistics.
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub details: Vec<FileDetail>,
}

/// Loads every supported file in a directory as one document.
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl DocumentLoader {
    pub fn new(config: &LoaderConfig) -> Self {
        Self { extensions: config.extensions.clone() }
    }

    fn is_supported(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Read all supported files under `dir`, ordered by file name.
    ///
    /// Returns the loaded documents and per-file statistics. An empty result
    /// is not an error here — the pipeline decides what an empty input set
    /// means.
    pub fn load_dir(&self, dir: &Path) -> Result<(Vec<Document>, LoadStats)> {
        let mut names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_supported(&name) {
                names.push(name);
            }
        }
        names.sort();

        let mut docs = Vec::with_capacity(names.len());
        let mut stats = LoadStats::default();
        for name in names {
            let path = dir.join(&name);
            match std::fs::read_to_string(&path) {
                Ok(text) if text.trim().is_empty() => {
                    tracing::warn!("skipping '{}': file is empty", name);
                    stats.files_skipped += 1;
                    stats.details.push(FileDetail {
                        name,
                        chars: 0,
                        error: Some("empty file".into()),
                    });
                }
                Ok(text) => {
                    stats.files_loaded += 1;
                    stats.details.push(FileDetail {
                        name: name.clone(),
                        chars: text.chars().count(),
                        error: None,
                    });
                    docs.push(Document { id: name, text });
                }
                Err(e) => {
                    let err = DocsiftError::DocumentLoad {
                        document: name.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!("skipping: {err}");
                    stats.files_skipped += 1;
                    stats.details.push(FileDetail {
                        name,
                        chars: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        Ok((docs, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::config::LoaderConfig;

    fn loader() -> DocumentLoader {
        DocumentLoader::new(&LoaderConfig::default())
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (docs, stats) = loader().load_dir(dir.path()).unwrap();
        assert!(docs.is_empty());
        assert_eq!(stats.files_loaded, 0);
        assert_eq!(stats.files_skipped, 0);
    }

    #[test]
    fn test_loads_supported_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "beta").unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 159]).unwrap();

        let (docs, stats) = loader().load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a.txt");
        assert_eq!(docs[1].id, "b.md");
        assert_eq!(stats.files_loaded, 2);
        // Unsupported extension is ignored entirely, not counted as skipped.
        assert_eq!(stats.files_skipped, 0);
    }

    #[test]
    fn test_empty_file_skipped_with_detail() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.txt"), "   \n").unwrap();
        std::fs::write(dir.path().join("real.txt"), "content").unwrap();

        let (docs, stats) = loader().load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(stats.files_skipped, 1);
        let detail = stats.details.iter().find(|d| d.name == "blank.txt").unwrap();
        assert!(detail.error.is_some());
    }

    #[test]
    fn test_unreadable_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        // Invalid UTF-8 fails read_to_string and must be skipped, not fatal.
        std::fs::write(dir.path().join("bad.log"), [0xffu8, 0xfe, 0xfd]).unwrap();
        std::fs::write(dir.path().join("good.log"), "lines").unwrap();

        let (docs, stats) = loader().load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "good.log");
        assert_eq!(stats.files_skipped, 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = loader().load_dir(Path::new("/definitely/not/here"));
        assert!(result.is_err());
    }
}
