//! Docsift configuration system.
//!
//! Loaded once at startup, validated, then passed by reference into the
//! chunker and the pipeline controller. Never mutated during a run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocsiftError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsiftConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

impl DocsiftConfig {
    /// Load config from the default path (~/.docsift/config.toml), falling
    /// back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DocsiftError::Config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DocsiftError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docsift")
            .join("config.toml")
    }

    /// Reject inconsistent values before a run starts.
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.target_size == 0 {
            return Err(DocsiftError::Config("chunking.target_size must be > 0".into()));
        }
        if c.min_size == 0 {
            return Err(DocsiftError::Config("chunking.min_size must be > 0".into()));
        }
        if c.min_size > c.target_size {
            return Err(DocsiftError::Config(format!(
                "chunking.min_size ({}) must not exceed chunking.target_size ({})",
                c.min_size, c.target_size
            )));
        }
        if c.overlap >= c.target_size {
            return Err(DocsiftError::Config(format!(
                "chunking.overlap ({}) must be smaller than chunking.target_size ({})",
                c.overlap, c.target_size
            )));
        }
        let m = &self.models;
        for (name, alias) in [("fast", &m.fast), ("mid", &m.mid), ("high", &m.high)] {
            if alias.is_empty() {
                return Err(DocsiftError::Config(format!("models.{name} must not be empty")));
            }
        }
        if m.endpoint.is_empty() {
            return Err(DocsiftError::Config("models.endpoint must not be empty".into()));
        }
        if m.request_timeout_secs == 0 {
            return Err(DocsiftError::Config("models.request_timeout_secs must be > 0".into()));
        }
        let r = &self.runtime;
        if r.scan_concurrency == 0 || r.extract_concurrency == 0 {
            return Err(DocsiftError::Config("runtime concurrency ceilings must be > 0".into()));
        }
        if r.selection_max == 0 {
            return Err(DocsiftError::Config("runtime.selection_max must be > 0".into()));
        }
        if self.loader.extensions.is_empty() {
            return Err(DocsiftError::Config("loader.extensions must not be empty".into()));
        }
        Ok(())
    }
}

/// Chunking configuration. Sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Soft upper bound on chunk core length.
    #[serde(default = "default_target_size")]
    pub target_size: usize,
    /// Context copied from the tail of the previous chunk.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// Chunks below this are merged into a neighbor (final chunk exempt).
    #[serde(default = "default_min_size")]
    pub min_size: usize,
}

fn default_target_size() -> usize { 1500 }
fn default_overlap() -> usize { 200 }
fn default_min_size() -> usize { 300 }

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            overlap: default_overlap(),
            min_size: default_min_size(),
        }
    }
}

/// Inference backend configuration — endpoint plus the three tier aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// OpenAI-compatible base URL (Ollama's /v1 works out of the box).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Optional bearer key. Local servers need none.
    #[serde(default)]
    pub api_key: String,
    /// Fast tier — mass per-chunk scanning.
    #[serde(default = "default_fast_model")]
    pub fast: String,
    /// Mid tier — chunk selection.
    #[serde(default = "default_mid_model")]
    pub mid: String,
    /// High tier — extraction and synthesis.
    #[serde(default = "default_high_model")]
    pub high: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String { "http://localhost:11434/v1".into() }
fn default_fast_model() -> String { "qwen3:0.6b".into() }
fn default_mid_model() -> String { "qwen3:8b".into() }
fn default_high_model() -> String { "qwen3:14b".into() }
fn default_temperature() -> f32 { 0.0 }
fn default_request_timeout() -> u64 { 120 }

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            fast: default_fast_model(),
            mid: default_mid_model(),
            high: default_high_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Pipeline runtime limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Max in-flight fast-tier scan requests.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
    /// Max in-flight high-tier extract requests.
    #[serde(default = "default_extract_concurrency")]
    pub extract_concurrency: usize,
    /// Retries after the first attempt, transient errors only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay; doubles per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Cap on how many chunks selection may keep.
    #[serde(default = "default_selection_max")]
    pub selection_max: usize,
    /// Only this many leading characters of a chunk are sent to the scanner.
    #[serde(default = "default_scan_preview_chars")]
    pub scan_preview_chars: usize,
    /// Summaries are flattened and clamped to this length.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

fn default_scan_concurrency() -> usize { 4 }
fn default_extract_concurrency() -> usize { 2 }
fn default_max_retries() -> u32 { 2 }
fn default_retry_backoff_ms() -> u64 { 500 }
fn default_selection_max() -> usize { 8 }
fn default_scan_preview_chars() -> usize { 2000 }
fn default_summary_max_chars() -> usize { 150 }

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            scan_concurrency: default_scan_concurrency(),
            extract_concurrency: default_extract_concurrency(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            selection_max: default_selection_max(),
            scan_preview_chars: default_scan_preview_chars(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

/// Document loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File extensions eligible for loading (with the leading dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec![
        ".txt", ".md", ".py", ".rs", ".json", ".csv", ".log", ".yml", ".yaml", ".xml", ".html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { extensions: default_extensions() }
    }
}
