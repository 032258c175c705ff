//! Configuration types for batch document conversion.
//!
//! All run behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. The config is assembled once at startup and is
//! read-only for the rest of the run: directories, credential, and pacing
//! are fixed before the first file is touched, so the batch loop never
//! mutates shared state beyond its own counters.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::BatchError;
use crate::parser::DocumentParser;
use crate::progress::BatchProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the LlamaParse API key.
pub const API_KEY_ENV: &str = "LLAMA_CLOUD_API_KEY";

/// Default base URL of the parsing service.
pub const DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";

/// Input tree, relative to the project root.
pub const INPUT_SUBDIR: &str = "input/reference_documents/original";

/// Output tree, relative to the project root. Mirrors the input layout.
pub const OUTPUT_SUBDIR: &str = "input/reference_documents/plain_text";

/// Parsing tier requested from the remote service.
///
/// Both tiers are configurations of the same service, not separate engines.
/// Tier selection is a filename convention (see
/// [`crate::discover::needs_premium_tier`]), never content inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParseTier {
    /// Auto mode: the service picks the best parsing strategy per document.
    /// (default)
    #[default]
    Auto,
    /// Premium mode: slower, higher-fidelity parsing for difficult layouts.
    Premium,
}

impl ParseTier {
    /// Short label used in logs and the run summary.
    pub fn label(&self) -> &'static str {
        match self {
            ParseTier::Auto => "auto",
            ParseTier::Premium => "premium",
        }
    }
}

impl fmt::Display for ParseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for a batch conversion run.
///
/// Built via [`BatchConfig::builder()`].
///
/// # Example
/// ```rust,no_run
/// use docset2md::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .root(".")
///     .api_key("llx-...")
///     .force(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Root of the document tree. Input is read from
    /// `<root>/input/reference_documents/original`, output written to
    /// `<root>/input/reference_documents/plain_text`. Default: `.`.
    pub root: PathBuf,

    /// Reconvert every discovered file, overwriting existing outputs.
    /// Default: false.
    ///
    /// Without this, a file is skipped whenever its derived `.md` output
    /// already exists on disk. The check is purely existence-based (no
    /// content hash, no timestamps), so a rerun after a partial failure
    /// re-skips any file whose output was written, even if that output is
    /// stale.
    pub force: bool,

    /// API key for the parsing service. Required unless a pre-built
    /// [`DocumentParser`] is injected via `parser`.
    pub api_key: Option<String>,

    /// Base URL of the parsing service. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Pause inserted after every file, successful or not. Default: 1 s.
    ///
    /// Files are processed strictly one at a time and this fixed delay is
    /// the only throttle against the remote service. There is no backoff
    /// and no adaptive rate control; the service's own job queue absorbs
    /// bursts, this just keeps the upload rate polite.
    pub inter_file_delay: Duration,

    /// Interval between job-status polls. Default: 1 s.
    pub poll_interval: Duration,

    /// Give up waiting for a parse job after this long. Default: 600 s.
    ///
    /// Large audio files and premium-tier jobs can sit in the service queue
    /// for minutes. When the deadline passes the file is recorded as failed
    /// and the batch moves on.
    pub job_timeout: Duration,

    /// Per-HTTP-request timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Pre-constructed parser. Takes precedence over `api_key`/`base_url`.
    ///
    /// This is the test seam: inject a mock here and the batch runs without
    /// network access or credentials.
    pub parser: Option<Arc<dyn DocumentParser>>,

    /// Per-file progress events. Default: none.
    pub progress: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            force: false,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            inter_file_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            job_timeout: Duration::from_secs(600),
            request_timeout_secs: 120,
            parser: None,
            progress: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("root", &self.root)
            .field("force", &self.force)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("inter_file_delay", &self.inter_file_delay)
            .field("poll_interval", &self.poll_interval)
            .field("job_timeout", &self.job_timeout)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("parser", &self.parser.as_ref().map(|_| "<dyn DocumentParser>"))
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// `<root>/input/reference_documents/original`.
    pub fn input_root(&self) -> PathBuf {
        self.root.join(INPUT_SUBDIR)
    }

    /// `<root>/input/reference_documents/plain_text`.
    pub fn output_root(&self) -> PathBuf {
        self.root.join(OUTPUT_SUBDIR)
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.root = root.as_ref().to_path_buf();
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.config.force = force;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn inter_file_delay(mut self, delay: Duration) -> Self {
        self.config.inter_file_delay = delay;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn job_timeout(mut self, timeout: Duration) -> Self {
        self.config.job_timeout = timeout;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.config.parser = Some(parser);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn BatchProgressCallback>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The credential itself is checked later, when the parser is resolved
    /// (an injected parser needs no key); `build()` only rejects values
    /// that can never work.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(BatchError::InvalidConfig("base_url must not be empty".into()));
        }
        if let Some(ref key) = c.api_key {
            if key.trim().is_empty() {
                return Err(BatchError::InvalidConfig(
                    "api_key must not be empty".into(),
                ));
            }
        }
        if c.poll_interval.is_zero() {
            return Err(BatchError::InvalidConfig(
                "poll_interval must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_the_fixed_relative_one() {
        let config = BatchConfig::builder().root("/proj").build().unwrap();
        assert_eq!(
            config.input_root(),
            PathBuf::from("/proj/input/reference_documents/original")
        );
        assert_eq!(
            config.output_root(),
            PathBuf::from("/proj/input/reference_documents/plain_text")
        );
    }

    #[test]
    fn builder_rejects_empty_api_key() {
        let err = BatchConfig::builder().api_key("  ").build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_rejects_zero_poll_interval() {
        let err = BatchConfig::builder()
            .poll_interval(Duration::ZERO)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn defaults_match_documented_pacing() {
        let config = BatchConfig::default();
        assert_eq!(config.inter_file_delay, Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(!config.force);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(ParseTier::Auto.label(), "auto");
        assert_eq!(ParseTier::Premium.to_string(), "premium");
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let config = BatchConfig::builder().api_key("llx-secret").build().unwrap();
        let dump = format!("{config:?}");
        assert!(!dump.contains("llx-secret"));
        assert!(dump.contains("<redacted>"));
    }
}
