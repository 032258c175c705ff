//! # docset2md
//!
//! Batch-convert a tree of reference documents (PDF, office formats,
//! spreadsheets, images, audio) to Markdown using the LlamaParse cloud API.
//!
//! ## Why this crate?
//!
//! Knowledge-base pipelines want one canonical plain-text rendition of every
//! source document, kept next to the originals and cheap to refresh. Local
//! extractors handle PDFs at best; this crate instead delegates parsing to a
//! document-understanding service that accepts dozens of formats, and takes
//! care of everything around the call: discovering candidates, skipping work
//! already done, picking a parsing tier per file, pacing requests, and
//! mirroring the directory layout on the output side.
//!
//! ## Pipeline Overview
//!
//! ```text
//! <root>/input/reference_documents/original
//!  │
//!  ├─ 1. Discover  walk the tree, filter by extension allow-list
//!  ├─ 2. Skip      output .md already exists? (unless --force)
//!  ├─ 3. Tier      DIFFICULT* prefix → premium, everything else → auto
//!  ├─ 4. Parse     upload → poll job → fetch markdown segments
//!  ├─ 5. Write     join segments, mirror relative path, swap ext to .md
//!  └─ 6. Pace      fixed pause, then next file (strictly sequential)
//! <root>/input/reference_documents/plain_text
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docset2md::{convert_all, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from LLAMA_CLOUD_API_KEY
//!     let config = BatchConfig::builder()
//!         .root(".")
//!         .api_key(std::env::var("LLAMA_CLOUD_API_KEY")?)
//!         .build()?;
//!     let summary = convert_all(&config).await?;
//!     println!(
//!         "converted {} / skipped {} / failed {}",
//!         summary.converted, summary.skipped, summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docs2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docset2md = { version = "0.3", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! A missing credential or input tree aborts before any file is touched.
//! Everything after that is per-file: a service error, an empty result, or
//! a write failure marks that one file failed in the [`BatchSummary`] and
//! the run continues. Failed files are never marked converted, so a plain
//! rerun retries exactly them.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod discover;
pub mod error;
pub mod output;
pub mod parser;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, ParseTier, API_KEY_ENV};
pub use convert::{convert_all, convert_file};
pub use error::{BatchError, FileError};
pub use output::{BatchSummary, FileOutcome, FileReport};
pub use parser::{DocumentParser, LlamaParseClient, ParseError, ParsedDocument};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
