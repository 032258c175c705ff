//! Batch conversion entry points.
//!
//! ## Why strictly sequential?
//!
//! The remote service rate-limits aggressively and a reference-document
//! refresh is a background chore, not a latency-sensitive path. Files are
//! therefore processed one at a time with a fixed pause after each — a
//! deliberate client-side throttle, not an accidental limitation. There is
//! no backoff, no retry, and no cancellation mid-run; interrupting the
//! process leaves already-written outputs on disk and nothing else.
//!
//! Per-file failures are folded into the [`BatchSummary`] and never abort
//! the run. The only fatal errors happen before the first file is touched:
//! missing credential, missing input tree, unwritable output root.

use crate::config::{BatchConfig, ParseTier};
use crate::discover;
use crate::error::{BatchError, FileError};
use crate::output::{BatchSummary, FileOutcome, FileReport};
use crate::parser::{DocumentParser, LlamaParseClient, ParsedDocument};
use std::path::Path;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Convert every discoverable file under the configured input tree.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchSummary)` on completion, even if some files failed
/// (check `summary.failed` / `summary.failures`).
///
/// # Errors
/// Returns `Err(BatchError)` only for fatal startup errors:
/// - No API key configured (and no parser injected)
/// - Input root missing
/// - Output root could not be created
pub async fn convert_all(config: &BatchConfig) -> Result<BatchSummary, BatchError> {
    // ── Step 1: Resolve the parser ───────────────────────────────────────
    // Happens first: a missing credential must abort before any I/O.
    let parser = resolve_parser(config)?;

    // ── Step 2: Resolve directories ──────────────────────────────────────
    let input_root = config.input_root();
    let output_root = config.output_root();
    std::fs::create_dir_all(&output_root).map_err(|source| BatchError::OutputRootCreate {
        path: output_root.clone(),
        source,
    })?;
    info!("Input directory: {}", input_root.display());
    info!("Output directory: {}", output_root.display());
    if config.force {
        info!("Force reconversion enabled - all files will be reconverted");
    }

    // ── Step 3: Discover candidates ──────────────────────────────────────
    let files = discover::discover_files(&input_root)?;
    if files.is_empty() {
        warn!("No supported files found for conversion");
        return Ok(BatchSummary::default());
    }
    info!("Found {} files to process", files.len());

    if let Some(ref cb) = config.progress {
        cb.on_batch_start(files.len());
    }

    // ── Step 4: Sequential loop with fixed pacing ────────────────────────
    let total = files.len();
    let mut summary = BatchSummary::default();

    for (i, file) in files.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress {
            cb.on_file_start(index, total, file);
        }

        let report = convert_file(parser.as_ref(), file, config).await;

        match &report.outcome {
            FileOutcome::Skipped { output } => {
                info!(
                    "Skipped (already converted): {} -> {}",
                    file.display(),
                    output.display()
                );
                if let Some(ref cb) = config.progress {
                    cb.on_file_skipped(index, total, file);
                }
            }
            FileOutcome::Converted {
                output,
                tier,
                bytes,
            } => {
                info!(
                    "Converted ({}): {} -> {}",
                    tier,
                    file.display(),
                    output.display()
                );
                if let Some(ref cb) = config.progress {
                    cb.on_file_converted(index, total, file, *tier, *bytes);
                }
            }
            FileOutcome::Failed { error } => {
                warn!("Failed to convert {}: {}", file.display(), error);
                if let Some(ref cb) = config.progress {
                    cb.on_file_failed(index, total, file, error.to_string());
                }
            }
        }

        summary.record(&report);

        // Fixed pause after every file, converted, skipped, or failed alike.
        sleep(config.inter_file_delay).await;
    }

    // ── Step 5: Report ───────────────────────────────────────────────────
    log_summary(&summary);
    if let Some(ref cb) = config.progress {
        cb.on_batch_complete(&summary);
    }

    Ok(summary)
}

/// Convert a single file, never propagating an error.
///
/// 1. Skip when the derived output already exists (unless forced).
/// 2. Select the tier from the filename and call the service.
/// 3. An empty document collection is a failure ("No content extracted");
///    nothing is written.
/// 4. Otherwise the segments are joined with one blank line, in service
///    order, and written as UTF-8 (overwriting an existing output — only
///    reachable with force-reconvert on).
pub async fn convert_file(
    parser: &dyn DocumentParser,
    input: &Path,
    config: &BatchConfig,
) -> FileReport {
    let input_root = config.input_root();
    let output_root = config.output_root();
    let output = discover::output_path_for(input, &input_root, &output_root);

    if discover::already_converted(input, &input_root, &output_root, config.force) {
        return FileReport {
            input: input.to_path_buf(),
            outcome: FileOutcome::Skipped { output },
        };
    }

    let tier = if discover::needs_premium_tier(input) {
        ParseTier::Premium
    } else {
        ParseTier::Auto
    };
    debug!("Processing ({}): {}", tier, input.display());

    let documents = match parser.parse(input, tier).await {
        Ok(documents) => documents,
        Err(e) => {
            return failed(
                input,
                FileError::ParseFailed {
                    path: input.to_path_buf(),
                    detail: e.to_string(),
                },
            )
        }
    };

    if documents.is_empty() {
        return failed(
            input,
            FileError::NoContent {
                path: input.to_path_buf(),
            },
        );
    }

    let markdown = join_documents(&documents);

    if let Some(parent) = output.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            return failed(
                input,
                FileError::WriteFailed {
                    path: output.clone(),
                    detail: e.to_string(),
                },
            );
        }
    }
    if let Err(e) = tokio::fs::write(&output, markdown.as_bytes()).await {
        return failed(
            input,
            FileError::WriteFailed {
                path: output.clone(),
                detail: e.to_string(),
            },
        );
    }

    FileReport {
        input: input.to_path_buf(),
        outcome: FileOutcome::Converted {
            output,
            tier,
            bytes: markdown.len(),
        },
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Use the injected parser when present, otherwise build the cloud client.
///
/// Mirrors the config seam: a pre-built parser carries its own
/// authentication, so the API-key check only applies to the cloud path.
fn resolve_parser(config: &BatchConfig) -> Result<Arc<dyn DocumentParser>, BatchError> {
    if let Some(ref parser) = config.parser {
        return Ok(Arc::clone(parser));
    }
    Ok(Arc::new(LlamaParseClient::from_config(config)?))
}

/// Join the service's segments with exactly one blank line, in order.
fn join_documents(documents: &[ParsedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn failed(input: &Path, error: FileError) -> FileReport {
    FileReport {
        input: input.to_path_buf(),
        outcome: FileOutcome::Failed { error },
    }
}

fn log_summary(summary: &BatchSummary) {
    info!("Conversion summary:");
    info!("Newly converted: {}", summary.converted);
    info!("Skipped (already converted): {}", summary.skipped);
    info!("Failed: {}", summary.failed);
    info!("Premium parsing used: {}", summary.premium_used);
    info!("Total files processed: {}", summary.total);

    if !summary.failures.is_empty() {
        warn!("Failed conversions:");
        for (path, message) in &summary.failures {
            warn!("  {}: {}", path.display(), message);
        }
    }

    if !summary.premium_files.is_empty() {
        info!("Files processed with premium parsing:");
        for name in &summary.premium_files {
            info!("  {}", name);
        }
    }
}
