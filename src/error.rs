//! Error types for the docset2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`] — **Fatal**: the run cannot start at all (missing API
//!   key, missing input tree, unwritable output root). Returned as
//!   `Err(BatchError)` from [`crate::convert::convert_all`] before any file
//!   is touched.
//!
//! * [`FileError`] — **Non-fatal**: a single file failed (service error,
//!   empty result, write failure) but the rest of the batch is fine. Stored
//!   inside [`crate::output::FileOutcome::Failed`] so callers can inspect
//!   partial success rather than losing the whole run to one bad file.
//!
//! The separation lets callers decide their own tolerance: a failed file is
//! reported in the summary and can be rerun later; it never aborts the batch.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docset2md library.
///
/// File-level failures use [`FileError`] and are stored in
/// [`crate::output::FileReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The API key environment variable is unset or empty.
    #[error("{var} is not set.\nExport it or pass --api-key: export {var}=llx-...")]
    MissingApiKey { var: String },

    /// The input root does not exist or is not a directory.
    #[error("Input directory not found: '{path}'\nExpected the document tree at <root>/input/reference_documents/original.")]
    InputRootMissing { path: PathBuf },

    /// The output root could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputRootCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a directory during discovery failed.
    #[error("Failed to read directory '{path}': {source}")]
    DiscoveryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single file.
///
/// Stored in [`crate::output::FileOutcome::Failed`] when a file fails.
/// The batch continues with the next file regardless.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The remote service rejected the file or the job did not complete.
    #[error("Parsing failed for '{path}': {detail}")]
    ParseFailed { path: PathBuf, detail: String },

    /// The service completed but returned an empty document collection.
    ///
    /// Some inputs legitimately yield nothing (blank scans, empty sheets);
    /// this is an expected failure kind, not a crash.
    #[error("No content extracted")]
    NoContent { path: PathBuf },

    /// The markdown output could not be written.
    #[error("Failed to write output '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}

impl FileError {
    /// The input file this error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            FileError::ParseFailed { path, .. } => path,
            FileError::NoContent { path } => path,
            FileError::WriteFailed { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_names_the_variable() {
        let e = BatchError::MissingApiKey {
            var: "LLAMA_CLOUD_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("LLAMA_CLOUD_API_KEY"), "got: {msg}");
    }

    #[test]
    fn input_root_missing_display() {
        let e = BatchError::InputRootMissing {
            path: PathBuf::from("/tmp/nope/original"),
        };
        assert!(e.to_string().contains("/tmp/nope/original"));
    }

    #[test]
    fn no_content_display_is_the_expected_marker() {
        let e = FileError::NoContent {
            path: PathBuf::from("a.pdf"),
        };
        assert_eq!(e.to_string(), "No content extracted");
    }

    #[test]
    fn parse_failed_carries_path_and_detail() {
        let e = FileError::ParseFailed {
            path: PathBuf::from("docs/b.docx"),
            detail: "HTTP 500".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("docs/b.docx"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn file_error_path_accessor() {
        let e = FileError::WriteFailed {
            path: PathBuf::from("out/c.md"),
            detail: "disk full".into(),
        };
        assert_eq!(e.path(), &PathBuf::from("out/c.md"));
    }
}
