//! Result types for a batch run.
//!
//! [`FileOutcome`] is a tagged tri-state rather than a success flag with a
//! magic message string: "skipped because the output already exists" and
//! "newly converted" are different facts and callers should not have to
//! grep a message to tell them apart. The summary counters still aggregate
//! exactly the way the run report expects (premium usage counted only among
//! newly converted files).

use crate::config::ParseTier;
use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The derived output already existed and force-reconvert was off.
    Skipped {
        /// The pre-existing output path.
        output: PathBuf,
    },
    /// The service returned content and the output file was written.
    Converted {
        /// Where the markdown was written.
        output: PathBuf,
        /// Tier used for the conversion.
        tier: ParseTier,
        /// Bytes of markdown written.
        bytes: usize,
    },
    /// The file could not be converted; the batch carried on.
    Failed {
        error: FileError,
    },
}

/// One file's result within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// The input file.
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// Aggregated counters and lists for a completed run.
///
/// Returned by [`crate::convert::convert_all`]; the CLI renders it as the
/// final report and optionally serialises it as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Files discovered and attempted (converted + skipped + failed).
    pub total: usize,
    /// Newly converted this run.
    pub converted: usize,
    /// Skipped because their output already existed.
    pub skipped: usize,
    /// Failed (service error, empty result, or write error).
    pub failed: usize,
    /// Premium-tier conversions, counted only among newly converted files.
    pub premium_used: usize,
    /// Failed inputs with their error messages, in processing order.
    pub failures: Vec<(PathBuf, String)>,
    /// Base names of files converted with the premium tier.
    pub premium_files: Vec<String>,
}

impl BatchSummary {
    /// Fold one file's report into the counters.
    pub fn record(&mut self, report: &FileReport) {
        self.total += 1;
        match &report.outcome {
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Converted { tier, .. } => {
                self.converted += 1;
                if *tier == ParseTier::Premium {
                    self.premium_used += 1;
                    let name = report
                        .input
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| report.input.display().to_string());
                    self.premium_files.push(name);
                }
            }
            FileOutcome::Failed { error } => {
                self.failed += 1;
                self.failures
                    .push((report.input.clone(), error.to_string()));
            }
        }
    }

    /// True when every attempted file converted or was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(input: &str, tier: ParseTier) -> FileReport {
        FileReport {
            input: PathBuf::from(input),
            outcome: FileOutcome::Converted {
                output: PathBuf::from(format!("{input}.md")),
                tier,
                bytes: 64,
            },
        }
    }

    #[test]
    fn counters_track_each_outcome() {
        let mut summary = BatchSummary::default();
        summary.record(&converted("a.pdf", ParseTier::Auto));
        summary.record(&FileReport {
            input: PathBuf::from("b.docx"),
            outcome: FileOutcome::Skipped {
                output: PathBuf::from("b.md"),
            },
        });
        summary.record(&FileReport {
            input: PathBuf::from("c.pdf"),
            outcome: FileOutcome::Failed {
                error: FileError::NoContent {
                    path: PathBuf::from("c.pdf"),
                },
            },
        });

        assert_eq!(summary.total, 3);
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.premium_used, 0);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].1, "No content extracted");
        assert!(!summary.is_clean());
    }

    #[test]
    fn premium_counted_only_among_converted() {
        let mut summary = BatchSummary::default();
        summary.record(&converted("DIFFICULT_a.pdf", ParseTier::Premium));
        // A premium-named file that was skipped must not count.
        summary.record(&FileReport {
            input: PathBuf::from("DIFFICULT_b.pdf"),
            outcome: FileOutcome::Skipped {
                output: PathBuf::from("DIFFICULT_b.md"),
            },
        });
        // Nor a premium-named file that failed.
        summary.record(&FileReport {
            input: PathBuf::from("DIFFICULT_c.pdf"),
            outcome: FileOutcome::Failed {
                error: FileError::NoContent {
                    path: PathBuf::from("DIFFICULT_c.pdf"),
                },
            },
        });

        assert_eq!(summary.premium_used, 1);
        assert_eq!(summary.premium_files, vec!["DIFFICULT_a.pdf"]);
    }

    #[test]
    fn summary_serialises_to_json() {
        let mut summary = BatchSummary::default();
        summary.record(&converted("a.pdf", ParseTier::Premium));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"premium_used\":1"));

        let back: BatchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.converted, 1);
    }
}
