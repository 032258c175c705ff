//! File discovery and filename policy.
//!
//! Everything here is deliberately pure filesystem logic: which files are
//! candidates, where their markdown lands, whether they can be skipped, and
//! which parsing tier they get. No network, no async — the batch loop in
//! [`crate::convert`] composes these with the remote service.
//!
//! ## Policy summary
//!
//! - A file is convertible iff its extension (case-insensitive) is on the
//!   service's allow-list, its name is not hidden (`.`-prefixed), and it is
//!   not an OS artifact file.
//! - Output mirrors the input tree: same relative path, `.md` extension.
//! - A file is skipped iff force-reconvert is off and its output exists.
//!   Existence is the only signal — no hashes, no timestamps.
//! - Premium tier is a naming convention: base name starts with `DIFFICULT`
//!   (ASCII case-insensitive prefix match, nothing fancier).

use crate::error::BatchError;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions the parsing service accepts, lowercase, without the dot.
///
/// Mirrors the service's documented format support: documents and
/// presentations, images and web pages, spreadsheets, and audio (audio is
/// size-limited server-side; we do not pre-check sizes here).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Base types
    "pdf",
    // Documents and presentations
    "abw", "cgm", "cwk", "doc", "docx", "docm", "dot", "dotm", "hwp", "key", "lwp", "mw", "mcw",
    "pages", "pbd", "ppt", "pptm", "pptx", "pot", "potm", "potx", "rtf", "sda", "sdd", "sdp",
    "sdw", "sgl", "sti", "sxi", "sxw", "stw", "sxg", "txt", "uof", "uop", "uot", "vor", "wpd",
    "wps", "xml", "zabw", "epub",
    // Images and web pages
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "tiff", "webp", "web", "htm", "html",
    // Spreadsheets
    "xlsx", "xls", "xlsm", "xlsb", "xlw", "csv", "dif", "sylk", "slk", "prn", "numbers", "et",
    "ods", "fods", "uos1", "uos2", "dbf", "wk1", "wk2", "wk3", "wk4", "wks", "123", "wq1", "wq2",
    "wb1", "wb2", "wb3", "qpw", "xlr", "eth", "tsv",
    // Audio
    "mp3", "mp4", "mpeg", "mpga", "m4a", "wav", "webm",
];

/// Files some operating systems scatter into directories. Excluded even
/// when their extension would otherwise qualify.
const OS_ARTIFACTS: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Is this file a conversion candidate, judged by name alone?
pub fn is_convertible(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    if name.starts_with('.') {
        return false;
    }
    if OS_ARTIFACTS.iter().any(|a| *a == name) {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Recursively enumerate convertible files under `input_root`.
///
/// The walk uses an explicit stack over `read_dir` and the final list is
/// sorted, so the result is deterministic within a run (reproducible logs).
/// Symlinked directories are followed like any other entry; the input tree
/// is expected to be a plain document folder, not something adversarial.
///
/// # Errors
/// [`BatchError::InputRootMissing`] if `input_root` is not a directory;
/// [`BatchError::DiscoveryFailed`] on unreadable directories mid-walk.
pub fn discover_files(input_root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !input_root.is_dir() {
        return Err(BatchError::InputRootMissing {
            path: input_root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let mut stack = vec![input_root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| BatchError::DiscoveryFailed {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| BatchError::DiscoveryFailed {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() && is_convertible(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Derive the output path for `input`: the path relative to `input_root`,
/// re-rooted under `output_root`, with the final extension replaced by `.md`.
///
/// Case and non-extension path segments pass through untouched. The
/// function is pure and idempotent; parent directories are created by the
/// writer, not here.
pub fn output_path_for(input: &Path, input_root: &Path, output_root: &Path) -> PathBuf {
    let relative = input.strip_prefix(input_root).unwrap_or(input);
    output_root.join(relative).with_extension("md")
}

/// Skip policy: true iff `force` is off and the derived output exists.
pub fn already_converted(input: &Path, input_root: &Path, output_root: &Path, force: bool) -> bool {
    if force {
        return false;
    }
    output_path_for(input, input_root, output_root).exists()
}

/// Tier policy: true iff the base name starts with `DIFFICULT`,
/// ASCII case-insensitively. Prefix only — `report_DIFFICULT.pdf` is
/// standard tier.
pub fn needs_premium_tier(input: &Path) -> bool {
    const PREFIX: &str = "DIFFICULT";
    input
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|name| name.get(..PREFIX.len()))
        .map(|prefix| prefix.eq_ignore_ascii_case(PREFIX))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap();
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(is_convertible(Path::new("report.PDF")));
        assert!(is_convertible(Path::new("deck.PpTx")));
        assert!(is_convertible(Path::new("audio.mp3")));
        assert!(!is_convertible(Path::new("binary.exe")));
        assert!(!is_convertible(Path::new("archive.zip")));
    }

    #[test]
    fn hidden_and_artifact_files_are_excluded() {
        assert!(!is_convertible(Path::new(".hidden.pdf")));
        assert!(!is_convertible(Path::new(".DS_Store")));
        assert!(!is_convertible(Path::new("Thumbs.db")));
        assert!(!is_convertible(Path::new("desktop.ini")));
    }

    #[test]
    fn extensionless_files_are_excluded() {
        assert!(!is_convertible(Path::new("README")));
        assert!(!is_convertible(Path::new("difficult")));
    }

    #[test]
    fn discover_walks_recursively_and_sorts() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.pdf"));
        touch(&root.join("a.docx"));
        touch(&root.join("notes.zip"));
        touch(&root.join(".DS_Store"));
        touch(&root.join("nested/deep/c.xlsx"));
        touch(&root.join("nested/.hidden.pdf"));

        let files = discover_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.docx"),
                PathBuf::from("b.pdf"),
                PathBuf::from("nested/deep/c.xlsx"),
            ]
        );
    }

    #[test]
    fn discover_is_deterministic_across_runs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in ["z.pdf", "m.csv", "a.txt", "sub/q.html"] {
            touch(&root.join(name));
        }
        let first = discover_files(root).unwrap();
        let second = discover_files(root).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn discover_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(matches!(
            discover_files(&missing),
            Err(BatchError::InputRootMissing { .. })
        ));
    }

    #[test]
    fn output_path_mirrors_structure_and_swaps_extension() {
        let input_root = Path::new("/in");
        let output_root = Path::new("/out");
        let derived = output_path_for(
            Path::new("/in/Sub Dir/Report.V2.pdf"),
            input_root,
            output_root,
        );
        assert_eq!(derived, PathBuf::from("/out/Sub Dir/Report.V2.md"));
    }

    #[test]
    fn output_path_is_idempotent() {
        let input_root = Path::new("/in");
        let output_root = Path::new("/out");
        let input = Path::new("/in/a/b.docx");
        assert_eq!(
            output_path_for(input, input_root, output_root),
            output_path_for(input, input_root, output_root)
        );
    }

    #[test]
    fn premium_prefix_matches_any_case_variant() {
        assert!(needs_premium_tier(Path::new("DIFFICULT_report.pdf")));
        assert!(needs_premium_tier(Path::new("difficult_scan.png")));
        assert!(needs_premium_tier(Path::new("Difficult.pdf")));
        assert!(!needs_premium_tier(Path::new("report_DIFFICULT.pdf")));
        assert!(!needs_premium_tier(Path::new("DIFFICUL.pdf")));
    }

    #[test]
    fn skip_policy_is_existence_based() {
        let dir = tempdir().unwrap();
        let input_root = dir.path().join("original");
        let output_root = dir.path().join("plain_text");
        let input = input_root.join("doc.pdf");
        touch(&input);

        assert!(!already_converted(&input, &input_root, &output_root, false));

        touch(&output_root.join("doc.md"));
        assert!(already_converted(&input, &input_root, &output_root, false));

        // force wins over existence
        assert!(!already_converted(&input, &input_root, &output_root, true));
    }
}
