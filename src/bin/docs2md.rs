//! CLI binary for docset2md.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`
//! and renders the run summary.

use anyhow::{Context, Result};
use clap::Parser;
use docset2md::{
    convert_all, BatchConfig, BatchProgressCallback, BatchSummary, ParseTier, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar anchored at the bottom with a
/// per-file log line above it. Files are processed strictly one at a time,
/// so a single start-time slot is enough.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    fn short_name(input: &Path) -> String {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string())
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, input: &Path) {
        *self.started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(Self::short_name(input));
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, input: &Path) {
        self.elapsed_secs();
        self.bar.println(format!(
            "  {} {}  {}",
            dim("↷"),
            Self::short_name(input),
            dim("already converted"),
        ));
        self.bar.inc(1);
    }

    fn on_file_converted(
        &self,
        _index: usize,
        _total: usize,
        input: &Path,
        tier: ParseTier,
        bytes: usize,
    ) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {}  {}  {}",
            green("✓"),
            Self::short_name(input),
            dim(&format!("{tier}, {bytes} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_failed(&self, _index: usize, _total: usize, input: &Path, error: String) {
        let secs = self.elapsed_secs();

        // Truncate very long error messages to keep output tidy. Counted in
        // chars, not bytes: the message can embed a non-ASCII file name.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };

        self.bar.println(format!(
            "  {} {}  {}  {}",
            red("✗"),
            Self::short_name(input),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert only new files under ./input/reference_documents/original
  docs2md

  # Force reconversion of everything, existing outputs included
  docs2md --force

  # Run against another project tree
  docs2md --root ~/projects/handbook

  # Machine-readable summary
  docs2md --json > summary.json

LAYOUT:
  <root>/input/reference_documents/original     source documents (any nesting)
  <root>/input/reference_documents/plain_text   mirrored tree of .md outputs

TIER SELECTION:
  Files whose name starts with DIFFICULT (any case) are parsed with the
  premium tier; everything else uses auto mode. This is a naming convention,
  not content inspection — rename the file to change the tier.

ENVIRONMENT VARIABLES:
  LLAMA_CLOUD_API_KEY   API key for the parsing service (required)
  DOCS2MD_ROOT          Override the project root
  DOCS2MD_BASE_URL      Override the service endpoint
  DOCS2MD_DELAY_MS      Pause between files in milliseconds

SETUP:
  1. Set API key:   export LLAMA_CLOUD_API_KEY=llx-...
  2. Convert:       docs2md
"#;

/// Convert reference documents to Markdown via the LlamaParse cloud API.
#[derive(Parser, Debug)]
#[command(
    name = "docs2md",
    version,
    about = "Batch-convert reference documents to Markdown via the LlamaParse cloud API",
    long_about = "Walk <root>/input/reference_documents/original, convert every supported \
document (PDF, office formats, spreadsheets, images, audio) to Markdown through the \
LlamaParse cloud API, and mirror the tree under .../plain_text. Already-converted files \
are skipped unless --force is given.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Force reconversion of all files, even if their output already exists.
    #[arg(long)]
    force: bool,

    /// Project root containing input/reference_documents/.
    #[arg(long, env = "DOCS2MD_ROOT", default_value = ".")]
    root: PathBuf,

    /// API key for the parsing service.
    #[arg(long, env = "LLAMA_CLOUD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the parsing service.
    #[arg(long, env = "DOCS2MD_BASE_URL", default_value = docset2md::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Pause between files in milliseconds.
    #[arg(long, env = "DOCS2MD_DELAY_MS", default_value_t = 1000)]
    delay_ms: u64,

    /// Give up on a parse job after this many seconds.
    #[arg(long, env = "DOCS2MD_JOB_TIMEOUT", default_value_t = 600)]
    job_timeout: u64,

    /// Print the run summary as JSON instead of the human-readable report.
    #[arg(long, env = "DOCS2MD_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOCS2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCS2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCS2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = BatchConfig::builder()
        .root(&cli.root)
        .force(cli.force)
        .base_url(&cli.base_url)
        .inter_file_delay(Duration::from_millis(cli.delay_ms))
        .job_timeout(Duration::from_secs(cli.job_timeout));

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run the batch ────────────────────────────────────────────────────
    // Per-file failures are inside the summary; an Err here is a fatal
    // startup problem (missing key, missing input tree) and exits 1.
    let summary = convert_all(&config).await.context("Conversion failed")?;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Human-readable run report, printed to stderr after the bar is cleared.
fn print_summary(summary: &BatchSummary) {
    if summary.total == 0 {
        eprintln!("{} no supported files found", cyan("⚠"));
        return;
    }

    let tick = if summary.is_clean() {
        green("✔")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{tick} {} converted  {} skipped  {} failed  {}",
        bold(&summary.converted.to_string()),
        summary.skipped,
        if summary.failed == 0 {
            summary.failed.to_string()
        } else {
            red(&summary.failed.to_string())
        },
        dim(&format!("({} premium)", summary.premium_used)),
    );

    if !summary.failures.is_empty() {
        eprintln!("{}", bold("Failed conversions:"));
        for (path, message) in &summary.failures {
            eprintln!("  {} {}: {}", red("✗"), path.display(), message);
        }
    }

    if !summary.premium_files.is_empty() {
        eprintln!("{}", bold("Premium parsing used for:"));
        for name in &summary.premium_files {
            eprintln!("  {} {}", cyan("◆"), name);
        }
    }
}
