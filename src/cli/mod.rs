//! # CLI Module
//!
//! Command-line interface for the duplicate image finder.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for duplicates
//! image-dedup scan ~/Pictures
//!
//! # Only PNG and GIF, eight workers
//! image-dedup scan ~/Pictures -e png -e gif --workers 8
//!
//! # JSON output
//! image-dedup scan ~/Pictures --output json
//! ```
//!
//! Ctrl-C stops the run; records already printed stay valid.

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_dupe_finder::core::hasher::{FingerprintKind, PayloadMode};
use image_dupe_finder::core::pipeline::{CancellationToken, Pipeline, PipelineSummary, ResultRecord};
use image_dupe_finder::error::{ConfigError, DuplicateFinderError, Result};
use image_dupe_finder::events::{Event, EventChannel, ScanEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Image Dupe Finder - report byte-identical images as they are found
#[derive(Parser, Debug)]
#[command(name = "image-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory tree for duplicate images
    Scan {
        /// Directory to scan
        root: PathBuf,

        /// File extension to include (repeatable; default: common image formats)
        #[arg(short, long = "ext")]
        extensions: Vec<String>,

        /// Parallel fingerprint workers (default: number of CPUs)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Files allowed in flight ahead of output (default: 2 x workers)
        #[arg(long)]
        prefetch: Option<usize>,

        /// Fingerprint algorithm
        #[arg(short, long, default_value = "md5")]
        algorithm: Algorithm,

        /// Records buffered between the pipeline and the output
        #[arg(long, default_value = "64")]
        queue_capacity: usize,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Skip hidden files and directories
        #[arg(long)]
        skip_hidden: bool,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Maximum directory depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// MD5 - cryptographic, the default
    Md5,
    /// XXH3-128 - faster, not cryptographic
    Xxh3,
}

impl From<Algorithm> for FingerprintKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Md5 => FingerprintKind::Md5,
            Algorithm::Xxh3 => FingerprintKind::Xxh3,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Options for one scan, as parsed from the command line
struct ScanOptions {
    root: PathBuf,
    extensions: Vec<String>,
    workers: Option<usize>,
    prefetch: Option<usize>,
    algorithm: FingerprintKind,
    queue_capacity: usize,
    output: OutputFormat,
    skip_hidden: bool,
    follow_symlinks: bool,
    max_depth: Option<usize>,
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            extensions,
            workers,
            prefetch,
            algorithm,
            queue_capacity,
            output,
            skip_hidden,
            follow_symlinks,
            max_depth,
            verbose,
        } => run_scan(ScanOptions {
            root,
            extensions,
            workers,
            prefetch,
            algorithm: algorithm.into(),
            queue_capacity,
            output,
            skip_hidden,
            follow_symlinks,
            max_depth,
            verbose,
        }),
    }
}

fn run_scan(options: ScanOptions) -> Result<()> {
    // Reject before any worker thread is started
    check_queue_capacity(options.queue_capacity)?;
    image_dupe_finder::init_tracing(if options.verbose { "debug" } else { "warn" });
    let term = Term::stderr();
    let pretty = matches!(options.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Image Dupe Finder").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Ctrl-C handler unavailable: {}", e);
    }

    let (sender, receiver) = EventChannel::bounded(1024);

    let mut builder = Pipeline::builder()
        .root(&options.root)
        .algorithm(options.algorithm)
        .payload(PayloadMode::Discard)
        .include_hidden(!options.skip_hidden)
        .follow_symlinks(options.follow_symlinks)
        .events(sender)
        .cancellation(cancel);
    if !options.extensions.is_empty() {
        builder = builder.extensions(options.extensions.clone());
    }
    if let Some(workers) = options.workers {
        builder = builder.workers(workers);
    }
    if let Some(prefetch) = options.prefetch {
        builder = builder.prefetch(prefetch);
    }
    if let Some(depth) = options.max_depth {
        builder = builder.max_depth(depth);
    }
    let pipeline = builder.build();

    let progress = if pretty {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {pos} files {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    // Crawl errors arrive as events; only shown when verbose
    let progress_clone = progress.clone();
    let verbose = options.verbose;
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            if let Event::Scan(ScanEvent::Error { path, message }) = event {
                if !verbose {
                    continue;
                }
                let line = format!("{} skipped {}: {}", style("!").yellow(), path.display(), message);
                match &progress_clone {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }
        }
    });

    let stream = pipeline.process()?;
    let (consumer, producer_thread) = stream.into_handoff(options.queue_capacity)?;
    drop(pipeline);

    let mut collected = Vec::new();
    for record in consumer {
        if let Some(ref pb) = progress {
            pb.inc(1);
            if record.is_duplicate || record.is_failure() {
                pb.println(describe_record(&record));
            }
        }
        match options.output {
            OutputFormat::Minimal if record.is_duplicate => println!("{}", record.path.display()),
            OutputFormat::Json => collected.push(record),
            _ => {}
        }
    }

    let summary = producer_thread
        .join()
        .map_err(|_| DuplicateFinderError::WorkerPool("result thread panicked".to_string()))?;
    event_thread.join().ok();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match options.output {
        OutputFormat::Pretty => print_pretty_summary(&term, &summary),
        OutputFormat::Json => print_json_results(&collected, &summary),
        OutputFormat::Minimal => {}
    }

    Ok(())
}

fn check_queue_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(ConfigError::InvalidCapacity.into());
    }
    Ok(())
}

fn describe_record(record: &ResultRecord) -> String {
    if let Some(ref error) = record.error {
        return format!("  {} {}", style("✗").red(), style(error).dim());
    }

    let original = record
        .first_seen
        .as_deref()
        .map(display_path)
        .unwrap_or_default();
    format!(
        "  {} {} {} {}",
        style("○").yellow(),
        display_path(&record.path),
        style("duplicates").dim(),
        original
    )
}

fn print_pretty_summary(term: &Term, summary: &PipelineSummary) {
    term.write_line("").ok();
    let heading = if summary.cancelled {
        format!("{} Scan Cancelled", style("■").yellow().bold())
    } else {
        format!("{} Scan Complete", style("✓").green().bold())
    };
    term.write_line(&heading).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files fingerprinted in {:.1}s",
        style(summary.total_files).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} unique", style(summary.unique).cyan())).ok();
    term.write_line(&format!("  {} duplicates", style(summary.duplicates).yellow())).ok();

    if summary.failed > 0 {
        term.write_line(&format!("  {} unreadable", style(summary.failed).red())).ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style("Remember: No files were deleted. Review carefully before taking action.").dim()
    ))
    .ok();
}

fn print_json_results(records: &[ResultRecord], summary: &PipelineSummary) {
    let output = serde_json::json!({
        "summary": summary,
        "records": records.iter().map(|r| {
            serde_json::json!({
                "path": r.path,
                "is_duplicate": r.is_duplicate,
                "fingerprint": r.fingerprint.map(|f| f.to_hex()),
                "first_seen": r.first_seen,
                "error": r.error,
            })
        }).collect::<Vec<_>>()
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("failed to render JSON: {}", e),
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(&home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_queue_capacity_is_rejected() {
        assert!(matches!(
            check_queue_capacity(0),
            Err(DuplicateFinderError::Config(ConfigError::InvalidCapacity))
        ));
        assert!(check_queue_capacity(1).is_ok());
    }

    #[test]
    fn scan_arguments_parse() {
        let cli = Cli::try_parse_from(["image-dedup", "scan", "/photos", "-e", "png", "--queue-capacity", "0"]).unwrap();
        let Commands::Scan { extensions, queue_capacity, .. } = cli.command;
        assert_eq!(extensions, vec!["png".to_string()]);
        assert_eq!(queue_capacity, 0);
    }
}
