//! # CLI Module
//!
//! Command-line interface for the RAW photo index.
//!
//! ## Usage
//! ```bash
//! # Add a folder tree to the index
//! raw-index index ~/Pictures/RAW
//!
//! # Preview what would be indexed, writing nothing
//! raw-index index ~/Pictures/RAW --verbose
//!
//! # List files on a card the library does not have yet
//! raw-index import /Volumes/EOS_DIGITAL/DCIM --method fingerprint
//!
//! # Copy them into a new folder
//! raw-index import /Volumes/EOS_DIGITAL/DCIM --copy-to ~/Pictures/RAW/2024-06-01
//!
//! # Per-day overview of a card
//! raw-index summary /Volumes/EOS_DIGITAL/DCIM/100CANON
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use raw_index::core::import::{
    summarize_card, ComparisonMethod, DaySummary, ImportComparator, ImportReport,
};
use raw_index::core::index::SqliteIndex;
use raw_index::core::pipeline::{IndexReport, Pipeline, DEFAULT_BATCH_SIZE};
use raw_index::core::scanner::ExtensionFilter;
use raw_index::core::transfer::{self, TransferResult};
use raw_index::error::Result;
use raw_index::events::{
    Event, EventChannel, EventReceiver, ImportEvent, IndexEvent, PipelineEvent, ScanEvent,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// RAW Index - keep a photo library free of duplicates
#[derive(Parser, Debug)]
#[command(name = "raw-index")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add every RAW file under a directory to the index
    Index {
        /// Directory to index
        directory: PathBuf,

        /// Index database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Log each record instead of writing it
        #[arg(short, long)]
        verbose: bool,

        /// Records written per batch
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// List RAW files in a source directory that are not indexed yet
    Import {
        /// Source directory, usually a camera card
        source: PathBuf,

        /// Index database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// How files are matched against the index
        #[arg(short, long, default_value = "fingerprint")]
        method: String,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Copy the new files into this directory
        #[arg(long)]
        copy_to: Option<PathBuf>,
    },

    /// Show a card's files per day, with how many are new
    Summary {
        /// Card directory (not searched recursively)
        card: PathBuf,

        /// Index database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// How files are matched against the index
        #[arg(short, long, default_value = "fingerprint")]
        method: String,

        /// List every file, not only RAW files
        #[arg(long)]
        all_files: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            directory,
            database,
            verbose,
            batch_size,
            include_hidden,
            output,
        } => {
            raw_index::init_tracing(if verbose { "info" } else { "warn" });
            run_index(directory, database, verbose, batch_size, include_hidden, output)
        }
        Commands::Import {
            source,
            database,
            method,
            output,
            copy_to,
        } => {
            raw_index::init_tracing("warn");
            let method: ComparisonMethod = method.parse()?;
            run_import(source, database, method, output, copy_to)
        }
        Commands::Summary {
            card,
            database,
            method,
            all_files,
        } => {
            raw_index::init_tracing("warn");
            let method: ComparisonMethod = method.parse()?;
            run_summary(card, database, method, all_files)
        }
    }
}

/// Default database location inside the user's data directory
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("raw-index"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .join("photo_index.db.sqlite")
}

fn open_index(database: Option<PathBuf>) -> Result<SqliteIndex> {
    let path = database.unwrap_or_else(default_database_path);
    Ok(SqliteIndex::open(&path)?)
}

fn progress_bar(output: OutputFormat) -> Option<ProgressBar> {
    if output != OutputFormat::Pretty {
        return None;
    }
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    pb.set_style(style);
    Some(pb)
}

/// Drive a progress bar from pipeline and comparator events until every
/// sender is dropped
fn spawn_progress(receiver: EventReceiver, progress: Option<ProgressBar>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let Some(pb) = progress else {
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Completed { total_candidates }) => {
                    pb.set_length(total_candidates as u64);
                }
                Event::Index(IndexEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Import(ImportEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    pb.set_message(format!("{} new", p.new_files));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Import(ImportEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
        pb.finish_and_clear();
    })
}

fn print_header(term: &Term, title: &str) {
    term.write_line(&format!(
        "{} {}",
        style(title).bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn run_index(
    directory: PathBuf,
    database: Option<PathBuf>,
    verbose: bool,
    batch_size: usize,
    include_hidden: bool,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    if output == OutputFormat::Pretty {
        print_header(&term, "RAW Index");
    }

    let mut builder = Pipeline::builder()
        .paths(vec![directory])
        .batch_size(batch_size)
        .include_hidden(include_hidden)
        .dry_run(verbose);

    // A dry run never opens the database.
    if !verbose {
        builder = builder.index(Arc::new(open_index(database)?));
    }
    let pipeline = builder.build();

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_progress(receiver, progress_bar(output));

    let result = pipeline.run_with_events(&sender);

    drop(sender);
    event_thread.join().ok();

    let report = result?;
    match output {
        OutputFormat::Pretty => print_index_pretty(&term, &report, verbose),
        OutputFormat::Json | OutputFormat::Minimal => print_json(&report),
    }

    Ok(())
}

fn print_index_pretty(term: &Term, report: &IndexReport, dry_run: bool) {
    let heading = if dry_run { "Dry Run Complete" } else { "Indexing Complete" };
    term.write_line(&format!("{} {}", style("✓").green().bold(), heading))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} RAW files found in {:.1}s",
        style(report.total_candidates).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    if dry_run {
        term.write_line(&format!(
            "  {} records would be written",
            style(report.previewed.len()).cyan()
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "  {} new records written",
            style(report.inserted).green()
        ))
        .ok();
        term.write_line(&format!(
            "  {} already indexed",
            style(report.already_indexed()).dim()
        ))
        .ok();
        if report.duplicates_in_batch() > 0 {
            term.write_line(&format!(
                "  {} duplicate copies in this run",
                style(report.duplicates_in_batch()).yellow()
            ))
            .ok();
        }
    }

    if !report.errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} files could not be read:",
            style(report.errors.len()).red()
        ))
        .ok();
        for error in &report.errors {
            term.write_line(&format!("    {} {}", style("!").red(), error))
                .ok();
        }
    }
}

fn run_import(
    source: PathBuf,
    database: Option<PathBuf>,
    method: ComparisonMethod,
    output: OutputFormat,
    copy_to: Option<PathBuf>,
) -> Result<()> {
    let term = Term::stderr();
    if output == OutputFormat::Pretty {
        print_header(&term, "RAW Import");
    }

    let index = open_index(database)?;
    let comparator = ImportComparator::new(&index, method);

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_progress(receiver, progress_bar(output));

    let result = comparator.compare_with_events(&source, &sender);

    drop(sender);
    event_thread.join().ok();

    let report = result?;
    let transfer = match copy_to {
        Some(destination) => Some(copy_new_files(&report, &destination, output)?),
        None => None,
    };

    match output {
        OutputFormat::Pretty => print_import_pretty(&term, &report, transfer.as_ref()),
        OutputFormat::Json => print_json(&serde_json::json!({
            "report": report,
            "transfer": transfer,
        })),
        OutputFormat::Minimal => {
            for path in report.new_files() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn copy_new_files(
    report: &ImportReport,
    destination: &Path,
    output: OutputFormat,
) -> Result<TransferResult> {
    let files: Vec<PathBuf> = report.new_files().cloned().collect();
    let progress = progress_bar(output);
    if let Some(pb) = &progress {
        pb.set_length(files.len() as u64);
        pb.set_message("Copying");
    }

    let result = transfer::copy_into(&files, destination, |done, _, _| {
        if let Some(pb) = &progress {
            pb.set_position(done as u64);
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    Ok(result)
}

fn print_import_pretty(term: &Term, report: &ImportReport, transfer: Option<&TransferResult>) {
    term.write_line(&format!(
        "{} Compared by {}",
        style("✓").green().bold(),
        report.method
    ))
    .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} new, {} already in the library ({:.1}s)",
        style(report.new_count()).green(),
        style(report.known_count()).dim(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line("").ok();

    if report.new_count() == 0 {
        term.write_line(&format!("  {}", style("Nothing new to import.").green()))
            .ok();
    } else {
        for path in report.new_files() {
            term.write_line(&format!("    {} {}", style("+").green(), display_path(path)))
                .ok();
        }
    }

    for error in &report.errors {
        term.write_line(&format!("    {} {}", style("!").red(), error))
            .ok();
    }

    if let Some(transfer) = transfer {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} copied ({}), {} already present",
            style(transfer.copied.len()).green(),
            format_bytes(transfer.total_size_bytes),
            style(transfer.skipped_existing.len()).yellow()
        ))
        .ok();
        for error in &transfer.errors {
            term.write_line(&format!("    {} {}", style("!").red(), error))
                .ok();
        }
        term.write_line(&format!(
            "{}",
            style("Copied files are not indexed until you run `raw-index index`.").dim()
        ))
        .ok();
    }
}

fn run_summary(
    card: PathBuf,
    database: Option<PathBuf>,
    method: ComparisonMethod,
    all_files: bool,
) -> Result<()> {
    let index = open_index(database)?;
    let filter = if all_files {
        ExtensionFilter::accept_all()
    } else {
        ExtensionFilter::raw()
    };

    let days = summarize_card(&card, &index, method, &filter)?;
    print_summary(&Term::stdout(), &days);
    Ok(())
}

fn print_summary(term: &Term, days: &[DaySummary]) {
    term.write_line(&format!(
        "{:<12} {:>7} {:>7}",
        style("Date").bold(),
        style("Files").bold(),
        style("New").bold()
    ))
    .ok();

    for day in days {
        let new = day.new_files.len();
        let new_cell = if new > 0 {
            style(new).green()
        } else {
            style(new).dim()
        };
        term.write_line(&format!(
            "{:<12} {:>7} {:>7}",
            day.date.format("%Y-%m-%d"),
            day.total(),
            new_cell
        ))
        .ok();
    }

    let total: usize = days.iter().map(DaySummary::total).sum();
    let new: usize = days.iter().map(|d| d.new_files.len()).sum();
    term.write_line(&format!(
        "{:<12} {:>7} {:>7}",
        style("Total").dim(),
        total,
        new
    ))
    .ok();
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to encode output: {}", e),
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
