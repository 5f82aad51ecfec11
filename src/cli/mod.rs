//! # CLI Module
//!
//! Command-line interface for the culling library.
//!
//! ## Usage
//! ```bash
//! # Import a folder (scan, restore decisions, fill the cache)
//! fotofilter import ~/Shoots/2024-06-01
//!
//! # Mark photos without the UI
//! fotofilter mark ~/Shoots/2024-06-01 keep IMG_0001 IMG_0002
//!
//! # Copy keepers out, or delete rejects
//! fotofilter export ~/Shoots/2024-06-01 ~/Selects
//! fotofilter purge ~/Shoots/2024-06-01 --permanent
//!
//! # Housekeeping
//! fotofilter projects --output json
//! fotofilter repair
//! fotofilter cleanup --days 14
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use fotofilter::core::library::{DeleteMode, Library};
use fotofilter::core::paths::AppPaths;
use fotofilter::core::registry::ProjectEntry;
use fotofilter::core::scanner::PhotoStatus;
use fotofilter::core::settings::Settings;
use fotofilter::error::{FotoFilterError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// FotoFilter - Cull RAW/JPEG shoots without losing a decision
#[derive(Parser, Debug)]
#[command(name = "fotofilter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory (default: ~/.fotofilter)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Worker threads for rendering (default: one per core)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Log what the library does
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a folder and fill its thumbnail/preview cache
    Import {
        /// Folder of photos
        folder: PathBuf,
    },

    /// Record a decision for photos of a folder
    Mark {
        /// Folder of photos
        folder: PathBuf,

        /// Decision to record
        status: Decision,

        /// Photo names (file stem, e.g. IMG_0042)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Copy kept photos (RAW and processed) into a folder
    Export {
        /// Folder of photos
        folder: PathBuf,

        /// Destination folder
        destination: PathBuf,
    },

    /// Delete discarded photos
    Purge {
        /// Folder of photos
        folder: PathBuf,

        /// Delete immediately instead of moving to the trash
        #[arg(long)]
        permanent: bool,
    },

    /// List cached projects
    Projects {
        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Repair selection documents and remove orphaned artifacts
    Repair,

    /// Forget projects not opened for a while
    Cleanup {
        /// Maximum age in days (default: from settings)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Forget one project and its cached images
    Forget {
        /// Folder of photos
        folder: PathBuf,
    },

    /// Show cache disk usage
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Decision {
    Keep,
    Discard,
    Undecided,
}

impl From<Decision> for PhotoStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Keep => PhotoStatus::Keep,
            Decision::Discard => PhotoStatus::Discard,
            Decision::Undecided => PhotoStatus::Undecided,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        fotofilter::init_tracing();
    }

    let paths = match &cli.root {
        Some(root) => AppPaths::new(root),
        None => AppPaths::from_home()
            .ok_or_else(|| FotoFilterError::Config("Cannot locate home directory".to_string()))?,
    };

    let mut settings = Settings::load(&paths);
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }
    // Nobody is looking at an overlay here
    settings.completion_delay_ms = 0;

    let delete_mode = match &cli.command {
        Commands::Purge {
            permanent: true, ..
        } => DeleteMode::Permanent,
        _ => DeleteMode::Trash,
    };

    let mut library = Library::builder()
        .root(paths.root())
        .settings(settings)
        .delete_mode(delete_mode)
        .build()?;

    let term = Term::stderr();
    match cli.command {
        Commands::Import { folder } => run_import(&term, &mut library, &folder),
        Commands::Mark {
            folder,
            status,
            names,
        } => run_mark(&term, &mut library, &folder, status.into(), &names),
        Commands::Export {
            folder,
            destination,
        } => run_export(&term, &mut library, &folder, &destination),
        Commands::Purge { folder, .. } => run_purge(&term, &mut library, &folder),
        Commands::Projects { output } => {
            let projects = library.refresh_projects().to_vec();
            match output {
                OutputFormat::Pretty => print_projects(&term, &projects),
                OutputFormat::Json => print_json(&projects)?,
            }
            Ok(())
        }
        Commands::Repair => {
            let report = library.registry().repair();
            term.write_line(&format!(
                "{} Checked {} documents, rewrote {}, removed {} orphaned images",
                style("✓").green().bold(),
                report.documents_checked,
                report.documents_rewritten,
                report.orphans_removed
            ))
            .ok();
            Ok(())
        }
        Commands::Cleanup { days } => {
            let days = days.unwrap_or(library.settings().selection_max_age_days);
            let removed = library.registry().cleanup_old(days);
            term.write_line(&format!(
                "{} Removed {} projects not opened in {} days",
                style("✓").green().bold(),
                removed,
                days
            ))
            .ok();
            Ok(())
        }
        Commands::Forget { folder } => {
            let removed = library.delete_project(&folder)?;
            let message = if removed {
                format!("{} Forgot {}", style("✓").green().bold(), folder.display())
            } else {
                format!("{} Could not forget {}", style("!").yellow().bold(), folder.display())
            };
            term.write_line(&message).ok();
            Ok(())
        }
        Commands::Stats => {
            let stats = library.cache().stats();
            term.write_line(&format!(
                "  {} projects, {} cached images, {}",
                style(stats.projects).cyan(),
                style(stats.artifacts).cyan(),
                style(format_bytes(stats.total_size_bytes)).yellow()
            ))
            .ok();
            Ok(())
        }
    }
}

fn progress_bar(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(template) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(template.progress_chars("█▓░"));
    }
    pb.set_message(message);
    pb
}

/// Open a folder with a progress bar for the cache fill
fn open_with_progress(term: &Term, library: &mut Library, folder: &Path) -> Result<()> {
    let pb = progress_bar("rendering");
    let summary = library.open_folder(folder, |completed, total| {
        pb.set_length(total as u64);
        pb.set_position(completed as u64);
    })?;
    pb.finish_and_clear();

    let skipped = library.session().map(|s| s.skipped.len()).unwrap_or(0);
    term.write_line(&format!(
        "{} {} photos ({} skipped files), {} rendered, {} cached, {} failed",
        style("✓").green().bold(),
        style(library.photos().len()).cyan(),
        skipped,
        summary.generated,
        summary.already_cached,
        style(summary.failed()).red()
    ))
    .ok();
    Ok(())
}

fn run_import(term: &Term, library: &mut Library, folder: &Path) -> Result<()> {
    open_with_progress(term, library, folder)?;

    let counts = library.counts();
    term.write_line(&format!(
        "  {} kept, {} discarded, {} undecided",
        style(counts.kept).green(),
        style(counts.discarded).red(),
        counts.undecided
    ))
    .ok();
    library.close_folder();
    Ok(())
}

fn run_mark(
    term: &Term,
    library: &mut Library,
    folder: &Path,
    status: PhotoStatus,
    names: &[String],
) -> Result<()> {
    open_with_progress(term, library, folder)?;

    for name in names {
        let index = library.photos().iter().position(|p| &p.name == name);
        match index {
            Some(index) => {
                library.navigate(index);
                library.decide(status)?;
            }
            None => {
                term.write_line(&format!("{} No photo named {}", style("!").yellow().bold(), name))
                    .ok();
            }
        }
    }

    library.close_folder();
    Ok(())
}

fn run_export(term: &Term, library: &mut Library, folder: &Path, destination: &Path) -> Result<()> {
    open_with_progress(term, library, folder)?;

    let pb = progress_bar("copying");
    let report = library.export(destination, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    term.write_line(&format!(
        "{} Exported {} files ({}) to {}",
        style("✓").green().bold(),
        report.files,
        format_bytes(report.total_size_bytes),
        destination.display()
    ))
    .ok();
    Ok(())
}

fn run_purge(term: &Term, library: &mut Library, folder: &Path) -> Result<()> {
    open_with_progress(term, library, folder)?;

    let report = library.delete_discarded()?;
    term.write_line(&format!(
        "{} Deleted {} files ({})",
        style("✓").green().bold(),
        report.files,
        format_bytes(report.total_size_bytes)
    ))
    .ok();
    Ok(())
}

fn print_projects(term: &Term, projects: &[ProjectEntry]) {
    if projects.is_empty() {
        term.write_line(&format!("  {}", style("No cached projects").dim()))
            .ok();
        return;
    }

    for project in projects {
        term.write_line(&format!(
            "  {} {}",
            style(&project.folder_name).bold(),
            style(project.folder_path.display()).dim()
        ))
        .ok();
        term.write_line(&format!(
            "    {} kept, {} discarded, {} remaining ({:.0}% done), last opened {}",
            style(project.kept).green(),
            style(project.discarded).red(),
            project.remaining,
            project.decided_fraction() * 100.0,
            project.last_accessed.format("%Y-%m-%d %H:%M")
        ))
        .ok();
    }
}

fn print_json(projects: &[ProjectEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(projects)
        .map_err(|e| FotoFilterError::Config(e.to_string()))?;
    println!("{}", json);
    Ok(())
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
