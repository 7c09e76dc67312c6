//! # CLI Module
//!
//! Command-line interface over [`PhotoLibrary`].
//!
//! ## Usage
//! ```bash
//! # Import a folder (or a single file)
//! photo-index import ~/Pictures/2024
//!
//! # List the catalog as JSON
//! photo-index list --output json
//!
//! # Delete two photos and their files, plus RAW companions
//! photo-index delete 12 13 --mode complete --with-raw
//!
//! # Extract a RAW preview
//! photo-index raw-preview ~/Pictures/IMG_0001.CR2
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_indexer::core::catalog::{PhotoId, PhotoRecord};
use photo_indexer::core::import::ImportResult;
use photo_indexer::core::maintenance::{DeleteMode, DeleteReport, MaintenanceResult};
use photo_indexer::error::{PhotoIndexError, Result};
use photo_indexer::events::{Event, EventChannel, EventReceiver, ImportEvent, ThumbnailEvent};
use photo_indexer::{AppPaths, ImportConfig, PhotoLibrary};
use serde::Serialize;
use std::path::PathBuf;
use std::thread;

/// Photo Indexer - import photos into a searchable catalog
#[derive(Parser, Debug)]
#[command(name = "photo-index")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog database path
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Thumbnail directory
    #[arg(long, global = true)]
    thumbnails: Option<PathBuf>,

    /// RAW preview cache directory
    #[arg(long, global = true)]
    preview_cache: Option<PathBuf>,

    /// Import settings (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a directory, a single file, or a file:// URI
    Import {
        root: String,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Thumbnail bounding box in pixels
        #[arg(long)]
        thumbnail_size: Option<u32>,
    },
    /// List cataloged photos
    List,
    /// Delete photos by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// What to delete
        #[arg(long, default_value = "app-only")]
        mode: Mode,

        /// Also delete RAW files sharing the photo's name
        #[arg(long)]
        with_raw: bool,
    },
    /// Extract (or fetch cached) preview of a RAW file
    RawPreview { path: PathBuf },
    /// Rebuild every thumbnail from its original
    Regenerate,
    /// Delete all thumbnails
    ClearThumbnails,
    /// Delete the catalog, thumbnails and preview cache
    ClearData {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Remove from the catalog only
    AppOnly,
    /// Remove the original file too
    Complete,
}

impl From<Mode> for DeleteMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::AppOnly => DeleteMode::AppOnly,
            Mode::Complete => DeleteMode::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

struct Context {
    paths: AppPaths,
    output: OutputFormat,
    verbose: bool,
    term: Term,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    photo_indexer::init_tracing(if cli.verbose { "debug" } else { "warn" });

    let defaults = AppPaths::default_paths();
    let ctx = Context {
        paths: AppPaths {
            catalog: cli.catalog.unwrap_or(defaults.catalog),
            thumbnails: cli.thumbnails.unwrap_or(defaults.thumbnails),
            preview_cache: cli.preview_cache.unwrap_or(defaults.preview_cache),
        },
        output: cli.output,
        verbose: cli.verbose,
        term: Term::stderr(),
    };

    let mut config = match cli.config {
        Some(ref path) => ImportConfig::from_file(path)?,
        None => ImportConfig::default(),
    };

    match cli.command {
        Commands::Import {
            root,
            include_hidden,
            thumbnail_size,
        } => {
            if include_hidden {
                config = config.include_hidden(true);
            }
            if let Some(size) = thumbnail_size {
                config = config.thumbnail_size(size);
            }
            run_import(&ctx, PhotoLibrary::new(config), &root)
        }
        Commands::List => {
            let photos = PhotoLibrary::new(config).list_photos(&ctx.paths.catalog, &ctx.paths.thumbnails)?;
            print_photos(&ctx, &photos)
        }
        Commands::Delete { ids, mode, with_raw } => {
            let ids: Vec<PhotoId> = ids.into_iter().map(PhotoId).collect();
            let report = PhotoLibrary::new(config).delete_photos(
                &ids,
                &ctx.paths.catalog,
                &ctx.paths.thumbnails,
                mode.into(),
                with_raw,
            )?;
            print_delete_report(&ctx, &report)
        }
        Commands::RawPreview { path } => {
            let preview = PhotoLibrary::new(config).get_raw_preview(
                &path,
                &ctx.paths.preview_cache,
                Some((ctx.paths.catalog.as_path(), ctx.paths.thumbnails.as_path())),
            )?;
            match ctx.output {
                OutputFormat::Json => print_json(&serde_json::json!({ "path": preview })),
                OutputFormat::Pretty => {
                    println!("{}", preview.display());
                    Ok(())
                }
            }
        }
        Commands::Regenerate => run_regenerate(&ctx, PhotoLibrary::new(config)),
        Commands::ClearThumbnails => {
            let removed = PhotoLibrary::new(config)
                .clear_thumbnail_cache(&ctx.paths.thumbnails, Some(&ctx.paths.catalog))?;
            match ctx.output {
                OutputFormat::Json => print_json(&serde_json::json!({ "removed": removed })),
                OutputFormat::Pretty => {
                    ctx.term
                        .write_line(&format!("{} Removed {} thumbnails", style("✓").green().bold(), removed))
                        .ok();
                    Ok(())
                }
            }
        }
        Commands::ClearData { yes } => {
            if !yes {
                return Err(PhotoIndexError::InvalidInput(
                    "clear-data removes the catalog and all caches; pass --yes to confirm".to_string(),
                ));
            }
            PhotoLibrary::new(config).clear_app_data(
                &ctx.paths.thumbnails,
                &ctx.paths.catalog,
                Some(&ctx.paths.preview_cache),
            )?;
            if ctx.output == OutputFormat::Pretty {
                ctx.term
                    .write_line(&format!("{} App data cleared", style("✓").green().bold()))
                    .ok();
            }
            Ok(())
        }
    }
}

fn progress_bar(ctx: &Context) -> Option<ProgressBar> {
    if ctx.output != OutputFormat::Pretty {
        return None;
    }
    let pb = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    Some(pb)
}

/// Drive a progress bar from import events until the sender is dropped
fn spawn_import_renderer(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else { continue };
            match event {
                Event::Import(ImportEvent::Started { total }) => pb.set_length(total as u64),
                Event::Import(ImportEvent::Progress(p)) => {
                    pb.set_length(p.total as u64);
                    pb.set_position(p.current as u64);
                    if verbose {
                        pb.set_message(p.last_path.clone());
                    }
                }
                Event::Import(ImportEvent::FileFailed { path, message }) if verbose => {
                    pb.println(format!("{} {}: {}", style("✗").red(), path, message));
                }
                Event::Import(ImportEvent::Completed(_)) | Event::Import(ImportEvent::Cancelled(_)) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    })
}

fn run_import(ctx: &Context, library: PhotoLibrary, root: &str) -> Result<()> {
    if ctx.output == OutputFormat::Pretty {
        ctx.term
            .write_line(&format!(
                "{} {}",
                style("Photo Indexer").bold().cyan(),
                style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
            ))
            .ok();
    }

    let (sender, receiver) = EventChannel::new();
    let renderer = spawn_import_renderer(receiver, progress_bar(ctx), ctx.verbose);

    let result = library.import(root, &ctx.paths.catalog, &ctx.paths.thumbnails, &sender);

    // Drop sender to signal the renderer to finish
    drop(sender);
    renderer.join().ok();

    let result = result?;
    match ctx.output {
        OutputFormat::Pretty => {
            print_import_summary(&ctx.term, &result);
            Ok(())
        }
        OutputFormat::Json => print_json(&result),
    }
}

fn print_import_summary(term: &Term, result: &ImportResult) {
    let headline = if result.cancelled {
        format!("{} Import cancelled", style("!").yellow().bold())
    } else {
        format!("{} Import complete", style("✓").green().bold())
    };
    term.write_line("").ok();
    term.write_line(&headline).ok();
    term.write_line(&format!("  {} new photos", style(result.success).cyan())).ok();
    term.write_line(&format!("  {} duplicates skipped", style(result.duplicates).cyan())).ok();
    if result.failure > 0 {
        term.write_line(&format!("  {} failed", style(result.failure).red())).ok();
    }
    term.write_line(&format!("  {} candidates", style(result.total).dim())).ok();
}

fn run_regenerate(ctx: &Context, library: PhotoLibrary) -> Result<()> {
    let (sender, receiver) = EventChannel::new();
    let progress = progress_bar(ctx);
    let renderer = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else { continue };
            match event {
                Event::Thumbnail(ThumbnailEvent::Progress { current, total, .. }) => {
                    pb.set_length(total as u64);
                    pb.set_position(current as u64);
                }
                Event::Thumbnail(ThumbnailEvent::Completed(_)) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let result = library.regenerate_thumbnails(&ctx.paths.catalog, &ctx.paths.thumbnails, &sender);
    drop(sender);
    renderer.join().ok();

    let result: MaintenanceResult = result?;
    match ctx.output {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Pretty => {
            ctx.term
                .write_line(&format!(
                    "{} Regenerated {} thumbnails ({} failed)",
                    style("✓").green().bold(),
                    style(result.success).cyan(),
                    result.failure
                ))
                .ok();
            Ok(())
        }
    }
}

fn print_photos(ctx: &Context, photos: &[PhotoRecord]) -> Result<()> {
    if ctx.output == OutputFormat::Json {
        return print_json(&photos);
    }

    if photos.is_empty() {
        ctx.term.write_line("No photos in catalog").ok();
        return Ok(());
    }

    for photo in photos {
        let camera = photo.metadata.camera_display().unwrap_or_default();
        let taken = photo.metadata.date_taken.clone().unwrap_or_default();
        println!(
            "{:>6}  {}x{}  {:<19}  {:<24}  {}",
            style(photo.id).bold(),
            photo.width,
            photo.height,
            taken,
            camera,
            display_path(&photo.path)
        );
    }
    ctx.term
        .write_line(&format!("{} photos", style(photos.len()).cyan()))
        .ok();
    Ok(())
}

fn print_delete_report(ctx: &Context, report: &DeleteReport) -> Result<()> {
    if ctx.output == OutputFormat::Json {
        return print_json(report);
    }
    ctx.term
        .write_line(&format!(
            "{} Deleted {} photos",
            style("✓").green().bold(),
            style(report.deleted.len()).cyan()
        ))
        .ok();
    for failure in &report.failed {
        ctx.term
            .write_line(&format!(
                "  {} {} {}: {}",
                style("✗").red(),
                failure.id,
                failure.path.as_deref().unwrap_or(""),
                failure.message
            ))
            .ok();
    }
    Ok(())
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &str) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    match std::path::Path::new(path).strip_prefix(&home) {
        Ok(rest) if !home.as_os_str().is_empty() => format!("~/{}", rest.display()),
        _ => path.to_string(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PhotoIndexError::InvalidInput(format!("cannot serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}
