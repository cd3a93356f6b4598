//! # CLI Module
//!
//! Command-line interface for the burst curator.
//!
//! ## Usage
//! ```bash
//! # Analyze a folder, writing a sidecar next to every photo
//! burst-scan scan ~/Photos/trip
//!
//! # Re-analyze everything with 8 workers
//! burst-scan scan ~/Photos/trip --threads 8 --force
//!
//! # List bursts and the sharpest photo of each
//! burst-scan bursts ~/Photos/trip --time-window 2 --threshold 8
//!
//! # JSON output
//! burst-scan bursts ~/Photos/trip --output json
//! ```

use burst_curator::core::cache::{RecordCache, SidecarCache};
use burst_curator::core::clustering::{ClusterConfig, PhotoCluster, ScoreMap, SimilarityClusterer};
use burst_curator::core::grouping::{GroupingConfig, TimeGroup, TimeWindowGrouper};
use burst_curator::core::hasher::HashVariant;
use burst_curator::core::media::{CaptureTimeSource, ExifCaptureTime, MediaItem};
use burst_curator::core::neighbors::NeighborConfig;
use burst_curator::core::scanner::{PhotoScanner, ScanConfig, WalkDirScanner};
use burst_curator::core::sharpness::SharpnessMethod;
use burst_curator::core::worker::{FolderScanWorker, ScanSession, WorkerConfig};
use burst_curator::error::Result;
use burst_curator::events::{Event, EventChannel, ScanEvent, ScanSummary};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::debug;

/// Burst Curator - find bursts, keep the sharpest shot
#[derive(Parser, Debug)]
#[command(name = "burst-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a folder incrementally and write sidecar records
    Scan {
        /// Folder to scan
        folder: PathBuf,

        /// Analysis worker threads
        #[arg(short = 'j', long, default_value = "4")]
        threads: usize,

        /// Re-analyze photos even when their record is current
        #[arg(short, long)]
        force: bool,

        /// Sharpness methods to compute
        #[arg(short, long, value_delimiter = ',', default_values = ["laplacian", "tenengrad", "roi"])]
        methods: Vec<Method>,

        /// Skip burst neighbor detection
        #[arg(long)]
        no_neighbors: bool,

        /// Maximum seconds between neighbors
        #[arg(long, default_value = "3.0")]
        neighbor_window: f64,

        /// Minimum histogram similarity for a neighbor (0-1)
        #[arg(long, default_value = "0.85")]
        similarity: f64,

        /// Photos to look at in each direction
        #[arg(long, default_value = "20")]
        max_neighbors: usize,

        /// Use the file modification time when EXIF has no capture time
        #[arg(long)]
        mtime_fallback: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// List burst clusters and the sharpest photo of each
    Bursts {
        /// Folder to inspect
        folder: PathBuf,

        /// Longest burst, in seconds from its first photo
        #[arg(long, default_value = "3.0")]
        time_window: f64,

        /// Longest pause between consecutive photos of a burst, in seconds
        #[arg(long, default_value = "2.0")]
        max_gap: f64,

        /// Maximum hash distance to the cluster seed (lower = stricter)
        #[arg(short, long, default_value = "6")]
        threshold: u32,

        /// Hash algorithm to use
        #[arg(short, long, default_value = "perceptual")]
        algorithm: Algorithm,

        /// Hash grid size
        #[arg(long, default_value = "8")]
        hash_size: u32,

        /// Sharpness method used to pick the best photo
        #[arg(short, long, default_value = "laplacian")]
        method: Method,

        /// Cluster the whole folder at once, ignoring capture times
        #[arg(long)]
        ignore_time: bool,

        /// Use the file modification time when EXIF has no capture time
        #[arg(long)]
        mtime_fallback: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Average Hash - Fast, good for exact copies
    Average,
    /// Difference Hash - Good balance
    Gradient,
    /// Perceptual Hash - Most robust to edits (default)
    Perceptual,
}

impl From<Algorithm> for HashVariant {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Average => HashVariant::Average,
            Algorithm::Gradient => HashVariant::Gradient,
            Algorithm::Perceptual => HashVariant::Perceptual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    /// Variance of the Laplacian
    Laplacian,
    /// Mean squared Sobel gradient
    Tenengrad,
    /// Laplacian variance inside edge regions
    Roi,
    /// Plain intensity variance
    Variance,
}

impl From<Method> for SharpnessMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Laplacian => SharpnessMethod::Laplacian,
            Method::Tenengrad => SharpnessMethod::Tenengrad,
            Method::Roi => SharpnessMethod::Roi,
            Method::Variance => SharpnessMethod::Variance,
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

    match cli.command {
        Commands::Scan {
            folder,
            threads,
            force,
            methods,
            no_neighbors,
            neighbor_window,
            similarity,
            max_neighbors,
            mtime_fallback,
            include_hidden,
            output,
        } => {
            let neighbors = (!no_neighbors).then_some(NeighborConfig {
                time_threshold: neighbor_window,
                similarity_threshold: similarity,
                max_neighbors,
            });
            let config = WorkerConfig {
                threads,
                force,
                sharpness_methods: methods.into_iter().map(SharpnessMethod::from).collect(),
                neighbors,
            };
            run_scan(&folder, config, mtime_fallback, include_hidden, output)
        }
        Commands::Bursts {
            folder,
            time_window,
            max_gap,
            threshold,
            algorithm,
            hash_size,
            method,
            ignore_time,
            mtime_fallback,
            include_hidden,
            output,
        } => {
            let options = BurstOptions {
                grouping: GroupingConfig {
                    time_window,
                    max_gap,
                },
                clustering: ClusterConfig {
                    variant: algorithm.into(),
                    hash_size,
                    threshold,
                },
                method: method.into(),
                ignore_time,
                mtime_fallback,
                include_hidden,
            };
            run_bursts(&folder, &options, output)
        }
    }
}

fn scanner(include_hidden: bool) -> WalkDirScanner {
    WalkDirScanner::new(ScanConfig {
        include_hidden,
        ..ScanConfig::default()
    })
}

fn header(term: &Term, output: OutputFormat) {
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Burst Curator").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

fn run_scan(
    folder: &Path,
    config: WorkerConfig,
    mtime_fallback: bool,
    include_hidden: bool,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    header(&term, output);

    let worker = FolderScanWorker::builder()
        .config(config)
        .scanner(Box::new(scanner(include_hidden)))
        .cache(Box::new(SidecarCache::new()))
        .capture_times(Box::new(
            ExifCaptureTime::new().with_mtime_fallback(mtime_fallback),
        ))
        .build()?;

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        let bar_style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
        pb.set_style(bar_style);
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            for _ in receiver.iter() {}
            return;
        };
        for event in receiver.iter() {
            match event {
                Event::Scan(ScanEvent::Started { total, skipped, .. }) => {
                    pb.set_length(total as u64);
                    pb.set_position(skipped as u64);
                    pb.set_message("analyzing");
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    // Events from parallel workers may arrive out of order
                    if p.completed as u64 > pb.position() {
                        pb.set_position(p.completed as u64);
                    }
                    if let Some(name) = p.current_file.as_deref().and_then(Path::file_name) {
                        pb.set_message(name.to_string_lossy().into_owned());
                    }
                }
                Event::Scan(ScanEvent::NeighborPhaseStarted { .. }) => {
                    pb.set_message("finding bursts");
                }
                Event::Scan(ScanEvent::Completed(_)) | Event::Scan(ScanEvent::Failed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let session = ScanSession::new();
    let result = worker.run_with_events(folder, &session, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let summary = result?;
    match output {
        OutputFormat::Pretty => print_pretty_summary(&term, folder, &summary),
        OutputFormat::Json => print_json(&summary),
    }

    Ok(())
}

fn print_pretty_summary(term: &Term, folder: &Path, summary: &ScanSummary) {
    term.write_line(&format!(
        "{} Scan Complete: {}",
        style("✓").green().bold(),
        folder.display()
    ))
    .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} photos in {:.1}s",
        style(summary.total).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} analyzed", style(summary.scanned).cyan()))
        .ok();
    if summary.skipped > 0 {
        term.write_line(&format!(
            "  {} unchanged since the last scan",
            style(summary.skipped).dim()
        ))
        .ok();
    }
    if summary.errors > 0 {
        term.write_line(&format!(
            "  {} could not be analyzed",
            style(summary.errors).red()
        ))
        .ok();
    }
    term.write_line(&format!(
        "  {} burst candidates",
        style(summary.burst_candidates).yellow()
    ))
    .ok();
}

struct BurstOptions {
    grouping: GroupingConfig,
    clustering: ClusterConfig,
    method: SharpnessMethod,
    ignore_time: bool,
    mtime_fallback: bool,
    include_hidden: bool,
}

#[derive(Serialize)]
struct BurstReport<'a> {
    method: SharpnessMethod,
    time_groups: usize,
    clusters: Vec<ClusterReport<'a>>,
}

#[derive(Serialize)]
struct ClusterReport<'a> {
    photos: Vec<&'a Path>,
    scores: Vec<Option<f64>>,
    best: &'a Path,
}

fn run_bursts(folder: &Path, options: &BurstOptions, output: OutputFormat) -> Result<()> {
    let term = Term::stderr();
    header(&term, output);

    let grouper = TimeWindowGrouper::new(options.grouping)?;
    let clusterer = SimilarityClusterer::new(options.clustering)?;

    let listing = scanner(options.include_hidden).scan(folder)?;
    let capture_times = ExifCaptureTime::new().with_mtime_fallback(options.mtime_fallback);
    let photos: Vec<MediaItem> = listing
        .photos
        .into_par_iter()
        .map(|item| {
            let time = capture_times.capture_time(&item.path);
            item.with_capture_time(time)
        })
        .collect();

    let paths: Vec<PathBuf> = photos.iter().map(|item| item.path.clone()).collect();
    let scores = stored_scores(&paths, options.method);

    let (groups, clusters) = if options.ignore_time {
        let clusters = clusterer.cluster_collection(&paths, Some(&scores))?;
        (Vec::<TimeGroup>::new(), clusters)
    } else {
        let groups = grouper.group(photos);
        let clusters = clusterer.cluster_groups(&groups, Some(&scores))?;
        (groups, clusters)
    };

    match output {
        OutputFormat::Pretty => {
            print_pretty_bursts(&term, folder, groups.len(), &clusters, options)
        }
        OutputFormat::Json => print_json(&BurstReport {
            method: options.method,
            time_groups: groups.len(),
            clusters: clusters
                .iter()
                .map(|cluster| ClusterReport {
                    photos: cluster.paths().map(PathBuf::as_path).collect(),
                    scores: cluster.scores(),
                    best: cluster.best_photo(),
                })
                .collect(),
        }),
    }

    Ok(())
}

/// Scores recorded by earlier scans. Photos without one, or edited since
/// their scan, stay unranked.
fn stored_scores(paths: &[PathBuf], method: SharpnessMethod) -> ScoreMap {
    let cache = SidecarCache::new();
    paths
        .par_iter()
        .filter_map(|path| {
            let score = cache.load(path).current_score(path, method);
            if score.is_none() {
                debug!(path = %path.display(), "No current {} score", method.name());
            }
            Some((path.clone(), score?))
        })
        .collect()
}

fn print_pretty_bursts(
    term: &Term,
    folder: &Path,
    time_groups: usize,
    clusters: &[PhotoCluster],
    options: &BurstOptions,
) {
    if options.ignore_time {
        term.write_line(&format!(
            "  {} similarity clusters",
            style(clusters.len()).cyan()
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "  {} bursts, {} similarity clusters",
            style(time_groups).cyan(),
            style(clusters.len()).cyan()
        ))
        .ok();
    }
    term.write_line("").ok();

    if clusters.is_empty() {
        term.write_line(&format!("  {}", style("No bursts found").dim()))
            .ok();
        return;
    }

    let unscored = clusters
        .iter()
        .any(|cluster| cluster.members().iter().any(|m| m.sharpness.is_none()));

    for (i, cluster) in clusters.iter().enumerate() {
        term.write_line(&format!(
            "  {} {} photos ({} ≤ {})",
            style(format!("Cluster {}:", i + 1)).bold(),
            cluster.count(),
            options.clustering.variant,
            options.clustering.threshold
        ))
        .ok();

        let best = cluster.best_index();
        for (idx, member) in cluster.members().iter().enumerate() {
            let marker = if idx == best {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            let score = match member.sharpness {
                Some(score) => format!("{} {:.1}", score.method, score.value),
                None => "no score".to_string(),
            };
            let display_path = member.path.strip_prefix(folder).unwrap_or(&member.path);

            term.write_line(&format!(
                "    {} {} {}",
                marker,
                display_path.display(),
                style(score).dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    if unscored {
        term.write_line(&format!(
            "{}",
            style("Some photos have no sharpness score yet. Run `burst-scan scan` first.").dim()
        ))
        .ok();
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode results: {}", e),
    }
}
