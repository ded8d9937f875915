use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use trackfix_core::annotation::infrastructure::box_annotator::BoxAnnotator;
use trackfix_core::pipeline::compose_subject_videos_use_case::ComposeOutcome;
use trackfix_core::pipeline::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use trackfix_core::pipeline::run_batch_use_case::RunBatchUseCase;
use trackfix_core::shared::config::PipelineConfig;
use trackfix_core::video::infrastructure::ffmpeg_backend::FfmpegBackend;

/// Merge fragmented tracker IDs and render per-subject masked videos.
#[derive(Parser)]
#[command(name = "trackfix", version)]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of `<video>.csv` correction tables.
    #[arg(long, global = true)]
    table_dir: Option<PathBuf>,

    /// Root of the tracker output (`<root>/<video>/labels`).
    #[arg(long, global = true)]
    labels_root: Option<PathBuf>,

    /// Directory of source videos.
    #[arg(long, global = true)]
    video_dir: Option<PathBuf>,

    /// Directory for overview and masked videos.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log progress every N label files or frames.
    #[arg(long, global = true)]
    progress_every: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite labels and render videos for every video, or only the named ones.
    Run {
        /// Video names without extension.
        videos: Vec<String>,
    },
    /// Rewrite one video's label files onto canonical IDs.
    Rewrite { video: String },
    /// Render one video's overview and masked outputs from rewritten labels.
    Render { video: String },
    /// Print the ID map built from a video's correction table.
    Ids { video: String },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let backend = FfmpegBackend::new();
    let annotator = BoxAnnotator::default();
    let batch = RunBatchUseCase::new(&config, &backend, &annotator);
    let mut logger = LogPipelineLogger::new(config.progress_every);

    match cli.command {
        Command::Run { videos } => {
            let videos = if videos.is_empty() {
                batch.discover_videos()?
            } else {
                videos
            };
            let report = batch.execute(&videos, &mut logger);
            logger.summary();
            log::info!("Batch finished:\n{}", report.summary());
            if report.has_failures() {
                return Err(format!("{} video(s) failed", report.failed()).into());
            }
        }
        Command::Rewrite { video } => {
            let id_map = batch.load_id_map(&video)?;
            let report = batch.rewrite_video(&video, &id_map, &mut logger)?;
            log::info!(
                "{video}: {} of {} label files rewritten",
                report.rewritten,
                report.total
            );
        }
        Command::Render { video } => {
            let id_map = batch.load_id_map(&video)?;
            match batch.render_video(&video, &id_map, &mut logger)? {
                ComposeOutcome::AlreadyRendered => {
                    log::info!("{video}: nothing to do");
                }
                ComposeOutcome::Rendered { frames, subjects } => {
                    logger.summary();
                    log::info!("{video}: {frames} frames, {subjects} masked video(s)");
                }
            }
        }
        Command::Ids { video } => {
            let id_map = batch.load_id_map(&video)?;
            for (track_id, canonical) in id_map.iter() {
                println!("{track_id} -> {canonical}");
            }
            let subjects: Vec<String> = id_map
                .canonical_ids()
                .iter()
                .map(|id| id.to_string())
                .collect();
            println!("subjects: {}", subjects.join(", "));
        }
    }

    Ok(())
}

/// Defaults, then the `--config` file, then individual flags.
fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &cli.table_dir {
        config.table_dir = dir.clone();
    }
    if let Some(dir) = &cli.labels_root {
        config.labels_root = dir.clone();
    }
    if let Some(dir) = &cli.video_dir {
        config.video_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(every) = cli.progress_every {
        config.progress_every = every;
    }

    Ok(config)
}
