use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::identity::domain::id_map::IdMap;
use crate::identity::infrastructure::csv_table_reader::CsvTableReader;
use crate::labels::infrastructure::fs_label_store::FsLabelStore;
use crate::shared::config::PipelineConfig;
use crate::shared::constants::TABLE_EXTENSION;
use crate::shared::error::PipelineError;
use crate::video::domain::video_backend::VideoBackend;

use super::compose_subject_videos_use_case::{ComposeOutcome, ComposeSubjectVideosUseCase};
use super::pipeline_logger::PipelineLogger;
use super::rewrite_labels_use_case::{RewriteLabelsUseCase, RewriteReport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoOutcome {
    Completed {
        labels: RewriteReport,
        render: ComposeOutcome,
    },
    /// Missing or unreadable correction table.
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoReport {
    pub video: String,
    pub outcome: VideoOutcome,
}

/// Per-video outcomes of a batch, in processing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub videos: Vec<VideoReport>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn outcome_of(&self, video: &str) -> Option<&VideoOutcome> {
        self.videos
            .iter()
            .find(|r| r.video == video)
            .map(|r| &r.outcome)
    }

    /// One line per video followed by the totals.
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self
            .videos
            .iter()
            .map(|r| match &r.outcome {
                VideoOutcome::Completed { labels, render } => {
                    let render = match render {
                        ComposeOutcome::AlreadyRendered => "already rendered".to_string(),
                        ComposeOutcome::Rendered { frames, subjects } => {
                            format!("{frames} frames, {subjects} subject(s)")
                        }
                    };
                    format!(
                        "  {}: completed ({} labels rewritten, {render})",
                        r.video, labels.rewritten
                    )
                }
                VideoOutcome::Skipped { reason } => format!("  {}: skipped ({reason})", r.video),
                VideoOutcome::Failed { error } => format!("  {}: FAILED ({error})", r.video),
            })
            .collect();
        lines.push(format!(
            "{} video(s): {} completed, {} skipped, {} failed",
            self.videos.len(),
            self.completed(),
            self.skipped(),
            self.failed()
        ));
        lines.join("\n")
    }

    fn count(&self, pred: impl Fn(&VideoOutcome) -> bool) -> usize {
        self.videos.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Drives the rewrite and render steps over a set of videos.
///
/// Videos are independent: a missing correction table skips the video
/// with a warning, any other failure is logged as an error, and the batch
/// moves on either way.
pub struct RunBatchUseCase<'a> {
    config: &'a PipelineConfig,
    backend: &'a dyn VideoBackend,
    annotator: &'a dyn FrameAnnotator,
    tables: CsvTableReader,
}

impl<'a> RunBatchUseCase<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        backend: &'a dyn VideoBackend,
        annotator: &'a dyn FrameAnnotator,
    ) -> Self {
        Self {
            config,
            backend,
            annotator,
            tables: CsvTableReader::new(),
        }
    }

    /// Names of every video with a source file or a correction table,
    /// sorted. A table without its video is kept so the gap gets reported.
    pub fn discover_videos(&self) -> Result<Vec<String>, PipelineError> {
        let mut names = BTreeSet::new();
        names.extend(stems_with_extension(
            &self.config.video_dir,
            &self.config.video_extension,
        )?);
        names.extend(stems_with_extension(&self.config.table_dir, TABLE_EXTENSION)?);
        Ok(names.into_iter().collect())
    }

    pub fn execute(&self, videos: &[String], logger: &mut dyn PipelineLogger) -> BatchReport {
        let total = videos.len();
        let mut report = BatchReport::default();
        if total == 0 {
            logger.warn("No videos to process");
            return report;
        }

        for (i, video) in videos.iter().enumerate() {
            logger.info(&format!("[{}/{total}] Processing {video}", i + 1));
            let outcome = match self.process_video(video, logger) {
                Ok(outcome) => outcome,
                Err(e) => {
                    logger.error(&format!("{video} failed: {e}"));
                    VideoOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.videos.push(VideoReport {
                video: video.clone(),
                outcome,
            });
            logger.progress("videos", i + 1, total);
        }

        report
    }

    pub fn load_id_map(&self, video: &str) -> Result<IdMap, PipelineError> {
        self.tables.load(&self.config.table_path(video))
    }

    /// Rewrites one video's labels without rendering.
    pub fn rewrite_video(
        &self,
        video: &str,
        id_map: &IdMap,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RewriteReport, PipelineError> {
        let store = self.label_store(video);
        RewriteLabelsUseCase::new(&store).execute(id_map, logger)
    }

    /// Renders one video from its existing rewritten labels.
    pub fn render_video(
        &self,
        video: &str,
        id_map: &IdMap,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ComposeOutcome, PipelineError> {
        let store = self.label_store(video);
        ComposeSubjectVideosUseCase::new(self.backend, self.annotator, &store).execute(
            &self.config.video_path(video),
            &self.config.output_paths(video),
            id_map,
            logger,
        )
    }

    fn process_video(
        &self,
        video: &str,
        logger: &mut dyn PipelineLogger,
    ) -> Result<VideoOutcome, PipelineError> {
        let id_map = match self.load_id_map(video) {
            Ok(id_map) => id_map,
            Err(e) if e.is_recoverable() => {
                logger.warn(&format!("{e}; skipping {video}"));
                return Ok(VideoOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        logger.info(&format!(
            "ID map: {} track IDs onto {} subject(s)",
            id_map.len(),
            id_map.canonical_ids().len()
        ));

        let labels = self.rewrite_video(video, &id_map, logger)?;
        let render = self.render_video(video, &id_map, logger)?;
        Ok(VideoOutcome::Completed { labels, render })
    }

    fn label_store(&self, video: &str) -> FsLabelStore {
        FsLabelStore::new(
            self.config.labels_dir(video),
            video,
            &self.config.fixed_suffix,
        )
    }
}

/// File stems in `dir` with the given extension. A missing directory has
/// no entries.
fn stems_with_extension(dir: &Path, extension: &str) -> Result<Vec<String>, PipelineError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !path.is_file() || !matches {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        }
    }
    Ok(stems)
}
