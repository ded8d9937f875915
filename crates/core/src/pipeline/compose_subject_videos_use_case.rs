use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::annotation::domain::frame_annotator::{Annotation, FrameAnnotator};
use crate::identity::domain::id_map::IdMap;
use crate::labels::domain::label_store::LabelStore;
use crate::shared::config::OutputPaths;
use crate::shared::error::{InputKind, PipelineError};
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_backend::VideoBackend;
use crate::video::domain::video_reader::VideoReader;

use super::output_streams::OutputStreams;
use super::pipeline_logger::PipelineLogger;

/// Result of one render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// The overview already existed; nothing was opened or written.
    AlreadyRendered,
    Rendered { frames: usize, subjects: usize },
}

/// A subject's masked output: black except the subject's current box.
///
/// The buffer is allocated once and reused; each frame only the previously
/// painted rectangle is cleared before the new one is copied in.
#[derive(Default)]
struct SubjectCanvas {
    frame: Option<Frame>,
    painted: Option<Region>,
}

impl SubjectCanvas {
    fn update(&mut self, source: &Frame, region: Option<&Region>) -> &Frame {
        let canvas = self.frame.get_or_insert_with(|| Frame::black_like(source));
        if let Some(previous) = self.painted.take() {
            canvas.clear_region(&previous);
        }
        if let Some(region) = region {
            self.painted = canvas.copy_region_from(source, region);
        }
        canvas.set_index(source.index());
        canvas
    }
}

/// Renders the annotated overview and one masked video per canonical
/// subject from a source video and its rewritten labels.
///
/// Every output has exactly one frame per decoded source frame. Frames
/// without a rewritten label artifact pass through unannotated, and every
/// masked output gets a black frame for them.
pub struct ComposeSubjectVideosUseCase<'a> {
    backend: &'a dyn VideoBackend,
    annotator: &'a dyn FrameAnnotator,
    labels: &'a dyn LabelStore,
}

impl<'a> ComposeSubjectVideosUseCase<'a> {
    pub fn new(
        backend: &'a dyn VideoBackend,
        annotator: &'a dyn FrameAnnotator,
        labels: &'a dyn LabelStore,
    ) -> Self {
        Self {
            backend,
            annotator,
            labels,
        }
    }

    pub fn execute(
        &self,
        source: &Path,
        outputs: &OutputPaths,
        id_map: &IdMap,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ComposeOutcome, PipelineError> {
        if outputs.overview_exists() {
            logger.info(&format!(
                "Overview already rendered: {} (skipped)",
                outputs.overview().display()
            ));
            return Ok(ComposeOutcome::AlreadyRendered);
        }
        if !source.is_file() {
            return Err(PipelineError::missing(InputKind::SourceVideo, source));
        }

        let mut reader = self.backend.reader();
        let metadata = match reader.open(source) {
            Ok(metadata) => metadata,
            Err(e) => {
                logger.warn(&format!("Cannot open {}: {e}", source.display()));
                return Err(PipelineError::missing(InputKind::SourceVideo, source));
            }
        };

        let subjects = id_map.canonical_ids();
        logger.info(&format!(
            "Rendering {} ({}x{} @ {:.2} fps) with {} subject(s)",
            source.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            subjects.len()
        ));

        let partial = outputs.overview_partial();
        let rendered = self.render(reader.as_mut(), &metadata, outputs, &subjects, logger);
        reader.close();

        let frames = match rendered {
            Ok(frames) => frames,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };

        let overview = outputs.overview();
        fs::rename(&partial, &overview).map_err(|e| PipelineError::io(&overview, e))?;
        logger.info(&format!(
            "Wrote {} and {} masked video(s), {frames} frames each",
            overview.display(),
            subjects.len()
        ));

        Ok(ComposeOutcome::Rendered {
            frames,
            subjects: subjects.len(),
        })
    }

    fn render(
        &self,
        reader: &mut dyn VideoReader,
        metadata: &VideoMetadata,
        outputs: &OutputPaths,
        subjects: &BTreeSet<u32>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, PipelineError> {
        let overview_path = outputs.overview_partial();
        let mut streams = OutputStreams::open(
            self.backend,
            metadata,
            &overview_path,
            subjects.iter().copied(),
            |id| outputs.masked(id),
        )?;
        let mut canvases: BTreeMap<u32, SubjectCanvas> = subjects
            .iter()
            .map(|&id| (id, SubjectCanvas::default()))
            .collect();

        let limit = metadata.frame_limit();
        let total = limit.unwrap_or(0);
        let mut written = 0;

        for item in reader.frames() {
            if limit.is_some_and(|limit| written >= limit) {
                break;
            }
            let mut frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    logger.warn(&format!("Decoding stopped at frame {written}: {e}"));
                    break;
                }
            };

            let started = Instant::now();
            frame.set_index(written);
            let annotations = self.annotations_for(&frame)?;

            // Masks copy from the clean frame, so they go before annotating.
            for (&id, canvas) in canvases.iter_mut() {
                let region = annotations
                    .iter()
                    .find(|a| a.subject_id == id)
                    .map(|a| &a.region);
                streams.write_subject(id, canvas.update(&frame, region))?;
            }

            self.annotator
                .annotate(&mut frame, &annotations)
                .map_err(|e| PipelineError::video(&overview_path, e))?;
            streams.write_overview(&frame)?;
            written += 1;

            logger.timing("compose", started.elapsed().as_secs_f64() * 1000.0);
            logger.metric("subjects_in_frame", annotations.len() as f64);
            logger.progress("frames", written, total);
        }

        if let Some(limit) = limit {
            if written < limit {
                logger.warn(&format!(
                    "Stream ended after {written} of {limit} reported frames"
                ));
            }
        }

        streams.close()?;
        Ok(written)
    }

    /// Subjects to draw on a frame. The first record per subject wins;
    /// records whose geometry does not parse are ignored.
    fn annotations_for(&self, frame: &Frame) -> Result<Vec<Annotation>, PipelineError> {
        let Some(artifact) = self.labels.read_frame(frame.index())? else {
            return Ok(Vec::new());
        };

        let mut seen = BTreeSet::new();
        Ok(artifact
            .records()
            .iter()
            .filter_map(|record| {
                let region = record.pixel_region(frame.width(), frame.height())?;
                seen.insert(record.track_id()).then_some(Annotation {
                    subject_id: record.track_id(),
                    region,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::infrastructure::fs_label_store::FsLabelStore;
    use crate::pipeline::pipeline_logger::{Level, LogPipelineLogger, NullPipelineLogger};
    use crate::pipeline::test_support::{solid_frame, StubBackend};
    use crate::shared::config::PipelineConfig;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const W: u32 = 20;
    const H: u32 = 10;

    /// Records what it was asked to draw without touching pixels.
    #[derive(Default)]
    struct RecordingAnnotator {
        calls: Mutex<Vec<(usize, Vec<Annotation>)>>,
    }

    impl FrameAnnotator for RecordingAnnotator {
        fn annotate(
            &self,
            frame: &mut Frame,
            annotations: &[Annotation],
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls
                .lock()
                .unwrap()
                .push((frame.index(), annotations.to_vec()));
            Ok(())
        }
    }

    struct FailingAnnotator;

    impl FrameAnnotator for FailingAnnotator {
        fn annotate(
            &self,
            _frame: &mut Frame,
            _annotations: &[Annotation],
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("draw failed".into())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        config: PipelineConfig,
        source: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = PipelineConfig {
                table_dir: dir.path().join("tables"),
                labels_root: dir.path().join("labels"),
                video_dir: dir.path().join("videos"),
                output_dir: dir.path().join("out"),
                ..PipelineConfig::default()
            };
            fs::create_dir_all(config.labels_dir("clip")).unwrap();
            fs::create_dir_all(&config.video_dir).unwrap();
            let source = config.video_path("clip");
            fs::write(&source, b"").unwrap();
            Self {
                dir,
                config,
                source,
            }
        }

        fn label(&self, frame: usize, contents: &str) {
            let path = self
                .config
                .labels_dir("clip")
                .join(format!("clip_{frame}_fixed.txt"));
            fs::write(path, contents).unwrap();
        }

        fn store(&self) -> FsLabelStore {
            FsLabelStore::new(&self.config.labels_dir("clip"), "clip", "_fixed")
        }

        fn outputs(&self) -> OutputPaths {
            self.config.output_paths("clip")
        }

        fn run(
            &self,
            backend: &StubBackend,
            annotator: &dyn FrameAnnotator,
            id_map: &IdMap,
            logger: &mut dyn PipelineLogger,
        ) -> Result<ComposeOutcome, PipelineError> {
            let store = self.store();
            ComposeSubjectVideosUseCase::new(backend, annotator, &store).execute(
                &self.source,
                &self.outputs(),
                id_map,
                logger,
            )
        }
    }

    fn frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| solid_frame(i, W, H, 100 + i as u8))
            .collect()
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> u8 {
        frame.as_ndarray()[[y, x, 0]]
    }

    fn map_1_2() -> IdMap {
        IdMap::from_rows([vec![1u32], vec![2u32]])
    }

    #[test]
    fn test_every_output_has_one_frame_per_source_frame() {
        let fx = Fixture::new();
        fx.label(0, "0 0.5 0.5 0.5 0.5 1\n");
        fx.label(2, "0 0.25 0.5 0.5 1.0 2\n");
        let backend = StubBackend::new(frames(3));

        let outcome = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(
            outcome,
            ComposeOutcome::Rendered {
                frames: 3,
                subjects: 2
            }
        );
        let outputs = fx.outputs();
        assert!(outputs.overview_exists());
        assert!(!outputs.overview_partial().exists());
        assert_eq!(backend.written(&outputs.overview_partial()).len(), 3);
        assert_eq!(backend.written(&outputs.masked(1)).len(), 3);
        assert_eq!(backend.written(&outputs.masked(2)).len(), 3);
        assert!(backend.all_closed());
        assert_eq!(backend.readers_closed(), 1);
    }

    #[test]
    fn test_masked_frame_keeps_only_subject_box() {
        let fx = Fixture::new();
        // 20x10 frame, box (5,2)-(15,7)
        fx.label(0, "0 0.5 0.5 0.5 0.5 1\n");
        let backend = StubBackend::new(frames(1));

        fx.run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        let masked = &backend.written(&fx.outputs().masked(1))[0];
        assert_eq!(pixel(masked, 5, 2), 100);
        assert_eq!(pixel(masked, 14, 6), 100);
        assert_eq!(pixel(masked, 15, 6), 0);
        assert_eq!(pixel(masked, 4, 2), 0);
        assert_eq!(pixel(masked, 5, 7), 0);
    }

    #[test]
    fn test_absent_subject_and_unlabelled_frame_are_black() {
        let fx = Fixture::new();
        fx.label(0, "0 0.5 0.5 0.5 0.5 1\n");
        let backend = StubBackend::new(frames(2));

        fx.run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        let outputs = fx.outputs();
        let subject_two = backend.written(&outputs.masked(2));
        assert!(subject_two.iter().all(|f| f.data().iter().all(|&b| b == 0)));
        // Frame 1 has no label file: subject 1's previous box must be cleared.
        let subject_one = backend.written(&outputs.masked(1));
        assert!(subject_one[1].data().iter().all(|&b| b == 0));
        assert_eq!(subject_one[1].index(), 1);
    }

    #[test]
    fn test_overview_is_source_frame_in_order() {
        let fx = Fixture::new();
        let backend = StubBackend::new(frames(3));

        fx.run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        let overview = backend.written(&fx.outputs().overview_partial());
        let values: Vec<u8> = overview.iter().map(|f| pixel(f, 0, 0)).collect();
        assert_eq!(values, vec![100, 101, 102]);
    }

    #[test]
    fn test_first_record_per_subject_wins_and_bad_geometry_is_ignored() {
        let fx = Fixture::new();
        fx.label(
            0,
            concat!(
                "0 abc 0.5 0.5 0.5 1\n",
                "0 0.25 0.5 0.5 0.5 1\n",
                "0 0.75 0.5 0.5 0.5 1\n",
                "0 0.5 0.5 0.2 0.2 7\n",
            ),
        );
        let backend = StubBackend::new(frames(1));
        let annotator = RecordingAnnotator::default();

        fx.run(&backend, &annotator, &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        let calls = annotator.calls.lock().unwrap();
        let (index, annotations) = &calls[0];
        assert_eq!(*index, 0);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].subject_id, 1);
        assert_eq!(annotations[0].region, Region::from_corners(0, 2, 10, 7));
        // Subject 7 is drawn on the overview but has no masked output.
        assert_eq!(annotations[1].subject_id, 7);
        assert!(!backend.opened_paths().contains(&fx.outputs().masked(7)));
    }

    #[test]
    fn test_box_outside_frame_is_clamped_in_mask() {
        let fx = Fixture::new();
        // Centered on the right edge: (15,0)-(25,10) clamps to (15,0)-(20,10).
        fx.label(0, "0 1.0 0.5 0.5 1.0 1\n");
        let backend = StubBackend::new(frames(1));

        fx.run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        let masked = &backend.written(&fx.outputs().masked(1))[0];
        assert_eq!(pixel(masked, 19, 9), 100);
        assert_eq!(pixel(masked, 14, 0), 0);
    }

    #[test]
    fn test_existing_overview_skips_without_opening_reader() {
        let fx = Fixture::new();
        let outputs = fx.outputs();
        fs::create_dir_all(fx.dir.path().join("out")).unwrap();
        fs::write(outputs.overview(), b"done").unwrap();
        let backend = StubBackend::new(frames(2));
        let mut logger = LogPipelineLogger::default();

        let outcome = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut logger)
            .unwrap();

        assert_eq!(outcome, ComposeOutcome::AlreadyRendered);
        assert_eq!(backend.readers_created(), 0);
        assert!(backend.opened_paths().is_empty());
        assert!(logger
            .messages()
            .iter()
            .any(|(_, m)| m.contains("already rendered")));
    }

    #[test]
    fn test_missing_source_is_missing_input() {
        let fx = Fixture::new();
        fs::remove_file(&fx.source).unwrap();
        let backend = StubBackend::new(frames(1));

        let err = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::MissingInput {
                kind: InputKind::SourceVideo,
                ..
            }
        ));
        assert!(backend.opened_paths().is_empty());
    }

    #[test]
    fn test_unopenable_source_is_missing_input() {
        let fx = Fixture::new();
        let backend = StubBackend::new(frames(1)).failing_open();

        let err = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingInput { .. }));
        assert!(!fx.outputs().overview_exists());
    }

    #[test]
    fn test_stops_at_reported_frame_count() {
        let fx = Fixture::new();
        let backend = StubBackend::new(frames(5)).with_total_frames(3);

        let outcome = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(
            outcome,
            ComposeOutcome::Rendered {
                frames: 3,
                subjects: 2
            }
        );
        assert_eq!(backend.written(&fx.outputs().masked(2)).len(), 3);
    }

    #[test]
    fn test_unknown_frame_count_reads_to_end() {
        let fx = Fixture::new();
        let backend = StubBackend::new(frames(4)).with_total_frames(0);

        let outcome = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut NullPipelineLogger)
            .unwrap();

        assert!(matches!(outcome, ComposeOutcome::Rendered { frames: 4, .. }));
    }

    #[test]
    fn test_early_end_of_stream_finalizes_outputs() {
        let fx = Fixture::new();
        let backend = StubBackend::new(frames(2))
            .with_total_frames(10)
            .with_decode_error();
        let mut logger = LogPipelineLogger::default();

        let outcome = fx
            .run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut logger)
            .unwrap();

        assert!(matches!(outcome, ComposeOutcome::Rendered { frames: 2, .. }));
        assert!(backend.all_closed());
        assert!(fx.outputs().overview_exists());
        assert_eq!(logger.count(Level::Warn), 2);
    }

    #[test]
    fn test_annotator_failure_closes_writers_and_leaves_no_overview() {
        let fx = Fixture::new();
        let backend = StubBackend::new(frames(2));

        let err = fx
            .run(&backend, &FailingAnnotator, &map_1_2(), &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Video { .. }));
        assert!(backend.all_closed());
        assert_eq!(backend.readers_closed(), 1);
        assert!(!fx.outputs().overview_exists());
        assert!(!fx.outputs().overview_partial().exists());
    }

    #[test]
    fn test_empty_id_map_renders_overview_only() {
        let fx = Fixture::new();
        fx.label(0, "0 0.5 0.5 0.5 0.5 4\n");
        let backend = StubBackend::new(frames(2));

        let outcome = fx
            .run(&backend, &RecordingAnnotator::default(), &IdMap::new(), &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(
            outcome,
            ComposeOutcome::Rendered {
                frames: 2,
                subjects: 0
            }
        );
        assert_eq!(backend.opened_paths().len(), 1);
    }

    #[test]
    fn test_reports_frame_progress_metrics() {
        let fx = Fixture::new();
        fx.label(1, "0 0.5 0.5 0.5 0.5 1\n0 0.2 0.2 0.2 0.2 2\n");
        let backend = StubBackend::new(frames(2));
        let mut logger = LogPipelineLogger::default();

        fx.run(&backend, &RecordingAnnotator::default(), &map_1_2(), &mut logger)
            .unwrap();

        assert_eq!(logger.metrics_for("subjects_in_frame").unwrap(), &[0.0, 2.0]);
        assert_eq!(logger.timings_for("compose").unwrap().len(), 2);
    }
}
