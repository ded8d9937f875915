use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_backend::VideoBackend;
use crate::video::domain::video_writer::VideoWriter;

struct Stream {
    path: PathBuf,
    writer: Box<dyn VideoWriter>,
}

impl Stream {
    fn open(
        backend: &dyn VideoBackend,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<Self, PipelineError> {
        let mut writer = backend.writer();
        writer
            .open(path, metadata)
            .map_err(|e| PipelineError::video(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    fn write(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        self.writer
            .write(frame)
            .map_err(|e| PipelineError::video(&self.path, e))
    }

    fn close(&mut self) -> Result<(), PipelineError> {
        self.writer
            .close()
            .map_err(|e| PipelineError::video(&self.path, e))
    }
}

/// The overview writer plus one writer per subject for a single render pass.
///
/// All writers are finalized by [`OutputStreams::close`]; if the set is
/// dropped without closing (early return on error), `Drop` closes them so
/// every container gets its trailer.
pub struct OutputStreams {
    overview: Stream,
    subjects: BTreeMap<u32, Stream>,
    closed: bool,
}

impl OutputStreams {
    /// Opens the overview at `overview_path` and one stream per subject,
    /// named by `subject_path`.
    pub fn open(
        backend: &dyn VideoBackend,
        metadata: &VideoMetadata,
        overview_path: &Path,
        subject_ids: impl IntoIterator<Item = u32>,
        subject_path: impl Fn(u32) -> PathBuf,
    ) -> Result<Self, PipelineError> {
        let mut streams = Self {
            overview: Stream::open(backend, overview_path, metadata)?,
            subjects: BTreeMap::new(),
            closed: false,
        };
        for id in subject_ids {
            let stream = Stream::open(backend, &subject_path(id), metadata)?;
            streams.subjects.insert(id, stream);
        }
        Ok(streams)
    }

    pub fn write_overview(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        self.overview.write(frame)
    }

    /// Writes to a subject's stream. Unknown IDs are ignored.
    pub fn write_subject(&mut self, subject_id: u32, frame: &Frame) -> Result<(), PipelineError> {
        match self.subjects.get_mut(&subject_id) {
            Some(stream) => stream.write(frame),
            None => Ok(()),
        }
    }

    /// Closes every writer, returning the first failure after attempting all.
    pub fn close(mut self) -> Result<(), PipelineError> {
        self.close_all()
    }

    fn close_all(&mut self) -> Result<(), PipelineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_error = None;
        for stream in std::iter::once(&mut self.overview).chain(self.subjects.values_mut()) {
            if let Err(e) = stream.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for OutputStreams {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            log::warn!("Failed to finalize output stream: {e}");
        }
    }
}
