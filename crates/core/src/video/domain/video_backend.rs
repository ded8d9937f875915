use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Creates fresh readers and writers on demand.
///
/// A render pass needs one reader and `1 + subjects` writers, and a batch
/// repeats that per video, so use cases hold a backend rather than
/// individual codec objects.
pub trait VideoBackend: Send + Sync {
    fn reader(&self) -> Box<dyn VideoReader>;
    fn writer(&self) -> Box<dyn VideoWriter>;
}
