use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frame count reported by the container; 0 when unknown.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Upper bound on frames to process, or `None` to read until the
    /// stream ends.
    pub fn frame_limit(&self) -> Option<usize> {
        (self.total_frames > 0).then_some(self.total_frames)
    }
}
