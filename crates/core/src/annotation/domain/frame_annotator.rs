use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// One subject to mark on an overview frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub subject_id: u32,
    pub region: Region,
}

/// Domain interface for drawing subject boxes and ID labels onto a frame.
///
/// Implementations modify the frame in-place (`&mut Frame`) to avoid allocation.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(
        &self,
        frame: &mut Frame,
        annotations: &[Annotation],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
