use std::path::{Path, PathBuf};

use crate::labels::domain::label_artifact::LabelArtifact;
use crate::shared::error::PipelineError;

/// Access to one video's per-frame label artifacts.
///
/// Raw artifacts come from the tracker; rewritten artifacts are written
/// once next to them and never regenerated.
pub trait LabelStore: Send {
    /// Raw artifacts in frame order. Rewritten artifacts are excluded.
    fn raw_artifacts(&self) -> Result<Vec<PathBuf>, PipelineError>;

    fn rewritten_path(&self, raw: &Path) -> PathBuf;

    /// "Already done" predicate for the rewrite step.
    fn is_rewritten(&self, raw: &Path) -> bool {
        self.rewritten_path(raw).exists()
    }

    fn read_raw(&self, raw: &Path) -> Result<LabelArtifact, PipelineError>;

    /// Persists `artifact` as the rewritten sibling of `raw`. Readers never
    /// observe a partially written file.
    fn write_rewritten(
        &self,
        raw: &Path,
        artifact: &LabelArtifact,
    ) -> Result<PathBuf, PipelineError>;

    /// Rewritten artifact for a frame index, `None` when absent.
    fn read_frame(&self, frame_index: usize) -> Result<Option<LabelArtifact>, PipelineError>;
}
