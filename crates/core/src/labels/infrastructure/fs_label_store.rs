use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::labels::domain::label_artifact::LabelArtifact;
use crate::labels::domain::label_store::LabelStore;
use crate::shared::constants::LABEL_EXTENSION;
use crate::shared::error::PipelineError;

/// Label artifacts stored as `<video>_<frame>.txt` files in one directory,
/// with rewritten siblings named `<video>_<frame><suffix>.txt`.
pub struct FsLabelStore {
    dir: PathBuf,
    video: String,
    fixed_suffix: String,
}

impl FsLabelStore {
    pub fn new(dir: impl Into<PathBuf>, video: &str, fixed_suffix: &str) -> Self {
        Self {
            dir: dir.into(),
            video: video.to_string(),
            fixed_suffix: fixed_suffix.to_string(),
        }
    }

    fn is_raw_label(&self, path: &Path) -> bool {
        let is_label = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == LABEL_EXTENSION);
        let is_rewritten = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with(&self.fixed_suffix));
        is_label && !is_rewritten
    }
}

impl LabelStore for FsLabelStore {
    fn raw_artifacts(&self) -> Result<Vec<PathBuf>, PipelineError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| PipelineError::io(&self.dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PipelineError::io(&self.dir, e))?.path();
            if path.is_file() && self.is_raw_label(&path) {
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| {
            frame_index_of(a)
                .cmp(&frame_index_of(b))
                .then_with(|| a.file_name().cmp(&b.file_name()))
        });
        Ok(paths)
    }

    fn rewritten_path(&self, raw: &Path) -> PathBuf {
        let stem = raw
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        raw.with_file_name(format!("{stem}{}.{LABEL_EXTENSION}", self.fixed_suffix))
    }

    fn read_raw(&self, raw: &Path) -> Result<LabelArtifact, PipelineError> {
        read_artifact(raw)
    }

    fn write_rewritten(
        &self,
        raw: &Path,
        artifact: &LabelArtifact,
    ) -> Result<PathBuf, PipelineError> {
        let target = self.rewritten_path(raw);
        let parent = target.parent().unwrap_or(&self.dir);

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| PipelineError::io(parent, e))?;
        tmp.write_all(artifact.render().as_bytes())
            .map_err(|e| PipelineError::io(tmp.path(), e))?;
        tmp.persist(&target)
            .map_err(|e| PipelineError::io(&target, e.error))?;
        Ok(target)
    }

    fn read_frame(&self, frame_index: usize) -> Result<Option<LabelArtifact>, PipelineError> {
        let path = self.dir.join(format!(
            "{}_{frame_index}{}.{LABEL_EXTENSION}",
            self.video, self.fixed_suffix
        ));
        if !path.is_file() {
            return Ok(None);
        }
        read_artifact(&path).map(Some)
    }
}

/// Undecodable bytes become U+FFFD, so the lines holding them fail to parse
/// and are dropped like any other malformed record.
fn read_artifact(path: &Path) -> Result<LabelArtifact, PipelineError> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(LabelArtifact::parse(&String::from_utf8_lossy(&bytes)))
}

/// Frame index embedded after the last underscore of the file stem.
fn frame_index_of(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    let (_, index) = stem.rsplit_once('_')?;
    index.parse().ok()
}
