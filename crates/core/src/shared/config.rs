use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_LABELS_ROOT, DEFAULT_OUTPUT_DIR, DEFAULT_TABLE_DIR, DEFAULT_VIDEO_DIR, FIXED_SUFFIX,
    TABLE_EXTENSION, VIDEO_EXTENSION,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory layout and naming conventions for a run.
///
/// Every path the pipeline touches is derived from this struct, so a
/// batch over many videos only differs in the video name passed to the
/// path helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `<video>.csv` correction tables.
    pub table_dir: PathBuf,
    /// Root under which the tracker wrote `<video>/labels/*.txt`.
    pub labels_root: PathBuf,
    /// Directory holding the source videos.
    pub video_dir: PathBuf,
    /// Directory receiving overview and masked videos.
    pub output_dir: PathBuf,
    pub video_extension: String,
    pub fixed_suffix: String,
    /// Log progress every N items (label files or frames).
    pub progress_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table_dir: PathBuf::from(DEFAULT_TABLE_DIR),
            labels_root: PathBuf::from(DEFAULT_LABELS_ROOT),
            video_dir: PathBuf::from(DEFAULT_VIDEO_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            video_extension: VIDEO_EXTENSION.to_string(),
            fixed_suffix: FIXED_SUFFIX.to_string(),
            progress_every: 10,
        }
    }
}

impl PipelineConfig {
    /// Loads a JSON config; missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn table_path(&self, video: &str) -> PathBuf {
        self.table_dir.join(format!("{video}.{TABLE_EXTENSION}"))
    }

    pub fn labels_dir(&self, video: &str) -> PathBuf {
        self.labels_root.join(video).join("labels")
    }

    pub fn video_path(&self, video: &str) -> PathBuf {
        self.video_dir
            .join(format!("{video}.{}", self.video_extension))
    }

    pub fn output_paths(&self, video: &str) -> OutputPaths {
        OutputPaths {
            output_dir: self.output_dir.clone(),
            video: video.to_string(),
            extension: self.video_extension.clone(),
            fixed_suffix: self.fixed_suffix.clone(),
        }
    }
}

/// Output file names for one video's render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    output_dir: PathBuf,
    video: String,
    extension: String,
    fixed_suffix: String,
}

impl OutputPaths {
    /// `<output_dir>/<video>_fixed.<ext>`
    pub fn overview(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}.{}",
            self.video, self.fixed_suffix, self.extension
        ))
    }

    /// Where the overview is encoded before being moved to
    /// [`OutputPaths::overview`] once every stream is finalized.
    pub fn overview_partial(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}.partial.{}",
            self.video, self.fixed_suffix, self.extension
        ))
    }

    /// `<output_dir>/<video>_ID<id>_masked.<ext>`
    pub fn masked(&self, subject_id: u32) -> PathBuf {
        self.output_dir.join(format!(
            "{}_ID{subject_id}_masked.{}",
            self.video, self.extension
        ))
    }

    /// The overview doubles as the "already rendered" marker.
    pub fn overview_exists(&self) -> bool {
        self.overview().exists()
    }
}
