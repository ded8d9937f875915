use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Which required input was absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    CorrectionTable,
    SourceVideo,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::CorrectionTable => write!(f, "correction table"),
            InputKind::SourceVideo => write!(f, "source video"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{kind} not found: {}", path.display())]
    MissingInput { kind: InputKind, path: PathBuf },
    #[error("malformed correction table {} (line {line}): {reason}", path.display())]
    MalformedTable {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("video error on {}: {message}", path.display())]
    Video { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn missing(kind: InputKind, path: &Path) -> Self {
        PipelineError::MissingInput {
            kind,
            path: path.to_path_buf(),
        }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn video(path: &Path, err: impl fmt::Display) -> Self {
        PipelineError::Video {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Errors that skip a video with a warning rather than failing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingInput { .. } | PipelineError::MalformedTable { .. }
        )
    }
}
