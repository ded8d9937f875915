/// Suffix appended to a raw label file stem to mark it as rewritten.
pub const FIXED_SUFFIX: &str = "_fixed";

pub const LABEL_EXTENSION: &str = "txt";
pub const TABLE_EXTENSION: &str = "csv";
pub const VIDEO_EXTENSION: &str = "mp4";

/// Fields per detection line: class, x_center, y_center, width, height, track id.
pub const RECORD_FIELDS: usize = 6;

/// Frame rate used by the encoder when the source reports none.
pub const FALLBACK_FPS: i32 = 30;

pub const DEFAULT_TABLE_DIR: &str = "fix_trackID";
pub const DEFAULT_LABELS_ROOT: &str = "runs/track";
pub const DEFAULT_VIDEO_DIR: &str = "videos";
pub const DEFAULT_OUTPUT_DIR: &str = "runs/track/fixed_videos";
