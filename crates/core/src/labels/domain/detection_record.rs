use std::fmt;

use crate::shared::constants::RECORD_FIELDS;
use crate::shared::region::Region;

/// One detection line: `class_id x_center y_center width height track_id`.
///
/// Everything except the track ID is kept as the original text so a
/// rewritten line differs from its source only in the last field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionRecord {
    class_id: String,
    geometry: [String; 4],
    track_id: u32,
}

impl DetectionRecord {
    /// Parses a whitespace-separated line.
    ///
    /// Returns `None` unless the line has exactly six fields and the last
    /// one is a non-negative integer.
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != RECORD_FIELDS {
            return None;
        }
        let track_id = fields[5].parse::<u32>().ok()?;
        Some(Self {
            class_id: fields[0].to_string(),
            geometry: [
                fields[1].to_string(),
                fields[2].to_string(),
                fields[3].to_string(),
                fields[4].to_string(),
            ],
            track_id,
        })
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn with_track_id(&self, track_id: u32) -> Self {
        Self {
            track_id,
            ..self.clone()
        }
    }

    /// Normalized `(x_center, y_center, width, height)`, if all four parse.
    pub fn normalized_box(&self) -> Option<(f64, f64, f64, f64)> {
        let [xc, yc, w, h] = &self.geometry;
        Some((
            xc.parse().ok()?,
            yc.parse().ok()?,
            w.parse().ok()?,
            h.parse().ok()?,
        ))
    }

    /// Pixel-space box for a `frame_width x frame_height` frame.
    pub fn pixel_region(&self, frame_width: u32, frame_height: u32) -> Option<Region> {
        let (xc, yc, w, h) = self.normalized_box()?;
        Some(Region::from_normalized(
            xc,
            yc,
            w,
            h,
            frame_width,
            frame_height,
        ))
    }
}

impl fmt::Display for DetectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [xc, yc, w, h] = &self.geometry;
        write!(
            f,
            "{} {xc} {yc} {w} {h} {}",
            self.class_id, self.track_id
        )
    }
}
