use crate::identity::domain::id_map::IdMap;
use crate::labels::domain::detection_record::DetectionRecord;

/// The detections of one frame, in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelArtifact {
    records: Vec<DetectionRecord>,
}

impl LabelArtifact {
    pub fn new(records: Vec<DetectionRecord>) -> Self {
        Self { records }
    }

    /// Parses artifact text, silently dropping malformed lines.
    pub fn parse(text: &str) -> Self {
        Self {
            records: text.lines().filter_map(DetectionRecord::parse).collect(),
        }
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps records whose track ID is mapped and substitutes the canonical ID.
    pub fn remap(&self, id_map: &IdMap) -> LabelArtifact {
        let records = self
            .records
            .iter()
            .filter_map(|r| id_map.canonical(r.track_id()).map(|c| r.with_track_id(c)))
            .collect();
        LabelArtifact { records }
    }

    /// File contents: one record per line, each newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_string());
            out.push('\n');
        }
        out
    }
}
