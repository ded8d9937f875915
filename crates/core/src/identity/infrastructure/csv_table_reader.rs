use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::identity::domain::id_map::IdMap;
use crate::shared::error::{InputKind, PipelineError};

/// Loads a comma-separated equivalence table into an [`IdMap`].
///
/// One row per group, any number of cells per row, no header. Blank
/// lines and blank cells are skipped.
pub struct CsvTableReader;

impl CsvTableReader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<IdMap, PipelineError> {
        Ok(IdMap::from_rows(self.read_rows(path)?))
    }

    pub fn read_rows(&self, path: &Path) -> Result<Vec<Vec<u32>>, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::missing(InputKind::CorrectionTable, path));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(path, e))?;
            let row = parse_row(path, &record)?;
            if !row.is_empty() {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_row(path: &Path, record: &StringRecord) -> Result<Vec<u32>, PipelineError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    record
        .iter()
        .filter(|cell| !cell.is_empty())
        .map(|cell| {
            cell.parse::<u32>()
                .map_err(|_| PipelineError::MalformedTable {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("'{cell}' is not a track ID"),
                })
        })
        .collect()
}

fn csv_error(path: &Path, err: csv::Error) -> PipelineError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => PipelineError::io(path, source),
            other => PipelineError::MalformedTable {
                path: path.to_path_buf(),
                line,
                reason: format!("{other:?}"),
            },
        }
    } else {
        PipelineError::MalformedTable {
            path: path.to_path_buf(),
            line,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    fn write_table(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.csv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_two_groups() {
        let (_dir, path) = write_table("1,2,5\n3,4\n");
        let map = CsvTableReader::new().load(&path).unwrap();
        assert_eq!(map.canonical(5), Some(1));
        assert_eq!(map.canonical(4), Some(3));
        assert_eq!(map.canonical_ids(), BTreeSet::from([1, 3]));
    }

    #[test]
    fn test_rows_of_varying_length() {
        let (_dir, path) = write_table("7\n10,11,12,13\n");
        let rows = CsvTableReader::new().read_rows(&path).unwrap();
        assert_eq!(rows, vec![vec![7], vec![10, 11, 12, 13]]);
    }

    #[test]
    fn test_blank_lines_cells_and_spaces_are_skipped() {
        let (_dir, path) = write_table("\n 4 , 2 ,\n\n,,\n9,8\n");
        let rows = CsvTableReader::new().read_rows(&path).unwrap();
        assert_eq!(rows, vec![vec![4, 2], vec![9, 8]]);
    }

    #[test]
    fn test_empty_file_yields_empty_map() {
        let (_dir, path) = write_table("");
        let map = CsvTableReader::new().load(&path).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_missing_file_is_missing_input() {
        let err = CsvTableReader::new()
            .load(Path::new("/nonexistent/video.csv"))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingInput {
                kind: InputKind::CorrectionTable,
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_cell_is_malformed() {
        let (_dir, path) = write_table("1,2\n3,abc\n");
        let err = CsvTableReader::new().load(&path).unwrap_err();
        match err {
            PipelineError::MalformedTable { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("abc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
