use crate::identity::domain::id_map::IdMap;
use crate::labels::domain::label_store::LabelStore;
use crate::shared::error::PipelineError;

use super::pipeline_logger::PipelineLogger;

/// Outcome counts of one rewrite pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub total: usize,
    pub rewritten: usize,
    pub already_done: usize,
    /// Raw artifacts with no record surviving the ID filter.
    pub empty: usize,
}

/// Rewrites every raw label artifact of one video onto canonical IDs.
///
/// Records with unmapped IDs are dropped. Existing rewritten artifacts are
/// left untouched, so reruns only fill in what is missing.
pub struct RewriteLabelsUseCase<'a> {
    labels: &'a dyn LabelStore,
}

impl<'a> RewriteLabelsUseCase<'a> {
    pub fn new(labels: &'a dyn LabelStore) -> Self {
        Self { labels }
    }

    pub fn execute(
        &self,
        id_map: &IdMap,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RewriteReport, PipelineError> {
        let raw = self.labels.raw_artifacts()?;
        let total = raw.len();
        let mut report = RewriteReport {
            total,
            ..RewriteReport::default()
        };

        if total == 0 {
            logger.warn("No label files found to rewrite");
            return Ok(report);
        }
        logger.info(&format!("Rewriting {total} label files"));

        for (i, path) in raw.iter().enumerate() {
            let position = i + 1;

            if self.labels.is_rewritten(path) {
                report.already_done += 1;
                logger.info(&format!(
                    "({position}/{total}) already rewritten: {} (skipped)",
                    self.labels.rewritten_path(path).display()
                ));
            } else {
                let remapped = self.labels.read_raw(path)?.remap(id_map);
                if remapped.is_empty() {
                    report.empty += 1;
                    logger.info(&format!(
                        "({position}/{total}) no matching IDs: {} (skipped)",
                        path.display()
                    ));
                } else {
                    let written = self.labels.write_rewritten(path, &remapped)?;
                    report.rewritten += 1;
                    logger.info(&format!(
                        "({position}/{total}) rewritten: {} ({} records)",
                        written.display(),
                        remapped.len()
                    ));
                }
            }

            logger.progress("labels", position, total);
        }

        logger.info(&format!(
            "Label rewrite finished: {} written, {} already done, {} without matches",
            report.rewritten, report.already_done, report.empty
        ));
        Ok(report)
    }
}
