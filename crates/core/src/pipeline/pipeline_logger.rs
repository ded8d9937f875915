use std::collections::HashMap;
use std::time::Instant;

/// Severity of a diagnostic recorded by a [`PipelineLogger`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples use cases from specific output mechanisms (log crate, test
/// capture) so each caller can observe pipeline behavior without changing
/// the orchestration code.
pub trait PipelineLogger: Send {
    /// Report progress of a stage (`labels`, `frames`, `videos`).
    fn progress(&mut self, stage: &str, current: usize, total: usize);

    /// Record how long a named pipeline stage took for one item.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. subjects visible in a frame).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    fn error(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
///
/// Used by tests where logger output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _stage: &str, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
    fn error(&mut self, _message: &str) {}
}

/// CLI-oriented logger backed by the `log` crate.
///
/// Tracks per-stage timing and metrics and provides a summary report at
/// the end of the run. Progress output is throttled to every
/// `throttle` items to avoid excessive output on long videos.
pub struct LogPipelineLogger {
    throttle: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_seen: usize,
    messages: Vec<(Level, String)>,
}

impl LogPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = Vec::new();

        lines.push(format!(
            "Run summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        let warnings = self.count(Level::Warn);
        let errors = self.count(Level::Error);
        if warnings + errors > 0 {
            lines.push(format!("  {warnings} warning(s), {errors} error(s)"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn messages(&self) -> &[(Level, String)] {
        &self.messages
    }

    pub fn count(&self, level: Level) -> usize {
        self.messages.iter().filter(|(l, _)| *l == level).count()
    }

    fn should_report(&self, current: usize, total: usize) -> bool {
        current % self.throttle == 0 || current == total
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, stage: &str, current: usize, total: usize) {
        if stage == "frames" {
            self.frames_seen += 1;
        }
        if !self.should_report(current, total) {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("{stage}: {current}/{total} ({pct:.1}%)");
        } else {
            log::info!("{stage}: {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push((Level::Info, message.to_string()));
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.messages.push((Level::Warn, message.to_string()));
        log::warn!("{message}");
    }

    fn error(&mut self, message: &str) {
        self.messages.push((Level::Error, message.to_string()));
        log::error!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress("frames", 1, 10);
        logger.timing("decode", 5.0);
        logger.metric("subjects_in_frame", 3.0);
        logger.info("hello");
        logger.warn("careful");
        logger.error("oops");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = LogPipelineLogger::new(10);
        logger.timing("compose", 20.0);
        logger.timing("compose", 30.0);
        logger.timing("encode", 5.0);

        let compose = logger.timings_for("compose").unwrap();
        assert_eq!(compose.len(), 2);
        assert!((compose[0] - 20.0).abs() < f64::EPSILON);
        assert!((compose[1] - 30.0).abs() < f64::EPSILON);
        assert_eq!(logger.timings_for("encode").unwrap().len(), 1);
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = LogPipelineLogger::new(10);
        logger.metric("subjects_in_frame", 3.0);
        logger.metric("subjects_in_frame", 4.0);

        let values = logger.metrics_for("subjects_in_frame").unwrap();
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        assert!((avg - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_includes_timing_metrics_and_diagnostics() {
        let mut logger = LogPipelineLogger::new(10);
        logger.progress("frames", 1, 2);
        logger.progress("frames", 2, 2);
        logger.timing("compose", 20.0);
        logger.metric("subjects_in_frame", 2.0);
        logger.warn("missing table");

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (2 frames"));
        assert!(summary.contains("compose"));
        assert!(summary.contains("subjects_in_frame: avg 2.0"));
        assert!(summary.contains("1 warning(s), 0 error(s)"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = LogPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_only_frame_progress_counts_frames() {
        let mut logger = LogPipelineLogger::new(10);
        for i in 1..=5 {
            logger.progress("labels", i, 5);
        }
        for i in 1..=3 {
            logger.progress("frames", i, 3);
        }
        assert_eq!(logger.frames_seen, 3);
    }

    #[test]
    fn test_throttle() {
        let logger = LogPipelineLogger::new(10);
        assert!(!logger.should_report(3, 25));
        assert!(logger.should_report(10, 25));
        assert!(logger.should_report(25, 25));
    }

    #[test]
    fn test_messages_keep_level_and_order() {
        let mut logger = LogPipelineLogger::default();
        logger.info("a");
        logger.warn("b");
        logger.error("c");
        assert_eq!(
            logger.messages(),
            &[
                (Level::Info, "a".to_string()),
                (Level::Warn, "b".to_string()),
                (Level::Error, "c".to_string()),
            ]
        );
        assert_eq!(logger.count(Level::Warn), 1);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let logger = LogPipelineLogger::new(0);
        assert_eq!(logger.throttle, 1);
    }
}
