//! The text-processing pipeline.
//!
//! Five steps run in order over the raw document text:
//!
//! ```text
//! clean ──> language ──> segment ──> statistics ──> chunk
//! fatal     non-fatal    fatal       non-fatal      fatal
//! ```
//!
//! Fatal steps short-circuit the run with `success = false` and the step
//! name in the error. Non-fatal steps degrade: the corresponding report
//! field stays `None`, an entry lands in `errors`, and processing
//! continues. Per-step wall-clock timings are recorded either way.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkingConfig};
use crate::chunker::IntelligentChunker;
use crate::clean::clean_text;
use crate::error::{Error, Result};
use crate::lang::{detect_language, LanguageInfo};
use crate::segment::segment;
use crate::statistics::{text_statistics, TextStatistics};
use crate::stats::{chunk_statistics, ChunkStatistics};

/// A recorded step timing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTiming {
    /// Step name.
    pub step: String,
    /// Elapsed wall-clock milliseconds.
    pub elapsed_ms: f64,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    /// False iff a fatal step failed.
    pub success: bool,
    /// Cleaned document text.
    pub processed_text: String,
    /// Detected language, when detection succeeded.
    pub language: Option<LanguageInfo>,
    /// Document statistics, when the step succeeded.
    pub statistics: Option<TextStatistics>,
    /// The chunks. Empty on fatal failure before chunking.
    pub chunks: Vec<Chunk>,
    /// Aggregate chunk statistics, when chunks were produced.
    pub chunk_info: Option<ChunkStatistics>,
    /// One message per failed step, fatal or not.
    pub errors: Vec<String>,
    /// Names of the steps that completed.
    pub steps_completed: Vec<String>,
    /// Per-step timings in execution order.
    pub timings: Vec<StepTiming>,
    /// Total elapsed milliseconds.
    pub total_elapsed_ms: f64,
}

/// Runs raw text through cleaning, analysis, and chunking.
///
/// ## Example
///
/// ```rust
/// use abridge::Pipeline;
///
/// let pipeline = Pipeline::new();
/// let report = pipeline.process("First sentence. Second sentence.");
/// assert!(report.success);
/// assert_eq!(report.chunks.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: ChunkingConfig,
}

impl Pipeline {
    /// Pipeline with the default chunking configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with an explicit chunking configuration.
    #[must_use]
    pub fn with_config(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// The chunking configuration in force.
    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Run all steps over `raw_text`.
    #[must_use]
    pub fn process(&self, raw_text: &str) -> PipelineReport {
        let start = Instant::now();
        let mut report = PipelineReport::default();

        // Step 1: cleaning (fatal). An empty document cannot be summarized.
        match self.run_clean(raw_text, &mut report) {
            Ok(text) => report.processed_text = text,
            Err(e) => {
                return self.fail(report, "cleaning", &e, start);
            }
        }

        // Step 2: language detection (non-fatal).
        time_step(&mut report, "language_detection", |report| {
            report.language = detect_language(&report.processed_text);
        });
        report.steps_completed.push("language_detection".to_string());

        // Step 3: segmentation (fatal). A document that yields no sentences
        // cannot be chunked.
        let sentence_count = {
            let timer = Instant::now();
            let sentences = segment(&report.processed_text);
            record(&mut report, "segmentation", timer);
            if sentences.is_empty() {
                let e = Error::Processing {
                    step: "segmentation",
                    message: "no sentences found".to_string(),
                };
                return self.fail(report, "segmentation", &e, start);
            }
            sentences.len()
        };
        report.steps_completed.push("segmentation".to_string());
        tracing::debug!(sentences = sentence_count, "segmentation complete");

        // Step 4: statistics (non-fatal).
        time_step(&mut report, "statistics", |report| {
            report.statistics = Some(text_statistics(&report.processed_text));
        });
        report.steps_completed.push("statistics".to_string());

        // Step 5: chunking (fatal).
        {
            let timer = Instant::now();
            let outcome = IntelligentChunker::new(self.config.clone())
                .map(|chunker| chunker.chunk_text(&report.processed_text));
            record(&mut report, "chunking", timer);
            match outcome {
                Ok(chunks) => {
                    report.chunk_info = Some(chunk_statistics(&chunks, &self.config));
                    report.chunks = chunks;
                    report.steps_completed.push("chunking".to_string());
                }
                Err(e) => {
                    return self.fail(report, "chunking", &e, start);
                }
            }
        }

        report.success = true;
        report.total_elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            chunks = report.chunks.len(),
            elapsed_ms = report.total_elapsed_ms,
            "pipeline complete"
        );
        report
    }

    fn run_clean(&self, raw_text: &str, report: &mut PipelineReport) -> Result<String> {
        let timer = Instant::now();
        let cleaned = clean_text(raw_text);
        record(report, "cleaning", timer);
        if cleaned.is_empty() {
            return Err(Error::Validation("document text is empty".to_string()));
        }
        report.steps_completed.push("cleaning".to_string());
        Ok(cleaned)
    }

    fn fail(
        &self,
        mut report: PipelineReport,
        step: &str,
        error: &Error,
        start: Instant,
    ) -> PipelineReport {
        tracing::error!(step, error = %error, "fatal pipeline step failed");
        report.errors.push(format!("{step}: {error}"));
        report.success = false;
        report.total_elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

fn record(report: &mut PipelineReport, step: &str, timer: Instant) {
    report.timings.push(StepTiming {
        step: step.to_string(),
        elapsed_ms: timer.elapsed().as_secs_f64() * 1000.0,
    });
}

fn time_step(report: &mut PipelineReport, step: &str, f: impl FnOnce(&mut PipelineReport)) {
    let timer = Instant::now();
    f(report);
    record(report, step, timer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_run_completes_all_steps() {
        let report = Pipeline::new().process("The sun rose. The birds sang. The town woke.");
        assert!(report.success);
        assert_eq!(
            report.steps_completed,
            vec![
                "cleaning",
                "language_detection",
                "segmentation",
                "statistics",
                "chunking"
            ]
        );
        assert!(report.errors.is_empty());
        assert_eq!(report.chunks.len(), 1);
        assert!(report.statistics.is_some());
        assert!(report.chunk_info.is_some());
    }

    #[test]
    fn test_empty_input_fails_at_cleaning() {
        let report = Pipeline::new().process("   \n\n  ");
        assert!(!report.success);
        assert!(report.chunks.is_empty());
        assert_eq!(report.errors.len(), 1);
        // The fatal-error label matches the step name used in
        // steps_completed and the timing records.
        assert!(report.errors[0].starts_with("cleaning:"));
        // Cleaning never completed, so nothing after it ran.
        assert!(report.steps_completed.is_empty());
    }

    #[test]
    fn test_short_text_degrades_language_gracefully() {
        // Under the detection minimum; language is None, run still succeeds.
        let report = Pipeline::new().process("Hi there.");
        assert!(report.success);
        assert!(report.language.is_none());
    }

    #[test]
    fn test_timings_recorded_per_step() {
        let report = Pipeline::new().process("One sentence here. Another one follows.");
        let steps: Vec<&str> = report.timings.iter().map(|t| t.step.as_str()).collect();
        assert_eq!(
            steps,
            vec![
                "cleaning",
                "language_detection",
                "segmentation",
                "statistics",
                "chunking"
            ]
        );
        assert!(report.total_elapsed_ms >= 0.0);
    }

    #[test]
    fn test_invalid_config_fails_at_chunking() {
        let config = ChunkingConfig {
            max_tokens: 10,
            overlap_tokens: 20,
            min_chunk_tokens: 5,
            ..ChunkingConfig::default()
        };
        let report = Pipeline::with_config(config).process("A full sentence for the pipeline.");
        assert!(!report.success);
        assert!(report.errors.iter().any(|e| e.starts_with("chunking")));
    }
}
