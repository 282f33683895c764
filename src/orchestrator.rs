//! Synchronization pipeline.
//!
//! Segments a word timeline, translates every segment through the configured
//! adapter, re-times the translations and merges the cues into one ordered
//! subtitle track.

use crate::config::SyncSettings;
use crate::error::{Result, TekstingError};
use crate::report::{SegmentSpan, SyncReport, SyncWarning};
use crate::retiming::{gap_within, Cue, CueRetimer, RetimeConfig};
use crate::segmentation::{Segment, SpeakerSegmenter};
use crate::subtitle::{emit_all, EmitOptions, SubtitleFormat};
use crate::transcription::WordTimeline;
use crate::translation::{RetryOutcome, RetryPolicy, Translator};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of a synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutput {
    /// Segments in timeline order, with translations where they succeeded.
    pub segments: Vec<Segment>,
    /// Merged cues ordered by start time, numbered from 1.
    pub cues: Vec<Cue>,
    pub report: SyncReport,
}

impl SyncOutput {
    /// Serialize the cues in every requested format.
    ///
    /// Unsupported format names are recorded in the report and skipped.
    pub fn render(&mut self, formats: &[String], options: &EmitOptions) -> Vec<(SubtitleFormat, Vec<u8>)> {
        let (outputs, warnings) = emit_all(&self.cues, formats, options);
        for warning in warnings {
            warn!("{}", warning);
            self.report.push(warning);
        }
        outputs
    }

    /// Store the full result as JSON so it can be rendered again later.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Drives segmentation, translation and re-timing for a timeline.
pub struct Synchronizer {
    translator: Arc<dyn Translator>,
    segmenter: SpeakerSegmenter,
    retimer: CueRetimer,
    retry: RetryPolicy,
    max_concurrent: usize,
    min_confidence: f32,
    show_progress: bool,
}

impl Synchronizer {
    pub fn new(settings: &SyncSettings, translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            segmenter: SpeakerSegmenter::new(settings.silence_split_ms),
            retimer: CueRetimer::new(RetimeConfig::from(settings)),
            retry: RetryPolicy::from(settings),
            max_concurrent: settings.max_concurrent.max(1),
            min_confidence: settings.min_confidence,
            show_progress: false,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Draw a progress bar on stderr while translating.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Synchronize a timeline into `target_lang` subtitles.
    ///
    /// `source_lang` falls back to the language detected by ASR, then to
    /// auto-detection by the translator. An empty timeline is an error;
    /// failing segments are excluded and reported.
    #[instrument(skip(self, timeline), fields(words = timeline.len(), translator = self.translator.name()))]
    pub async fn run(&self, timeline: &WordTimeline, source_lang: Option<&str>, target_lang: &str) -> Result<SyncOutput> {
        if timeline.is_empty() {
            return Err(TekstingError::Input("timeline contains no words".into()));
        }

        let source_lang = source_lang.or(timeline.language_code());
        let segments = self.segmenter.segment(timeline);
        info!("Synchronizing {} segments into {}", segments.len(), target_lang);

        let mut report = SyncReport::new(source_lang.map(str::to_string), target_lang);
        report.segments_total = segments.len();
        report.asr_metadata = timeline.metadata().clone();

        for segment in &segments {
            let confidence = segment.mean_confidence();
            if confidence < self.min_confidence {
                report.push(SyncWarning::LowConfidence {
                    span: SegmentSpan::of(segment),
                    confidence,
                });
            }
        }
        for repair in timeline.repairs() {
            report.push(SyncWarning::WordRepaired { repair: repair.clone() });
        }

        let pb = self.progress_bar(segments.len());
        let source_owned = source_lang.map(str::to_string);
        let target_owned = target_lang.to_string();
        let mut results: Vec<(usize, RetryOutcome<String>)> = stream::iter(segments.iter().cloned())
            .map(|segment| {
                let pb = pb.clone();
                let source = source_owned.clone();
                let target = target_owned.clone();
                async move {
                    let outcome = self.translate_segment(&segment, source.as_deref(), &target).await;
                    pb.inc(1);
                    (segment.index, outcome)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;
        pb.finish_and_clear();

        // Completion order is arbitrary; everything below runs in segment order.
        results.sort_by_key(|(index, _)| *index);

        let mut synced = Vec::with_capacity(segments.len());
        let mut tagged_cues: Vec<(usize, Cue)> = Vec::new();

        for (segment, (_, outcome)) in segments.into_iter().zip(results) {
            match outcome {
                RetryOutcome::Succeeded { value, .. } => {
                    let segment = segment.with_translation(value);
                    let retimed = self.retimer.retime_segment(&segment);
                    for warning in retimed.warnings {
                        report.push(warning);
                    }
                    tagged_cues.extend(retimed.cues.into_iter().map(|cue| (segment.index, cue)));
                    report.segments_synced += 1;
                    synced.push(segment);
                }
                RetryOutcome::Failed { attempts, last_error } => {
                    report.push(SyncWarning::SegmentExcluded {
                        span: SegmentSpan::of(&segment),
                        attempts,
                        reason: last_error.to_string(),
                    });
                    report.segments_excluded += 1;
                    synced.push(segment);
                }
            }
        }

        let cues = merge_cues(tagged_cues, self.retimer.config().inter_cue_gap_ms);
        report.cue_count = cues.len();

        info!(
            "Synchronized {}/{} segments into {} cues ({} warnings)",
            report.segments_synced,
            report.segments_total,
            report.cue_count,
            report.warnings.len()
        );

        Ok(SyncOutput {
            segments: synced,
            cues,
            report,
        })
    }

    async fn translate_segment(&self, segment: &Segment, source_lang: Option<&str>, target_lang: &str) -> RetryOutcome<String> {
        let text = segment.source_text();
        let text = text.as_str();
        let translator = self.translator.as_ref();
        let label = format!("segment {}", segment.index);

        self.retry
            .run(&label, move || translator.translate(text, source_lang, target_lang))
            .await
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {spinner:.green} Translating [{bar:30.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Order cues by start time (ties by segment), keep `gap_ms` between cues of
/// different segments and number them from 1.
///
/// The gap is taken from the later cue, as within a segment.
fn merge_cues(mut tagged: Vec<(usize, Cue)>, gap_ms: u64) -> Vec<Cue> {
    tagged.sort_by_key(|(segment, cue)| (cue.start_ms, *segment));

    let mut cues: Vec<Cue> = Vec::with_capacity(tagged.len());
    let mut prev_segment = None;

    for (segment, mut cue) in tagged {
        if let (Some(prev), Some(prev_cue)) = (prev_segment, cues.last()) {
            if prev != segment {
                let room = cue.end_ms.saturating_sub(prev_cue.end_ms);
                let earliest = prev_cue.end_ms + gap_within(room, gap_ms);
                cue.start_ms = cue.start_ms.max(earliest);
            }
        }
        cue.index = cues.len() + 1;
        prev_segment = Some(segment);
        cues.push(cue);
    }

    cues
}
