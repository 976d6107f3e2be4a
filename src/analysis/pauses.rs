//! Pause reconciliation and the pause-quality metric.
//!
//! Two independent detectors report silence: gaps between transcribed words
//! (ASR) and the voice-activity detector (VAD). Their intervals disagree on
//! boundaries and overlap freely; this module merges them into one sorted,
//! non-overlapping pause list and scores the result.

use crate::analysis::metric::{MetricOutcome, MetricScorer};
use crate::analysis::types::{
    FeedbackItem, MetricDetails, MetricResult, Pause, PauseContext, PauseEvent, PauseQuality,
    PauseQualityDetails, PauseSource, TimelineEntry,
};
use crate::config::AnalysisConfig;
use crate::defaults::{PAUSE_RATE_HIGH_PER_SEC, PAUSE_RATE_LOW_PER_SEC};
use crate::features::{RawFeatures, RawInterval, WordToken};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: f64,
    end: f64,
    source: PauseSource,
}

impl Candidate {
    fn overlap_sec(&self, other: &Candidate) -> f64 {
        (self.end.min(other.end) - self.start.max(other.start)).max(0.0)
    }
}

/// Merges ASR and VAD silence intervals into classified [`Pause`]s.
#[derive(Debug, Clone, Copy)]
pub struct PauseReconciler {
    /// Intervals within this margin of the recording boundary are discarded.
    pub boundary_margin_sec: f64,
    /// Minimum overlap for two intervals to count as the same pause.
    pub merge_tolerance_sec: f64,
}

impl Default for PauseReconciler {
    fn default() -> Self {
        Self {
            boundary_margin_sec: crate::defaults::PAUSE_BOUNDARY_MARGIN_SEC,
            merge_tolerance_sec: crate::defaults::PAUSE_MERGE_TOLERANCE_SEC,
        }
    }
}

impl PauseReconciler {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            boundary_margin_sec: config.boundary_margin_sec,
            merge_tolerance_sec: config.merge_tolerance_sec,
        }
    }

    /// Reconcile both interval streams into one sorted, non-overlapping,
    /// classified pause list.
    ///
    /// Resolution rules, applied pairwise in encounter order over the
    /// start-sorted union:
    /// - VAD beats ASR: an overlapping ASR interval is dropped entirely
    ///   (voice-activity boundaries are more accurate than word-gap ones).
    /// - Two intervals of the same source merge into their union span.
    pub fn reconcile(
        &self,
        asr: &[RawInterval],
        vad: &[RawInterval],
        duration_sec: f64,
        words: &[WordToken],
    ) -> Vec<Pause> {
        if duration_sec <= 0.0 {
            return Vec::new();
        }

        // A short clip would otherwise lose every interval to the margins.
        let margin = self.boundary_margin_sec.min(duration_sec / 4.0);

        let mut candidates: Vec<Candidate> = Vec::new();
        for (intervals, source) in [(asr, PauseSource::Asr), (vad, PauseSource::Vad)] {
            for interval in intervals {
                if interval.duration_sec() <= 0.0 {
                    continue;
                }
                // Leading/trailing silence is not a mid-speech pause.
                if interval.start_sec <= margin || interval.end_sec >= duration_sec - margin {
                    continue;
                }
                candidates.push(Candidate {
                    start: interval.start_sec,
                    end: interval.end_sec,
                    source,
                });
            }
        }

        candidates.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<Candidate> = Vec::new();
        for current in candidates {
            let mut overlapped = false;
            for existing in merged.iter_mut() {
                if current.overlap_sec(existing) < self.merge_tolerance_sec {
                    continue;
                }
                overlapped = true;
                match (current.source, existing.source) {
                    (PauseSource::Vad, PauseSource::Asr) => {
                        tracing::debug!(
                            asr_start = existing.start,
                            asr_end = existing.end,
                            vad_start = current.start,
                            vad_end = current.end,
                            "replacing ASR pause with overlapping VAD pause"
                        );
                        *existing = current;
                    }
                    (PauseSource::Asr, PauseSource::Vad) => {
                        // VAD already holds this span; the ASR interval loses.
                    }
                    _ => {
                        existing.start = existing.start.min(current.start);
                        existing.end = existing.end.max(current.end);
                    }
                }
                break;
            }
            if !overlapped {
                merged.push(current);
            }
        }

        merged.sort_by(|a, b| a.start.total_cmp(&b.start));

        merged
            .into_iter()
            .map(|c| Pause {
                start_sec: c.start,
                end_sec: c.end,
                source: c.source,
                quality: PauseQuality::from_duration(c.end - c.start),
                context: classify_context(words, c.start),
            })
            .collect()
    }
}

/// A pause at a clause boundary is breathing room; one mid-clause is a
/// hesitation. The nearest word ending at or before the pause start decides:
/// terminal punctuation (or no preceding word at all) means helpful.
fn classify_context(words: &[WordToken], pause_start_sec: f64) -> PauseContext {
    let preceding = words
        .iter()
        .filter(|w| w.end_sec <= pause_start_sec + 1e-6)
        .max_by(|a, b| a.end_sec.total_cmp(&b.end_sec));

    match preceding {
        None => PauseContext::Helpful,
        Some(word) => {
            if word.text.trim_end().ends_with(['.', '?', '!']) {
                PauseContext::Helpful
            } else {
                PauseContext::Awkward
            }
        }
    }
}

/// Rate-based score over the reconciled pause list.
#[derive(Debug, Clone, Copy)]
pub struct PauseQualityScorer {
    min_duration_sec: f64,
    reconciler: PauseReconciler,
}

impl PauseQualityScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_duration_sec: config.min_duration_sec,
            reconciler: PauseReconciler::new(config),
        }
    }
}

impl Default for PauseQualityScorer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl MetricScorer for PauseQualityScorer {
    fn name(&self) -> &'static str {
        "pause_quality"
    }

    fn score(&self, features: &RawFeatures) -> MetricOutcome {
        let duration_sec = features.duration_sec;
        if duration_sec <= 0.0 {
            return MetricOutcome::abstained("invalid_duration");
        }
        if duration_sec < self.min_duration_sec {
            return MetricOutcome::abstained("talk_too_short");
        }

        let pauses = self.reconciler.reconcile(
            &features.asr_pauses,
            &features.vad_pauses,
            duration_sec,
            &features.words,
        );
        if pauses.is_empty() {
            return MetricOutcome::abstained("no_pauses_detected");
        }

        let durations: Vec<f64> = pauses.iter().map(Pause::duration_sec).collect();
        let average = durations.iter().sum::<f64>() / durations.len() as f64;
        let long_pauses = durations.iter().filter(|d| **d > 1.0).count();
        let short_pauses = durations.iter().filter(|d| **d < 0.2).count();
        let pause_rate = pauses.len() as f64 / duration_sec;

        let (label, score) = if pause_rate > PAUSE_RATE_HIGH_PER_SEC {
            ("too_many_pauses", 45)
        } else if pause_rate < PAUSE_RATE_LOW_PER_SEC {
            ("too_few_pauses", 55)
        } else {
            ("good", 85)
        };

        let message = match label {
            "too_many_pauses" => "You pause very frequently. Try connecting ideas more fluidly.",
            "too_few_pauses" => "You rarely pause. Add short pauses to emphasize key transitions.",
            _ => "Your pacing and pauses are balanced and clear.",
        };
        let feedback = vec![FeedbackItem {
            start_sec: 0.0,
            end_sec: duration_sec,
            metric: "pause_quality".to_string(),
            message: message.to_string(),
            tip_type: "pause_quality".to_string(),
        }];

        let timeline = pauses
            .iter()
            .map(|p| TimelineEntry::Pause(PauseEvent::from(p)))
            .collect();

        let result = MetricResult {
            score_0_100: Some(score),
            label: label.to_string(),
            confidence: 0.75,
            abstained: false,
            details: MetricDetails::PauseQuality(PauseQualityDetails {
                total_pauses: pauses.len(),
                average_pause_duration_sec: average,
                long_pauses,
                short_pauses,
                pause_rate_per_sec: pause_rate,
            }),
            feedback,
        };

        MetricOutcome::scored_with_timeline(result, timeline)
    }
}
