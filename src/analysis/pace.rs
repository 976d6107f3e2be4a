//! Words-per-minute pace metric.

use crate::analysis::metric::{MetricOutcome, MetricScorer};
use crate::analysis::types::{
    FeedbackItem, MetricDetails, MetricResult, PaceDetails, SegmentWpm,
};
use crate::config::AnalysisConfig;
use crate::defaults::{SEGMENT_WINDOW_SEC, WPM_OPTIMAL_MAX, WPM_SLOW_MAX};
use crate::features::{RawFeatures, WordToken};

/// Gaps longer than this between consecutive words count as hesitations.
const LONG_GAP_SEC: f64 = 0.4;

fn compute_wpm(word_count: usize, duration_sec: f64) -> f64 {
    if duration_sec <= 0.0 {
        return 0.0;
    }
    word_count as f64 / (duration_sec / 60.0)
}

/// Per-window WPM over fixed 30 s segments.
fn segment_wpm(words: &[WordToken]) -> Vec<SegmentWpm> {
    let Some(max_end) = words
        .iter()
        .map(|w| w.end_sec)
        .max_by(f64::total_cmp)
    else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut t = 0.0;
    while t < max_end {
        let end = t + SEGMENT_WINDOW_SEC;
        let count = words
            .iter()
            .filter(|w| w.start_sec >= t && w.start_sec < end)
            .count();
        segments.push(SegmentWpm {
            start_sec: t,
            end_sec: end,
            wpm: compute_wpm(count, SEGMENT_WINDOW_SEC),
        });
        t = end;
    }
    segments
}

#[derive(Debug, Clone, Copy)]
pub struct PaceScorer {
    min_duration_sec: f64,
}

impl PaceScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_duration_sec: config.min_duration_sec,
        }
    }
}

impl Default for PaceScorer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl MetricScorer for PaceScorer {
    fn name(&self) -> &'static str {
        "pace"
    }

    fn score(&self, features: &RawFeatures) -> MetricOutcome {
        let duration_sec = features.duration_sec;
        if duration_sec <= 0.0 {
            return MetricOutcome::abstained("invalid_duration");
        }
        if duration_sec < self.min_duration_sec {
            return MetricOutcome::abstained("talk_too_short");
        }
        if features.words.is_empty() {
            return MetricOutcome::abstained("no_words");
        }

        let wpm = compute_wpm(features.words.len(), duration_sec);
        let (label, score) = if wpm < WPM_SLOW_MAX {
            ("too_slow", 40)
        } else if wpm <= WPM_OPTIMAL_MAX {
            ("optimal", 90)
        } else {
            ("too_fast", 50)
        };

        let mut sorted: Vec<&WordToken> = features.words.iter().collect();
        sorted.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
        let gaps: Vec<f64> = sorted
            .windows(2)
            .map(|pair| (pair[1].start_sec - pair[0].end_sec).max(0.0))
            .collect();
        let mean_gap = if gaps.is_empty() {
            0.0
        } else {
            gaps.iter().sum::<f64>() / gaps.len() as f64
        };
        let long_gap_ratio = if gaps.is_empty() {
            0.0
        } else {
            gaps.iter().filter(|g| **g > LONG_GAP_SEC).count() as f64 / gaps.len() as f64
        };

        let mut feedback = Vec::new();
        if label == "too_fast" {
            feedback.push(FeedbackItem {
                start_sec: 0.0,
                end_sec: duration_sec.min(30.0),
                metric: "pace".to_string(),
                message: format!(
                    "Your speaking pace is fast (~{wpm:.0} words/min). Add strategic pauses."
                ),
                tip_type: "pace".to_string(),
            });
        } else if label == "too_slow" {
            feedback.push(FeedbackItem {
                start_sec: 0.0,
                end_sec: duration_sec.min(30.0),
                metric: "pace".to_string(),
                message: format!(
                    "Your pace is slow (~{wpm:.0} words/min). Reduce hesitation pauses."
                ),
                tip_type: "pace".to_string(),
            });
        }

        let result = MetricResult {
            score_0_100: Some(score),
            label: label.to_string(),
            confidence: 0.8,
            abstained: false,
            details: MetricDetails::Pace(PaceDetails {
                overall_wpm: wpm,
                mean_gap_sec: mean_gap,
                long_gap_ratio,
                segment_wpm: segment_wpm(&features.words),
            }),
            feedback,
        };

        MetricOutcome::scored(result)
    }
}
