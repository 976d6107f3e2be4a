//! Multi-factor intonation (vocal dynamism) metric.
//!
//! Combines pitch variance, pitch range, coefficient of variation, and
//! energy variance into one label. The pitch range is measured from the raw
//! F0 timeseries when one is available; otherwise it is estimated from the
//! standard deviation.

use crate::analysis::metric::{MetricOutcome, MetricScorer};
use crate::analysis::types::{
    FeedbackItem, IntonationDetails, MetricDetails, MetricResult,
};
use crate::config::AnalysisConfig;
use crate::defaults::{
    ENERGY_STD_LOW_MAX, ENERGY_STD_MODERATE_MAX, MIN_VOICED_FRAMES, PITCH_COV_LOW_MAX,
    PITCH_COV_MODERATE_MAX, PITCH_RANGE_MODERATE_MAX_HZ, PITCH_RANGE_NARROW_MAX_HZ,
    PITCH_STD_FLAT_MAX_HZ, PITCH_STD_MODERATE_MAX_HZ,
};
use crate::features::RawFeatures;

/// Linear-interpolated percentile over a sorted slice. `p` is in [0, 100].
///
/// Raw min/max is not robust here: pitch trackers emit spurious octave jumps,
/// and a single 500 Hz blip would dominate a max-based range.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Voiced frames only: unvoiced frames are NaN (or non-positive junk).
fn voiced_frames(series: &[f64]) -> Vec<f64> {
    series
        .iter()
        .copied()
        .filter(|f| !f.is_nan() && *f > 0.0)
        .collect()
}

/// 5th-to-95th percentile span of the voiced frames.
fn exact_pitch_range(voiced: &mut Vec<f64>) -> f64 {
    voiced.sort_by(f64::total_cmp);
    percentile(voiced, 95.0) - percentile(voiced, 5.0)
}

/// Crude normalization of pitch and energy variance into [0, 1].
fn prosody_variance_score(pitch_std_hz: f64, energy_std: f64) -> f64 {
    fn norm(x: f64, lo: f64, hi: f64) -> f64 {
        (x.clamp(lo, hi) - lo) / (hi - lo)
    }
    0.5 * (norm(pitch_std_hz, 5.0, 50.0) + norm(energy_std, 0.001, 0.05))
}

fn band(value: f64, low_max: f64, moderate_max: f64) -> u8 {
    if value < low_max {
        0
    } else if value < moderate_max {
        1
    } else {
        2
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IntonationScorer {
    min_duration_sec: f64,
}

impl IntonationScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_duration_sec: config.min_duration_sec,
        }
    }
}

impl Default for IntonationScorer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl MetricScorer for IntonationScorer {
    fn name(&self) -> &'static str {
        "intonation"
    }

    fn score(&self, features: &RawFeatures) -> MetricOutcome {
        if features.duration_sec < self.min_duration_sec {
            return MetricOutcome::abstained("talk_too_short_for_intonation");
        }

        let (mean_hz, std_hz) = match (features.pitch.mean_hz, features.pitch.std_hz) {
            (Some(mean), Some(std)) if mean > 0.0 => (mean, std),
            _ => return MetricOutcome::abstained("no_pitch_data"),
        };

        let (range_hz, range_is_exact) = match &features.raw_pitch_hz {
            Some(series) => {
                let mut voiced = voiced_frames(series);
                if voiced.len() < MIN_VOICED_FRAMES {
                    return MetricOutcome::abstained("insufficient_voiced_frames");
                }
                (exact_pitch_range(&mut voiced), true)
            }
            // Normal-distribution approximation: ~95% of values fall inside
            // mean +/- 2*std, so the range spans about 4 standard deviations.
            None => (4.0 * std_hz, false),
        };

        let cov = std_hz / mean_hz;
        let energy_std = features.energy.std;

        let pitch_std_score = band(std_hz, PITCH_STD_FLAT_MAX_HZ, PITCH_STD_MODERATE_MAX_HZ);
        let range_score = band(range_hz, PITCH_RANGE_NARROW_MAX_HZ, PITCH_RANGE_MODERATE_MAX_HZ);
        let cov_score = band(cov, PITCH_COV_LOW_MAX, PITCH_COV_MODERATE_MAX);
        let energy_score = band(energy_std, ENERGY_STD_LOW_MAX, ENERGY_STD_MODERATE_MAX);

        let total = 0.35 * f64::from(pitch_std_score)
            + 0.25 * f64::from(range_score)
            + 0.25 * f64::from(cov_score)
            + 0.15 * f64::from(energy_score);

        let (label, score) = if total < 0.7 {
            ("monotone", 45)
        } else if total < 1.4 {
            ("somewhat_monotone", 65)
        } else {
            ("dynamic", 85)
        };

        let variance_score = prosody_variance_score(std_hz, energy_std);
        // All four factors are present whenever we score at all.
        let confidence = (0.6 + 0.3 * variance_score + 0.05).min(0.95);

        let range_qualifier = if range_is_exact { "" } else { "~" };
        let message = match label {
            "monotone" => format!(
                "Your pitch stays relatively flat (variation: {std_hz:.1} Hz, range: \
                 {range_qualifier}{range_hz:.0} Hz). Try widening your range toward 100-150 Hz \
                 (about an octave); emphasize key words with pitch rises."
            ),
            "somewhat_monotone" => format!(
                "You have some pitch variation (std: {std_hz:.1} Hz, range: \
                 {range_qualifier}{range_hz:.0} Hz), but could be more dynamic. Aim for a range \
                 above 100 Hz with rises for questions and falls for emphasis."
            ),
            _ => format!(
                "Excellent! Your pitch varies dynamically (std: {std_hz:.1} Hz, range: \
                 {range_qualifier}{range_hz:.0} Hz), which helps maintain listener attention."
            ),
        };

        let result = MetricResult {
            score_0_100: Some(score),
            label: label.to_string(),
            confidence,
            abstained: false,
            details: MetricDetails::Intonation(IntonationDetails {
                mean_pitch_hz: mean_hz,
                pitch_std_hz: std_hz,
                pitch_range_hz: range_hz,
                range_is_exact,
                pitch_cov: cov,
                energy_mean: features.energy.mean,
                energy_std,
                prosody_variance_score: variance_score,
            }),
            feedback: vec![FeedbackItem {
                start_sec: 0.0,
                end_sec: features.duration_sec,
                metric: "intonation".to_string(),
                message,
                tip_type: "intonation".to_string(),
            }],
        };

        MetricOutcome::scored(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{EnergySummary, PitchSummary};

    fn features(
        mean_hz: Option<f64>,
        std_hz: Option<f64>,
        raw: Option<Vec<f64>>,
        energy_std: f64,
    ) -> RawFeatures {
        RawFeatures {
            pitch: PitchSummary { mean_hz, std_hz },
            raw_pitch_hz: raw,
            energy: EnergySummary {
                mean: 0.02,
                std: energy_std,
            },
            duration_sec: 60.0,
            ..Default::default()
        }
    }

    fn details(result: &MetricResult) -> &IntonationDetails {
        match &result.details {
            MetricDetails::Intonation(d) => d,
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 100.0), 40.0);
        assert_eq!(percentile(&sorted, 50.0), 25.0);
    }

    #[test]
    fn percentile_range_ignores_octave_jump_outlier() {
        // Twenty values evenly spread over 150-245 Hz plus one spurious
        // 500 Hz detection. The percentile range tracks the true spread;
        // max-min would report 350 Hz.
        let mut series: Vec<f64> = (0..20).map(|i| 150.0 + 5.0 * i as f64).collect();
        series.push(500.0);
        let mut voiced = voiced_frames(&series);
        let range = exact_pitch_range(&mut voiced);
        assert!((range - 90.0).abs() < 1e-9, "range was {range}");
    }

    #[test]
    fn raw_series_with_unvoiced_frames_is_filtered() {
        let mut series = vec![f64::NAN, 0.0, -1.0];
        series.extend((0..20).map(|i| 150.0 + 5.0 * i as f64));
        let features = features(Some(190.0), Some(28.0), Some(series), 0.01);
        let (result, _) = IntonationScorer::default().score(&features).into_parts();
        assert!(!result.abstained);
        let d = details(&result);
        assert!(d.range_is_exact);
        // 20 voiced frames 150-245 Hz: p95 = 240.25, p5 = 154.75.
        assert!((d.pitch_range_hz - 85.5).abs() < 1e-9);
    }

    #[test]
    fn fallback_range_is_four_times_std_and_flagged_estimated() {
        let features = features(Some(180.0), Some(20.0), None, 0.01);
        let (result, _) = IntonationScorer::default().score(&features).into_parts();
        let d = details(&result);
        assert_eq!(d.pitch_range_hz, 80.0);
        assert!(!d.range_is_exact);
    }

    #[test]
    fn flat_pitch_is_monotone_with_concrete_target() {
        let features = features(Some(200.0), Some(8.0), None, 0.001);
        let (result, _) = IntonationScorer::default().score(&features).into_parts();
        assert_eq!(result.label, "monotone");
        assert_eq!(result.score_0_100, Some(45));
        let message = &result.feedback[0].message;
        assert!(message.contains("8.0 Hz"));
        assert!(message.contains("100"));
        // Estimated range carries the tilde qualifier.
        assert!(message.contains("~32 Hz"));
    }

    #[test]
    fn moderate_everything_is_somewhat_monotone() {
        // std 15 (band 1), estimated range 60 (band 1), cov 0.1 (band 1),
        // energy std 0.01 (band 1) -> total 1.0.
        let features = features(Some(150.0), Some(15.0), None, 0.01);
        let (result, _) = IntonationScorer::default().score(&features).into_parts();
        assert_eq!(result.label, "somewhat_monotone");
        assert_eq!(result.score_0_100, Some(65));
    }

    #[test]
    fn lively_delivery_is_dynamic() {
        let series: Vec<f64> = (0..40).map(|i| 120.0 + 4.0 * i as f64).collect();
        let features = features(Some(150.0), Some(30.0), Some(series), 0.03);
        let (result, _) = IntonationScorer::default().score(&features).into_parts();
        assert_eq!(result.label, "dynamic");
        assert_eq!(result.score_0_100, Some(85));
        let confidence = result.confidence;
        assert!(confidence > 0.6 && confidence <= 0.95);
    }

    #[test]
    fn abstains_on_short_recording() {
        let mut f = features(Some(180.0), Some(20.0), None, 0.01);
        f.duration_sec = 1.0;
        let (result, _) = IntonationScorer::default().score(&f).into_parts();
        assert!(result.abstained);
        assert_eq!(result.score_0_100, None);
    }

    #[test]
    fn abstains_without_pitch_summary() {
        let (result, _) = IntonationScorer::default()
            .score(&features(None, None, None, 0.01))
            .into_parts();
        assert!(result.abstained);
    }

    #[test]
    fn abstains_on_non_positive_mean() {
        let (result, _) = IntonationScorer::default()
            .score(&features(Some(0.0), Some(12.0), None, 0.01))
            .into_parts();
        assert!(result.abstained);
    }

    #[test]
    fn abstains_when_raw_series_has_too_few_voiced_frames() {
        let series = vec![f64::NAN, 120.0, f64::NAN, 130.0, 140.0];
        let (result, _) = IntonationScorer::default()
            .score(&features(Some(130.0), Some(10.0), Some(series), 0.01))
            .into_parts();
        assert!(result.abstained);
        match &result.details {
            MetricDetails::Abstained { reason } => {
                assert_eq!(reason, "insufficient_voiced_frames");
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }
}
