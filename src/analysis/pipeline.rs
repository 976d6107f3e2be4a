//! Analysis pipeline: validation, feature extraction, metric scoring, and
//! report assembly.
//!
//! Each metric is isolated: a scorer that abstains, fails, or panics only
//! affects its own entry in the report. The run as a whole fails only on
//! invalid input or a front-end error, because then no metric is computable.

use crate::analysis::fillers::is_filler_token;
use crate::analysis::metric::{builtin_scorers, MetricOutcome, MetricScorer};
use crate::analysis::types::{
    AbstainReason, FeedbackEvent, MetricResult, ModelMetadata, NoiseLevel, OverallScore,
    QualityFlags, Report, TimelineEntry, Transcript, TranscriptSegment, TranscriptToken,
};
use crate::config::Config;
use crate::defaults::{
    MIN_ASR_CONFIDENCE, MIN_SPEECH_RATIO, NOISE_LOW_MAX_DBFS, NOISE_MEDIUM_MAX_DBFS,
};
use crate::error::{PodiumError, Result};
use crate::features::{FeatureExtractor, RawFeatures, WordToken};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

/// Validated submission payload for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    /// Path (or file:// URL) of the recording or its features document.
    pub audio: String,
    pub language: String,
    pub talk_type: String,
    pub audience_type: String,
    /// Metric names to compute; empty means all built-in metrics.
    pub requested_metrics: Vec<String>,
    pub user_metadata: BTreeMap<String, serde_json::Value>,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            audio: String::new(),
            language: crate::defaults::DEFAULT_LANGUAGE.to_string(),
            talk_type: "unspecified".to_string(),
            audience_type: "general".to_string(),
            requested_metrics: Vec::new(),
            user_metadata: BTreeMap::new(),
        }
    }
}

impl AnalysisRequest {
    /// Minimal request for a recording on disk.
    pub fn for_audio(audio: impl Into<String>) -> Self {
        Self {
            audio: audio.into(),
            ..Default::default()
        }
    }

    /// Reject submissions the pipeline cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.audio.trim().is_empty() {
            return Err(PodiumError::InvalidInput {
                message: "audio source is empty".to_string(),
            });
        }
        if self.requested_metrics.iter().any(|m| m.trim().is_empty()) {
            return Err(PodiumError::InvalidInput {
                message: "requested metric names must be non-empty".to_string(),
            });
        }
        Ok(())
    }

    /// Local path of the audio source, with file:// URLs unwrapped.
    pub fn audio_path(&self) -> PathBuf {
        let trimmed = self.audio.trim();
        PathBuf::from(trimmed.strip_prefix("file://").unwrap_or(trimmed))
    }
}

/// Runs the full analysis pipeline for one submission.
pub struct Analyzer {
    extractor: Arc<dyn FeatureExtractor>,
    scorers: Vec<Box<dyn MetricScorer>>,
    default_language: String,
}

impl Analyzer {
    pub fn new(extractor: Arc<dyn FeatureExtractor>, config: &Config) -> Self {
        Self {
            extractor,
            scorers: builtin_scorers(&config.analysis),
            default_language: config.analysis.language.clone(),
        }
    }

    /// Replace the scorer set (used by tests to inject misbehaving scorers).
    pub fn with_scorers(mut self, scorers: Vec<Box<dyn MetricScorer>>) -> Self {
        self.scorers = scorers;
        self
    }

    fn scorer_names(&self) -> Vec<String> {
        self.scorers.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run the whole pipeline: validate, extract, score, assemble.
    pub fn run(&self, request: &AnalysisRequest) -> Result<Report> {
        request.validate()?;

        let audio_path = request.audio_path();
        tracing::info!(audio = %audio_path.display(), "starting analysis");

        let features = self.extractor.extract(&audio_path)?;
        tracing::debug!(
            words = features.words.len(),
            duration_sec = features.duration_sec,
            "features extracted"
        );

        let quality_flags = compute_quality_flags(&features);

        let language = if request.language.trim().is_empty() {
            self.default_language.clone()
        } else {
            request.language.clone()
        };
        let transcript = build_transcript(&features.words, &language);

        let requested = if request.requested_metrics.is_empty() {
            self.scorer_names()
        } else {
            request.requested_metrics.clone()
        };

        let mut metrics: BTreeMap<String, MetricResult> = BTreeMap::new();
        let mut timeline: Vec<TimelineEntry> = Vec::new();

        for name in &requested {
            let outcome = match self.scorers.iter().find(|s| s.name() == name) {
                Some(scorer) => invoke_scorer(scorer.as_ref(), &features),
                None => MetricOutcome::abstained("unknown_metric"),
            };
            let (result, contributed) = outcome.into_parts();
            if result.abstained {
                tracing::debug!(metric = %name, "metric abstained");
            }
            timeline.extend(contributed);
            for item in &result.feedback {
                timeline.push(TimelineEntry::Feedback(FeedbackEvent::from(item)));
            }
            metrics.insert(name.clone(), result);
        }

        // Deterministic regardless of scorer order.
        timeline.sort_by(|a, b| {
            a.start_sec()
                .total_cmp(&b.start_sec())
                .then(a.end_sec().total_cmp(&b.end_sec()))
        });

        let overall_score = compute_overall_score(&metrics);

        tracing::info!(
            metrics = metrics.len(),
            overall = ?overall_score.score_0_100,
            "analysis complete"
        );

        Ok(Report {
            quality_flags,
            overall_score,
            metrics,
            timeline,
            transcript,
            model_metadata: ModelMetadata {
                extractor: self.extractor.name().to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }
}

/// Invoke one scorer, converting a panic into a per-metric failure.
fn invoke_scorer(scorer: &dyn MetricScorer, features: &RawFeatures) -> MetricOutcome {
    match catch_unwind(AssertUnwindSafe(|| scorer.score(features))) {
        Ok(outcome) => outcome,
        Err(panic_info) => {
            let msg = panic_info
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic");
            tracing::error!(metric = scorer.name(), panic = msg, "scorer panicked");
            MetricOutcome::failed(msg)
        }
    }
}

fn compute_quality_flags(features: &RawFeatures) -> QualityFlags {
    let asr_confidence = if features.words.is_empty() {
        0.0
    } else {
        features.words.iter().map(|w| w.confidence).sum::<f64>() / features.words.len() as f64
    };

    let background_noise_level = match features.noise.noise_dbfs {
        None => NoiseLevel::Low,
        Some(dbfs) if dbfs < NOISE_LOW_MAX_DBFS => NoiseLevel::Low,
        Some(dbfs) if dbfs < NOISE_MEDIUM_MAX_DBFS => NoiseLevel::Medium,
        Some(_) => NoiseLevel::High,
    };

    let speech_ratio = features.noise.speech_ratio;
    let low_confidence = asr_confidence < MIN_ASR_CONFIDENCE;
    let low_speech = speech_ratio < MIN_SPEECH_RATIO;
    let abstain_reason = match (low_confidence, low_speech) {
        (true, true) => Some(AbstainReason::LowAsrAndSpeechRatio),
        (true, false) => Some(AbstainReason::LowAsrConfidence),
        (false, true) => Some(AbstainReason::LowSpeechRatio),
        (false, false) => None,
    };

    QualityFlags {
        asr_confidence,
        mic_quality: features.noise.mic_quality,
        background_noise_level,
        speech_ratio,
        abstain_reason,
    }
}

fn build_transcript(words: &[WordToken], language: &str) -> Transcript {
    let cleaned: Vec<&WordToken> = words.iter().filter(|w| !w.text.trim().is_empty()).collect();

    let full_text = cleaned
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ");

    let segments = if cleaned.is_empty() {
        Vec::new()
    } else {
        let start = cleaned
            .iter()
            .map(|w| w.start_sec)
            .fold(f64::INFINITY, f64::min);
        let end = cleaned.iter().map(|w| w.end_sec).fold(0.0, f64::max);
        let avg_confidence =
            cleaned.iter().map(|w| w.confidence).sum::<f64>() / cleaned.len() as f64;
        vec![TranscriptSegment {
            start_sec: start,
            end_sec: end,
            text: full_text.clone(),
            avg_confidence,
        }]
    };

    let tokens = cleaned
        .iter()
        .map(|w| TranscriptToken {
            text: w.text.trim().to_string(),
            start_sec: w.start_sec,
            end_sec: w.end_sec,
            is_filler: is_filler_token(&w.text),
        })
        .collect();

    Transcript {
        full_text,
        language: language.to_string(),
        segments,
        tokens,
    }
}

/// Confidence-weighted mean of the non-abstained metric scores. An abstained
/// metric contributes zero weight.
fn compute_overall_score(metrics: &BTreeMap<String, MetricResult>) -> OverallScore {
    let mut weighted_sum = 0.0;
    let mut weight = 0.0;
    for result in metrics.values() {
        if result.abstained {
            continue;
        }
        if let Some(score) = result.score_0_100 {
            weighted_sum += f64::from(score) * result.confidence;
            weight += result.confidence;
        }
    }

    if weight <= 0.0 {
        return OverallScore {
            score_0_100: None,
            label: "unknown".to_string(),
            confidence: 0.0,
        };
    }

    let score = (weighted_sum / weight).round().clamp(0.0, 100.0) as u8;
    let label = if score >= 80 {
        "strong"
    } else if score >= 60 {
        "solid"
    } else {
        "needs_work"
    };
    let scored_count = metrics.values().filter(|m| !m.abstained).count();
    let confidence = weight / scored_count as f64;

    OverallScore {
        score_0_100: Some(score),
        label: label.to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{MetricDetails, MicQuality};
    use crate::features::{EnergySummary, MockExtractor, NoiseSummary, PitchSummary, RawInterval};

    fn word(text: &str, start: f64, confidence: f64) -> WordToken {
        WordToken {
            text: text.to_string(),
            start_sec: start,
            end_sec: start + 0.3,
            confidence,
        }
    }

    /// A plausible one-minute talk with every signal populated.
    fn rich_features() -> RawFeatures {
        let text = "First we look at the problem. Um the cache was cold. \
                    Next we fixed the loader. In summary everything got faster.";
        let words: Vec<WordToken> = text
            .split_whitespace()
            .enumerate()
            .map(|(i, t)| word(t, 1.0 + i as f64 * 2.8, 0.9))
            .collect();
        let raw_pitch: Vec<f64> = (0..60)
            .map(|i| {
                if i % 5 == 0 {
                    f64::NAN
                } else {
                    140.0 + 2.0 * (i as f64)
                }
            })
            .collect();
        RawFeatures {
            words,
            asr_pauses: vec![RawInterval::new(8.0, 8.6)],
            vad_pauses: vec![RawInterval::new(8.1, 8.9), RawInterval::new(30.0, 31.2)],
            pitch: PitchSummary {
                mean_hz: Some(190.0),
                std_hz: Some(28.0),
            },
            raw_pitch_hz: Some(raw_pitch),
            energy: EnergySummary {
                mean: 0.03,
                std: 0.015,
            },
            noise: NoiseSummary {
                noise_dbfs: Some(-55.0),
                speech_ratio: 0.8,
                mic_quality: MicQuality::Ok,
            },
            duration_sec: 60.0,
        }
    }

    fn analyzer_with(features: RawFeatures) -> Analyzer {
        Analyzer::new(
            Arc::new(MockExtractor::new().with_features(features)),
            &Config::default(),
        )
    }

    #[test]
    fn empty_audio_is_a_hard_validation_error() {
        let analyzer = analyzer_with(RawFeatures::default());
        let request = AnalysisRequest::default();
        let result = analyzer.run(&request);
        assert!(matches!(result, Err(PodiumError::InvalidInput { .. })));
    }

    #[test]
    fn empty_metric_name_is_rejected() {
        let mut request = AnalysisRequest::for_audio("talk.json");
        request.requested_metrics = vec!["pace".to_string(), "  ".to_string()];
        assert!(request.validate().is_err());
    }

    #[test]
    fn file_url_is_unwrapped_to_a_path() {
        let request = AnalysisRequest::for_audio("file:///tmp/talk.json");
        assert_eq!(request.audio_path(), PathBuf::from("/tmp/talk.json"));
    }

    #[test]
    fn front_end_failure_fails_the_run() {
        let analyzer = Analyzer::new(
            Arc::new(MockExtractor::new().with_failure()),
            &Config::default(),
        );
        let result = analyzer.run(&AnalysisRequest::for_audio("talk.json"));
        assert!(matches!(result, Err(PodiumError::FeatureExtraction { .. })));
    }

    #[test]
    fn full_run_scores_every_builtin_metric() {
        let analyzer = analyzer_with(rich_features());
        let report = analyzer
            .run(&AnalysisRequest::for_audio("talk.json"))
            .unwrap();

        for name in [
            "pace",
            "pause_quality",
            "fillers",
            "intonation",
            "content_structure",
        ] {
            let metric = report.metrics.get(name).unwrap_or_else(|| {
                panic!("missing metric {name}");
            });
            assert!(!metric.abstained, "{name} unexpectedly abstained");
            assert!(metric.score_0_100.is_some());
        }
        assert!(report.overall_score.score_0_100.is_some());
        assert!(!report.transcript.full_text.is_empty());
        assert_eq!(report.model_metadata.extractor, "mock");
    }

    #[test]
    fn timeline_is_sorted_and_mixes_entry_kinds() {
        let analyzer = analyzer_with(rich_features());
        let report = analyzer
            .run(&AnalysisRequest::for_audio("talk.json"))
            .unwrap();

        assert!(!report.timeline.is_empty());
        for window in report.timeline.windows(2) {
            assert!(window[0].start_sec() <= window[1].start_sec());
        }
        let has_pause = report
            .timeline
            .iter()
            .any(|e| matches!(e, TimelineEntry::Pause(_)));
        let has_feedback = report
            .timeline
            .iter()
            .any(|e| matches!(e, TimelineEntry::Feedback(_)));
        assert!(has_pause);
        assert!(has_feedback);
    }

    #[test]
    fn requested_subset_limits_the_report() {
        let analyzer = analyzer_with(rich_features());
        let mut request = AnalysisRequest::for_audio("talk.json");
        request.requested_metrics = vec!["pace".to_string(), "fillers".to_string()];
        let report = analyzer.run(&request).unwrap();
        assert_eq!(report.metrics.len(), 2);
        assert!(report.metrics.contains_key("pace"));
        assert!(report.metrics.contains_key("fillers"));
    }

    #[test]
    fn unknown_metric_abstains_instead_of_failing() {
        let analyzer = analyzer_with(rich_features());
        let mut request = AnalysisRequest::for_audio("talk.json");
        request.requested_metrics = vec!["charisma".to_string()];
        let report = analyzer.run(&request).unwrap();
        let metric = &report.metrics["charisma"];
        assert!(metric.abstained);
        match &metric.details {
            MetricDetails::Abstained { reason } => assert_eq!(reason, "unknown_metric"),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    struct PanickingScorer;

    impl MetricScorer for PanickingScorer {
        fn name(&self) -> &'static str {
            "intonation"
        }

        fn score(&self, _features: &RawFeatures) -> MetricOutcome {
            panic!("pitch summary missing");
        }
    }

    #[test]
    fn panicking_scorer_is_isolated() {
        let features = rich_features();
        let analyzer = analyzer_with(features).with_scorers(vec![
            Box::new(PanickingScorer),
            Box::new(crate::analysis::pace::PaceScorer::default()),
        ]);
        let report = analyzer
            .run(&AnalysisRequest::for_audio("talk.json"))
            .unwrap();

        let intonation = &report.metrics["intonation"];
        assert!(intonation.abstained);
        match &intonation.details {
            MetricDetails::Abstained { reason } => {
                assert!(reason.starts_with("metric_computation_failed"));
                assert!(reason.contains("pitch summary missing"));
            }
            other => panic!("unexpected details: {other:?}"),
        }
        // The other metric still scored normally.
        assert!(!report.metrics["pace"].abstained);
    }

    #[test]
    fn abstention_cascade_on_one_second_recording() {
        let features = RawFeatures {
            words: vec![word("hi", 0.2, 0.9)],
            duration_sec: 1.0,
            ..Default::default()
        };
        let analyzer = analyzer_with(features);
        let mut request = AnalysisRequest::for_audio("talk.json");
        request.requested_metrics = vec![
            "pace".to_string(),
            "pause_quality".to_string(),
            "fillers".to_string(),
            "intonation".to_string(),
        ];
        let report = analyzer.run(&request).unwrap();
        for (name, metric) in &report.metrics {
            assert!(metric.abstained, "{name} should abstain on a 1s recording");
            assert_eq!(metric.score_0_100, None);
        }
        assert_eq!(report.overall_score.score_0_100, None);
        assert_eq!(report.overall_score.label, "unknown");
    }

    #[test]
    fn quality_flags_reflect_noise_and_confidence() {
        let mut features = rich_features();
        features.noise.noise_dbfs = Some(-35.0);
        features.noise.speech_ratio = 0.2;
        for w in &mut features.words {
            w.confidence = 0.3;
        }
        let analyzer = analyzer_with(features);
        let report = analyzer
            .run(&AnalysisRequest::for_audio("talk.json"))
            .unwrap();
        let flags = &report.quality_flags;
        assert_eq!(flags.background_noise_level, NoiseLevel::High);
        assert_eq!(
            flags.abstain_reason,
            Some(AbstainReason::LowAsrAndSpeechRatio)
        );
        assert!(flags.asr_confidence < 0.5);
    }

    #[test]
    fn quality_flags_without_noise_data_default_to_low() {
        let flags = compute_quality_flags(&RawFeatures {
            words: vec![word("ok", 0.0, 0.9)],
            noise: NoiseSummary {
                noise_dbfs: None,
                speech_ratio: 0.9,
                mic_quality: MicQuality::Ok,
            },
            duration_sec: 10.0,
            ..Default::default()
        });
        assert_eq!(flags.background_noise_level, NoiseLevel::Low);
        assert_eq!(flags.abstain_reason, None);
    }

    #[test]
    fn overall_score_weighs_by_confidence() {
        let mut metrics = BTreeMap::new();
        metrics.insert("a".to_string(), {
            let mut m = MetricResult::abstained("x");
            m.abstained = false;
            m.score_0_100 = Some(90);
            m.confidence = 0.9;
            m
        });
        metrics.insert("b".to_string(), {
            let mut m = MetricResult::abstained("x");
            m.abstained = false;
            m.score_0_100 = Some(40);
            m.confidence = 0.1;
            m
        });
        metrics.insert("c".to_string(), MetricResult::abstained("no_signal"));

        let overall = compute_overall_score(&metrics);
        // (90*0.9 + 40*0.1) / 1.0 = 85
        assert_eq!(overall.score_0_100, Some(85));
        assert_eq!(overall.label, "strong");
    }

    #[test]
    fn transcript_tokens_carry_filler_flags() {
        let features = RawFeatures {
            words: vec![word("um", 0.5, 0.9), word("hello", 1.0, 0.95)],
            duration_sec: 10.0,
            ..Default::default()
        };
        let transcript = build_transcript(&features.words, "en");
        assert_eq!(transcript.full_text, "um hello");
        assert!(transcript.tokens[0].is_filler);
        assert!(!transcript.tokens[1].is_filler);
        assert_eq!(transcript.segments.len(), 1);
        let avg = transcript.segments[0].avg_confidence;
        assert!((avg - 0.925).abs() < 1e-9);
    }
}
