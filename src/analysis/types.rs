//! Data types shared by the metric scorers, the report, and the job layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which silence detector produced a pause interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseSource {
    /// Gap between consecutive transcribed words.
    Asr,
    /// Silence interval from the voice-activity detector.
    Vad,
}

/// Duration class of a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseQuality {
    Short,
    Medium,
    Long,
}

impl PauseQuality {
    /// Classify a pause by duration in seconds.
    pub fn from_duration(duration_sec: f64) -> Self {
        if duration_sec < crate::defaults::PAUSE_SHORT_MAX_SEC {
            PauseQuality::Short
        } else if duration_sec < crate::defaults::PAUSE_MEDIUM_MAX_SEC {
            PauseQuality::Medium
        } else {
            PauseQuality::Long
        }
    }
}

/// Whether a pause supports the delivery or interrupts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseContext {
    /// Pause at a clause boundary; gives the audience time to digest.
    Helpful,
    /// Mid-clause hesitation.
    Awkward,
}

/// A reconciled mid-speech pause. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pause {
    pub start_sec: f64,
    pub end_sec: f64,
    pub source: PauseSource,
    pub quality: PauseQuality,
    pub context: PauseContext,
}

impl Pause {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// Qualitative advice anchored to a time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub start_sec: f64,
    pub end_sec: f64,
    pub metric: String,
    pub message: String,
    pub tip_type: String,
}

/// One ranked filler token with its occurrence count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerCount {
    pub token: String,
    pub count: usize,
}

/// A time span where the filler rate exceeded the spike threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerSpike {
    pub start_sec: f64,
    pub end_sec: f64,
    pub rate_per_min: f64,
}

/// Words-per-minute for one analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentWpm {
    pub start_sec: f64,
    pub end_sec: f64,
    pub wpm: f64,
}

/// Measured values behind the pause-quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseQualityDetails {
    pub total_pauses: usize,
    pub average_pause_duration_sec: f64,
    pub long_pauses: usize,
    pub short_pauses: usize,
    pub pause_rate_per_sec: f64,
}

/// Measured values behind the filler score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerDetails {
    pub filler_rate_per_min: f64,
    pub fillers_per_100_words: f64,
    pub total_fillers: usize,
    pub top_fillers: Vec<FillerCount>,
    pub filler_spikes: Vec<FillerSpike>,
}

/// Measured values behind the intonation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntonationDetails {
    pub mean_pitch_hz: f64,
    pub pitch_std_hz: f64,
    pub pitch_range_hz: f64,
    /// True when the range came from the raw timeseries percentiles,
    /// false when it is the `4 x std` estimate.
    pub range_is_exact: bool,
    pub pitch_cov: f64,
    pub energy_mean: f64,
    pub energy_std: f64,
    pub prosody_variance_score: f64,
}

/// Measured values behind the pace score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceDetails {
    pub overall_wpm: f64,
    pub mean_gap_sec: f64,
    pub long_gap_ratio: f64,
    pub segment_wpm: Vec<SegmentWpm>,
}

/// Measured values behind the content-structure score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDetails {
    pub num_sentences: usize,
    pub avg_sentence_length_tokens: f64,
    pub long_sentence_count: usize,
    pub signpost_count: usize,
    pub signpost_examples: Vec<String>,
}

/// Per-metric measurement payload.
///
/// Each metric has its own typed detail struct; on the wire all of them
/// serialize to a flat key-value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricDetails {
    PauseQuality(PauseQualityDetails),
    Fillers(FillerDetails),
    Intonation(IntonationDetails),
    Pace(PaceDetails),
    Structure(StructureDetails),
    /// Why the scorer produced no score.
    Abstained { reason: String },
}

/// Result of one metric scorer for one job. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub score_0_100: Option<u8>,
    pub label: String,
    pub confidence: f64,
    pub abstained: bool,
    pub details: MetricDetails,
    pub feedback: Vec<FeedbackItem>,
}

impl MetricResult {
    /// Neutral result for a scorer that declined (or failed) to score.
    pub fn abstained(reason: impl Into<String>) -> Self {
        Self {
            score_0_100: None,
            label: "abstained".to_string(),
            confidence: 0.0,
            abstained: true,
            details: MetricDetails::Abstained {
                reason: reason.into(),
            },
            feedback: Vec::new(),
        }
    }
}

/// Pause entry on the report timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub quality: PauseQuality,
    pub source: PauseSource,
    pub context: PauseContext,
}

impl From<&Pause> for PauseEvent {
    fn from(pause: &Pause) -> Self {
        Self {
            kind: "pause".to_string(),
            start_sec: pause.start_sec,
            end_sec: pause.end_sec,
            quality: pause.quality,
            source: pause.source,
            context: pause.context,
        }
    }
}

/// Feedback entry on the report timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub metric: String,
    pub message: String,
    pub tip_type: String,
}

impl From<&FeedbackItem> for FeedbackEvent {
    fn from(item: &FeedbackItem) -> Self {
        Self {
            kind: "feedback".to_string(),
            start_sec: item.start_sec,
            end_sec: item.end_sec,
            metric: item.metric.clone(),
            message: item.message.clone(),
            tip_type: item.tip_type.clone(),
        }
    }
}

/// Content segment on the report timeline. Carries no `type` discriminator
/// on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEvent {
    pub start_sec: f64,
    pub end_sec: f64,
    pub dominant_issues: Vec<String>,
    pub highlights: Vec<String>,
}

/// One entry on the merged, time-ordered report timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimelineEntry {
    Pause(PauseEvent),
    Feedback(FeedbackEvent),
    Segment(SegmentEvent),
}

impl TimelineEntry {
    pub fn start_sec(&self) -> f64 {
        match self {
            TimelineEntry::Pause(e) => e.start_sec,
            TimelineEntry::Feedback(e) => e.start_sec,
            TimelineEntry::Segment(e) => e.start_sec,
        }
    }

    pub fn end_sec(&self) -> f64 {
        match self {
            TimelineEntry::Pause(e) => e.end_sec,
            TimelineEntry::Feedback(e) => e.end_sec,
            TimelineEntry::Segment(e) => e.end_sec,
        }
    }
}

/// Recording-level microphone quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicQuality {
    Ok,
    VeryQuiet,
    Noisy,
}

impl Default for MicQuality {
    fn default() -> Self {
        MicQuality::Ok
    }
}

/// Qualitative background-noise level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    Low,
    Medium,
    High,
}

/// Recording-level reason the metrics should be taken with caution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstainReason {
    LowAsrConfidence,
    LowSpeechRatio,
    LowAsrAndSpeechRatio,
}

/// Recording-quality flags attached to every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub asr_confidence: f64,
    pub mic_quality: MicQuality,
    pub background_noise_level: NoiseLevel,
    pub speech_ratio: f64,
    pub abstain_reason: Option<AbstainReason>,
}

/// Confidence-weighted combination of the non-abstained metric scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub score_0_100: Option<u8>,
    pub label: String,
    pub confidence: f64,
}

/// One transcript segment with its average word confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_sec: f64,
    pub end_sec: f64,
    pub text: String,
    pub avg_confidence: f64,
}

/// One transcript token with its filler flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptToken {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub is_filler: bool,
}

/// Transcript block exposed by the report and the transcript query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub full_text: String,
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
    pub tokens: Vec<TranscriptToken>,
}

/// Which components produced this report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub extractor: String,
    pub version: String,
}

/// Final assembled analysis report for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub quality_flags: QualityFlags,
    pub overall_score: OverallScore,
    pub metrics: BTreeMap<String, MetricResult>,
    pub timeline: Vec<TimelineEntry>,
    pub transcript: Transcript,
    pub model_metadata: ModelMetadata,
}
