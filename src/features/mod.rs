//! Acoustic front-end boundary: raw feature types and the extractor seam.
//!
//! The heavy lifting (ASR, VAD, pitch tracking) happens outside this crate.
//! Everything downstream consumes one read-only [`RawFeatures`] document per
//! job, obtained through the [`FeatureExtractor`] trait.

pub mod json;
pub mod wav;

use crate::analysis::types::MicQuality;
use crate::error::{PodiumError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub use json::JsonFeatureExtractor;
pub use wav::WavEnergyExtractor;

/// One transcribed word with timing and recognizer confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    #[serde(alias = "start")]
    pub start_sec: f64,
    #[serde(alias = "end")]
    pub end_sec: f64,
    #[serde(alias = "probability", default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

/// A raw silence interval from one of the two detectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawInterval {
    #[serde(alias = "start")]
    pub start_sec: f64,
    #[serde(alias = "end")]
    pub end_sec: f64,
}

impl RawInterval {
    pub fn new(start_sec: f64, end_sec: f64) -> Self {
        Self { start_sec, end_sec }
    }

    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// Summary statistics of the fundamental-frequency track.
///
/// Both fields are `None` when the pitch tracker found no voiced frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PitchSummary {
    pub mean_hz: Option<f64>,
    pub std_hz: Option<f64>,
}

/// Summary statistics of the frame-wise RMS energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnergySummary {
    pub mean: f64,
    pub std: f64,
}

/// Recording-level noise measurements from the front end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NoiseSummary {
    pub noise_dbfs: Option<f64>,
    pub speech_ratio: f64,
    pub mic_quality: MicQuality,
}

/// Everything the acoustic front end hands to the analysis pipeline.
/// Read-only for the duration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RawFeatures {
    pub words: Vec<WordToken>,
    pub asr_pauses: Vec<RawInterval>,
    pub vad_pauses: Vec<RawInterval>,
    pub pitch: PitchSummary,
    /// One F0 value per analysis frame; unvoiced frames are NaN. On the wire
    /// unvoiced frames are `null`.
    #[serde(deserialize_with = "deserialize_pitch_series")]
    pub raw_pitch_hz: Option<Vec<f64>>,
    pub energy: EnergySummary,
    pub noise: NoiseSummary,
    pub duration_sec: f64,
}

/// JSON has no NaN; unvoiced frames arrive as `null` and are mapped back.
fn deserialize_pitch_series<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let frames: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(frames.map(|v| v.into_iter().map(|f| f.unwrap_or(f64::NAN)).collect()))
}

/// Trait for acoustic feature extraction.
///
/// This trait allows swapping implementations (offline JSON documents,
/// WAV energy scanning, mocks for tests). Implementations must not fail for
/// well-formed audio; a signal that could not be detected (e.g. pitch) is
/// reported through `None` fields instead.
pub trait FeatureExtractor: Send + Sync {
    /// Extract raw features for one recording.
    fn extract(&self, audio: &Path) -> Result<RawFeatures>;

    /// Short name for report metadata and logging.
    fn name(&self) -> &'static str;
}

/// Mock extractor for testing.
#[derive(Debug, Clone, Default)]
pub struct MockExtractor {
    features: RawFeatures,
    should_fail: bool,
}

impl MockExtractor {
    /// Create a mock returning empty features.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to return specific features.
    pub fn with_features(mut self, features: RawFeatures) -> Self {
        self.features = features;
        self
    }

    /// Configure the mock to fail on extract.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl FeatureExtractor for MockExtractor {
    fn extract(&self, _audio: &Path) -> Result<RawFeatures> {
        if self.should_fail {
            Err(PodiumError::FeatureExtraction {
                message: "mock extraction failure".to_string(),
            })
        } else {
            Ok(self.features.clone())
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
