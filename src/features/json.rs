//! Feature extractor that loads a precomputed features document.
//!
//! The practical offline path: an external front end (ASR + VAD + pitch
//! tracker) writes one JSON document per recording; this extractor only
//! parses and validates it.

use crate::error::{PodiumError, Result};
use crate::features::{FeatureExtractor, RawFeatures};
use std::fs;
use std::path::Path;

/// Loads [`RawFeatures`] from a JSON document on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeatureExtractor;

impl JsonFeatureExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for JsonFeatureExtractor {
    fn extract(&self, audio: &Path) -> Result<RawFeatures> {
        if !audio.is_file() {
            return Err(PodiumError::AudioFileNotFound {
                path: audio.display().to_string(),
            });
        }

        let contents = fs::read_to_string(audio)?;
        let features: RawFeatures =
            serde_json::from_str(&contents).map_err(|e| PodiumError::FeatureExtraction {
                message: format!("invalid features document {}: {e}", audio.display()),
            })?;

        if features.duration_sec < 0.0 {
            return Err(PodiumError::FeatureExtraction {
                message: format!(
                    "features document {} has negative duration",
                    audio.display()
                ),
            });
        }

        Ok(features)
    }

    fn name(&self) -> &'static str {
        "json-features"
    }
}
