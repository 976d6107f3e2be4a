//! Default tuning constants for podium.
//!
//! This module provides shared constants used across the analysis metrics
//! to ensure consistency and eliminate duplication.

/// Minimum recording duration (seconds) for duration-dependent metrics.
///
/// Below this the rate-based scorers have too little signal to say anything
/// useful, so they abstain instead of guessing.
pub const MIN_ANALYSIS_DURATION_SEC: f64 = 3.0;

/// Boundary margin (seconds) for pause reconciliation.
///
/// Silence that touches the very start or end of the recording is lead-in or
/// tail silence, not a mid-speech pause, and is discarded. For very short
/// clips the margin shrinks to a quarter of the duration.
pub const PAUSE_BOUNDARY_MARGIN_SEC: f64 = 0.3;

/// Minimum overlap (seconds) for two pause intervals to be considered the
/// same pause during reconciliation.
pub const PAUSE_MERGE_TOLERANCE_SEC: f64 = 0.1;

/// Pause duration thresholds (seconds) for quality classification.
pub const PAUSE_SHORT_MAX_SEC: f64 = 0.5;
pub const PAUSE_MEDIUM_MAX_SEC: f64 = 1.0;

/// Pause-rate thresholds (pauses per second) for the pause-quality score.
pub const PAUSE_RATE_HIGH_PER_SEC: f64 = 0.30;
pub const PAUSE_RATE_LOW_PER_SEC: f64 = 0.05;

/// Filler-rate thresholds (fillers per minute).
pub const FILLER_RATE_LOW_MAX_PER_MIN: f64 = 3.0;
pub const FILLER_RATE_MODERATE_MAX_PER_MIN: f64 = 7.0;

/// Sliding-window parameters for filler-spike detection.
///
/// A 30 s window stepped by a quarter of its width smooths the rate estimate
/// while still localizing spikes to a usable time span.
pub const FILLER_SPIKE_WINDOW_SEC: f64 = 30.0;
pub const FILLER_SPIKE_THRESHOLD_PER_MIN: f64 = 10.0;

/// Minimum voiced frames required to trust a raw pitch timeseries.
pub const MIN_VOICED_FRAMES: usize = 10;

/// Pitch standard-deviation thresholds (Hz): flat / moderate / dynamic.
pub const PITCH_STD_FLAT_MAX_HZ: f64 = 12.0;
pub const PITCH_STD_MODERATE_MAX_HZ: f64 = 25.0;

/// Pitch range thresholds (Hz): narrow / moderate / wide.
pub const PITCH_RANGE_NARROW_MAX_HZ: f64 = 50.0;
pub const PITCH_RANGE_MODERATE_MAX_HZ: f64 = 120.0;

/// Coefficient-of-variation thresholds (std / mean).
pub const PITCH_COV_LOW_MAX: f64 = 0.10;
pub const PITCH_COV_MODERATE_MAX: f64 = 0.20;

/// Energy standard-deviation thresholds.
pub const ENERGY_STD_LOW_MAX: f64 = 0.005;
pub const ENERGY_STD_MODERATE_MAX: f64 = 0.02;

/// Words-per-minute thresholds for the pace score.
pub const WPM_SLOW_MAX: f64 = 110.0;
pub const WPM_OPTIMAL_MAX: f64 = 170.0;

/// Window length (seconds) for per-segment pace and structure statistics.
pub const SEGMENT_WINDOW_SEC: f64 = 30.0;

/// Word-token count above which a sentence is considered long.
pub const LONG_SENTENCE_TOKENS: usize = 30;

/// Quality-flag thresholds.
///
/// ASR confidence below 0.5, or speech occupying less than 30% of the
/// recording, makes every transcription-derived metric suspect; the report
/// carries an abstain reason so callers can tell "unavailable" from "scored".
pub const MIN_ASR_CONFIDENCE: f64 = 0.5;
pub const MIN_SPEECH_RATIO: f64 = 0.3;

/// Background-noise dBFS thresholds: below the first is low, below the
/// second is medium, anything louder is high.
pub const NOISE_LOW_MAX_DBFS: f64 = -60.0;
pub const NOISE_MEDIUM_MAX_DBFS: f64 = -40.0;

/// RMS threshold for the WAV energy extractor's silence detection.
///
/// Matches the typical speech/silence boundary for normalized microphone
/// input; frames below it count as silence.
pub const WAV_SILENCE_RMS_THRESHOLD: f64 = 0.02;

/// Frame length (samples) for the WAV energy extractor at 16 kHz.
pub const WAV_FRAME_SAMPLES: usize = 1024;

/// Minimum silence run (seconds) for the WAV extractor to report a pause.
pub const WAV_MIN_SILENCE_SEC: f64 = 0.25;

/// Default job-id prefix.
pub const JOB_ID_PREFIX: &str = "talk";

/// Default language tag attached to transcripts when the submission does not
/// specify one.
pub const DEFAULT_LANGUAGE: &str = "en";
