//! Energy-only feature extractor for raw WAV recordings.
//!
//! A degraded front end for when no transcription is available: reads the
//! WAV, computes frame-wise RMS energy, and derives VAD-style silence
//! intervals by thresholding. Words and pitch stay empty, so the
//! transcription-derived metrics abstain while pause and quality signals
//! still work.

use crate::analysis::types::MicQuality;
use crate::defaults::{
    WAV_FRAME_SAMPLES, WAV_MIN_SILENCE_SEC, WAV_SILENCE_RMS_THRESHOLD,
};
use crate::error::{PodiumError, Result};
use crate::features::{
    EnergySummary, FeatureExtractor, NoiseSummary, RawFeatures, RawInterval,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Extracts energy, silence intervals, and noise heuristics from a WAV file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEnergyExtractor;

impl WavEnergyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for WavEnergyExtractor {
    fn extract(&self, audio: &Path) -> Result<RawFeatures> {
        if !audio.is_file() {
            return Err(PodiumError::AudioFileNotFound {
                path: audio.display().to_string(),
            });
        }

        let file = File::open(audio)?;
        let mut reader =
            hound::WavReader::new(BufReader::new(file)).map_err(|e| PodiumError::FeatureExtraction {
                message: format!("failed to parse WAV file: {e}"),
            })?;

        let spec = reader.spec();
        let samples = read_mono_samples(&mut reader, spec)?;
        let sample_rate = spec.sample_rate as f64;
        let duration_sec = samples.len() as f64 / sample_rate;

        let frame_rms = frame_rms(&samples, WAV_FRAME_SAMPLES);
        let frame_sec = WAV_FRAME_SAMPLES as f64 / sample_rate;

        let energy = energy_summary(&frame_rms);
        let vad_pauses = silence_intervals(&frame_rms, frame_sec);
        let noise = noise_summary(&frame_rms, &vad_pauses, duration_sec, energy.mean);

        Ok(RawFeatures {
            words: Vec::new(),
            asr_pauses: Vec::new(),
            vad_pauses,
            pitch: Default::default(),
            raw_pitch_hz: None,
            energy,
            noise,
            duration_sec,
        })
    }

    fn name(&self) -> &'static str {
        "wav-energy"
    }
}

/// Read all samples, averaging stereo down to mono, normalized to [-1, 1].
fn read_mono_samples<R: std::io::Read>(
    reader: &mut hound::WavReader<R>,
    spec: hound::WavSpec,
) -> Result<Vec<f64>> {
    let raw: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<std::result::Result<_, _>>()
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>(),
    }
    .map_err(|e| PodiumError::FeatureExtraction {
        message: format!("failed to read WAV samples: {e}"),
    })?;

    if spec.channels == 2 {
        Ok(raw
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect())
    } else {
        Ok(raw)
    }
}

/// Frame-wise RMS over fixed-size windows; the trailing partial frame is kept.
fn frame_rms(samples: &[f64], frame_len: usize) -> Vec<f64> {
    samples
        .chunks(frame_len)
        .map(|frame| {
            let sum_sq: f64 = frame.iter().map(|s| s * s).sum();
            (sum_sq / frame.len() as f64).sqrt()
        })
        .collect()
}

fn energy_summary(frame_rms: &[f64]) -> EnergySummary {
    if frame_rms.is_empty() {
        return EnergySummary::default();
    }
    let mean = frame_rms.iter().sum::<f64>() / frame_rms.len() as f64;
    let variance =
        frame_rms.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / frame_rms.len() as f64;
    EnergySummary {
        mean,
        std: variance.sqrt(),
    }
}

/// Runs of sub-threshold frames become silence intervals; runs shorter than
/// the minimum are ignored.
fn silence_intervals(frame_rms: &[f64], frame_sec: f64) -> Vec<RawInterval> {
    let mut intervals = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, rms) in frame_rms.iter().enumerate() {
        if *rms < WAV_SILENCE_RMS_THRESHOLD {
            run_start.get_or_insert(i);
        } else if let Some(start) = run_start.take() {
            push_interval(&mut intervals, start, i, frame_sec);
        }
    }
    if let Some(start) = run_start {
        push_interval(&mut intervals, start, frame_rms.len(), frame_sec);
    }

    intervals
}

fn push_interval(intervals: &mut Vec<RawInterval>, start_frame: usize, end_frame: usize, frame_sec: f64) {
    let start = start_frame as f64 * frame_sec;
    let end = end_frame as f64 * frame_sec;
    if end - start >= WAV_MIN_SILENCE_SEC {
        intervals.push(RawInterval::new(start, end));
    }
}

fn noise_summary(
    frame_rms: &[f64],
    silences: &[RawInterval],
    duration_sec: f64,
    mean_energy: f64,
) -> NoiseSummary {
    // Noise floor estimate: bottom 20% of frame energies.
    let noise_dbfs = if frame_rms.is_empty() {
        None
    } else {
        let mut sorted = frame_rms.to_vec();
        sorted.sort_by(f64::total_cmp);
        let bottom = sorted[(sorted.len() - 1) / 5];
        Some(if bottom <= 1e-12 {
            -100.0
        } else {
            20.0 * bottom.log10()
        })
    };

    let silence_total: f64 = silences.iter().map(RawInterval::duration_sec).sum();
    let speech_ratio = if duration_sec > 0.0 {
        ((duration_sec - silence_total) / duration_sec).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mic_quality = if mean_energy < 0.001 {
        MicQuality::VeryQuiet
    } else if noise_dbfs.is_some_and(|n| n > -30.0) {
        MicQuality::Noisy
    } else {
        MicQuality::Ok
    };

    NoiseSummary {
        noise_dbfs,
        speech_ratio,
        mic_quality,
    }
}
