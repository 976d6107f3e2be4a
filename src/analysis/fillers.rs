//! Filler-word detection and the filler-rate metric.

use crate::analysis::metric::{MetricOutcome, MetricScorer};
use crate::analysis::types::{
    FeedbackItem, FillerCount, FillerDetails, FillerSpike, MetricDetails, MetricResult,
};
use crate::config::AnalysisConfig;
use crate::defaults::{
    FILLER_RATE_LOW_MAX_PER_MIN, FILLER_RATE_MODERATE_MAX_PER_MIN, FILLER_SPIKE_THRESHOLD_PER_MIN,
    FILLER_SPIKE_WINDOW_SEC,
};
use crate::features::{RawFeatures, WordToken};
use std::collections::HashMap;

/// Discrete filler tokens. The multi-token phrase "you know" is handled
/// separately, both as an adjacent token pair and as the mashed form some
/// recognizers emit.
const FILLER_TOKENS: &[&str] = &[
    "um",
    "uh",
    "uhm",
    "er",
    "erm",
    "like",
    "actually",
    "basically",
];

const PHRASE_DISPLAY: &str = "you know";

/// Lowercase, strip ASCII punctuation, collapse whitespace.
pub fn normalize_token(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a single token is a filler on its own.
///
/// Used for the transcript's `is_filler` flags; the pair form of "you know"
/// is only counted by the scorer.
pub fn is_filler_token(text: &str) -> bool {
    let normalized = normalize_token(text);
    FILLER_TOKENS.contains(&normalized.as_str())
        || normalized == PHRASE_DISPLAY
        || normalized == "youknow"
}

/// One detected filler occurrence, keyed by its display token.
struct Occurrence {
    token: &'static str,
    start_sec: f64,
}

fn detect_fillers(words: &[WordToken]) -> (Vec<Occurrence>, usize) {
    let normalized: Vec<String> = words.iter().map(|w| normalize_token(&w.text)).collect();
    let total_tokens = normalized.iter().filter(|n| !n.is_empty()).count();

    let mut occurrences = Vec::new();
    for (i, norm) in normalized.iter().enumerate() {
        if let Some(token) = FILLER_TOKENS.iter().copied().find(|t| *t == norm) {
            occurrences.push(Occurrence {
                token,
                start_sec: words[i].start_sec,
            });
            continue;
        }
        if norm == PHRASE_DISPLAY || norm == "youknow" {
            occurrences.push(Occurrence {
                token: PHRASE_DISPLAY,
                start_sec: words[i].start_sec,
            });
            continue;
        }
        // Adjacent-pair form of the phrase.
        if norm == "you"
            && let Some(next) = normalized.get(i + 1)
            && next == "know"
        {
            occurrences.push(Occurrence {
                token: PHRASE_DISPLAY,
                start_sec: words[i].start_sec,
            });
        }
    }

    (occurrences, total_tokens)
}

/// Slide a window across the talk and report spans where the filler rate
/// exceeds the spike threshold. Overlapping spike windows are coalesced.
fn detect_spikes(occurrences: &[Occurrence], words: &[WordToken]) -> Vec<FillerSpike> {
    if words.is_empty() || occurrences.is_empty() {
        return Vec::new();
    }

    let first_start = words
        .iter()
        .map(|w| w.start_sec)
        .fold(f64::INFINITY, f64::min);
    let last_end = words.iter().map(|w| w.end_sec).fold(0.0, f64::max);
    if last_end <= first_start {
        return Vec::new();
    }

    let window = FILLER_SPIKE_WINDOW_SEC;
    let step = window / 4.0;
    let window_min = window / 60.0;

    let mut spikes: Vec<FillerSpike> = Vec::new();
    let mut current_start = first_start;

    while current_start + window <= last_end {
        let window_end = current_start + window;
        let in_window = occurrences
            .iter()
            .filter(|o| o.start_sec >= current_start && o.start_sec < window_end)
            .count();
        let rate = in_window as f64 / window_min;

        if rate >= FILLER_SPIKE_THRESHOLD_PER_MIN {
            match spikes.last_mut() {
                Some(last) if current_start <= last.end_sec => {
                    last.end_sec = window_end;
                    last.rate_per_min = last.rate_per_min.max(rate);
                }
                _ => spikes.push(FillerSpike {
                    start_sec: current_start,
                    end_sec: window_end,
                    rate_per_min: rate,
                }),
            }
        }

        current_start += step;
    }

    spikes
}

/// Rate-based filler score.
#[derive(Debug, Clone, Copy)]
pub struct FillerScorer {
    min_duration_sec: f64,
}

impl FillerScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_duration_sec: config.min_duration_sec,
        }
    }
}

impl Default for FillerScorer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl MetricScorer for FillerScorer {
    fn name(&self) -> &'static str {
        "fillers"
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

        let (occurrences, total_tokens) = detect_fillers(&features.words);
        if total_tokens == 0 {
            return MetricOutcome::abstained("no_tokens");
        }

        let duration_min = duration_sec / 60.0;
        let total_fillers = occurrences.len();
        let rate_per_min = total_fillers as f64 / duration_min;
        let per_100_words = total_fillers as f64 / total_tokens as f64 * 100.0;

        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for occurrence in &occurrences {
            *counts.entry(occurrence.token).or_default() += 1;
        }
        let mut top_fillers: Vec<FillerCount> = counts
            .into_iter()
            .map(|(token, count)| FillerCount {
                token: token.to_string(),
                count,
            })
            .collect();
        top_fillers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.token.cmp(&b.token)));

        let spikes = detect_spikes(&occurrences, &features.words);

        let (label, score) = if total_fillers == 0 {
            ("low_filler_rate", 95)
        } else if rate_per_min <= FILLER_RATE_LOW_MAX_PER_MIN {
            ("low_filler_rate", 85)
        } else if rate_per_min <= FILLER_RATE_MODERATE_MAX_PER_MIN {
            ("moderate_filler_rate", 65)
        } else {
            ("high_filler_rate", 45)
        };

        let top_name = top_fillers.first().map(|f| f.token.clone());
        let message = match (label, &top_name) {
            ("high_filler_rate", Some(top)) => format!(
                "High filler rate (~{rate_per_min:.1}/min); \"{top}\" is your most frequent. \
                 Try replacing it with a silent breath or short pause."
            ),
            ("moderate_filler_rate", Some(top)) => format!(
                "Moderate filler rate (~{rate_per_min:.1}/min); watch for \"{top}\". \
                 Being more deliberate before speaking can reduce fillers."
            ),
            (_, Some(top)) => format!(
                "Low filler rate (~{rate_per_min:.1}/min); the occasional \"{top}\" is fine. \
                 Great job keeping your speech clean and focused."
            ),
            (_, None) => format!(
                "Low filler rate (~{rate_per_min:.1}/min). \
                 Great job keeping your speech clean and focused."
            ),
        };

        let mut feedback = vec![FeedbackItem {
            start_sec: 0.0,
            end_sec: duration_sec,
            metric: "fillers".to_string(),
            message,
            tip_type: "fillers".to_string(),
        }];
        for spike in &spikes {
            feedback.push(FeedbackItem {
                start_sec: spike.start_sec,
                end_sec: spike.end_sec,
                metric: "fillers".to_string(),
                message: format!(
                    "High filler rate (~{:.1}/min) detected in this segment. \
                     Practice pausing silently instead of saying \"um\".",
                    spike.rate_per_min
                ),
                tip_type: "fillers".to_string(),
            });
        }

        let result = MetricResult {
            score_0_100: Some(score),
            label: label.to_string(),
            confidence: 0.75,
            abstained: false,
            details: MetricDetails::Fillers(FillerDetails {
                filler_rate_per_min: rate_per_min,
                fillers_per_100_words: per_100_words,
                total_fillers,
                top_fillers,
                filler_spikes: spikes,
            }),
            feedback,
        };

        MetricOutcome::scored(result)
    }
}
