//! Content-structure metric: signpost phrases and sentence shape.
//!
//! Rule-based stand-in for full NLP: sentences are split on terminal
//! punctuation carried by the recognizer's word tokens, and structure is
//! judged from sentence length plus discourse-marker ("signpost") usage.

use crate::analysis::fillers::normalize_token;
use crate::analysis::metric::{MetricOutcome, MetricScorer};
use crate::analysis::types::{
    FeedbackItem, MetricDetails, MetricResult, SegmentEvent, StructureDetails, TimelineEntry,
};
use crate::defaults::{LONG_SENTENCE_TOKENS, SEGMENT_WINDOW_SEC};
use crate::features::{RawFeatures, WordToken};

/// Single-word discourse markers.
const SIGNPOST_WORDS: &[&str] = &[
    "first",
    "firstly",
    "second",
    "secondly",
    "third",
    "next",
    "then",
    "finally",
    "lastly",
    "however",
    "moreover",
    "furthermore",
    "also",
    "therefore",
    "thus",
    "consequently",
    "overall",
    "importantly",
    "specifically",
    "namely",
    "clearly",
];

/// Multi-word discourse markers, matched over normalized token windows.
const SIGNPOST_PHRASES: &[&str] = &[
    "in summary",
    "to summarize",
    "in conclusion",
    "to conclude",
    "in short",
    "for example",
    "for instance",
    "such as",
    "in addition",
    "on the other hand",
    "in contrast",
    "as a result",
    "in other words",
    "that is",
];

struct Sentence {
    start_sec: f64,
    text: String,
    tokens: usize,
    signposts: Vec<String>,
}

/// Group word tokens into sentences at terminal punctuation. Tokens without
/// any closing punctuation form one trailing sentence.
fn split_sentences(words: &[WordToken]) -> Vec<Sentence> {
    let normalized: Vec<String> = words.iter().map(|w| normalize_token(&w.text)).collect();
    let signpost_hits = find_signposts(&normalized);

    let mut sentences = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        current.push(i);
        if word.text.trim_end().ends_with(['.', '?', '!']) {
            sentences.push(build_sentence(words, &normalized, &signpost_hits, &current));
            current.clear();
        }
    }
    if !current.is_empty() {
        sentences.push(build_sentence(words, &normalized, &signpost_hits, &current));
    }

    sentences.retain(|s| s.tokens > 0);
    sentences
}

fn build_sentence(
    words: &[WordToken],
    normalized: &[String],
    signpost_hits: &[(usize, String)],
    indices: &[usize],
) -> Sentence {
    let first = indices[0];
    let last = *indices.last().unwrap_or(&first);
    let tokens = indices.iter().filter(|i| !normalized[**i].is_empty()).count();
    let text = indices
        .iter()
        .map(|i| words[*i].text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let signposts = signpost_hits
        .iter()
        .filter(|(i, _)| *i >= first && *i <= last)
        .map(|(_, phrase)| phrase.clone())
        .collect();
    Sentence {
        start_sec: words[first].start_sec,
        text,
        tokens,
        signposts,
    }
}

/// All signpost occurrences as (token index, matched phrase).
fn find_signposts(normalized: &[String]) -> Vec<(usize, String)> {
    let mut hits = Vec::new();
    for (i, token) in normalized.iter().enumerate() {
        if SIGNPOST_WORDS.contains(&token.as_str()) {
            hits.push((i, token.clone()));
        }
    }
    for phrase in SIGNPOST_PHRASES {
        let parts: Vec<&str> = phrase.split(' ').collect();
        for start in 0..normalized.len().saturating_sub(parts.len() - 1) {
            if parts
                .iter()
                .enumerate()
                .all(|(j, part)| normalized[start + j] == *part)
            {
                hits.push((start, (*phrase).to_string()));
            }
        }
    }
    hits.sort_by_key(|(i, _)| *i);
    hits
}

fn label_and_score(
    num_sentences: usize,
    signpost_count: usize,
    long_sentence_count: usize,
) -> (&'static str, u8) {
    let long_ratio = long_sentence_count as f64 / num_sentences.max(1) as f64;
    let low_signposts = signpost_count == 0;

    match (low_signposts, long_ratio > 0.4) {
        (true, true) => ("unclear_structure", 45),
        (true, false) => ("mixed_structure", 60),
        (false, true) => ("mostly_clear_structure", 75),
        (false, false) => ("very_clear_structure", 90),
    }
}

fn feedback_for_label(label: &str) -> &'static str {
    match label {
        "unclear_structure" => {
            "Your talk structure is hard to follow: you rarely use signposts and several \
             sentences are quite long. Try adding phrases like \"first\", \"next\", or \
             \"in summary\", and break long sentences into smaller units."
        }
        "mixed_structure" => {
            "Some parts of your structure are clear, but the flow could be improved. \
             Consider using more explicit signposts and shortening long sentences."
        }
        "mostly_clear_structure" => {
            "Your structure is mostly clear, with some room to improve. A few long sentences \
             could be simplified, and extra signposts may help transitions."
        }
        _ => {
            "Your structure is very clear. You use signposts effectively and keep sentences \
             at a readable length, which makes it easy for the audience to follow."
        }
    }
}

/// Per-window content segments for the timeline.
fn content_segments(sentences: &[Sentence], duration_sec: f64) -> Vec<TimelineEntry> {
    if sentences.is_empty() || duration_sec <= 0.0 {
        return Vec::new();
    }

    let mut entries = Vec::new();
    let mut t = 0.0;
    while t < duration_sec {
        let end = (t + SEGMENT_WINDOW_SEC).min(duration_sec);
        let in_window: Vec<&Sentence> = sentences
            .iter()
            .filter(|s| s.start_sec >= t && s.start_sec < end)
            .collect();

        if !in_window.is_empty() {
            let mut dominant_issues = Vec::new();
            let mut highlights: Vec<String> = Vec::new();

            if in_window.iter().any(|s| s.tokens > LONG_SENTENCE_TOKENS) {
                dominant_issues.push("long_sentences".to_string());
            }
            for sentence in &in_window {
                for signpost in &sentence.signposts {
                    if !highlights.contains(signpost) && highlights.len() < 3 {
                        highlights.push(signpost.clone());
                    }
                }
            }
            if highlights.is_empty() {
                dominant_issues.push("few_signposts".to_string());
            }

            entries.push(TimelineEntry::Segment(SegmentEvent {
                start_sec: t,
                end_sec: end,
                dominant_issues,
                highlights,
            }));
        }
        t += SEGMENT_WINDOW_SEC;
    }
    entries
}

/// Rubric-based score over sentence shape and signpost usage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureScorer;

impl StructureScorer {
    pub fn new() -> Self {
        Self
    }
}

impl MetricScorer for StructureScorer {
    fn name(&self) -> &'static str {
        "content_structure"
    }

    fn score(&self, features: &RawFeatures) -> MetricOutcome {
        let sentences = split_sentences(&features.words);
        if sentences.is_empty() {
            return MetricOutcome::abstained("empty_transcript");
        }

        let num_sentences = sentences.len();
        let long_sentence_count = sentences
            .iter()
            .filter(|s| s.tokens > LONG_SENTENCE_TOKENS)
            .count();
        let signpost_count: usize = sentences.iter().map(|s| s.signposts.len()).sum();
        let avg_sentence_length =
            sentences.iter().map(|s| s.tokens).sum::<usize>() as f64 / num_sentences as f64;

        let signpost_examples: Vec<String> = sentences
            .iter()
            .filter(|s| !s.signposts.is_empty())
            .take(5)
            .map(|s| s.text.clone())
            .collect();

        let (label, score) = label_and_score(num_sentences, signpost_count, long_sentence_count);

        let result = MetricResult {
            score_0_100: Some(score),
            label: label.to_string(),
            confidence: 0.75,
            abstained: false,
            details: MetricDetails::Structure(StructureDetails {
                num_sentences,
                avg_sentence_length_tokens: avg_sentence_length,
                long_sentence_count,
                signpost_count,
                signpost_examples,
            }),
            feedback: vec![FeedbackItem {
                start_sec: 0.0,
                end_sec: 0.0,
                metric: "content_structure".to_string(),
                message: feedback_for_label(label).to_string(),
                tip_type: "content_structure".to_string(),
            }],
        };

        let timeline = content_segments(&sentences, features.duration_sec);
        MetricOutcome::scored_with_timeline(result, timeline)
    }
}
