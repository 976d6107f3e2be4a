//! End-to-end pipeline tests over the public API, including the JSON wire
//! shape consumers depend on.

use podium::analysis::pipeline::{AnalysisRequest, Analyzer};
use podium::analysis::types::{MicQuality, TimelineEntry};
use podium::config::Config;
use podium::features::{
    EnergySummary, MockExtractor, NoiseSummary, PitchSummary, RawFeatures, RawInterval, WordToken,
};
use std::sync::Arc;

fn word(text: &str, start: f64) -> WordToken {
    WordToken {
        text: text.to_string(),
        start_sec: start,
        end_sec: start + 0.35,
        confidence: 0.92,
    }
}

/// A two-minute talk with realistic signal in every channel.
fn talk_features() -> RawFeatures {
    let text = "First let me explain the goal of this project. Um we wanted faster builds. \
                Next I will walk through the changes we made. The um compiler cache was cold \
                on every run. In summary the pipeline is now twice as fast. Thank you.";
    let words: Vec<WordToken> = text
        .split_whitespace()
        .enumerate()
        .map(|(i, t)| word(t, 2.0 + i as f64 * 2.2))
        .collect();

    let raw_pitch: Vec<f64> = (0..200)
        .map(|i| {
            if i % 4 == 0 {
                f64::NAN
            } else {
                130.0 + (i % 50) as f64 * 2.0
            }
        })
        .collect();

    RawFeatures {
        words,
        asr_pauses: vec![RawInterval::new(24.0, 24.7), RawInterval::new(60.0, 60.9)],
        vad_pauses: vec![
            RawInterval::new(24.1, 24.9),
            RawInterval::new(90.0, 91.4),
        ],
        pitch: PitchSummary {
            mean_hz: Some(165.0),
            std_hz: Some(26.0),
        },
        raw_pitch_hz: Some(raw_pitch),
        energy: EnergySummary {
            mean: 0.04,
            std: 0.012,
        },
        noise: NoiseSummary {
            noise_dbfs: Some(-65.0),
            speech_ratio: 0.85,
            mic_quality: MicQuality::Ok,
        },
        duration_sec: 120.0,
    }
}

fn analyzer() -> Analyzer {
    Analyzer::new(
        Arc::new(MockExtractor::new().with_features(talk_features())),
        &Config::default(),
    )
}

#[test]
fn report_covers_all_metrics_with_scores() {
    let report = analyzer()
        .run(&AnalysisRequest::for_audio("talk.json"))
        .unwrap();

    assert_eq!(report.metrics.len(), 5);
    for (name, metric) in &report.metrics {
        assert!(!metric.abstained, "{name} unexpectedly abstained");
        let score = metric.score_0_100.unwrap();
        assert!(score <= 100);
        assert!(metric.confidence > 0.0 && metric.confidence <= 1.0);
    }

    let overall = &report.overall_score;
    assert!(overall.score_0_100.is_some());
    assert!(overall.confidence > 0.0);
}

#[test]
fn wire_shape_matches_consumer_contract() {
    let report = analyzer()
        .run(&AnalysisRequest::for_audio("talk.json"))
        .unwrap();
    let value = serde_json::to_value(&report).unwrap();

    // metrics: name -> MetricResult with the stable field set.
    let fillers = &value["metrics"]["fillers"];
    assert!(fillers["score_0_100"].is_number());
    assert!(fillers["label"].is_string());
    assert!(fillers["confidence"].is_number());
    assert_eq!(fillers["abstained"], false);
    assert!(fillers["details"]["filler_rate_per_min"].is_number());
    assert!(fillers["feedback"].is_array());

    // quality_flags enums are the documented snake_case strings.
    let flags = &value["quality_flags"];
    assert_eq!(flags["mic_quality"], "ok");
    assert_eq!(flags["background_noise_level"], "low");
    assert_eq!(flags["abstain_reason"], serde_json::Value::Null);

    // timeline entries: pauses and feedback carry a type tag, content
    // segments do not.
    let timeline = value["timeline"].as_array().unwrap();
    assert!(!timeline.is_empty());
    let mut saw_pause = false;
    let mut saw_feedback = false;
    let mut saw_segment = false;
    for entry in timeline {
        match entry.get("type").and_then(|t| t.as_str()) {
            Some("pause") => {
                saw_pause = true;
                assert!(entry["quality"].is_string());
                assert!(entry["source"].is_string());
                assert!(entry["context"].is_string());
            }
            Some("feedback") => {
                saw_feedback = true;
                assert!(entry["metric"].is_string());
                assert!(entry["message"].is_string());
                assert!(entry["tip_type"].is_string());
            }
            Some(other) => panic!("unexpected timeline type {other}"),
            None => {
                saw_segment = true;
                assert!(entry["dominant_issues"].is_array());
                assert!(entry["highlights"].is_array());
            }
        }
    }
    assert!(saw_pause && saw_feedback && saw_segment);
}

#[test]
fn timeline_is_duration_ordered() {
    let report = analyzer()
        .run(&AnalysisRequest::for_audio("talk.json"))
        .unwrap();
    for window in report.timeline.windows(2) {
        assert!(window[0].start_sec() <= window[1].start_sec());
    }
}

#[test]
fn vad_wins_in_the_final_timeline() {
    // The ASR pause at 24.0-24.7 overlaps the VAD pause at 24.1-24.9; only
    // the VAD one may survive to the timeline.
    let report = analyzer()
        .run(&AnalysisRequest::for_audio("talk.json"))
        .unwrap();
    let pauses: Vec<_> = report
        .timeline
        .iter()
        .filter_map(|e| match e {
            TimelineEntry::Pause(p) => Some(p),
            _ => None,
        })
        .collect();

    let overlapping: Vec<_> = pauses
        .iter()
        .filter(|p| p.start_sec < 25.0 && p.end_sec > 24.0)
        .collect();
    assert_eq!(overlapping.len(), 1);
    assert_eq!(overlapping[0].start_sec, 24.1);
    assert_eq!(overlapping[0].end_sec, 24.9);
    assert_eq!(
        serde_json::to_value(overlapping[0].source).unwrap(),
        "vad"
    );
}

#[test]
fn abstained_metrics_stay_visible_in_the_report() {
    let features = RawFeatures {
        // Words but no pitch: intonation abstains while others score.
        words: talk_features().words,
        duration_sec: 120.0,
        ..Default::default()
    };
    let analyzer = Analyzer::new(
        Arc::new(MockExtractor::new().with_features(features)),
        &Config::default(),
    );
    let report = analyzer
        .run(&AnalysisRequest::for_audio("talk.json"))
        .unwrap();

    let intonation = &report.metrics["intonation"];
    assert!(intonation.abstained);
    assert_eq!(intonation.score_0_100, None);
    assert_eq!(intonation.label, "abstained");

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["metrics"]["intonation"]["abstained"], true);
    assert_eq!(
        value["metrics"]["intonation"]["score_0_100"],
        serde_json::Value::Null
    );

    // The abstained metric contributes zero weight, not a zero score.
    assert!(report.overall_score.score_0_100.is_some());
}

#[test]
fn fallback_pitch_range_is_marked_estimated_on_the_wire() {
    let mut features = talk_features();
    features.raw_pitch_hz = None;
    let analyzer = Analyzer::new(
        Arc::new(MockExtractor::new().with_features(features)),
        &Config::default(),
    );
    let report = analyzer
        .run(&AnalysisRequest::for_audio("talk.json"))
        .unwrap();
    let value = serde_json::to_value(&report).unwrap();
    let details = &value["metrics"]["intonation"]["details"];
    assert_eq!(details["range_is_exact"], false);
    assert_eq!(details["pitch_range_hz"], 104.0); // 4 x std (26 Hz)
}
