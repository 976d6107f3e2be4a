//! Shared contract for metric scorers.
//!
//! Every scorer is a deterministic, side-effect-free function from extracted
//! features to a tagged outcome. "Not enough signal" is the `Abstained`
//! outcome, never an error; `Failed` is reserved for malformed input a
//! well-behaved front end should never produce.

use crate::analysis::fillers::FillerScorer;
use crate::analysis::intonation::IntonationScorer;
use crate::analysis::pace::PaceScorer;
use crate::analysis::pauses::PauseQualityScorer;
use crate::analysis::structure::StructureScorer;
use crate::analysis::types::{MetricResult, TimelineEntry};
use crate::config::AnalysisConfig;
use crate::features::RawFeatures;

/// Outcome of one scorer invocation.
#[derive(Debug, Clone)]
pub enum MetricOutcome {
    /// A real score, plus any timeline entries the scorer contributes.
    Scored {
        result: MetricResult,
        timeline: Vec<TimelineEntry>,
    },
    /// The scorer's own preconditions were unmet.
    Abstained { reason: String },
    /// The scorer hit malformed input (programmer error upstream).
    Failed { message: String },
}

impl MetricOutcome {
    pub fn scored(result: MetricResult) -> Self {
        MetricOutcome::Scored {
            result,
            timeline: Vec::new(),
        }
    }

    pub fn scored_with_timeline(result: MetricResult, timeline: Vec<TimelineEntry>) -> Self {
        MetricOutcome::Scored { result, timeline }
    }

    pub fn abstained(reason: impl Into<String>) -> Self {
        MetricOutcome::Abstained {
            reason: reason.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        MetricOutcome::Failed {
            message: message.into(),
        }
    }

    /// Collapse the outcome into the uniform result representation.
    ///
    /// Abstentions and failures both surface as abstained metric results; a
    /// failure's reason records that the scorer broke rather than declined.
    pub fn into_parts(self) -> (MetricResult, Vec<TimelineEntry>) {
        match self {
            MetricOutcome::Scored { result, timeline } => (result, timeline),
            MetricOutcome::Abstained { reason } => (MetricResult::abstained(reason), Vec::new()),
            MetricOutcome::Failed { message } => (
                MetricResult::abstained(format!("metric_computation_failed: {message}")),
                Vec::new(),
            ),
        }
    }
}

/// A deterministic, side-effect-free metric scorer.
pub trait MetricScorer: Send + Sync {
    /// Metric name as it appears in requests and the report.
    fn name(&self) -> &'static str;

    /// Score one recording's features.
    fn score(&self, features: &RawFeatures) -> MetricOutcome;
}

/// Build the full scorer set from analysis configuration.
pub fn builtin_scorers(config: &AnalysisConfig) -> Vec<Box<dyn MetricScorer>> {
    vec![
        Box::new(PaceScorer::new(config)),
        Box::new(PauseQualityScorer::new(config)),
        Box::new(FillerScorer::new(config)),
        Box::new(IntonationScorer::new(config)),
        Box::new(StructureScorer::new()),
    ]
}
