//! podium - Offline analysis of recorded presentations
//!
//! Turns word timings, voice-activity segments, and pitch/energy statistics
//! into calibrated, confidence-scored delivery metrics with a timeline of
//! notable events.

// Enforce error handling discipline in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod features;
pub mod jobs;
pub mod logging;

// Core seams (extract → score → report)
pub use analysis::metric::{MetricOutcome, MetricScorer};
pub use analysis::pipeline::{AnalysisRequest, Analyzer};
pub use analysis::types::{MetricResult, Report, TimelineEntry};
pub use features::{
    FeatureExtractor, JsonFeatureExtractor, MockExtractor, RawFeatures, WavEnergyExtractor,
};

// Job lifecycle
pub use jobs::{JobManager, JobStatus};

// Error handling
pub use error::{PodiumError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
