//! Error types for podium.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PodiumError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Submission / validation errors
    #[error("Invalid submission: {message}")]
    InvalidInput { message: String },

    // Acoustic front-end errors
    #[error("Feature extraction failed: {message}")]
    FeatureExtraction { message: String },

    #[error("Audio file not found at {path}")]
    AudioFileNotFound { path: String },

    // Job lifecycle errors
    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String },

    #[error("Job {job_id} is not done yet (status: {status})")]
    JobNotDone { job_id: String, status: String },

    #[error("Invalid job transition for {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PodiumError>;
