//! Job records and their lifecycle state machine.
//!
//! A job is created `Queued`, moves to `Processing` when its worker picks it
//! up, and ends `Done` or `Failed`. No transition skips a state and terminal
//! states are never left; a terminal job can only be deleted and resubmitted
//! as a new job.

pub mod manager;

pub use manager::JobManager;

use crate::analysis::pipeline::AnalysisRequest;
use crate::analysis::types::Report;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Legal state-machine edges: queued -> processing -> done | failed.
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Done)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preserved description of why a job failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub code: String,
    pub message: String,
}

/// One submission and everything the pipeline produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub input: AnalysisRequest,
    pub report: Option<Report>,
    pub failure: Option<JobFailure>,
}

impl Job {
    pub(crate) fn new(job_id: String, input: AnalysisRequest) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            input,
            report: None,
            failure: None,
        }
    }

    /// Guarded state transition; rejects skips and terminal re-entry.
    pub(crate) fn transition(&mut self, to: JobStatus) -> crate::error::Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(crate::error::PodiumError::InvalidTransition {
                job_id: self.job_id.clone(),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Read-only status subset answered by status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub failure: Option<JobFailure>,
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status,
            created_at: job.created_at,
            updated_at: job.updated_at,
            failure: job.failure.clone(),
        }
    }
}

/// Lifecycle notifications streamed to interested callers.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Queued { job_id: String },
    Started { job_id: String },
    Finished { job_id: String, status: JobStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions_only() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Done));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));

        // No skipping.
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Failed));

        // No leaving terminal states.
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Done));

        // No going backwards.
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Queued));
    }

    #[test]
    fn terminal_states_are_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn job_transition_rejects_illegal_edge() {
        let mut job = Job::new("talk_test123".to_string(), AnalysisRequest::default());
        assert!(job.transition(JobStatus::Done).is_err());
        assert_eq!(job.status, JobStatus::Queued);

        job.transition(JobStatus::Processing).unwrap();
        job.transition(JobStatus::Done).unwrap();
        let err = job.transition(JobStatus::Processing).unwrap_err();
        assert!(err.to_string().contains("done -> processing"));
    }

    #[test]
    fn transition_touches_updated_at() {
        let mut job = Job::new("talk_test123".to_string(), AnalysisRequest::default());
        let created = job.updated_at;
        job.transition(JobStatus::Processing).unwrap();
        assert!(job.updated_at >= created);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(JobStatus::Queued).unwrap(), "queued");
        assert_eq!(
            serde_json::to_value(JobStatus::Processing).unwrap(),
            "processing"
        );
    }
}
