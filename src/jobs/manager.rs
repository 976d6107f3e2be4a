//! In-memory job manager with one background worker per submission.

use crate::analysis::pipeline::{AnalysisRequest, Analyzer};
use crate::analysis::types::{Report, Transcript};
use crate::config::Config;
use crate::error::{PodiumError, Result};
use crate::features::FeatureExtractor;
use crate::jobs::{Job, JobEvent, JobStatus, JobStatusView};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the job store and schedules pipeline runs.
///
/// The store is a keyed map of independently locked records: state
/// transitions take the per-job lock, so jobs never contend with each other.
/// Exactly one worker is spawned per submission, which is the only writer of
/// that job's status.
pub struct JobManager {
    analyzer: Arc<Analyzer>,
    jobs: Arc<Mutex<HashMap<String, Arc<Mutex<Job>>>>>,
    event_tx: Option<crossbeam_channel::Sender<JobEvent>>,
    id_prefix: String,
}

impl JobManager {
    /// Creates a manager running the built-in scorer set.
    pub fn new(extractor: Arc<dyn FeatureExtractor>, config: &Config) -> Self {
        Self::with_analyzer(Analyzer::new(extractor, config), config)
    }

    /// Creates a manager around a custom-built analyzer.
    pub fn with_analyzer(analyzer: Analyzer, config: &Config) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            event_tx: None,
            id_prefix: config.jobs.id_prefix.clone(),
        }
    }

    /// Sets a lifecycle-event sender (crossbeam, non-blocking).
    pub fn with_event_sender(mut self, tx: crossbeam_channel::Sender<JobEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit(&self, event: JobEvent) {
        if let Some(tx) = &self.event_tx
            && tx.send(event).is_err()
        {
            tracing::debug!("job event receiver dropped");
        }
    }

    fn new_job_id(&self) -> String {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_{}", self.id_prefix, &hex[..10])
    }

    /// Validates a submission, creates a `Queued` job, and schedules it.
    ///
    /// Invalid submissions are rejected here; no job record is created.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<String> {
        request.validate()?;

        let job_id = self.new_job_id();
        let job = Arc::new(Mutex::new(Job::new(job_id.clone(), request.clone())));

        self.jobs.lock().await.insert(job_id.clone(), job.clone());
        tracing::info!(job_id = %job_id, "created job, status=queued");
        self.emit(JobEvent::Queued {
            job_id: job_id.clone(),
        });

        let analyzer = self.analyzer.clone();
        let event_tx = self.event_tx.clone();
        let worker_id = job_id.clone();
        tokio::spawn(async move {
            process_job(job, analyzer, event_tx, worker_id, request).await;
        });

        Ok(job_id)
    }

    /// Pure read of the job's current state. Never blocks on completion.
    pub async fn status(&self, job_id: &str) -> Option<JobStatusView> {
        let job = self.jobs.lock().await.get(job_id).cloned()?;
        let guard = job.lock().await;
        Some(JobStatusView::from(&*guard))
    }

    /// The full report; only valid once the job is `Done`.
    pub async fn full_report(&self, job_id: &str) -> Result<Report> {
        let job = self
            .jobs
            .lock()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| PodiumError::JobNotFound {
                job_id: job_id.to_string(),
            })?;
        let guard = job.lock().await;
        match (&guard.status, &guard.report) {
            (JobStatus::Done, Some(report)) => Ok(report.clone()),
            _ => Err(PodiumError::JobNotDone {
                job_id: job_id.to_string(),
                status: guard.status.to_string(),
            }),
        }
    }

    /// The transcript block of a `Done` job.
    pub async fn transcript(&self, job_id: &str) -> Result<Transcript> {
        self.full_report(job_id).await.map(|r| r.transcript)
    }

    /// Removes the record. Does not preempt a running worker; callers must
    /// not assume immediate resource reclamation.
    pub async fn delete(&self, job_id: &str) -> bool {
        let removed = self.jobs.lock().await.remove(job_id).is_some();
        if removed {
            tracing::info!(job_id = %job_id, "deleted job");
        }
        removed
    }

    /// All known job ids.
    pub async fn list(&self) -> Vec<String> {
        self.jobs.lock().await.keys().cloned().collect()
    }
}

/// One job's worker: processing transition, pipeline run, terminal record.
async fn process_job(
    job: Arc<Mutex<Job>>,
    analyzer: Arc<Analyzer>,
    event_tx: Option<crossbeam_channel::Sender<JobEvent>>,
    job_id: String,
    request: AnalysisRequest,
) {
    {
        let mut guard = job.lock().await;
        if let Err(e) = guard.transition(JobStatus::Processing) {
            tracing::error!(job_id = %job_id, error = %e, "refusing to start worker");
            return;
        }
    }
    tracing::info!(job_id = %job_id, "job started processing");
    if let Some(tx) = &event_tx
        && tx
            .send(JobEvent::Started {
                job_id: job_id.clone(),
            })
            .is_err()
    {
        tracing::debug!("job event receiver dropped");
    }

    // The pipeline is CPU-bound; keep it off the async workers.
    let run_result = tokio::task::spawn_blocking(move || analyzer.run(&request)).await;

    let outcome = match run_result {
        Ok(result) => result,
        Err(join_error) => Err(PodiumError::Other(format!(
            "analysis worker panicked: {join_error}"
        ))),
    };

    let final_status;
    {
        let mut guard = job.lock().await;
        match outcome {
            Ok(report) => {
                if let Err(e) = guard.transition(JobStatus::Done) {
                    tracing::error!(job_id = %job_id, error = %e, "cannot finish job");
                    return;
                }
                guard.report = Some(report);
                tracing::info!(job_id = %job_id, "job completed successfully");
            }
            Err(error) => {
                if let Err(e) = guard.transition(JobStatus::Failed) {
                    tracing::error!(job_id = %job_id, error = %e, "cannot fail job");
                    return;
                }
                tracing::error!(job_id = %job_id, error = %error, "job failed");
                guard.failure = Some(crate::jobs::JobFailure {
                    code: "analysis_error".to_string(),
                    message: error.to_string(),
                });
            }
        }
        final_status = guard.status;
    }

    if let Some(tx) = &event_tx
        && tx
            .send(JobEvent::Finished {
                job_id,
                status: final_status,
            })
            .is_err()
    {
        tracing::debug!("job event receiver dropped");
    }
}
