//! Tracks the progress of campaign dispatches.
//!
//! A dispatch runs for as long as it takes to reach every contact, so its
//! progress is published here and can be polled through
//! `GET /api/campaign/status/{campaign_id}` while the send request is still
//! in flight.
//!
//! The main components are:
//! - `JobsState`: A clonable, thread-safe struct holding the status of every job.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: A message carrying a status change for one job, or its
//!   eviction.
//! - `JobReporter`: The handle a running dispatch uses to publish its own updates.
//! - `start_job_updater`: A long-running task that applies `JobUpdate` messages
//!   to the shared map.
//!
//! A finished dispatch evicts its entry once the campaign is in the history
//! store, so the map only holds dispatches that are still running.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Job id (the campaign id) to its latest status.
    ///
    /// Read by the status endpoint, written only by `start_job_updater` and
    /// by `register`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender side of the update channel consumed by `start_job_updater`.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    /// Registers `job_id` as `Pending` and returns the handle used to report
    /// its progress.
    pub async fn register(&self, job_id: &str) -> JobReporter {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
        JobReporter {
            job_id: job_id.to_string(),
            tx: self.tx.clone(),
        }
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// Represents a status update for a specific job. `None` removes the job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: Option<JobStatus>,
}

/// Publishes status updates for one job.
#[derive(Clone, Debug)]
pub struct JobReporter {
    job_id: String,
    tx: mpsc::Sender<JobUpdate>,
}

impl JobReporter {
    pub async fn report(&self, status: JobStatus) {
        self.send(Some(status)).await;
    }

    /// Drops the job from the shared map. Updates already queued are applied
    /// first.
    pub async fn evict(self) {
        self.send(None).await;
    }

    async fn send(&self, status: Option<JobStatus>) {
        // The updater only goes away on shutdown; a lost update is harmless then.
        let _ = self
            .tx
            .send(JobUpdate {
                job_id: self.job_id.clone(),
                status,
            })
            .await;
    }
}

/// Applies every `JobUpdate` received on `rx` to the shared state. Runs until
/// all senders are dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        match update.status {
            Some(status) => {
                jobs.insert(update.job_id, status);
            }
            None => {
                jobs.remove(&update.job_id);
            }
        }
    }
}
