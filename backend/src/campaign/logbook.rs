//! Per-campaign delivery log.
//!
//! Outcomes are appended as JSON lines to `<log_root>/<slug>.log`, one line
//! per recipient, in the order contacts were processed. The file is created on
//! the first append and never rewritten.

use crate::campaign::record::CampaignIdentity;
use crate::job_controller::state::JobReporter;
use async_trait::async_trait;
use common::jobs::JobStatus;
use common::model::outcome::{RecipientLogEntry, RecipientOutcome};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum LogbookError {
    #[error("failed to write campaign log: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode campaign log entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives each outcome as soon as the dispatch loop produces it.
#[async_trait]
pub trait OutcomeSink: Send {
    /// `position` is the zero-based index of the contact, `total` the number
    /// of contacts in the campaign.
    async fn record(
        &mut self,
        position: usize,
        total: usize,
        outcome: &RecipientOutcome,
    ) -> Result<(), LogbookError>;
}

#[async_trait]
impl OutcomeSink for Vec<RecipientOutcome> {
    async fn record(
        &mut self,
        _position: usize,
        _total: usize,
        outcome: &RecipientOutcome,
    ) -> Result<(), LogbookError> {
        self.push(outcome.clone());
        Ok(())
    }
}

/// Append-only JSONL writer for one campaign.
pub struct JsonlLog {
    path: PathBuf,
    campaign_id: String,
    campaign_slug: String,
    file: Option<File>,
}

impl JsonlLog {
    pub fn new(identity: &CampaignIdentity) -> Self {
        Self {
            path: identity.log_location.clone(),
            campaign_id: identity.id.clone(),
            campaign_slug: identity.slug.clone(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&mut self, outcome: &RecipientOutcome) -> Result<(), LogbookError> {
        let entry = RecipientLogEntry::new(&self.campaign_id, &self.campaign_slug, outcome);
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let file = match self.file.take() {
            Some(file) => file,
            None => self.open().await?,
        };
        let file = self.file.insert(file);
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn open(&self) -> Result<File, LogbookError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        Ok(file)
    }
}

#[async_trait]
impl OutcomeSink for JsonlLog {
    async fn record(
        &mut self,
        _position: usize,
        _total: usize,
        outcome: &RecipientOutcome,
    ) -> Result<(), LogbookError> {
        self.append(outcome).await
    }
}

/// Reads back every entry of a campaign log.
pub async fn read_entries(path: &Path) -> Result<Vec<RecipientLogEntry>, LogbookError> {
    let raw = fs::read_to_string(path).await?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(LogbookError::from))
        .collect()
}

/// The sink used by the send route: JSONL log plus job progress.
pub struct CampaignSink {
    log: JsonlLog,
    progress: JobReporter,
}

impl CampaignSink {
    pub fn new(log: JsonlLog, progress: JobReporter) -> Self {
        Self { log, progress }
    }
}

#[async_trait]
impl OutcomeSink for CampaignSink {
    async fn record(
        &mut self,
        position: usize,
        total: usize,
        outcome: &RecipientOutcome,
    ) -> Result<(), LogbookError> {
        let logged = self.log.append(outcome).await;
        let percent = if total > 0 {
            ((position + 1) as f32 / total as f32 * 100.0) as u32
        } else {
            0
        };
        self.progress.report(JobStatus::InProgress(percent)).await;
        logged
    }
}
