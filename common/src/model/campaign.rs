use crate::model::attachment::{CampaignAttachment, CampaignAttachmentRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate result of one dispatch, returned to the caller once every
/// contact has been processed.
///
/// `sent_count + failed_count` always equals the number of contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDispatchResult {
    pub campaign_id: String,
    pub campaign_slug: String,
    pub sent_count: usize,
    pub failed_count: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
    /// Where the per-recipient JSONL log for this dispatch lives.
    pub log_location: String,
}

/// A finished campaign as kept in the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    pub total_recipients: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub log_file: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_output: Option<String>,
    #[serde(default)]
    pub attachments: Vec<CampaignAttachment>,
    #[serde(default)]
    pub attachment_rules: Vec<CampaignAttachmentRule>,
}
