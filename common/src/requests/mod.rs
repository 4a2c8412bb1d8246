use crate::model::attachment::{AttachmentDescriptor, AttachmentRule};
use crate::model::contact::ContactRow;
use serde::Deserialize;

/// The `payload` part of `POST /api/campaign/send`, also accepted as JSON by
/// `POST /api/campaign/validate`.
///
/// `subject`, `htmlOutput` and `contacts` are required; a payload without them
/// is rejected before anything else happens.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCampaignPayload {
    #[serde(default)]
    pub campaign_name: String,
    pub subject: String,
    pub html_output: String,
    pub contacts: Vec<ContactRow>,
    /// Headers of the imported sheet. Optional; when present the recipient
    /// header must be one of them.
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub recipient_header: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentDescriptor>,
    #[serde(default)]
    pub custom_attachments_enabled: bool,
    #[serde(default)]
    pub rules: Vec<AttachmentRule>,
}

/// Body of `POST /api/campaign/preview`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html_output: String,
    #[serde(default)]
    pub contact: Option<ContactRow>,
}
