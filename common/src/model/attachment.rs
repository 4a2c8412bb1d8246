use serde::{Deserialize, Serialize};

/// How an uploaded file reaches recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentMode {
    /// Sent unchanged to every recipient.
    Broadcast,
    /// Only reachable through an attachment rule.
    Personalized,
}

/// Metadata for one uploaded file, as sent by the client alongside the file
/// itself. The content travels in the multipart body under the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    pub id: String,
    pub file_name: String,
    pub mode: AttachmentMode,
}

/// Per-recipient attachment rule. `pattern` is a template rendered against
/// each contact to obtain the file name to look for, e.g. `invoice_{id}.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRule {
    pub id: String,
    pub pattern: String,
}

/// Attachment metadata stored with a finished campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignAttachment {
    pub id: String,
    pub file_name: String,
    pub bytes: u64,
    #[serde(rename = "type")]
    pub kind: AttachmentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// Attachment rule as stored with a finished campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignAttachmentRule {
    pub id: String,
    pub rule: String,
}

impl From<&AttachmentRule> for CampaignAttachmentRule {
    fn from(rule: &AttachmentRule) -> Self {
        Self {
            id: rule.id.clone(),
            rule: rule.pattern.clone(),
        }
    }
}
