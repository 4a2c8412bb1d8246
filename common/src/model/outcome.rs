use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of delivering one message.
///
/// Both variants carry the attachment names that went out with the message;
/// only the failure carries an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent { attachments: Vec<String> },
    Failed { attachments: Vec<String>, error: String },
}

impl Outcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent { .. })
    }

    pub fn status(&self) -> DeliveryStatus {
        match self {
            Outcome::Sent { .. } => DeliveryStatus::Sent,
            Outcome::Failed { .. } => DeliveryStatus::Failed,
        }
    }

    pub fn attachments(&self) -> &[String] {
        match self {
            Outcome::Sent { attachments } | Outcome::Failed { attachments, .. } => attachments,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Sent { .. } => None,
            Outcome::Failed { error, .. } => Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// One entry per contact per dispatch. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub recipient: String,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

/// One line of a campaign's JSONL delivery log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientLogEntry {
    pub campaign_id: String,
    pub campaign_slug: String,
    pub recipient: String,
    pub status: DeliveryStatus,
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl RecipientLogEntry {
    pub fn new(campaign_id: &str, campaign_slug: &str, outcome: &RecipientOutcome) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            campaign_slug: campaign_slug.to_string(),
            recipient: outcome.recipient.clone(),
            status: outcome.outcome.status(),
            attachments: outcome.outcome.attachments().to_vec(),
            error: outcome.outcome.error().map(str::to_string),
            timestamp: outcome.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn failed_entry_carries_error_and_millisecond_timestamp() {
        let outcome = RecipientOutcome {
            recipient: "b@x.com".to_string(),
            outcome: Outcome::Failed {
                attachments: vec!["brochure.pdf".to_string()],
                error: "connection refused".to_string(),
            },
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        };

        let line = serde_json::to_value(RecipientLogEntry::new("id-1", "launch-1a2b3c4d", &outcome))
            .unwrap();

        assert_eq!(
            line,
            serde_json::json!({
                "campaignId": "id-1",
                "campaignSlug": "launch-1a2b3c4d",
                "recipient": "b@x.com",
                "status": "failed",
                "attachments": ["brochure.pdf"],
                "error": "connection refused",
                "timestamp": 1_700_000_000_123_i64,
            })
        );
    }

    #[test]
    fn sent_entry_omits_error() {
        let outcome = RecipientOutcome {
            recipient: "a@x.com".to_string(),
            outcome: Outcome::Sent {
                attachments: Vec::new(),
            },
            timestamp: Utc::now(),
        };

        let line = serde_json::to_value(RecipientLogEntry::new("id-1", "slug", &outcome)).unwrap();

        assert_eq!(line["status"], "sent");
        assert!(line.get("error").is_none());
    }
}
