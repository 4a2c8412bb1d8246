//! Fixtures shared by the campaign route tests.

use crate::campaign::transport::MailTransport;
use crate::services::campaign::{history, CampaignContext};
use chrono::{DateTime, Duration, Utc};
use common::model::attachment::{AttachmentMode, CampaignAttachment, CampaignAttachmentRule};
use common::model::campaign::CampaignRecord;
use std::sync::Arc;
use tempfile::TempDir;

/// Context rooted in `dir`, with an initialised history database.
pub(crate) fn context(dir: &TempDir, transport: Option<Arc<dyn MailTransport>>) -> CampaignContext {
    let context = CampaignContext {
        transport,
        sender: "news@example.com".to_string(),
        log_root: dir.path().join("logs"),
        db_path: dir.path().join("kampaign.sqlite"),
    };
    let conn = history::open(&context.db_path).unwrap();
    history::init_schema(&conn).unwrap();
    context
}

pub(crate) fn millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

pub(crate) fn record(id: &str, created_at: DateTime<Utc>) -> CampaignRecord {
    CampaignRecord {
        id: id.to_string(),
        slug: format!("launch-{}", id),
        name: "Launch".to_string(),
        subject: "Hello {name}".to_string(),
        sender_email: Some("news@example.com".to_string()),
        total_recipients: 3,
        sent_count: 2,
        failed_count: 1,
        log_file: format!("logs/campaigns/launch-{}.log", id),
        created_at,
        completed_at: created_at + Duration::seconds(5),
        html_output: Some("<p>Hi {name}</p>".to_string()),
        attachments: vec![CampaignAttachment {
            id: "a1".to_string(),
            file_name: "terms.pdf".to_string(),
            bytes: 1024,
            kind: AttachmentMode::Broadcast,
            rule: None,
        }],
        attachment_rules: vec![CampaignAttachmentRule {
            id: "r1".to_string(),
            rule: "invoice_{id}.pdf".to_string(),
        }],
    }
}

pub(crate) fn save(context: &CampaignContext, record: &CampaignRecord) {
    let conn = history::open(&context.db_path).unwrap();
    history::save(&conn, record).unwrap();
}
