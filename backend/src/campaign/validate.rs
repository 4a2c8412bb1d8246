use common::model::attachment::AttachmentDescriptor;
use common::model::contact::ContactRow;
use common::requests::SendCampaignPayload;
use serde::Serialize;

/// Outcome of the pre-flight check. `ok` is false exactly when `errors` is
/// non-empty; warnings never block a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn validate(
    campaign_name: &str,
    subject: &str,
    body: &str,
    contacts: &[ContactRow],
    recipient_header: &str,
    attachments: &[AttachmentDescriptor],
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if campaign_name.trim().is_empty() {
        warnings.push("Campaign name is required.".to_string());
    }
    if subject.trim().is_empty() {
        errors.push("Subject is required.".to_string());
    }
    if body.trim().is_empty() {
        warnings.push("Email body is required.".to_string());
    }
    if contacts.is_empty() {
        errors.push("At least one contact is required.".to_string());
    }
    if recipient_header.trim().is_empty() {
        errors.push("Select the column with headers columns.".to_string());
    }
    if attachments.is_empty() {
        warnings.push("No files attached.".to_string());
    }

    ValidationReport {
        ok: errors.is_empty(),
        errors,
        warnings,
    }
}

pub fn validate_payload(payload: &SendCampaignPayload) -> ValidationReport {
    validate(
        &payload.campaign_name,
        &payload.subject,
        &payload.html_output,
        &payload.contacts,
        &payload.recipient_header,
        &payload.attachments,
    )
}
