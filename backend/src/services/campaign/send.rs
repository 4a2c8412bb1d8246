//! # Campaign Send Service
//!
//! `POST /api/campaign/send` takes a multipart body with:
//!
//! - a `payload` part holding the JSON `SendCampaignPayload`;
//! - any number of `attachments` parts, one per uploaded file, whose filename
//!   is the `fileName` of the matching descriptor.
//!
//! Files are streamed into a `StagedFiles` directory while the body is read.
//! The request is then checked in this order, and nothing is sent if any
//! check fails:
//!
//! 1. the payload is present and well formed (`400`);
//! 2. a mail transport is configured (`400 SMTP NOT CONFIGURED!`);
//! 3. the recipient column is one of the sheet `headers`, when given (`400`);
//! 4. the validation gate reports no errors (`422`).
//!
//! The send loop runs inside the request. Its progress is published to
//! `JobsState` under the campaign id so `GET /api/campaign/status/{id}` can be
//! polled meanwhile. Once the loop finishes the staged files are deleted, the
//! campaign is saved to the history store, its job entry is evicted and the
//! `CampaignDispatchResult` is returned.

use crate::campaign::attachments::{AttachmentPlan, StagedFiles};
use crate::campaign::dispatch::{dispatch, DispatchRequest, DispatchSummary};
use crate::campaign::logbook::{CampaignSink, JsonlLog};
use crate::campaign::record::CampaignIdentity;
use crate::campaign::render::render;
use crate::campaign::transport::MailTransport;
use crate::campaign::validate::validate_payload;
use crate::error::CampaignError;
use crate::job_controller::state::JobsState;
use crate::services::campaign::{history, CampaignContext};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::jobs::JobStatus;
use common::model::attachment::{AttachmentMode, CampaignAttachment, CampaignAttachmentRule};
use common::model::campaign::{CampaignDispatchResult, CampaignRecord};
use common::requests::SendCampaignPayload;
use futures_util::StreamExt;
use log::{error, info, warn};
use serde_json::json;
use std::io::Write;

pub(crate) async fn process(
    context: web::Data<CampaignContext>,
    jobs: web::Data<JobsState>,
    payload: Multipart,
) -> Result<HttpResponse, CampaignError> {
    let (payload, staged) = read_upload(payload).await?;

    let transport = context
        .transport
        .clone()
        .ok_or(CampaignError::NotConfigured)?;
    check_recipient_header(&payload)?;

    let report = validate_payload(&payload);
    if !report.ok {
        return Err(CampaignError::Validation(report));
    }

    let result = run_campaign(&context, &jobs, transport.as_ref(), &payload, staged).await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "result": result,
        "warnings": report.warnings,
    })))
}

/// Reads the multipart body: the JSON payload plus every uploaded file.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(SendCampaignPayload, StagedFiles), CampaignError> {
    let mut payload: Option<SendCampaignPayload> = None;
    let mut staged = StagedFiles::new()?;

    while let Some(item) = multipart.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("payload") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                let parsed = serde_json::from_slice(&bytes)
                    .map_err(|e| CampaignError::MalformedInput(e.to_string()))?;
                payload = Some(parsed);
            }
            Some("attachments") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();

                let mut writer = staged.create(&filename)?;
                while let Some(chunk) = field.next().await {
                    writer.write_all(&chunk?)?;
                }
                writer.flush()?;
            }
            _ => {
                // Unknown parts are drained and ignored.
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
            }
        }
    }

    let payload = payload
        .ok_or_else(|| CampaignError::MalformedInput("missing `payload` field".to_string()))?;
    Ok((payload, staged))
}

fn check_recipient_header(payload: &SendCampaignPayload) -> Result<(), CampaignError> {
    let header = payload.recipient_header.trim();
    if payload.headers.is_empty() || header.is_empty() {
        return Ok(());
    }
    if payload.headers.iter().any(|h| h == header) {
        Ok(())
    } else {
        Err(CampaignError::MalformedInput(format!(
            "recipient column {:?} is not one of the sheet headers",
            header
        )))
    }
}

async fn run_campaign(
    context: &CampaignContext,
    jobs: &JobsState,
    transport: &dyn MailTransport,
    payload: &SendCampaignPayload,
    staged: StagedFiles,
) -> CampaignDispatchResult {
    let identity = CampaignIdentity::new(
        &payload.campaign_name,
        &payload.contacts,
        Utc::now(),
        &context.log_root,
    );
    let reporter = jobs.register(&identity.id).await;
    info!(
        "Campaign {} ({}) started: {} recipients, {} staged files",
        identity.slug,
        identity.id,
        identity.total_recipients,
        staged.len()
    );

    let plan = AttachmentPlan::new(
        &payload.attachments,
        payload.custom_attachments_enabled,
        &payload.rules,
    );
    let request = DispatchRequest {
        contacts: &payload.contacts,
        subject: &payload.subject,
        body: &payload.html_output,
        recipient_header: payload.recipient_header.trim(),
        sender: &context.sender,
        attachments: &plan,
    };
    let mut sink = CampaignSink::new(JsonlLog::new(&identity), reporter.clone());
    let outcomes = dispatch(&request, &staged, transport, &mut sink).await;

    let attachments = attachment_metadata(payload, &staged);
    if let Err(e) = staged.release() {
        warn!("Could not delete staged files of {}: {}", identity.slug, e);
    }

    let result = identity.finalize(DispatchSummary::from_outcomes(&outcomes), Utc::now());
    reporter
        .report(JobStatus::completed(result.sent_count, result.failed_count))
        .await;
    info!(
        "Campaign {} finished: {} sent, {} failed",
        identity.slug, result.sent_count, result.failed_count
    );

    let record = CampaignRecord {
        id: identity.id.clone(),
        slug: identity.slug.clone(),
        name: identity.name.clone(),
        subject: payload.subject.clone(),
        sender_email: Some(context.sender.clone()),
        total_recipients: identity.total_recipients,
        sent_count: result.sent_count,
        failed_count: result.failed_count,
        log_file: result.log_location.clone(),
        created_at: identity.started_at,
        completed_at: result.completed_at,
        html_output: Some(payload.html_output.clone()),
        attachments,
        attachment_rules: payload.rules.iter().map(CampaignAttachmentRule::from).collect(),
    };
    match history::open(&context.db_path).and_then(|conn| history::save(&conn, &record)) {
        // From here on the status route answers from the history store.
        Ok(()) => reporter.evict().await,
        Err(e) => error!("Failed to save campaign {} to history: {}", record.id, e),
    }

    result
}

/// Sizes are read from the staged copies, so this must run before they are
/// released. A personalized file is tagged with the first rule that resolved
/// to it for some contact.
fn attachment_metadata(
    payload: &SendCampaignPayload,
    staged: &StagedFiles,
) -> Vec<CampaignAttachment> {
    payload
        .attachments
        .iter()
        .map(|a| {
            let rule = match a.mode {
                AttachmentMode::Broadcast => None,
                AttachmentMode::Personalized => payload
                    .rules
                    .iter()
                    .find(|r| {
                        payload
                            .contacts
                            .iter()
                            .any(|c| render(&r.pattern, c) == a.file_name)
                    })
                    .map(|r| r.pattern.clone()),
            };
            CampaignAttachment {
                id: a.id.clone(),
                file_name: a.file_name.clone(),
                bytes: staged.size(&a.file_name).unwrap_or(0),
                kind: a.mode,
                rule,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::logbook::read_entries;
    use crate::campaign::transport::LogTransport;
    use crate::job_controller::state::start_job_updater;
    use crate::services::campaign::test_support::context;
    use crate::services::campaign::{configure_history_routes, configure_routes};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use common::model::outcome::DeliveryStatus;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::path::Path;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const BOUNDARY: &str = "kampaign-test-boundary";

    fn multipart_body(payload: &Value, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"payload\"\r\n\
                 Content-Type: application/json\r\n\r\n{payload}\r\n"
            )
            .as_bytes(),
        );
        for (name, content) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"attachments\"; \
                     filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn launch_payload() -> Value {
        json!({
            "campaignName": "Q1 Launch",
            "subject": "Hello {name}",
            "htmlOutput": "<p>Hi {name}, see attached.</p>",
            "headers": ["name", "email", "id"],
            "recipientHeader": "email",
            "contacts": [
                { "name": "Ada", "email": "ada@example.com", "id": "42" },
                { "name": "Bob", "email": "bob@example.com", "id": "99" }
            ],
            "attachments": [
                { "id": "a1", "fileName": "terms.pdf", "mode": "broadcast" },
                { "id": "a2", "fileName": "invoice_42.pdf", "mode": "personalized" }
            ],
            "customAttachmentsEnabled": true,
            "rules": [ { "id": "r1", "pattern": "invoice_{id}.pdf" } ]
        })
    }

    async fn post_send(context: CampaignContext, body: Vec<u8>) -> (StatusCode, Value) {
        let (tx, rx) = mpsc::channel(64);
        let jobs = JobsState::new(tx);
        actix_web::rt::spawn(start_job_updater(jobs.clone(), rx));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jobs))
                .app_data(web::Data::new(context))
                .service(configure_routes())
                .service(configure_history_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/campaign/send")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn dry_run_send_logs_and_records_every_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, Some(Arc::new(LogTransport)));
        let db_path = ctx.db_path.clone();
        let body = multipart_body(
            &launch_payload(),
            &[
                ("terms.pdf", &b"%PDF terms"[..]),
                ("invoice_42.pdf", &b"%PDF invoice"[..]),
            ],
        );

        let (status, body) = post_send(ctx, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        let result: CampaignDispatchResult =
            serde_json::from_value(body["result"].clone()).unwrap();
        assert_eq!((result.sent_count, result.failed_count), (2, 0));
        assert!(result.campaign_slug.starts_with("q1-launch-"));

        let entries = read_entries(Path::new(&result.log_location)).await.unwrap();
        let recipients: Vec<&str> = entries.iter().map(|e| e.recipient.as_str()).collect();
        assert_eq!(recipients, vec!["ada@example.com", "bob@example.com"]);
        assert!(entries.iter().all(|e| e.status == DeliveryStatus::Sent));
        assert_eq!(entries[0].attachments, vec!["terms.pdf", "invoice_42.pdf"]);
        assert_eq!(entries[1].attachments, vec!["terms.pdf"]);

        let conn = history::open(&db_path).unwrap();
        let record = history::get(&conn, &result.campaign_id).unwrap().unwrap();
        assert_eq!(record.total_recipients, 2);
        assert_eq!(record.attachments[0].bytes, 10);
        assert_eq!(record.attachments[1].rule.as_deref(), Some("invoice_{id}.pdf"));
        assert_eq!(record.attachment_rules.len(), 1);
    }

    #[actix_web::test]
    async fn send_without_transport_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, None);

        let (status, body) = post_send(ctx, multipart_body(&launch_payload(), &[])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("SMTP NOT CONFIGURED!"));
    }

    #[actix_web::test]
    async fn payload_without_subject_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, Some(Arc::new(LogTransport)));
        let mut payload = launch_payload();
        payload.as_object_mut().unwrap().remove("subject");

        let (status, body) = post_send(ctx, multipart_body(&payload, &[])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid payload"));
    }

    #[actix_web::test]
    async fn recipient_column_must_be_a_sheet_header() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, Some(Arc::new(LogTransport)));
        let mut payload = launch_payload();
        payload["recipientHeader"] = json!("mail");

        let (status, _) = post_send(ctx, multipart_body(&payload, &[])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn validation_errors_are_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, Some(Arc::new(LogTransport)));
        let mut payload = launch_payload();
        payload["contacts"] = json!([]);

        let (status, body) = post_send(ctx, multipart_body(&payload, &[])).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"], json!(["At least one contact is required."]));
    }

    #[actix_web::test]
    async fn recipient_header_check_skips_missing_headers() {
        let payload: SendCampaignPayload = serde_json::from_value(json!({
            "subject": "s",
            "htmlOutput": "b",
            "recipientHeader": "email",
            "contacts": []
        }))
        .unwrap();
        assert!(check_recipient_header(&payload).is_ok());
    }
}
