//! # Campaign History
//!
//! Finished campaigns are stored in the `campaigns` table of the SQLite
//! database at `KAMPAIGN_DB`. Attachment metadata and rules are kept as JSON
//! text columns; timestamps as epoch milliseconds.
//!
//! Routes:
//! - `GET /api/campaigns`: every record, newest first by `created_at`.
//! - `GET /api/campaigns/{campaign_id}`: one record, `404` when unknown.
//! - `GET /api/campaigns/{campaign_id}/log`: entries of the record's JSONL log,
//!   `404` when the record or its log file is missing, `500` when the log
//!   cannot be read or parsed.

use crate::campaign::logbook::{read_entries, LogbookError};
use crate::services::campaign::CampaignContext;
use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use common::model::campaign::CampaignRecord;
use log::error;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to encode campaign metadata: {0}")]
    Encode(#[from] serde_json::Error),
}

const SELECT_COLUMNS: &str = "SELECT id, slug, name, subject, sender_email, total_recipients, \
     sent_count, failed_count, log_file, created_at, completed_at, html_output, attachments, \
     attachment_rules FROM campaigns";

pub fn open(path: &Path) -> Result<Connection, HistoryError> {
    Ok(Connection::open(path)?)
}

pub fn init_schema(conn: &Connection) -> Result<(), HistoryError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL,
            name TEXT NOT NULL,
            subject TEXT NOT NULL,
            sender_email TEXT,
            total_recipients INTEGER NOT NULL,
            sent_count INTEGER NOT NULL,
            failed_count INTEGER NOT NULL,
            log_file TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            completed_at INTEGER NOT NULL,
            html_output TEXT,
            attachments TEXT NOT NULL DEFAULT '[]',
            attachment_rules TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS campaigns_created_at ON campaigns (created_at);",
    )?;
    Ok(())
}

pub fn save(conn: &Connection, record: &CampaignRecord) -> Result<(), HistoryError> {
    conn.execute(
        "INSERT OR REPLACE INTO campaigns (id, slug, name, subject, sender_email, \
         total_recipients, sent_count, failed_count, log_file, created_at, completed_at, \
         html_output, attachments, attachment_rules) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            record.id,
            record.slug,
            record.name,
            record.subject,
            record.sender_email,
            record.total_recipients as i64,
            record.sent_count as i64,
            record.failed_count as i64,
            record.log_file,
            record.created_at.timestamp_millis(),
            record.completed_at.timestamp_millis(),
            record.html_output,
            serde_json::to_string(&record.attachments)?,
            serde_json::to_string(&record.attachment_rules)?,
        ],
    )?;
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<CampaignRecord>, HistoryError> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS))?;
    let records = stmt
        .query_map([], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<CampaignRecord>, HistoryError> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
    Ok(stmt.query_row(params![id], record_from_row).optional()?)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CampaignRecord> {
    Ok(CampaignRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        subject: row.get(3)?,
        sender_email: row.get(4)?,
        total_recipients: row.get::<_, i64>(5)? as usize,
        sent_count: row.get::<_, i64>(6)? as usize,
        failed_count: row.get::<_, i64>(7)? as usize,
        log_file: row.get(8)?,
        created_at: millis_column(row, 9)?,
        completed_at: millis_column(row, 10)?,
        html_output: row.get(11)?,
        attachments: json_column(row, 12)?,
        attachment_rules: json_column(row, 13)?,
    })
}

fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Handler for `GET /api/campaigns`.
pub(crate) async fn list_campaigns(context: web::Data<CampaignContext>) -> impl Responder {
    match open(&context.db_path).and_then(|conn| list(&conn)) {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            error!("Failed to list campaigns: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error listing campaigns: {}", e))
        }
    }
}

/// Handler for `GET /api/campaigns/{campaign_id}`.
pub(crate) async fn get_campaign(
    campaign_id: web::Path<String>,
    context: web::Data<CampaignContext>,
) -> impl Responder {
    match open(&context.db_path).and_then(|conn| get(&conn, &campaign_id)) {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().body("Campaign not found"),
        Err(e) => {
            error!("Failed to load campaign {}: {}", campaign_id, e);
            HttpResponse::ServiceUnavailable().body(format!("Error retrieving campaign: {}", e))
        }
    }
}

/// Handler for `GET /api/campaigns/{campaign_id}/log`.
pub(crate) async fn get_campaign_log(
    campaign_id: web::Path<String>,
    context: web::Data<CampaignContext>,
) -> impl Responder {
    let record = match open(&context.db_path).and_then(|conn| get(&conn, &campaign_id)) {
        Ok(Some(record)) => record,
        Ok(None) => return HttpResponse::NotFound().body("Campaign not found"),
        Err(e) => {
            return HttpResponse::ServiceUnavailable()
                .body(format!("Error retrieving campaign: {}", e))
        }
    };

    match read_entries(Path::new(&record.log_file)).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(LogbookError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            HttpResponse::NotFound().body(format!("Campaign log not found: {}", record.log_file))
        }
        Err(e) => {
            error!("Failed to read log {} for campaign {}: {}", record.log_file, record.id, e);
            HttpResponse::InternalServerError().body(format!("Campaign log unreadable: {}", e))
        }
    }
}
