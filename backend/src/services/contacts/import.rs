use actix_multipart::{Multipart, MultipartError};
use actix_web::{HttpResponse, Responder};
use common::model::contact::ContactRow;
use csv::{ReaderBuilder, Trim};
use futures_util::StreamExt;
use log::info;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;

const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the upload has no `file` field")]
    MissingFile,
    #[error("the sheet has no header row")]
    NoHeader,
    #[error("header cell {0} is empty")]
    EmptyHeader(usize),
    #[error("header {0:?} appears more than once")]
    DuplicateHeader(String),
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ImportedContacts {
    pub headers: Vec<String>,
    pub contacts: Vec<ContactRow>,
}

/// HTTP handler for `POST /api/contacts/import`.
///
/// - On success: `200 OK` with `{ headers, contacts }`.
/// - On failure: `400 Bad Request` with `{ success: false, message }`.
pub(crate) async fn process(payload: Multipart) -> impl Responder {
    match import_contacts(payload).await {
        Ok(imported) => {
            info!(
                "Imported {} contacts with {} columns",
                imported.contacts.len(),
                imported.headers.len()
            );
            HttpResponse::Ok().json(imported)
        }
        Err(e) => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": format!("Invalid payload: {}", e),
        })),
    }
}

async fn import_contacts(mut payload: Multipart) -> Result<ImportedContacts, ImportError> {
    let mut sheet: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        if name.as_deref() == Some("file") {
            sheet = Some(bytes);
        }
    }

    parse_contacts(&sheet.ok_or(ImportError::MissingFile)?)
}

/// Picks the most frequent of `,` `;` `\t` `|` on the header line. Ties and
/// lines without any of them fall back to `,`.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = ',';
    let mut best_count = 0;
    for delimiter in DELIMITERS {
        let count = header_line.matches(delimiter).count();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }
    best as u8
}

pub fn parse_contacts(raw: &[u8]) -> Result<ImportedContacts, ImportError> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let header_line = raw.split(|&b| b == b'\n').next().unwrap_or_default();
    let delimiter = detect_delimiter(&String::from_utf8_lossy(header_line));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(raw);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(ImportError::NoHeader);
    }

    let mut seen = HashSet::new();
    for (idx, header) in headers.iter().enumerate() {
        if header.is_empty() {
            return Err(ImportError::EmptyHeader(idx + 1));
        }
        if !seen.insert(header.as_str()) {
            return Err(ImportError::DuplicateHeader(header.clone()));
        }
    }

    let mut contacts = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: ContactRow = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.as_str(), record.get(idx).unwrap_or("")))
            .collect();
        contacts.push(row);
    }

    Ok(ImportedContacts { headers, contacts })
}
