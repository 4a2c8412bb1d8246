//! Errors that abort a campaign request before its send loop starts.
//!
//! Per-recipient delivery problems are not errors: they are recorded as
//! failed outcomes and the request still succeeds.

use crate::campaign::attachments::StagingError;
use crate::campaign::validate::ValidationReport;
use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("Invalid payload: {0}")]
    MalformedInput(String),
    #[error("SMTP NOT CONFIGURED!")]
    NotConfigured,
    #[error("Campaign failed validation")]
    Validation(ValidationReport),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResponseError for CampaignError {
    fn status_code(&self) -> StatusCode {
        match self {
            CampaignError::MalformedInput(_)
            | CampaignError::NotConfigured
            | CampaignError::Multipart(_)
            | CampaignError::Staging(StagingError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            CampaignError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CampaignError::Staging(StagingError::Io(_)) | CampaignError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            CampaignError::Validation(report) => json!({
                "success": false,
                "message": self.to_string(),
                "errors": report.errors,
                "warnings": report.warnings,
            }),
            _ => json!({ "success": false, "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(
            CampaignError::MalformedInput("missing field `subject`".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CampaignError::NotConfigured.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CampaignError::Validation(ValidationReport::default()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CampaignError::Io(io::Error::other("disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_configured_message_is_stable() {
        assert_eq!(CampaignError::NotConfigured.to_string(), "SMTP NOT CONFIGURED!");
    }
}
