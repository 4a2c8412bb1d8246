//! # Campaign Service Module
//!
//! HTTP surface of the dispatch engine. Two scopes are registered:
//!
//! *   **`/api/campaign`**
//!     - `POST /send`: multipart campaign request; runs the send loop and
//!       answers with the `CampaignDispatchResult`.
//!     - `POST /validate`: runs the validation gate on a JSON payload.
//!     - `POST /preview`: renders subject and body for one contact.
//!     - `GET /status/{campaign_id}`: progress of a running dispatch.
//!
//! *   **`/api/campaigns`**
//!     - `GET /`: campaign history, newest first.
//!     - `GET /{campaign_id}`: one history record.
//!     - `GET /{campaign_id}/log`: the recipient log of a finished campaign.

pub mod history;
mod preview;
mod send;
mod status;
#[cfg(test)]
pub(crate) mod test_support;
mod validate;

use crate::campaign::transport::MailTransport;
use crate::config::AppConfig;
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use std::path::PathBuf;
use std::sync::Arc;

const API_PATH: &str = "/api/campaign";
const HISTORY_PATH: &str = "/api/campaigns";

/// Sender used by dry runs when neither `KAMPAIGN_FROM` nor SMTP is set.
const DRY_RUN_SENDER: &str = "kampaign@localhost";

/// Shared, read-only context for the campaign routes.
#[derive(Clone)]
pub struct CampaignContext {
    /// `None` when mail delivery is not configured.
    pub transport: Option<Arc<dyn MailTransport>>,
    pub sender: String,
    pub log_root: PathBuf,
    pub db_path: PathBuf,
}

impl CampaignContext {
    pub fn new(config: &AppConfig, transport: Option<Arc<dyn MailTransport>>) -> Self {
        Self {
            transport,
            sender: config
                .sender()
                .unwrap_or_else(|| DRY_RUN_SENDER.to_string()),
            log_root: config.log_root.clone(),
            db_path: config.db_path.clone(),
        }
    }
}

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/send", post().to(send::process))
        .route("/validate", post().to(validate::process))
        .route("/preview", post().to(preview::process))
        .route("/status/{campaign_id}", get().to(status::process))
}

pub fn configure_history_routes() -> Scope {
    scope(HISTORY_PATH)
        .route("", get().to(history::list_campaigns))
        .route("/{campaign_id}", get().to(history::get_campaign))
        .route("/{campaign_id}/log", get().to(history::get_campaign_log))
}
