//! # SMTP Service Module
//!
//! *   **`GET /api/smtp/test`**: Checks the configured mail transport.

mod check;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/smtp";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/test", get().to(check::process))
}
