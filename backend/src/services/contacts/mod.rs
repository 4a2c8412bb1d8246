//! # Contacts Service Module
//!
//! *   **`POST /api/contacts/import`**: Parses an uploaded CSV sheet into the
//!     header list and `ContactRow`s expected by the campaign routes.

mod import;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/contacts";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/import", post().to(import::process))
}
