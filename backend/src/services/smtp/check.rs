use crate::services::campaign::CampaignContext;
use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};
use serde_json::json;

/// Handler for `GET /api/smtp/test`.
///
/// Always answers `200 OK`; the outcome is carried in `success`.
pub(crate) async fn process(context: web::Data<CampaignContext>) -> impl Responder {
    let Some(transport) = &context.transport else {
        return HttpResponse::Ok().json(json!({
            "success": false,
            "message": "SMTP NOT CONFIGURED!",
        }));
    };

    match transport.verify().await {
        Ok(()) => {
            info!("SMTP connection check succeeded");
            HttpResponse::Ok().json(json!({ "success": true, "message": "SMTP IS WORKING" }))
        }
        Err(e) => {
            warn!("SMTP connection check failed: {}", e);
            HttpResponse::Ok().json(json!({ "success": false, "message": e.to_string() }))
        }
    }
}
