use crate::campaign::validate::validate_payload;
use actix_web::{web, HttpResponse, Responder};
use common::requests::SendCampaignPayload;

/// `POST /api/campaign/validate`: the same gate the send route applies,
/// without sending anything. Always answers `200` with the report.
pub(crate) async fn process(payload: web::Json<SendCampaignPayload>) -> impl Responder {
    HttpResponse::Ok().json(validate_payload(&payload))
}
