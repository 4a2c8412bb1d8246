use crate::campaign::render::preview;
use actix_web::{web, HttpResponse, Responder};
use common::requests::PreviewRequest;

/// `POST /api/campaign/preview`: renders the subject and body templates for
/// one contact. Without a contact both parts come back empty.
pub(crate) async fn process(payload: web::Json<PreviewRequest>) -> impl Responder {
    let request = payload.into_inner();
    HttpResponse::Ok().json(preview(
        &request.subject,
        &request.html_output,
        request.contact.as_ref(),
    ))
}
