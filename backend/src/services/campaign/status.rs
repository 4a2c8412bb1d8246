use crate::job_controller::state::JobsState;
use crate::services::campaign::{history, CampaignContext};
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use log::error;

/// `GET /api/campaign/status/{campaign_id}`.
///
/// Running dispatches are answered from `JobsState`. Finished ones have been
/// evicted from it and are answered from the history store.
pub(crate) async fn process(
    campaign_id: web::Path<String>,
    state: web::Data<JobsState>,
    context: web::Data<CampaignContext>,
) -> impl Responder {
    if let Some(status) = state.status(&campaign_id).await {
        return HttpResponse::Ok().json(status);
    }

    match history::open(&context.db_path).and_then(|conn| history::get(&conn, &campaign_id)) {
        Ok(Some(record)) => {
            HttpResponse::Ok().json(JobStatus::completed(record.sent_count, record.failed_count))
        }
        Ok(None) => HttpResponse::NotFound().body("Campaign ID not found"),
        Err(e) => {
            error!("Failed to look up campaign {}: {}", campaign_id, e);
            HttpResponse::ServiceUnavailable().body(format!("Error retrieving campaign: {}", e))
        }
    }
}
