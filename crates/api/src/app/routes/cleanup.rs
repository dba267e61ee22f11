use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::info;

use tribute_core::TaskCode;
use tribute_infra::jobs::CleanupJobs;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:job", post(trigger_job))
}

/// Run one cleanup job now, through the same lock and ledger path as the
/// scheduler. The response does not reveal how the run ended.
pub async fn trigger_job(
    Extension(jobs): Extension<Arc<CleanupJobs>>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    let Some(task) = TaskCode::from_slug(&slug) else {
        return errors::unknown_job(&slug);
    };

    info!(job = task.job_name(), "manual cleanup trigger");
    let outcome = jobs.trigger(task).await;
    info!(job = task.job_name(), ?outcome, "manual cleanup trigger finished");

    Json(dto::TriggerResponse::triggered(task.slug())).into_response()
}
