use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::Accepted;
use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use recsync_core::{
    ingest::InboundMessage,
    records::{Record, RecordFields},
    sync::SyncOptions,
    tasks::Task,
};

fn submit(state: &AppState, task: Task) -> ApiResult<(StatusCode, Json<Accepted>)> {
    let accepted = Accepted::of(&task);
    state.tasks.submit(task)?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

fn require_keys(bibcodes: &[String]) -> ApiResult<()> {
    if bibcodes.is_empty() {
        return Err(ApiError::BadRequest("bibcodes must not be empty".to_string()));
    }
    Ok(())
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    Json(message): Json<InboundMessage>,
) -> ApiResult<(StatusCode, Json<Accepted>)> {
    // Reject unknown kinds and missing keys up front; the status is checked
    // by the handler, which drops unknown values.
    message
        .parse()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    submit(&state, Task::UpdateRecord { message })
}

#[derive(Debug, Deserialize)]
struct IndexRequest {
    bibcodes: Vec<String>,
    #[serde(flatten)]
    options: SyncOptions,
}

async fn index_records(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IndexRequest>,
) -> ApiResult<(StatusCode, Json<Accepted>)> {
    require_keys(&body.bibcodes)?;
    body.options.validate()?;
    submit(
        &state,
        Task::IndexRecords {
            bibcodes: body.bibcodes,
            options: body.options,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RebuildRequest {
    bibcodes: Vec<String>,
    #[serde(default, alias = "indexTargets")]
    solr_targets: Option<Vec<String>>,
}

async fn rebuild_index(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RebuildRequest>,
) -> ApiResult<(StatusCode, Json<Accepted>)> {
    require_keys(&body.bibcodes)?;
    submit(
        &state,
        Task::RebuildIndex {
            bibcodes: body.bibcodes,
            index_targets: body.solr_targets,
        },
    )
}

async fn delete_record(
    Path(bibcode): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<Accepted>)> {
    submit(&state, Task::DeleteRecord { bibcode })
}

async fn get_record(
    Path(bibcode): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Record>> {
    state
        .records
        .get_record(&bibcode, &RecordFields::all())?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/records/update", post(update_record))
        .route("/records/index", post(index_records))
        .route("/records/rebuild", post(rebuild_index))
        .route("/records/{bibcode}", get(get_record).delete(delete_record))
}
