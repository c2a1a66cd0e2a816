use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use super::Accepted;
use crate::{error::ApiResult, main_lib::AppState};
use recsync_core::{sitemap::SitemapAction, tasks::Task};

#[derive(Debug, Deserialize)]
struct PopulateRequest {
    #[serde(default)]
    bibcodes: Vec<String>,
    action: SitemapAction,
}

async fn populate_sitemap(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PopulateRequest>,
) -> ApiResult<(StatusCode, Json<Accepted>)> {
    let task = Task::PopulateSitemap {
        bibcodes: body.bibcodes,
        action: body.action,
    };
    let accepted = Accepted::of(&task);
    state.tasks.submit(task)?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sitemap/populate", post(populate_sitemap))
}
