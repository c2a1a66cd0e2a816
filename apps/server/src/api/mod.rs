//! HTTP control surface.
//!
//! Every mutating endpoint only enqueues a task and answers 202; the work
//! happens on the queue workers.

use std::sync::Arc;

use axum::{routing::get, Router};
use serde::Serialize;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, main_lib::AppState};
use recsync_core::tasks::Task;

mod records;
mod sitemap;

/// Body of every 202 answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accepted {
    pub queue: String,
    pub keys: usize,
}

impl Accepted {
    fn of(task: &Task) -> Self {
        Self {
            queue: task.queue().to_string(),
            keys: task.size(),
        }
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(records::router())
        .merge(sitemap::router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
