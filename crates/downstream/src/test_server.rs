//! Throwaway HTTP endpoint for client tests.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Records every request body and rejects those mentioning a blocked key.
#[derive(Clone, Default)]
pub struct Recorder {
    rejected: Arc<HashSet<String>>,
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl Recorder {
    pub fn rejecting(keys: &[&str]) -> Self {
        Self {
            rejected: Arc::new(keys.iter().map(|k| k.to_string()).collect()),
            requests: Arc::default(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(HeaderMap, Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn mentions_rejected(&self, body: &Value) -> bool {
        let docs: Vec<&Value> = match body {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        docs.iter().any(|doc| {
            doc.get("bibcode")
                .and_then(Value::as_str)
                .is_some_and(|key| self.rejected.contains(key))
        })
    }
}

async fn handle(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let rejected = recorder.mentions_rejected(&body);
    recorder.requests.lock().unwrap().push((headers, body));
    if rejected {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    }
}

/// Serves `recorder` on an ephemeral local port and returns its base URL.
pub async fn spawn(recorder: Recorder) -> String {
    let router = Router::new().fallback(handle).with_state(recorder);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
