//! Forwards affiliation augmentation requests to the external pipeline.

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::http::{build_client, check_response, headers, HttpSettings};
use recsync_core::ingest::AugmentationClient;

/// Task envelope understood by the augmentation pipeline's intake.
#[derive(Debug, Serialize)]
struct ForwardedTask<'a> {
    task: &'a str,
    args: [&'a str; 1],
    id: Uuid,
}

#[derive(Debug, Clone)]
pub struct HttpTaskForwarder {
    client: reqwest::Client,
    endpoint: String,
    task_name: String,
}

impl HttpTaskForwarder {
    pub fn new(endpoint: &str, task_name: &str, settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings)?,
            endpoint: endpoint.to_string(),
            task_name: task_name.to_string(),
        })
    }

    async fn forward(&self, bibcode: &str) -> Result<()> {
        let envelope = ForwardedTask {
            task: &self.task_name,
            args: [bibcode],
            id: Uuid::new_v4(),
        };
        debug!("Forwarding {} for {}", self.task_name, bibcode);

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers(None)?)
            .json(&envelope)
            .send()
            .await?;
        check_response(response).await
    }
}

#[async_trait]
impl AugmentationClient for HttpTaskForwarder {
    async fn request_augment(&self, bibcode: &str) -> recsync_core::Result<()> {
        Ok(self.forward(bibcode).await?)
    }
}
