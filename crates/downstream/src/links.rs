//! Links resolver client.

use async_trait::async_trait;
use log::{debug, error, warn};
use serde_json::{json, Value};

use crate::error::Result;
use crate::http::{build_client, check_response, headers, HttpSettings};
use recsync_core::publish::{LinksResolverClient, WriteOutcome};
use recsync_core::tasks::PublishItem;

/// PUTs data-link payloads to the resolver's update endpoint.
#[derive(Debug, Clone)]
pub struct LinksResolverHttpClient {
    client: reqwest::Client,
    update_url: String,
    api_token: String,
}

impl LinksResolverHttpClient {
    pub fn new(update_url: &str, api_token: &str, settings: &HttpSettings) -> Result<Self> {
        // Fail early on a token that can never become a header value.
        headers(Some(api_token))?;
        Ok(Self {
            client: build_client(settings)?,
            update_url: update_url.to_string(),
            api_token: api_token.to_string(),
        })
    }

    async fn put(&self, body: &Value) -> Result<()> {
        let response = self
            .client
            .put(&self.update_url)
            .headers(headers(Some(&self.api_token))?)
            .json(body)
            .send()
            .await?;
        check_response(response).await
    }
}

#[async_trait]
impl LinksResolverClient for LinksResolverHttpClient {
    async fn update_links(&self, items: &[PublishItem]) -> recsync_core::Result<WriteOutcome> {
        if items.is_empty() {
            return Ok(WriteOutcome::default());
        }
        let payloads: Vec<&Value> = items.iter().map(|i| &i.payload).collect();

        match self.put(&json!(payloads)).await {
            Ok(()) => {
                debug!("Sent {} link records to {}", items.len(), self.update_url);
                return Ok(WriteOutcome::all_succeeded(
                    items.iter().map(|i| i.bibcode.clone()),
                ));
            }
            Err(e) => warn!(
                "Links resolver rejected a batch of {}, retrying one by one: {}",
                items.len(),
                e
            ),
        }

        let mut outcome = WriteOutcome::default();
        for item in items {
            match self.put(&json!([&item.payload])).await {
                Ok(()) => outcome.succeeded.push(item.bibcode.clone()),
                Err(e) => {
                    error!("Failed to send links of {}: {}", item.bibcode, e);
                    outcome.failed.push(item.bibcode.clone());
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{spawn, Recorder};

    fn item(key: &str) -> PublishItem {
        PublishItem {
            bibcode: key.to_string(),
            payload: json!({"bibcode": key, "data_links_rows": []}),
            fingerprint: "f".to_string(),
            observed_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let recorder = Recorder::rejecting(&[]);
        let base = spawn(recorder.clone()).await;
        let client =
            LinksResolverHttpClient::new(&format!("{}/update", base), "secret", &HttpSettings::default())
                .unwrap();

        let outcome = client.update_links(&[item("A")]).await.unwrap();
        assert_eq!(outcome.succeeded, vec!["A".to_string()]);

        let requests = recorder.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0["authorization"], "Bearer secret");
        assert_eq!(requests[0].1[0]["bibcode"], "A");
    }

    #[tokio::test]
    async fn test_partial_failure_after_fallback() {
        let recorder = Recorder::rejecting(&["A"]);
        let base = spawn(recorder.clone()).await;
        let client =
            LinksResolverHttpClient::new(&format!("{}/update", base), "", &HttpSettings::default())
                .unwrap();

        let outcome = client.update_links(&[item("A"), item("B")]).await.unwrap();
        assert_eq!(outcome.succeeded, vec!["B".to_string()]);
        assert_eq!(outcome.failed, vec!["A".to_string()]);
        assert!(!recorder.requests()[0].0.contains_key("authorization"));
    }
}
