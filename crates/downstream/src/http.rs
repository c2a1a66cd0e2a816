//! Shared HTTP plumbing for the downstream clients.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use crate::error::{DownstreamError, Result};

/// Default timeout for downstream requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub(crate) fn build_client(settings: &HttpSettings) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(settings.timeout).build()?)
}

/// JSON content type, plus a bearer token when one is configured.
pub(crate) fn headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| DownstreamError::invalid_request("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);
    }

    Ok(headers)
}

/// Turns a non-success response into an `Api` error, draining the body.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let body = response.text().await?;
    debug!("Downstream response ({}): {}", status, body);

    if !status.is_success() {
        return Err(DownstreamError::api(
            status.as_u16(),
            format!("Request failed: {}", body),
        ));
    }
    Ok(())
}
