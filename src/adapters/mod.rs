// Adapters layer: concrete clients for the third-party providers.

pub mod google_search;
pub mod google_vision;
pub mod openai;
pub mod simulated;

use crate::utils::error::{GlanceError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("glance/", env!("CARGO_PKG_VERSION"));

/// One client for every provider so connections are pooled.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Turns a non-2xx answer into `VendorError`, keeping the body for the logs.
pub(crate) async fn check_status(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("{} response status: {}", provider, status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} request failed with {}: {}", provider, status, body);
    Err(GlanceError::vendor(provider, status.as_u16(), body))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
