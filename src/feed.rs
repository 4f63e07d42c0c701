//! Feed download.

use std::time::Duration;

use meetcal_core::SyncError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for the feed and the calendar API.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("meetcal/{}", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
}

/// GET the feed document. Any non-success status is a feed error.
pub async fn fetch(http: &reqwest::Client, url: &str) -> Result<String, SyncError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| SyncError::Feed(format!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(SyncError::Feed(format!(
            "Fetching {} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SyncError::Feed(format!("Failed to read feed body from {}: {}", url, e)))?;

    tracing::debug!(url, bytes = body.len(), "fetched feed");
    Ok(body)
}
