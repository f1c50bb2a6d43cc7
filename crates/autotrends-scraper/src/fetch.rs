//! Plain HTTP retrieval of the results page.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;

/// Builds the shared HTTP client used by the static backend.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the TLS backend fails to initialize.
pub fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ScraperError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Fetches `url` and returns the body as text.
///
/// # Errors
///
/// Returns [`ScraperError::UnexpectedStatus`] for any non-2xx response and
/// [`ScraperError::Http`] for transport failures.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, ScraperError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let body = response.text().await?;
    tracing::debug!(url, bytes = body.len(), "fetched results page");
    Ok(body)
}
