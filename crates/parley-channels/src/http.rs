use parley_core::{AuthError, ParleyError, ParleyResult};
use reqwest::StatusCode;
use std::time::Duration;

/// Build the shared HTTP client with the configured timeout.
pub(crate) fn client(timeout: Duration) -> ParleyResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ParleyError::Http(format!("cannot build HTTP client: {e}")))
}

/// Turn a non-success response into an error.
///
/// 401/403 always become [`AuthError::Rejected`]; anything else is wrapped by
/// `wrap` with the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    wrap: fn(String) -> ParleyError,
) -> ParleyResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AuthError::Rejected(status.as_u16()).into());
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(wrap(format!("{status}: {body}")))
}
