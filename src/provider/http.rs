//! Shared plumbing for the HTTP API backed providers.

use crate::error::Error;
use reqwest::{Client, Response};
use std::time::Duration;

/// Per HTTP call timeout. Requests also carry their own, shorter, deadline.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub(super) fn client() -> Result<Client, Error> {
    Ok(Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("dyncrab/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Turn a non-2xx response into a provider error, reading the body for context.
pub(super) async fn check(
    provider: &'static str,
    action: &str,
    response: Response,
) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error response".to_string());

    let message = match status.as_u16() {
        401 | 403 => format!(
            "{action}: authentication failed, invalid API token or insufficient permissions ({status})"
        ),
        404 => format!("{action}: not found ({status})"),
        429 => format!("{action}: rate limited ({status})"),
        500..=599 => format!("{action}: server error ({status}): {body}"),
        _ => format!("{action}: {status}: {body}"),
    };
    Err(Error::provider(provider, message))
}
