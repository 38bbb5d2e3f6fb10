//! Shared HTTP helpers for the store clients

use reqwest::{Client, Response};
use tracing::debug;

use crate::error::{Result, StoreError};

/// User agent sent with every store request
pub const USER_AGENT: &str = concat!("skylift/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all store clients
pub fn build_client() -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// Pass successful responses through, turn anything else into [`StoreError::ApiError`]
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let error_text = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), url = %url, "store API returned an error");
    Err(StoreError::ApiError {
        status: status.as_u16(),
        message: error_text,
    })
}

/// Like [`check_status`] but reports failures as [`StoreError::AuthenticationFailed`]
pub async fn check_auth_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(StoreError::AuthenticationFailed(format!(
        "{} - {}",
        status.as_u16(),
        error_text
    )))
}
