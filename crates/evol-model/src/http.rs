//! Shared HTTP plumbing for the generation backends.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::config::GenerationConfig;
use crate::error::{ModelError, ModelResult};

/// Longest response body excerpt kept in a status error.
const MAX_ERROR_BODY_CHARS: usize = 320;

/// Build the HTTP client for a backend.
///
/// No timeout is applied unless `timeout_secs` is configured.
pub(crate) fn build_client(provider: &str, config: &GenerationConfig) -> ModelResult<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| ModelError::request(provider, format!("failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into `ModelError::Status`.
pub(crate) async fn ensure_success(provider: &str, response: Response) -> ModelResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ModelError::Status {
        provider: provider.to_string(),
        status,
        body: truncate(&body, MAX_ERROR_BODY_CHARS),
    })
}

/// Truncate on a char boundary.
pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}
