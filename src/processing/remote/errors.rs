//! Translation of non-2xx responses into [`TransformError::Remote`].

use serde::Deserialize;
use crate::processing::remote::HttpResponse;
use crate::utils::TransformError;

/// Human-readable default for a status when the body carries no detail.
pub fn default_message(status: u16) -> String {
    match status {
        400 => "Invalid request or unsupported file".to_string(),
        401 => "Invalid API key".to_string(),
        402 => "Insufficient credits".to_string(),
        403 => "Access forbidden: check API key permissions".to_string(),
        429 => "Rate limit exceeded, try again later".to_string(),
        500 => "Remote service error".to_string(),
        other => format!("Unexpected response (HTTP {other})"),
    }
}

#[derive(Deserialize)]
struct ErrorTitle {
    title: Option<String>,
}

/// Error bodies seen from the matting and conversion services.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorTitle>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Pulls the first usable message out of a structured error body.
pub fn structured_message(body: &[u8]) -> Option<String> {
    let body: ErrorBody = serde_json::from_slice(body).ok()?;
    body.errors
        .into_iter()
        .filter_map(|e| e.title)
        .chain(body.message)
        .map(|m| m.trim().to_string())
        .find(|m| !m.is_empty())
}

/// Builds the remote error for a failed response.
pub fn remote_error(response: &HttpResponse) -> TransformError {
    let message = structured_message(&response.body).unwrap_or_else(|| default_message(response.status));
    TransformError::remote(response.status, message)
}
