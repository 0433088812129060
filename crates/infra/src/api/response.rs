//! Response materialization: JSON bodies, blobs, backend error messages

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::errors::ApiError;

/// Binary download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// From `Content-Disposition`, when the backend names the file
    pub file_name: Option<String>,
}

impl Blob {
    pub(crate) async fn from_response(response: Response) -> Result<Self, ApiError> {
        let headers = response.headers();
        let content_type =
            headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(Self { bytes: bytes.to_vec(), content_type, file_name })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Deserialize a successful response
///
/// 204/205 and empty bodies deserialize from JSON `null`, so `()` and
/// `Option<T>` work without the body being parsed.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return from_null(status);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return from_null(status);
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
}

fn from_null<T: DeserializeOwned>(status: StatusCode) -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::Null).map_err(|_| {
        ApiError::Decode(format!(
            "No content response ({}), but response type cannot be deserialized from empty body",
            status.as_u16()
        ))
    })
}

/// Turn a non-2xx response into `ApiError::Backend`
pub(crate) async fn backend_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ApiError::Backend { status: status.as_u16(), message: error_message(status, &body) }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<ErrorMessage>,
}

/// Validation failures arrive as a list of messages
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

/// Backend-provided `message`, else `Error <status>: <statusText>`
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let backend = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.message).and_then(
        |message| match message {
            ErrorMessage::One(text) => Some(text),
            ErrorMessage::Many(list) if !list.is_empty() => Some(list.join(", ")),
            ErrorMessage::Many(_) => None,
        },
    );

    match backend {
        Some(message) if !message.trim().is_empty() => message,
        _ => format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
    }
}

/// `attachment; filename="report.pdf"` → `report.pdf`
fn disposition_file_name(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}
