//! Request description shared by every attempt of one logical call

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use super::errors::ApiError;

/// Request body
///
/// Kept in a replayable form so the post-refresh retry sends the identical
/// payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// One field of a multipart upload
#[derive(Debug, Clone)]
pub enum MultipartPart {
    Text { name: String, value: String },
    File { name: String, file_name: String, bytes: Vec<u8>, mime: Option<String> },
}

/// Multipart payload; the transport picks the content type and boundary
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text { name: name.into(), value: value.into() });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
            mime,
        });
        self
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    /// Build a fresh reqwest form (forms are consumed on send).
    pub(crate) fn to_form(&self) -> Form {
        self.parts.iter().fold(Form::new(), |form, part| match part {
            MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
            MultipartPart::File { name, file_name, bytes, mime } => {
                form.part(name.clone(), file_part(bytes, file_name, mime.as_deref()))
            }
        })
    }
}

fn file_part(bytes: &[u8], file_name: &str, mime: Option<&str>) -> Part {
    let part = || Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
    match mime {
        Some(mime) => part().mime_str(mime).unwrap_or_else(|_| {
            warn!(mime, file_name, "ignoring unparsable MIME type on upload");
            part()
        }),
        None => part(),
    }
}

/// A logical API call
///
/// `path` is relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    id: Uuid,
    method: Method,
    path: String,
    body: RequestBody,
    headers: HeaderMap,
    cancel: Option<CancellationToken>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
            cancel: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    ///
    /// # Errors
    /// Returns `ApiError::Encode` if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Encode(format!("Failed to serialize body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Abort the call with `ApiError::Cancelled` once `token` fires
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Correlation id, sent as `X-Request-Id` on every attempt
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }
}
