//! HTTP client abstraction for the remote strategies.
//!
//! This module defines the `HttpClient` trait so strategy logic can be tested
//! without real network calls. Strategies build a [`MultipartRequest`], the
//! client sends it and hands back the raw status and body.

use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::utils::TransportError;

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        media_type: String,
        bytes: Bytes,
    },
}

/// A multipart POST to a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub parts: Vec<FormPart>,
}

impl MultipartRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, media_type: &str, bytes: Bytes) -> Self {
        self.parts.push(FormPart::File {
            name: name.to_string(),
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        });
        self
    }

    /// File name of the first file part, if any
    pub fn file_name(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::File { file_name, .. } => Some(file_name.as_str()),
            FormPart::Text { .. } => None,
        })
    }
}

/// Raw response from a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends multipart requests.
///
/// Non-2xx statuses are returned as responses, not errors; only failures that
/// produce no status at all surface as [`TransportError`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    media_type,
                    bytes,
                } => {
                    let part = Part::bytes(bytes.to_vec())
                        .file_name(file_name)
                        .mime_str(&media_type)?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, request), fields(url = %request.url))]
    async fn post_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError> {
        let MultipartRequest {
            url,
            headers,
            query,
            parts,
        } = request;

        let mut req = self.client.post(&url).query(&query);
        for (name, value) in headers {
            req = req.header(name, value);
        }
        req = req.multipart(Self::build_form(parts)?);

        let response = req.send().await.map_err(|e| {
            let err = TransportError::from(e);
            tracing::error!(url = %url, error = %err, "HTTP request failed");
            err
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(status = status, response_len = body.len(), "HTTP request completed");

        Ok(HttpResponse { status, body })
    }
}
