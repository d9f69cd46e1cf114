//! Remote background matting.
//!
//! `POST {endpoint}/removebg` with the API key in `X-Api-Key`, the image in
//! `image_file` and `size=auto`. A successful reply is the PNG itself.

use std::sync::Arc;
use async_trait::async_trait;
use tracing::debug;

use crate::core::{RemoveBackgroundConfig, TransformMode, TransformedArtifact};
use crate::processing::strategy::{TransformJob, TransformStrategy};
use crate::utils::{TransformError, TransformResult, output_file_name};

use super::client::{HttpClient, MultipartRequest};
use super::errors::remote_error;

pub const OUTPUT_MEDIA_TYPE: &str = "image/png";
const OUTPUT_EXTENSION: &str = "png";

pub struct RemoveBackgroundStrategy {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    api_key: String,
}

impl RemoveBackgroundStrategy {
    pub fn new(client: Arc<dyn HttpClient>, config: &RemoveBackgroundConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl TransformStrategy for RemoveBackgroundStrategy {
    fn mode(&self) -> TransformMode {
        TransformMode::RemoveBackground
    }

    #[tracing::instrument(skip(self, job), fields(entry = %job.id))]
    async fn execute(&self, job: &TransformJob) -> TransformResult<TransformedArtifact> {
        let source = &job.source;
        let request = MultipartRequest::new(format!("{}/removebg", self.endpoint))
            .header("X-Api-Key", self.api_key.as_str())
            .file("image_file", &source.name, &source.media_type, source.bytes.clone())
            .text("size", "auto");

        let response = self.client.post_multipart(request).await?;
        if !response.is_success() {
            return Err(remote_error(&response));
        }
        if response.body.is_empty() {
            return Err(TransformError::decode("Background removal returned an empty image"));
        }

        debug!("'{}' matted: {} bytes", source.name, response.body.len());
        Ok(TransformedArtifact::new(
            response.body,
            output_file_name(&source.name, TransformMode::RemoveBackground.file_suffix(), OUTPUT_EXTENSION),
            OUTPUT_MEDIA_TYPE,
            source.size(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crate::core::{EntryId, SourceFile};
    use crate::processing::remote::{FormPart, HttpResponse, MockHttpClient};
    use crate::utils::FailureKind;

    fn strategy(mock: &MockHttpClient) -> RemoveBackgroundStrategy {
        let config = RemoveBackgroundConfig {
            endpoint: "https://matting.test/v1.0".into(),
            api_key: "key-123".into(),
            ..RemoveBackgroundConfig::default()
        };
        RemoveBackgroundStrategy::new(Arc::new(mock.clone()), &config)
    }

    fn job(name: &str) -> TransformJob {
        TransformJob {
            id: EntryId::new(0, name, 4),
            source: SourceFile::new(name, "image/jpeg", Bytes::from_static(b"jpeg")),
            target_format: None,
        }
    }

    #[tokio::test]
    async fn sends_key_and_sizing_hint() {
        let mock = MockHttpClient::new();
        mock.add_response("/removebg", HttpResponse::new(200, Bytes::from_static(b"\x89PNG")));

        let artifact = strategy(&mock).execute(&job("cat.jpeg")).await.unwrap();
        assert_eq!(artifact.file_name, "cat-no-bg.png");
        assert_eq!(artifact.media_type, "image/png");
        assert_eq!(artifact.size, 4);

        let call = &mock.calls()[0];
        assert_eq!(call.url, "https://matting.test/v1.0/removebg");
        assert_eq!(call.headers, vec![("X-Api-Key".to_string(), "key-123".to_string())]);
        assert!(call.parts.contains(&FormPart::Text {
            name: "size".into(),
            value: "auto".into(),
        }));
    }

    #[tokio::test]
    async fn structured_error_title_is_surfaced() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "/removebg",
            HttpResponse::new(402, r#"{"errors":[{"title":"Insufficient credits","code":"insufficient_credits"}]}"#),
        );
        let err = strategy(&mock).execute(&job("cat.jpeg")).await.unwrap_err();
        assert_eq!(err, TransformError::remote(402, "Insufficient credits"));
    }

    #[tokio::test]
    async fn empty_success_body_is_decode_error() {
        let mock = MockHttpClient::new();
        mock.add_response("/removebg", HttpResponse::new(200, Bytes::new()));
        let err = strategy(&mock).execute(&job("cat.jpeg")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::DecodeError);
    }

    #[tokio::test]
    async fn transport_failure_is_classified() {
        let mock = MockHttpClient::new();
        mock.add_transport_error("/removebg", "connection refused");
        let err = strategy(&mock).execute(&job("cat.jpeg")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransportError);
    }
}
