//! Remote format conversion.
//!
//! `POST {endpoint}/convert/{from}/to/{to}?Secret={key}` with the file in the
//! `File` multipart field. A successful reply is JSON carrying the converted
//! file as base64.

use std::sync::Arc;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::core::{ConvertConfig, SourceFile, TransformMode, TransformedArtifact};
use crate::processing::strategy::{TransformJob, TransformStrategy};
use crate::utils::{
    TargetFormat, TransformError, TransformResult, extension_for_media_type, extension_of,
    output_file_name,
};

use super::client::{HttpClient, MultipartRequest};
use super::errors::remote_error;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertResponse {
    #[serde(default)]
    files: Vec<ConvertedFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedFile {
    file_data: String,
}

pub struct ConvertStrategy {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    api_key: String,
    default_target: TargetFormat,
}

impl ConvertStrategy {
    pub fn new(client: Arc<dyn HttpClient>, config: &ConvertConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            default_target: config.default_target,
        }
    }

    fn request_for(&self, source: &SourceFile, from: &str, to: TargetFormat) -> MultipartRequest {
        let url = format!("{}/convert/{from}/to/{}", self.endpoint, to.primary_extension());
        MultipartRequest::new(url)
            .query("Secret", self.api_key.as_str())
            .file("File", &source.name, &source.media_type, source.bytes.clone())
    }
}

/// Extension the service should treat the upload as.
fn source_extension(source: &SourceFile) -> TransformResult<String> {
    extension_of(&source.name)
        .or_else(|| extension_for_media_type(&source.media_type).map(str::to_string))
        .ok_or_else(|| {
            TransformError::unsupported(format!(
                "Cannot tell the format of '{}' ({})",
                source.name, source.media_type
            ))
        })
}

/// Decodes the first converted file out of a success body.
fn decode_payload(body: &[u8]) -> TransformResult<Bytes> {
    let response: ConvertResponse = serde_json::from_slice(body)
        .map_err(|e| TransformError::decode(format!("Invalid conversion response: {e}")))?;
    let file = response
        .files
        .into_iter()
        .next()
        .ok_or_else(|| TransformError::decode("Conversion response contains no files"))?;
    let bytes = STANDARD
        .decode(file.file_data.trim())
        .map_err(|e| TransformError::decode(format!("Invalid base64 payload: {e}")))?;
    if bytes.is_empty() {
        return Err(TransformError::decode("Converted file is empty"));
    }
    Ok(Bytes::from(bytes))
}

#[async_trait]
impl TransformStrategy for ConvertStrategy {
    fn mode(&self) -> TransformMode {
        TransformMode::Convert
    }

    #[tracing::instrument(skip(self, job), fields(entry = %job.id))]
    async fn execute(&self, job: &TransformJob) -> TransformResult<TransformedArtifact> {
        let source = &job.source;
        let target = job.target_format.unwrap_or(self.default_target);
        let from = source_extension(source)?;
        debug!("Converting '{}' {from} → {target}", source.name);

        let response = self
            .client
            .post_multipart(self.request_for(source, &from, target))
            .await?;
        if !response.is_success() {
            return Err(remote_error(&response));
        }

        let bytes = decode_payload(&response.body)?;
        Ok(TransformedArtifact::new(
            bytes,
            output_file_name(&source.name, TransformMode::Convert.file_suffix(), target.primary_extension()),
            target.media_type(),
            source.size(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntryId;
    use crate::processing::remote::{FormPart, HttpResponse, MockHttpClient};
    use crate::utils::FailureKind;

    fn success_body(payload: &[u8]) -> String {
        serde_json::json!({
            "ConversionCost": 1,
            "Files": [{
                "FileName": "out.webp",
                "FileExt": "webp",
                "FileSize": payload.len(),
                "FileData": STANDARD.encode(payload),
            }]
        })
        .to_string()
    }

    fn strategy(mock: &MockHttpClient) -> ConvertStrategy {
        let config = ConvertConfig {
            endpoint: "https://convert.test/".into(),
            api_key: "secret".into(),
            ..ConvertConfig::default()
        };
        ConvertStrategy::new(Arc::new(mock.clone()), &config)
    }

    fn job(name: &str, media_type: &str, target: Option<TargetFormat>) -> TransformJob {
        TransformJob {
            id: EntryId::new(0, name, 3),
            source: SourceFile::new(name, media_type, Bytes::from_static(b"abc")),
            target_format: target,
        }
    }

    #[tokio::test]
    async fn converts_to_requested_target() {
        let mock = MockHttpClient::new();
        mock.add_response("/convert/png/to/webp", HttpResponse::new(200, success_body(b"RIFFwebp")));

        let artifact = strategy(&mock)
            .execute(&job("logo.png", "image/png", Some(TargetFormat::Webp)))
            .await
            .unwrap();

        assert_eq!(&artifact.bytes[..], b"RIFFwebp");
        assert_eq!(artifact.file_name, "logo-converted.webp");
        assert_eq!(artifact.media_type, "image/webp");
        assert_eq!(artifact.original_size, 3);

        let call = &mock.calls()[0];
        assert_eq!(call.url, "https://convert.test/convert/png/to/webp");
        assert_eq!(call.query, vec![("Secret".to_string(), "secret".to_string())]);
        assert!(matches!(&call.parts[0], FormPart::File { name, .. } if name == "File"));
    }

    #[tokio::test]
    async fn falls_back_to_default_target_and_media_type_extension() {
        let mock = MockHttpClient::new();
        mock.add_response("/convert/jpg/to/png", HttpResponse::new(200, success_body(b"png")));

        let artifact = strategy(&mock)
            .execute(&job("camera-upload", "image/jpeg", None))
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "camera-upload-converted.png");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_api_key() {
        let mock = MockHttpClient::new();
        mock.add_response("/convert", HttpResponse::new(401, Bytes::new()));

        let err = strategy(&mock)
            .execute(&job("a.png", "image/png", Some(TargetFormat::Jpg)))
            .await
            .unwrap_err();
        assert_eq!(err, TransformError::remote(401, "Invalid API key"));
    }

    #[tokio::test]
    async fn malformed_payload_is_decode_error() {
        let mock = MockHttpClient::new();
        mock.add_response("/to/gif", HttpResponse::new(200, r#"{"Files":[{"FileData":"***"}]}"#));
        mock.add_response("/to/bmp", HttpResponse::new(200, r#"{"Files":[]}"#));

        let convert = strategy(&mock);
        let bad_base64 = convert.execute(&job("a.png", "image/png", Some(TargetFormat::Gif))).await;
        let no_files = convert.execute(&job("a.png", "image/png", Some(TargetFormat::Bmp))).await;
        assert_eq!(bad_base64.unwrap_err().kind(), FailureKind::DecodeError);
        assert_eq!(no_files.unwrap_err().kind(), FailureKind::DecodeError);
    }

    #[tokio::test]
    async fn unknown_source_format_never_hits_the_network() {
        let mock = MockHttpClient::new();
        let err = strategy(&mock)
            .execute(&job("blob", "application/octet-stream", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedMediaType);
        assert_eq!(mock.call_count(), 0);
    }
}
