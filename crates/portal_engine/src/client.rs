use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart;
use serde::Deserialize;
use url::Url;

use crate::{
    AnalysisOutcome, DeleteOutcome, FailureKind, RecognizedText, ServiceError, UploadReceipt,
};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_download_bytes: 54 * 1024 * 1024,
        }
    }
}

/// The remote portal: storage, analysis and deletion live on the other side.
#[async_trait::async_trait]
pub trait PortalService: Send + Sync {
    async fn analyze(&self, identifier: &str) -> Result<AnalysisOutcome, ServiceError>;

    async fn delete(&self, identifier: &str) -> Result<DeleteOutcome, ServiceError>;

    async fn upload(&self, roll_no: &str, file: &Path) -> Result<UploadReceipt, ServiceError>;

    async fn download(&self, identifier: &str) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct OcrPayload {
    #[serde(default)]
    texts: Option<Vec<Option<TextPayload>>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DeletePayload {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestService {
    settings: ServiceSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{route}/{identifier}` with the identifier encoded as a single
    /// path segment, slashes included.
    pub fn endpoint(&self, route: &str, identifier: &str) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::new(FailureKind::InvalidUrl, "base url cannot have a path"))?
            .pop_if_empty()
            .push(route)
            .push(identifier);
        Ok(url)
    }

    /// Reads a JSON body. The service reports its own failures as JSON, so a
    /// non-2xx status only matters when the body does not parse.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| {
            if status.is_success() {
                ServiceError::new(FailureKind::Decode, err.to_string())
            } else {
                ServiceError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
            }
        })
    }
}

#[async_trait::async_trait]
impl PortalService for ReqwestService {
    async fn analyze(&self, identifier: &str) -> Result<AnalysisOutcome, ServiceError> {
        let url = self.endpoint("ocr", identifier)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let payload: OcrPayload = Self::read_json(response).await?;

        if let Some(error) = payload.error.filter(|message| !message.is_empty()) {
            return Ok(AnalysisOutcome::Rejected(error));
        }
        let texts = payload
            .texts
            .unwrap_or_default()
            .into_iter()
            .map(|item| match item {
                Some(item) => RecognizedText {
                    text: item.text,
                    confidence: item.confidence.as_ref().and_then(serde_json::Value::as_f64),
                },
                None => RecognizedText::default(),
            })
            .collect();
        Ok(AnalysisOutcome::Recognized(texts))
    }

    async fn delete(&self, identifier: &str) -> Result<DeleteOutcome, ServiceError> {
        let url = self.endpoint("delete", identifier)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: DeletePayload = Self::read_json(response).await?;
        if payload.success {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Rejected(payload.error))
        }
    }

    async fn upload(&self, roll_no: &str, file: &Path) -> Result<UploadReceipt, ServiceError> {
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .ok_or_else(|| ServiceError::new(FailureKind::Io, "upload path has no file name"))?;
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|err| ServiceError::new(FailureKind::Io, err.to_string()))?;

        let form = multipart::Form::new()
            .text("roll_no", roll_no.to_string())
            .part("file", multipart::Part::bytes(bytes).file_name(file_name.clone()));
        let response = self
            .client
            .post(self.base.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(UploadReceipt {
            status: status.as_u16(),
            stored_as: format!("{roll_no}/{file_name}"),
        })
    }

    async fn download(&self, identifier: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint("download", identifier)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ServiceError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "download too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ServiceError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "download too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
