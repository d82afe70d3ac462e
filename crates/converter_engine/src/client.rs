use std::error::Error as _;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use converter_logging::{converter_debug, converter_info, converter_warn, SERVICE_TARGET};
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use serde::de::DeserializeOwned;

use crate::persist::{sanitize_filename, PendingFile, PersistError};
use crate::wire::{ConvertResponse, ErrorResponse, ProgressResponse, UrlRequest, ValidateResponse};
use crate::{FailureKind, ProgressSnapshot, ServiceEndpoint, ServiceError, VideoInfo};

const INVALID_URL: &str = "Invalid URL";
const CONVERSION_REFUSED: &str = "Conversion failed to start";
const FILE_UNAVAILABLE: &str = "File not available";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub connect_timeout: Duration,
    /// Whole-call limit for the JSON calls, and the longest a download may
    /// stall between two reads.
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
    /// Largest JSON answer accepted from the service.
    pub max_response_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            output_dir: PathBuf::from("downloads"),
            max_response_bytes: 1024 * 1024,
        }
    }
}

/// The four calls of the conversion service.
#[async_trait::async_trait]
pub trait ConversionService: Send + Sync {
    async fn validate(&self, url: &str) -> Result<VideoInfo, ServiceError>;

    /// Asks the service to start a job; returns its progress id.
    async fn start_conversion(&self, url: &str) -> Result<String, ServiceError>;

    async fn progress(&self, progress_id: &str) -> Result<ProgressSnapshot, ServiceError>;

    /// Streams the finished file into `dest_dir` and returns where it landed.
    async fn download(&self, progress_id: &str, dest_dir: &Path)
        -> Result<PathBuf, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestService {
    endpoint: ServiceEndpoint,
    request_timeout: Duration,
    max_response_bytes: u64,
    client: reqwest::Client,
}

impl ReqwestService {
    pub fn new(endpoint: ServiceEndpoint, settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            endpoint,
            request_timeout: settings.request_timeout,
            max_response_bytes: settings.max_response_bytes,
            client,
        })
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Sends a request and decodes its JSON body whatever the status code,
    /// the way the service reports refusals.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(reqwest::StatusCode, T), ServiceError> {
        let response = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = self.read_body(response).await?;
        let decoded = serde_json::from_slice::<T>(&body).map_err(|err| {
            if status.is_success() {
                ServiceError::new(FailureKind::Decode, err.to_string())
            } else {
                ServiceError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
            }
        })?;
        Ok((status, decoded))
    }

    /// Collects a JSON body, refusing anything over `max_response_bytes`.
    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ServiceError> {
        let max_bytes = self.max_response_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ConversionService for ReqwestService {
    async fn validate(&self, url: &str) -> Result<VideoInfo, ServiceError> {
        let call_url = self.endpoint.validate_url();
        converter_debug!(target: SERVICE_TARGET, "POST {} url={}", call_url, url);
        let (status, body): (_, ValidateResponse) = self
            .send_json(self.client.post(call_url).json(&UrlRequest { url }))
            .await?;

        if status.is_success() && body.valid {
            Ok(body.info.map(VideoInfo::from).unwrap_or_default())
        } else {
            let reason = body.error.unwrap_or_else(|| INVALID_URL.to_string());
            converter_info!(target: SERVICE_TARGET, "validate rejected status={} reason={}", status, reason);
            Err(ServiceError::new(FailureKind::Rejected, reason))
        }
    }

    async fn start_conversion(&self, url: &str) -> Result<String, ServiceError> {
        let call_url = self.endpoint.convert_url();
        converter_debug!(target: SERVICE_TARGET, "POST {} url={}", call_url, url);
        let (status, body): (_, ConvertResponse) = self
            .send_json(self.client.post(call_url).json(&UrlRequest { url }))
            .await?;

        if !status.is_success() {
            let reason = body.error.unwrap_or_else(|| CONVERSION_REFUSED.to_string());
            converter_info!(target: SERVICE_TARGET, "convert rejected status={} reason={}", status, reason);
            return Err(ServiceError::new(FailureKind::Rejected, reason));
        }
        match body.progress_id {
            Some(id) if !id.is_empty() => {
                converter_info!(target: SERVICE_TARGET, "conversion started progress_id={}", id);
                Ok(id)
            }
            _ => Err(ServiceError::new(
                FailureKind::Decode,
                "response carries no progress_id",
            )),
        }
    }

    async fn progress(&self, progress_id: &str) -> Result<ProgressSnapshot, ServiceError> {
        let call_url = self.endpoint.progress_url(progress_id);
        let response = self
            .client
            .get(call_url)
            .timeout(self.request_timeout)
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
        let body = self.read_body(response).await?;
        let body: ProgressResponse = serde_json::from_slice(&body)
            .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))?;
        let snapshot = ProgressSnapshot::from(body);
        converter_debug!(
            target: SERVICE_TARGET,
            "progress_id={} status={:?} percent={}",
            progress_id,
            snapshot.status,
            snapshot.percent
        );
        Ok(snapshot)
    }

    async fn download(
        &self,
        progress_id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ServiceError> {
        let call_url = self.endpoint.download_url(progress_id);
        converter_info!(target: SERVICE_TARGET, "GET {}", call_url);
        let response = self
            .client
            .get(call_url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| FILE_UNAVAILABLE.to_string());
            converter_warn!(target: SERVICE_TARGET, "download refused status={} reason={}", status, reason);
            return Err(ServiceError::new(FailureKind::Rejected, reason));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .and_then(|name| sanitize_filename(&name))
            .or_else(|| sanitize_filename(&format!("{progress_id}.mp3")))
            .unwrap_or_else(|| "download.mp3".to_string());

        let mut file = PendingFile::create(dest_dir, &filename).map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk.map_err(map_reqwest_error)?;
            file.write_chunk(&chunk).map_err(map_persist_error)?;
        }
        let written = file.bytes_written();
        let path = file.commit().map_err(map_persist_error)?;
        converter_info!(
            target: SERVICE_TARGET,
            "saved progress_id={} bytes={} path={:?}",
            progress_id,
            written,
            path
        );
        Ok(path)
    }
}

/// Extracts the `filename` parameter of a `Content-Disposition` header.
fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .filter(|name| !name.is_empty())
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> ServiceError {
    ServiceError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "response too large",
    )
}

/// True when a socket read in the error chain gave up waiting.
fn is_read_timeout(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_err| io_err.kind() == io::ErrorKind::TimedOut)
        {
            return true;
        }
        source = cause.source();
    }
    false
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() || is_read_timeout(&err) {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> ServiceError {
    ServiceError::new(FailureKind::Io, err.to_string())
}
