use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures::TryStreamExt;
use log::{error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;

use crate::errors::ApiError;
use crate::helpers::ipfs::{ipfs_url, Gateway};

/// A file already on local disk, ready to be pinned.
pub struct PinUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub percentage: u8,
    pub uploaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn new(uploaded: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            (u128::from(uploaded) * 100 / u128::from(total)).min(100) as u8
        };

        UploadProgress {
            percentage,
            uploaded,
            total,
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct PinResult {
    pub ipfs_hash: String,
    pub pinata_url: String,
    pub gateway_url: String,
}

impl PinResult {
    pub fn new(ipfs_hash: String) -> Self {
        PinResult {
            pinata_url: ipfs_url(Some(&ipfs_hash), Gateway::Pinata),
            gateway_url: ipfs_url(Some(&ipfs_hash), Gateway::Ipfs),
            ipfs_hash,
        }
    }
}

#[derive(Deserialize)]
struct PinFileResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[async_trait]
pub trait Pinner: Send + Sync {
    async fn pin_file(
        &self,
        upload: PinUpload,
        token: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<PinResult, ApiError>;
}

pub struct PinataClient {
    client: reqwest::Client,
    api_url: String,
}

impl PinataClient {
    pub fn new(api_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Config(format!("Couldn't build Pinata client: {}", e)))?;

        Ok(PinataClient {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

fn pin_metadata(file_name: &str) -> Value {
    json!({
        "name": file_name,
        "keyvalues": {
            "type": "video",
            "uploadedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    })
}

fn pin_options() -> Value {
    json!({ "cidVersion": 1 })
}

#[async_trait]
impl Pinner for PinataClient {
    async fn pin_file(
        &self,
        upload: PinUpload,
        token: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<PinResult, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::Upload("Pinata JWT is required".to_string()));
        }

        let file = tokio::fs::File::open(&upload.path).await.map_err(|e| {
            error!("Couldn't open {}: {}", upload.path.display(), e);
            ApiError::Internal("Couldn't read the uploaded file".to_string())
        })?;

        let total = upload.size;
        let mut uploaded = 0u64;
        let stream = ReaderStream::new(file).inspect_ok(move |chunk| {
            uploaded += chunk.len() as u64;
            if let Some(progress) = &progress {
                progress(UploadProgress::new(uploaded, total));
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|_| ApiError::Validation(format!("Invalid file type: {}", upload.mime)))?;

        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", pin_metadata(&upload.file_name).to_string())
            .text("pinataOptions", pin_options().to_string());

        info!("Pinning {} ({} bytes)", upload.file_name, total);

        let res = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Pinata request failed: {}", e);
                ApiError::Upload("Network error during upload".to_string())
            })?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            error!("Pinata rejected the upload ({}): {}", status, body);
            return Err(ApiError::Upload(format!("Upload failed: {}", status)));
        }

        let body = res
            .json::<PinFileResponse>()
            .await
            .map_err(|_| ApiError::Upload("Failed to parse Pinata response".to_string()))?;

        info!("Pinned {} as {}", upload.file_name, body.ipfs_hash);

        Ok(PinResult::new(body.ipfs_hash))
    }
}
