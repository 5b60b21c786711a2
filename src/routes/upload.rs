use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use log::{error, info};
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::helpers::ipfs::validate_video_file;
use crate::helpers::multipart_parsing::attempt_parse_multipart;
use crate::helpers::pinata::{PinResult, PinUpload, Pinner, ProgressCallback, UploadProgress};
use crate::models::UploadResponse;
use crate::AppState;

const MISSING_SERVER_TOKEN: &str = "PINATA_JWT environment variable not configured on server";

#[derive(Deserialize, Validate)]
pub struct UploadVideoData {
    /// Overrides the pinned file name.
    #[validate(length(min = 1, max = 100))]
    name: Option<String>,
}

impl UploadResponse {
    fn pinned(pin: PinResult) -> Self {
        UploadResponse {
            success: true,
            ipfs_hash: Some(pin.ipfs_hash),
            pinata_url: Some(pin.pinata_url),
            gateway_url: Some(pin.gateway_url),
            error: None,
            allow_token_fallback: false,
        }
    }

    /// The client should offer the bring-your-own-token upload when the server path is unusable.
    fn failed(error: String) -> Self {
        let allow_token_fallback = error.contains("PINATA_JWT") || error.contains("Server upload failed");

        UploadResponse {
            success: false,
            ipfs_hash: None,
            pinata_url: None,
            gateway_url: None,
            error: Some(error),
            allow_token_fallback,
        }
    }
}

fn respond(result: Result<PinResult, ApiError>) -> HttpResponse {
    match result {
        Ok(pin) => HttpResponse::Ok().json(UploadResponse::pinned(pin)),
        Err(e) => HttpResponse::build(e.status_code()).json(UploadResponse::failed(e.to_string())),
    }
}

/// Parses and validates the upload, pins it, and drops the temp file either way.
async fn pin_upload(
    payload: Multipart,
    pinner: &dyn Pinner,
    token: &str,
    progress: Option<ProgressCallback>,
) -> Result<PinResult, ApiError> {
    let parsed = attempt_parse_multipart::<UploadVideoData>(payload).await?;

    if let Some(data) = &parsed.data {
        data.validate()?;
    }

    let file = match parsed.files.get("file") {
        Some(v) => v,
        None => return Err(ApiError::Validation("No file provided".to_string())),
    };

    validate_video_file(&file.mime, file.size)?;

    let file_name = parsed
        .data
        .as_ref()
        .and_then(|d| d.name.clone())
        .unwrap_or_else(|| file.file_name.clone());

    info!("Received {} ({} bytes)", file_name, file.size);

    let upload = PinUpload {
        path: file.path.clone(),
        file_name,
        mime: file.mime.clone(),
        size: file.size,
    };

    pinner.pin_file(upload, token, progress).await
}

/// Pins with the server-held token.
pub async fn upload_video(payload: Multipart, state: web::Data<AppState>) -> HttpResponse {
    let token = match &state.config.pinata_jwt {
        Some(v) => v,
        None => {
            error!("Upload refused: PINATA_JWT is not configured");
            return respond(Err(ApiError::Config(MISSING_SERVER_TOKEN.to_string())));
        }
    };

    let result = pin_upload(payload, state.pinner.as_ref(), token, None)
        .await
        .map_err(|e| match e {
            ApiError::Upload(message) => ApiError::Upload(format!("Server upload failed: {}", message)),
            e => e,
        });

    respond(result)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn log_progress() -> ProgressCallback {
    let logged = AtomicU8::new(0);

    Arc::new(move |progress: UploadProgress| {
        let step = progress.percentage / 10 * 10;
        if logged.fetch_max(step, Ordering::Relaxed) < step {
            info!("Upload {}% ({}/{} bytes)", step, progress.uploaded, progress.total);
        }
    })
}

/// Pins with the caller's own token, sent as `Authorization: Bearer`.
pub async fn upload_video_direct(req: HttpRequest, payload: Multipart, state: web::Data<AppState>) -> HttpResponse {
    let token = match bearer_token(&req) {
        Some(v) => v,
        None => return respond(Err(ApiError::Validation("Pinata JWT is required".to_string()))),
    };

    respond(pin_upload(payload, state.pinner.as_ref(), &token, Some(log_progress())).await)
}
