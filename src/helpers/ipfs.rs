use serde::Deserialize;

use crate::errors::ApiError;

pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024; // 500MB

pub const ALLOWED_VIDEO_TYPES: [&str; 4] = ["video/mp4", "video/webm", "video/ogg", "video/quicktime"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Pinata,
    Cloudflare,
    Ipfs,
}

impl Default for Gateway {
    fn default() -> Self {
        Gateway::Pinata
    }
}

impl Gateway {
    fn host(&self) -> &'static str {
        match self {
            Gateway::Pinata => "gateway.pinata.cloud",
            Gateway::Cloudflare => "cloudflare-ipfs.com",
            Gateway::Ipfs => "ipfs.io",
        }
    }
}

/// Gateway URL for a content hash. Accepts bare hashes and `ipfs://` URIs;
/// an empty hash gives an empty string.
pub fn ipfs_url(ipfs_hash: Option<&str>, gateway: Gateway) -> String {
    let hash = match ipfs_hash.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => {
            log::warn!("ipfs_url called without a content hash");
            return String::new();
        }
    };

    let hash = hash.strip_prefix("ipfs://").unwrap_or(hash);

    format!("https://{}/ipfs/{}", gateway.host(), hash)
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const SIZES: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let mut index = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && index < SIZES.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZES[index])
}

pub fn validate_video_type(mime: &str) -> Result<(), ApiError> {
    if ALLOWED_VIDEO_TYPES.contains(&mime) {
        return Ok(());
    }

    Err(ApiError::Validation(format!(
        "Invalid file type. Allowed types: {}",
        ALLOWED_VIDEO_TYPES.join(", ")
    )))
}

pub fn validate_video_size(size: u64) -> Result<(), ApiError> {
    if size > MAX_FILE_SIZE {
        return Err(ApiError::Validation(format!(
            "File size exceeds maximum allowed size of {}",
            format_file_size(MAX_FILE_SIZE)
        )));
    }

    Ok(())
}

pub fn validate_video_file(mime: &str, size: u64) -> Result<(), ApiError> {
    validate_video_type(mime)?;
    validate_video_size(size)
}

/// File extension used for temporary copies of an upload.
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/ogg" => "ogv",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}
