use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use actix_multipart::Multipart;
use futures::TryStreamExt;
use log::{error, warn};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::helpers::ipfs::{extension_for, validate_video_size, validate_video_type};

/// Upper bound on the `application/json` part; it only carries upload options.
pub const MAX_JSON_PART_SIZE: usize = 64 * 1024;

/// A file field spooled to the temp dir. The file is deleted when this is dropped.
pub struct MultipartFile {
    pub path: PathBuf,
    pub mime: String,
    pub file_name: String,
    pub size: u64,
}

impl Drop for MultipartFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Couldn't remove temp file {}: {}", self.path.display(), e);
            }
        }
    }
}

pub struct ParsedMultipart<D> {
    pub files: HashMap<String, MultipartFile>,
    pub data: Option<D>, // JSON part of the multipart
}

fn malformed(e: impl std::fmt::Display) -> ApiError {
    ApiError::Validation(format!("Couldn't parse multipart: {}", e))
}

fn io_failure(e: std::io::Error) -> ApiError {
    error!("Temp file write failed: {}", e);
    ApiError::Internal("Couldn't store the uploaded file".to_string())
}

fn append_json_chunk(data: &mut Vec<u8>, chunk: &[u8]) -> Result<(), ApiError> {
    if data.len() + chunk.len() > MAX_JSON_PART_SIZE {
        return Err(ApiError::Validation(format!(
            "JSON part exceeds {} bytes",
            MAX_JSON_PART_SIZE
        )));
    }
    data.extend_from_slice(chunk);
    Ok(())
}

/*
    Reads every field of the multipart. `application/json` parts deserialize into D,
    file parts stream to disk. A file whose type isn't an allowed video type, or that
    grows past the size ceiling, aborts the parse and its partial file is removed.
*/
pub async fn attempt_parse_multipart<D: DeserializeOwned>(mut multipart: Multipart) -> Result<ParsedMultipart<D>, ApiError> {
    let mut parsed_multipart: ParsedMultipart<D> = ParsedMultipart {
        files: HashMap::new(),
        data: None,
    };

    while let Some(mut field) = multipart.try_next().await.map_err(malformed)? {
        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        let name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let file_name = field.content_disposition().get_filename().map(str::to_string);

        if mime == "application/json" {
            let mut data: Vec<u8> = Vec::new();

            while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                append_json_chunk(&mut data, &chunk)?;
            }

            let data: D = serde_json::from_slice(&data).map_err(|_| ApiError::Validation("Failed to deserialize JSON".to_string()))?;
            parsed_multipart.data = Some(data);
            continue;
        }

        let file_name = match file_name {
            Some(v) => v,
            None => {
                // plain text field, nothing we read
                while field.try_next().await.map_err(malformed)?.is_some() {}
                continue;
            }
        };

        validate_video_type(&mime)?;

        let ext = extension_for(&mime);
        let path = std::env::temp_dir().join(format!("{}.{}", Uuid::new_v4(), ext));

        let mut file = tokio::fs::File::create(&path).await.map_err(io_failure)?;
        let mut multipart_file = MultipartFile {
            path,
            mime,
            file_name,
            size: 0,
        };

        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            multipart_file.size += chunk.len() as u64;
            validate_video_size(multipart_file.size)?;
            file.write_all(&chunk).await.map_err(io_failure)?;
        }

        file.flush().await.map_err(io_failure)?;

        parsed_multipart.files.insert(name, multipart_file);
    }

    Ok(parsed_multipart)
}
