use crate::common::error::{AppError, AppResult};
use crate::infrastructure::storage::s3::StorageService;
use anyhow::anyhow;
use axum::extract::multipart::Field;
use bytes::{Bytes, BytesMut};
use tracing::{error, info};
use uuid::Uuid;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Checks that the declared content type is an image and picks a file extension for it.
pub fn image_extension(content_type: &str) -> AppResult<&'static str> {
    let mime: mime::Mime = content_type
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid content type: {}", content_type)))?;

    if mime.type_() != mime::IMAGE {
        return Err(AppError::validation("Invalid content type: only image/* allowed"));
    }

    Ok(mime_guess::get_mime_extensions(&mime)
        .and_then(|exts| exts.first().copied())
        .unwrap_or("img"))
}

/// Buffers a multipart field, rejecting bodies over `max_bytes`.
pub async fn read_limited(mut field: Field<'_>, max_bytes: usize) -> AppResult<Bytes> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::validation(format!("Stream interrupted: {}", e)))?
    {
        if buffer.len() + chunk.len() > max_bytes {
            return Err(AppError::validation(format!(
                "File too large: limit is {} bytes",
                max_bytes
            )));
        }
        buffer.extend_from_slice(&chunk);
    }

    if buffer.is_empty() {
        return Err(AppError::validation("Empty file"));
    }

    Ok(buffer.freeze())
}

/// Stores an avatar image and returns its public URL.
pub async fn store_avatar(
    storage: &StorageService,
    field: Field<'_>,
    user_id: Uuid,
) -> AppResult<String> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let extension = image_extension(&content_type)?;
    let body = read_limited(field, MAX_AVATAR_BYTES).await?;

    let key = format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), extension);
    let size = body.len();

    let url = storage
        .put_object(&key, body, &content_type)
        .await
        .map_err(|e| {
            error!("Avatar upload failed: {}", e);
            AppError::Internal(anyhow!("Upload failed: {}", e))
        })?;

    info!("Stored avatar {} ({} bytes)", key, size);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_images_only() {
        assert!(image_extension("image/png").is_ok());
        assert!(image_extension("image/jpeg").is_ok());
        assert!(matches!(image_extension("video/mp4"), Err(AppError::Validation(_))));
        assert!(matches!(image_extension("not a mime"), Err(AppError::Validation(_))));
    }
}
