//! Storage of uploaded media files under the media root

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{
    config::MediaConfig,
    error::{AppError, AppResult},
};

/// Sub-directory of the media root holding profile photos
pub const PROFILE_PHOTO_DIR: &str = "profile_photos";

#[derive(Clone)]
pub struct MediaService {
    config: MediaConfig,
}

impl MediaService {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Write a profile photo and return its path relative to the media root
    pub async fn save_profile_photo(
        &self,
        user_id: i64,
        content_type: Option<&str>,
        data: &[u8],
    ) -> AppResult<String> {
        let extension = image_extension(content_type).ok_or_else(|| {
            AppError::Validation("Profile photo must be a JPEG, PNG, GIF or WebP image".to_string())
        })?;

        if data.is_empty() {
            return Err(AppError::Validation("Profile photo is empty".to_string()));
        }
        if data.len() > self.config.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "Profile photo exceeds {} bytes",
                self.config.max_upload_bytes
            )));
        }

        let relative = format!(
            "{}/user_{}_{}.{}",
            PROFILE_PHOTO_DIR,
            user_id,
            Utc::now().timestamp_millis(),
            extension
        );
        let target = self.config.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;
        }
        tokio::fs::write(&target, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store profile photo: {}", e)))?;

        tracing::debug!(user_id, path = %relative, bytes = data.len(), "Profile photo stored");
        Ok(relative)
    }

    /// Remove a stored file; a file already gone is not an error
    pub async fn remove(&self, relative: &str) -> AppResult<()> {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(path = %relative, "Refusing to remove path outside media root");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to remove media file: {}", e))),
        }
    }

    /// Public URL of a stored file
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), relative)
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        (!escapes).then(|| self.config.root.join(relative))
    }
}

fn image_extension(content_type: Option<&str>) -> Option<&'static str> {
    match content_type?.split(';').next()?.trim() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
