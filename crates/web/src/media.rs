use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("poster is empty")]
    Empty,

    #[error("poster is not valid base64")]
    Encoding(#[from] base64::DecodeError),

    #[error("poster data URI must be base64 encoded")]
    NotBase64DataUri,

    #[error("unsupported poster format")]
    UnsupportedFormat,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upload service responded with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected upload result: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A poster ready to be sent to the upload service: either a data URI or a
/// remote URL the service fetches itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterPayload(String);

impl PosterPayload {
    /// Accepts a `data:` URI, an http(s) URL, or bare base64 image bytes.
    /// Bare base64 is sniffed for its image type and wrapped into a data URI.
    pub fn resolve(raw: &str) -> Result<Self, PosterError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PosterError::Empty);
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self(raw.to_string()));
        }

        if let Some(rest) = raw.strip_prefix("data:") {
            let (_, data) = rest
                .split_once(";base64,")
                .ok_or(PosterError::NotBase64DataUri)?;
            STANDARD.decode(data)?;
            return Ok(Self(raw.to_string()));
        }

        let bytes = STANDARD.decode(raw)?;
        let mime = sniff_image_type(&bytes).ok_or(PosterError::UnsupportedFormat)?;

        Ok(Self(format!("data:{mime};base64,{raw}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

/// Upload-service result, stored verbatim alongside the competition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
pub trait MediaUploader: Send + Sync + 'static {
    async fn upload(&self, folder: &str, poster: &PosterPayload)
    -> Result<UploadedMedia, UploadError>;
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub api_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
}

/// Client for the Cloudinary unsigned upload API
pub struct CloudinaryUploader {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(
        &self,
        folder: &str,
        poster: &PosterPayload,
    ) -> Result<UploadedMedia, UploadError> {
        let public_id = Uuid::new_v4().simple().to_string();

        tracing::info!(folder, public_id = %public_id, "Uploading poster");

        let response = self
            .client
            .post(self.upload_url())
            .form(&[
                ("file", poster.as_str()),
                ("upload_preset", self.config.upload_preset.as_str()),
                ("folder", folder),
                ("public_id", public_id.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected { status, body });
        }

        let uploaded: UploadedMedia = response.json().await?;
        tracing::info!(public_id = %uploaded.public_id, "Poster uploaded");

        Ok(uploaded)
    }
}
