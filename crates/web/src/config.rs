use std::time::Duration;

use anyhow::{Context, Result};

use crate::media::CloudinaryConfig;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MEDIA_ROOT: &str = "/kompetisi-id/competition";
const DEFAULT_CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Budget shared by every downstream call of one request
    pub request_timeout: Duration,
    /// Upload folder prefix; posters land in `{media_root}/{username}/{year}`
    pub media_root: String,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let request_timeout_secs = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            request_timeout: Duration::from_secs(request_timeout_secs),
            media_root: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| DEFAULT_MEDIA_ROOT.into()),
            cloudinary: CloudinaryConfig {
                api_url: std::env::var("CLOUDINARY_API_URL")
                    .unwrap_or_else(|_| DEFAULT_CLOUDINARY_API_URL.into()),
                cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME")
                    .context("Cannot load CLOUDINARY_CLOUD_NAME env variable")?,
                upload_preset: std::env::var("CLOUDINARY_UPLOAD_PRESET")
                    .context("Cannot load CLOUDINARY_UPLOAD_PRESET env variable")?,
            },
        })
    }
}
