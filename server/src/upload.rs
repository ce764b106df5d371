//! # Media uploads
//!
//! Avatar, banner and post images go to an external image host. The host is
//! an opaque collaborator: it either answers with a hosted URL or the upload
//! fails. Retry and backoff are its problem, not ours.
//!
//! Profile media additionally gets a CDN transform baked into the stored
//! URL, so the frontend never requests the original asset.
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use crate::{config::Config, error::AppError};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const PROFILE_TRANSFORM: &str = "/upload/w_600,h_400,c_fill,e_grayscale,r_20,f_auto,q_auto/";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Falha no envio da imagem: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Resposta do serviço de imagens sem URL")]
    MissingUrl,
}

pub fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Checks the extension whitelist and the size cap before any bytes leave
/// the process.
pub fn validate_image(file_name: &str, size: usize) -> Result<(), AppError> {
    let permitida = extension(file_name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);

    if !permitida {
        return Err(AppError::UnsupportedMedia);
    }

    if size > MAX_IMAGE_BYTES {
        return Err(AppError::ImageTooLarge);
    }

    Ok(())
}

/// Rewrites a hosted URL so the CDN serves the profile-media rendition.
pub fn transform_url(url: &str) -> String {
    url.replacen("/upload/", PROFILE_TRANSFORM, 1)
}

#[derive(Deserialize)]
struct HostResponse {
    secure_url: Option<String>,
}

pub struct MediaUploader {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
}

impl MediaUploader {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                config.media_cloud
            ),
            api_key: config.media_key.clone(),
            api_secret: config.media_secret.clone(),
        }
    }

    /// One attempt against the image host. The caller decides what a failure
    /// means; nothing is retried here.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("api_secret", self.api_secret.clone())
            .text("folder", folder.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let host_response: HostResponse = response.json().await?;

        host_response.secure_url.ok_or(UploadError::MissingUrl)
    }
}
