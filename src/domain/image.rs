use crate::utils::error::{GlanceError, Result};
use crate::utils::validation::validate_file_extension;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

pub const INVALID_IMAGE_FORMAT: &str = "Invalid image format. Only JPEG and PNG are supported.";

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    fn from_data_url(data_url: &str) -> Option<Self> {
        if data_url.starts_with("data:image/jpeg") {
            Some(Self::Jpeg)
        } else if data_url.starts_with("data:image/png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// A decoded JPEG or PNG upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    mime: ImageMime,
    bytes: Vec<u8>,
}

// 避免把整張圖片印進日誌
impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("mime", &self.mime.as_str())
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageData {
    pub fn new(mime: ImageMime, bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(GlanceError::invalid_image("Image payload is empty"));
        }
        Ok(Self { mime, bytes })
    }

    /// Parses a browser data URL such as `data:image/png;base64,iVBOR...`.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let data_url = data_url.trim();
        let mime = ImageMime::from_data_url(data_url)
            .ok_or_else(|| GlanceError::invalid_image(INVALID_IMAGE_FORMAT))?;

        let (_, payload) = data_url
            .split_once(',')
            .ok_or_else(|| GlanceError::invalid_image("Data URL has no payload"))?;

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| GlanceError::invalid_image(format!("Invalid base64 payload: {}", e)))?;

        Self::new(mime, bytes)
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension =
            validate_file_extension("image", &path.to_string_lossy(), &ALLOWED_EXTENSIONS)?;
        let mime = ImageMime::from_extension(&extension)
            .ok_or_else(|| GlanceError::invalid_image(INVALID_IMAGE_FORMAT))?;

        let bytes = tokio::fs::read(path).await?;
        Self::new(mime, bytes)
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), self.to_base64())
    }
}
