use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;

/// Error type for thumbnail operations
#[derive(Debug)]
pub enum ThumbnailError {
    ImageLoadError(String),
    ImageSaveError(String),
    IoError(std::io::Error),
}

impl std::fmt::Display for ThumbnailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThumbnailError::ImageLoadError(msg) => write!(f, "Image load error: {}", msg),
            ThumbnailError::ImageSaveError(msg) => write!(f, "Image save error: {}", msg),
            ThumbnailError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ThumbnailError {}

impl From<std::io::Error> for ThumbnailError {
    fn from(err: std::io::Error) -> Self {
        ThumbnailError::IoError(err)
    }
}

/// Creates a WebP thumbnail from image bytes, bounded by `size` on the
/// longest edge. Returns the encoded thumbnail bytes.
pub fn create_thumbnail(bytes: &[u8], size: u32) -> Result<Vec<u8>, ThumbnailError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ThumbnailError::ImageLoadError(format!("Failed to load image: {}", e)))?;

    let thumb = img.resize(size, size, FilterType::Lanczos3);

    let mut buffer = Cursor::new(Vec::new());
    thumb
        .write_to(&mut buffer, ImageFormat::WebP)
        .map_err(|e| {
            ThumbnailError::ImageSaveError(format!("Failed to write thumbnail: {}", e))
        })?;

    Ok(buffer.into_inner())
}
