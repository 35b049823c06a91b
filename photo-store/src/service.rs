use crate::models::{PhotoMetadata, PhotoStoreConfig};
use crate::thumbnail::{create_thumbnail, ThumbnailError};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Error type for photo store operations
#[derive(Debug)]
pub enum PhotoStoreError {
    IoError(std::io::Error),
    ThumbnailError(ThumbnailError),
    MetadataError(String),
    Other(String),
}

impl std::fmt::Display for PhotoStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoStoreError::IoError(e) => write!(f, "IO error: {}", e),
            PhotoStoreError::ThumbnailError(e) => write!(f, "Thumbnail error: {}", e),
            PhotoStoreError::MetadataError(msg) => write!(f, "Metadata error: {}", msg),
            PhotoStoreError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PhotoStoreError {}

impl From<std::io::Error> for PhotoStoreError {
    fn from(err: std::io::Error) -> Self {
        PhotoStoreError::IoError(err)
    }
}

impl From<ThumbnailError> for PhotoStoreError {
    fn from(err: ThumbnailError) -> Self {
        PhotoStoreError::ThumbnailError(err)
    }
}

/// Filesystem photo store
pub struct PhotoStore {
    config: PhotoStoreConfig,
}

impl PhotoStore {
    /// Initialize the photo store with configuration
    pub fn new(config: PhotoStoreConfig) -> Self {
        Self { config }
    }

    /// Returns the absolute path to a stored photo (for UI display)
    pub fn absolute_path(&self, relative_path: &str) -> PathBuf {
        PathBuf::from(self.config.storage_path.trim_end_matches('/')).join(relative_path)
    }

    /// Stores photo bytes for a film product and returns the relative path.
    ///
    /// The file name is derived from the product identity plus a content-hash
    /// prefix, so re-storing identical bytes for the same product is a no-op
    /// that returns the existing path.
    pub fn store(
        &self,
        bytes: &[u8],
        manufacturer: &str,
        name: &str,
    ) -> Result<String, PhotoStoreError> {
        let checksum = format!("{:x}", Sha256::digest(bytes));
        let relative_path = format!(
            "{}/{}-{}.jpg",
            slug(manufacturer),
            slug(name),
            &checksum[..8]
        );

        let target = self.absolute_path(&relative_path);
        if target.exists() {
            log::debug!("Photo already stored at {}", relative_path);
            return Ok(relative_path);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        log::debug!("Photo stored at {:?} ({} bytes)", target, bytes.len());

        if self.config.enable_thumbnails {
            let thumb = create_thumbnail(bytes, self.config.thumbnail_size)?;
            fs::write(thumbnail_path(&target), thumb)?;
        }

        let metadata = PhotoMetadata {
            manufacturer: manufacturer.to_string(),
            name: name.to_string(),
            checksum,
            byte_len: bytes.len() as u64,
            relative_path: relative_path.clone(),
        };
        let toml_str = metadata
            .to_toml()
            .map_err(|e| PhotoStoreError::MetadataError(e.to_string()))?;
        fs::write(sidecar_path(&target), toml_str)?;

        Ok(relative_path)
    }

    /// Reads back the bytes of a stored photo, or `None` if the file is gone
    pub fn resolve(&self, relative_path: &str) -> Result<Option<Vec<u8>>, PhotoStoreError> {
        let path = self.absolute_path(relative_path);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    /// Reads the sidecar metadata of a stored photo
    pub fn metadata(&self, relative_path: &str) -> Result<Option<PhotoMetadata>, PhotoStoreError> {
        let path = sidecar_path(&self.absolute_path(relative_path));
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let meta = PhotoMetadata::from_toml(&content)
            .map_err(|e| PhotoStoreError::MetadataError(e.to_string()))?;
        Ok(Some(meta))
    }

    /// Removes a stored photo together with its thumbnail and sidecar.
    /// Missing files are ignored so removal is idempotent.
    pub fn remove(&self, relative_path: &str) -> Result<(), PhotoStoreError> {
        let path = self.absolute_path(relative_path);
        for p in [thumbnail_path(&path), sidecar_path(&path), path] {
            if p.exists() {
                fs::remove_file(p)?;
            }
        }
        Ok(())
    }
}

fn thumbnail_path(photo: &PathBuf) -> PathBuf {
    photo.with_extension("thumb.webp")
}

fn sidecar_path(photo: &PathBuf) -> PathBuf {
    photo.with_extension("toml")
}

/// Lowercases and reduces a display name to a filesystem-safe slug
fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("photo");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn sample_jpeg() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(32, 32);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        buffer.into_inner()
    }

    fn test_store() -> (PhotoStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(PhotoStoreConfig {
            storage_path: dir.path().to_string_lossy().to_string(),
            enable_thumbnails: true,
            thumbnail_size: 16,
        });
        (store, dir)
    }

    #[test]
    fn test_store_and_resolve() {
        let (store, _dir) = test_store();
        let bytes = sample_jpeg();

        let path = store.store(&bytes, "Kodak", "Portra 400").unwrap();
        assert!(path.starts_with("kodak/portra-400-"));

        let resolved = store.resolve(&path).unwrap().unwrap();
        assert_eq!(resolved, bytes);

        let meta = store.metadata(&path).unwrap().unwrap();
        assert_eq!(meta.manufacturer, "Kodak");
        assert_eq!(meta.byte_len, bytes.len() as u64);
    }

    #[test]
    fn test_store_is_idempotent() {
        let (store, _dir) = test_store();
        let bytes = sample_jpeg();

        let first = store.store(&bytes, "Ilford", "HP5+").unwrap();
        let second = store.store(&bytes, "Ilford", "HP5+").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_missing_returns_none() {
        let (store, _dir) = test_store();
        assert!(store.resolve("kodak/gone.jpg").unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let (store, _dir) = test_store();
        let path = store.store(&sample_jpeg(), "Fuji", "Provia 100F").unwrap();

        store.remove(&path).unwrap();
        assert!(store.resolve(&path).unwrap().is_none());
        // second removal is a no-op
        store.remove(&path).unwrap();
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Portra 400"), "portra-400");
        assert_eq!(slug("HP5+"), "hp5");
        assert_eq!(slug("  "), "photo");
    }
}
