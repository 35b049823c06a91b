use serde::{Deserialize, Serialize};

/// Configuration for the photo store
#[derive(Debug, Clone)]
pub struct PhotoStoreConfig {
    /// Base directory for stored photos
    pub storage_path: String,
    /// Whether to generate thumbnails alongside originals
    pub enable_thumbnails: bool,
    /// Longest edge of generated thumbnails, in pixels
    pub thumbnail_size: u32,
}

impl Default for PhotoStoreConfig {
    fn default() -> Self {
        Self {
            storage_path: "./photos".to_string(),
            enable_thumbnails: true,
            thumbnail_size: 512,
        }
    }
}

/// Sidecar metadata written next to each stored photo as TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub manufacturer: String,
    pub name: String,
    /// SHA256 hash of the photo bytes
    pub checksum: String,
    /// Size of the original file in bytes
    pub byte_len: u64,
    /// e.g. "kodak/portra-400-1a2b3c4d.jpg"
    pub relative_path: String,
}

impl PhotoMetadata {
    /// Converts to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Loads from TOML string
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
