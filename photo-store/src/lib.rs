//! Photo storage library for reminder photos.
//!
//! Stores image bytes on the filesystem under a configurable base directory,
//! names files by content hash, generates a thumbnail per photo and writes a
//! TOML sidecar with the owning product's metadata. The embedding application
//! keeps only the returned relative path in its own records.

pub mod models;
pub mod service;
pub mod thumbnail;

pub use models::{PhotoMetadata, PhotoStoreConfig};
pub use service::{PhotoStore, PhotoStoreError};
