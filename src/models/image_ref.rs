use serde::{Deserialize, Serialize};

/// How the reminder photo of a film unit is resolved.
///
/// The source precedence (a user-cropped photo beats a catalog image beats
/// auto-detection) is decided once in [`ImageRef::select`]; everything else
/// just switches on the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// No reminder photo
    #[default]
    None,
    /// Resolve by product identity against the bundled catalog heuristics
    AutoDetected,
    /// A photo taken by the user, stored in the photo store
    Custom(String),
    /// A concrete catalog entry id
    Catalog(String),
}

impl ImageRef {
    pub fn kind_str(&self) -> &'static str {
        match self {
            ImageRef::None => "none",
            ImageRef::AutoDetected => "auto",
            ImageRef::Custom(_) => "custom",
            ImageRef::Catalog(_) => "catalog",
        }
    }

    /// The value column for storage; `None` for the payload-free kinds
    pub fn value(&self) -> Option<&str> {
        match self {
            ImageRef::Custom(path) => Some(path),
            ImageRef::Catalog(id) => Some(id),
            _ => None,
        }
    }

    /// Reassembles a reference from its two storage columns. An unknown kind
    /// or a missing payload degrades to `None` rather than failing the row.
    pub fn from_columns(kind: &str, value: Option<String>) -> Self {
        match (kind, value) {
            ("auto", _) => ImageRef::AutoDetected,
            ("custom", Some(path)) => ImageRef::Custom(path),
            ("catalog", Some(id)) => ImageRef::Catalog(id),
            _ => ImageRef::None,
        }
    }

    /// Single deterministic resolution of the photo source precedence:
    /// custom photo, then catalog entry, then auto-detection.
    pub fn select(
        custom_path: Option<String>,
        catalog_id: Option<String>,
        auto_detected: bool,
    ) -> Self {
        if let Some(path) = custom_path {
            ImageRef::Custom(path)
        } else if let Some(id) = catalog_id {
            ImageRef::Catalog(id)
        } else if auto_detected {
            ImageRef::AutoDetected
        } else {
            ImageRef::None
        }
    }
}
