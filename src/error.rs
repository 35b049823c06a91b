use std::fmt;

/// A field-level validation failure, with enough structure for the caller
/// to highlight the offending input. `index` is set when the field is a
/// list (e.g. the third expiry date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub index: Option<usize>,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            index: None,
            message: message.into(),
        }
    }

    pub fn at_index(field: &'static str, index: usize, message: impl Into<String>) -> Self {
        Self {
            field,
            index: Some(index),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]: {}", self.field, i, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// Central error types for the film stock engine
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Io(std::io::Error),
    /// Validation error (invalid field on a record)
    Validation(ValidationError),
    /// Resource not found
    NotFound(String),
    /// A load or quantity change would consume more film than is in stock
    InsufficientStock(String),
    /// All five camera slots are occupied
    CapacityExceeded,
    /// Manufacturer still referenced by ledger rows
    ManufacturerInUse(String),
    /// Photo storage error
    PhotoStore(photo_store::PhotoStoreError),
    /// General error
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Io(e) => write!(f, "Filesystem error: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InsufficientStock(msg) => write!(f, "Insufficient stock: {}", msg),
            AppError::CapacityExceeded => write!(f, "All camera slots are occupied"),
            AppError::ManufacturerInUse(name) => {
                write!(f, "Manufacturer '{}' is still in use", name)
            }
            AppError::PhotoStore(e) => write!(f, "Photo storage error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl From<photo_store::PhotoStoreError> for AppError {
    fn from(e: photo_store::PhotoStoreError) -> Self {
        AppError::PhotoStore(e)
    }
}

/// User-friendly error messages for the embedding UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred. Please try again.".to_string(),
            AppError::Io(_) => "Error accessing files. Please check app permissions.".to_string(),
            AppError::Validation(e) => e.message.clone(),
            AppError::NotFound(msg) => format!("{} was not found.", msg),
            AppError::InsufficientStock(msg) => msg.clone(),
            AppError::CapacityExceeded => {
                "You already have 5 films loaded. Finish one first.".to_string()
            }
            AppError::ManufacturerInUse(name) => format!(
                "{} still has film in your inventory and cannot be removed.",
                name
            ),
            AppError::PhotoStore(_) => "Error processing the reminder photo.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }
}
