use crate::error::{AppError, ValidationError};
use crate::models::FilmFormat;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A camera the user loads film into. The name is unique
/// (case-insensitive); the format affinity only ranks picker suggestions
/// and is never enforced when loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
    pub format: Option<FilmFormat>,
}

impl Camera {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            format: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "Camera name must not be empty").into());
        }
        if self.name.len() > 100 {
            return Err(
                ValidationError::new("name", "Camera name must not exceed 100 characters").into(),
            );
        }
        Ok(())
    }
}

impl<'r> TryFrom<&Row<'r>> for Camera {
    type Error = rusqlite::Error;

    // Column order: id, uuid, name, format, custom_format_name
    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        let format_str: Option<String> = row.get(3)?;
        let custom_format_name: Option<String> = row.get(4)?;

        Ok(Camera {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            name: row.get(2)?,
            format: format_str.map(|f| FilmFormat::from_columns(&f, custom_format_name)),
        })
    }
}
