use crate::error::{AppError, ValidationError};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A film manufacturer reference. Names are unique case-insensitively;
/// resolution happens in the reconciliation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manufacturer {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
}

impl Manufacturer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "Name must not be empty").into());
        }
        if self.name.len() > 100 {
            return Err(
                ValidationError::new("name", "Name must not exceed 100 characters").into(),
            );
        }
        Ok(())
    }
}

impl<'r> TryFrom<&Row<'r>> for Manufacturer {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        Ok(Manufacturer {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            name: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Manufacturer::new("Kodak").validate().is_ok());
        assert!(Manufacturer::new("  ").validate().is_err());
    }
}
