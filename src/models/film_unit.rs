use crate::error::{AppError, ValidationError};
use crate::models::expiry_date;
use crate::models::ImageRef;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilmType {
    BlackAndWhite,
    Color,
    Slide,
    Instant,
}

impl FilmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmType::BlackAndWhite => "black_and_white",
            FilmType::Color => "color",
            FilmType::Slide => "slide",
            FilmType::Instant => "instant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "black_and_white" => Some(FilmType::BlackAndWhite),
            "color" => Some(FilmType::Color),
            "slide" => Some(FilmType::Slide),
            "instant" => Some(FilmType::Instant),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FilmType::BlackAndWhite => "Black & White",
            FilmType::Color => "Color",
            FilmType::Slide => "Slide",
            FilmType::Instant => "Instant",
        }
    }

    pub fn all() -> &'static [FilmType] {
        static ALL: [FilmType; 4] = [
            FilmType::BlackAndWhite,
            FilmType::Color,
            FilmType::Slide,
            FilmType::Instant,
        ];
        &ALL
    }
}

/// Physical film format. Roll formats track one roll per ledger row;
/// sheet formats track a batch of sheets in a single row. `Other` carries
/// the user's free-text name for formats we do not enumerate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilmFormat {
    Mm35,
    Mm120,
    Mm110,
    Mm127,
    Mm220,
    Sheet4x5,
    Sheet5x7,
    Sheet8x10,
    Other(String),
}

impl FilmFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmFormat::Mm35 => "35mm",
            FilmFormat::Mm120 => "120",
            FilmFormat::Mm110 => "110",
            FilmFormat::Mm127 => "127",
            FilmFormat::Mm220 => "220",
            FilmFormat::Sheet4x5 => "4x5",
            FilmFormat::Sheet5x7 => "5x7",
            FilmFormat::Sheet8x10 => "8x10",
            FilmFormat::Other(_) => "other",
        }
    }

    /// Parses an interchange string; anything we do not enumerate becomes
    /// a custom format carrying the original text.
    pub fn from_str(s: &str) -> Self {
        match s {
            "35mm" => FilmFormat::Mm35,
            "120" => FilmFormat::Mm120,
            "110" => FilmFormat::Mm110,
            "127" => FilmFormat::Mm127,
            "220" => FilmFormat::Mm220,
            "4x5" => FilmFormat::Sheet4x5,
            "5x7" => FilmFormat::Sheet5x7,
            "8x10" => FilmFormat::Sheet8x10,
            other => FilmFormat::Other(other.to_string()),
        }
    }

    /// Reassembles a format from its two storage columns
    pub fn from_columns(format: &str, custom_name: Option<String>) -> Self {
        if format == "other" {
            FilmFormat::Other(custom_name.unwrap_or_default())
        } else {
            FilmFormat::from_str(format)
        }
    }

    /// The free-text name for custom formats
    pub fn custom_name(&self) -> Option<&str> {
        match self {
            FilmFormat::Other(name) => Some(name),
            _ => None,
        }
    }

    /// Sheet film is consumed in counted units from a shared batch; rolls
    /// are binary in/out of a camera. Custom formats get roll semantics.
    pub fn is_sheet(&self) -> bool {
        matches!(
            self,
            FilmFormat::Sheet4x5 | FilmFormat::Sheet5x7 | FilmFormat::Sheet8x10
        )
    }

    pub fn display_name(&self) -> &str {
        match self {
            FilmFormat::Other(name) => name,
            _ => self.as_str(),
        }
    }

    pub fn all_builtin() -> &'static [FilmFormat] {
        static ALL: [FilmFormat; 8] = [
            FilmFormat::Mm35,
            FilmFormat::Mm120,
            FilmFormat::Mm110,
            FilmFormat::Mm127,
            FilmFormat::Mm220,
            FilmFormat::Sheet4x5,
            FilmFormat::Sheet5x7,
            FilmFormat::Sheet8x10,
        ];
        &ALL
    }
}

/// The product identity key: identifies "the same film stock" independent
/// of format or batch. Used for grouping and merge-matching, never as a
/// uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductKey {
    pub name: String,
    pub manufacturer: String,
    pub film_type: FilmType,
    pub speed: u32,
}

/// One ledger row: an individually tracked roll, or a batch of sheets
/// sharing the same expiry and storage condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmUnit {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
    pub manufacturer: String,
    pub film_type: FilmType,
    pub speed: u32,
    pub format: FilmFormat,
    /// 0 means finished; the row is kept for history
    pub quantity: u32,
    /// Canonical `YYYY` / `MM/YYYY` strings (legacy rows may carry `MM/DD/YYYY`)
    pub expiry_dates: Vec<String>,
    pub is_frozen: bool,
    pub exposures: Option<u32>,
    pub comments: Option<String>,
    pub image_ref: ImageRef,
    pub created_at: Option<String>,
    /// None until the row is edited for the first time
    pub updated_at: Option<String>,
}

impl FilmUnit {
    /// Creates a new unit with generated UUID and quantity 1
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        film_type: FilmType,
        speed: u32,
        format: FilmFormat,
    ) -> Self {
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            film_type,
            speed,
            format,
            quantity: 1,
            expiry_dates: Vec::new(),
            is_frozen: false,
            exposures: None,
            comments: None,
            image_ref: ImageRef::None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Validates all fields of the unit
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "Name must not be empty").into());
        }
        if self.name.len() > 100 {
            return Err(
                ValidationError::new("name", "Name must not exceed 100 characters").into(),
            );
        }
        if self.manufacturer.trim().is_empty() {
            return Err(
                ValidationError::new("manufacturer", "Manufacturer must not be empty").into(),
            );
        }
        if self.manufacturer.len() > 100 {
            return Err(ValidationError::new(
                "manufacturer",
                "Manufacturer must not exceed 100 characters",
            )
            .into());
        }
        if self.speed == 0 {
            return Err(ValidationError::new("speed", "Speed must be at least 1").into());
        }
        if self.exposures == Some(0) {
            return Err(
                ValidationError::new("exposures", "Exposure count must be at least 1").into(),
            );
        }
        if let FilmFormat::Other(name) = &self.format {
            if name.trim().is_empty() {
                return Err(ValidationError::new(
                    "format",
                    "Custom format needs a name",
                )
                .into());
            }
        }
        expiry_date::validate_all(&self.expiry_dates)?;

        Ok(())
    }

    pub fn product_key(&self) -> ProductKey {
        ProductKey {
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            film_type: self.film_type,
            speed: self.speed,
        }
    }

    /// Canonicalized, sorted expiry dates; the comparison form used by the
    /// reconciliation match ("identical expiry-date set")
    pub fn expiry_set(&self) -> Vec<String> {
        let mut set: Vec<String> = self
            .expiry_dates
            .iter()
            .filter_map(|s| expiry_date::ExpiryDate::parse(s).ok())
            .map(|d| d.canonical())
            .collect();
        set.sort();
        set.dedup();
        set
    }

    /// True when any of the unit's expiry dates lies fully in the past
    pub fn is_expired(&self, today: chrono::NaiveDate) -> bool {
        self.expiry_dates
            .iter()
            .filter_map(|s| expiry_date::ExpiryDate::parse(s).ok())
            .any(|d| d.is_past(today))
    }
}

impl<'r> TryFrom<&Row<'r>> for FilmUnit {
    type Error = rusqlite::Error;

    // Column order: id, uuid, name, manufacturer, film_type, speed, format,
    // custom_format_name, quantity, expiry_dates, is_frozen, exposures,
    // comments, image_ref_kind, image_ref_value, created_at, updated_at
    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        let film_type_str: String = row.get(4)?;
        let film_type = FilmType::from_str(&film_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown film type '{}'", film_type_str).into(),
            )
        })?;

        let format_str: String = row.get(6)?;
        let custom_format_name: Option<String> = row.get(7)?;
        let expiry_json: String = row.get(9)?;
        let expiry_dates: Vec<String> = serde_json::from_str(&expiry_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                9,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let image_ref_kind: String = row.get(13)?;
        let image_ref_value: Option<String> = row.get(14)?;

        Ok(FilmUnit {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            name: row.get(2)?,
            manufacturer: row.get(3)?,
            film_type,
            speed: row.get(5)?,
            format: FilmFormat::from_columns(&format_str, custom_format_name),
            quantity: row.get(8)?,
            expiry_dates,
            is_frozen: row.get(10)?,
            exposures: row.get(11)?,
            comments: row.get(12)?,
            image_ref: ImageRef::from_columns(&image_ref_kind, image_ref_value),
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }
}
