use crate::models::expiry_date::{self, ExpiryDate};
use crate::models::{FilmFormat, FilmType};
use chrono::NaiveDate;
use serde::Serialize;

/// Per-(format, custom name) aggregate within a product group.
///
/// `total_quantity` sums over every contributing ledger row, even when
/// rows differ in expiry or storage condition; the display fields come
/// from one representative row (preferring rows still in stock).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormatInfo {
    pub format: FilmFormat,
    pub total_quantity: u32,
    /// uuids of all contributing ledger rows
    pub roll_ids: Vec<String>,
    pub expiry_dates: Vec<String>,
    pub is_frozen: bool,
    pub exposures: Option<u32>,
    pub comments: Option<String>,
}

/// A display aggregate of all ledger rows sharing a product identity key.
/// Recomputed from the live ledger on every read, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupedFilm {
    pub name: String,
    pub manufacturer: String,
    pub film_type: FilmType,
    pub speed: u32,
    pub formats: Vec<FormatInfo>,
    /// Union of all contributing rows' expiry dates (derived queries only)
    pub all_expiry_dates: Vec<String>,
}

impl GroupedFilm {
    /// Sum over all formats of the group
    pub fn total_quantity(&self) -> u32 {
        self.formats.iter().map(|f| f.total_quantity).sum()
    }

    /// True when any date across the whole group lies fully in the past
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.all_expiry_dates
            .iter()
            .filter_map(|s| ExpiryDate::parse(s).ok())
            .any(|d| d.is_past(today))
    }

    /// The most urgent expiry date across the whole group
    pub fn closest_expiry(&self) -> Option<ExpiryDate> {
        expiry_date::closest(self.all_expiry_dates.iter().map(|s| s.as_str()))
    }
}
