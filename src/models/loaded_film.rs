use chrono::NaiveDate;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// An active association between a ledger row and a camera. A roll is
/// loaded whole (`load_count` 1); a sheet batch contributes `load_count`
/// sheets to one loading event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadedFilm {
    pub id: Option<i64>,
    pub uuid: String,
    pub film_unit_uuid: String,
    pub camera: String,
    pub loaded_at: NaiveDate,
    pub load_count: u32,
    /// Sensitivity the user intends to expose at, when it differs from
    /// the box speed (push/pull)
    pub shot_at_iso: Option<u32>,
}

impl<'r> TryFrom<&Row<'r>> for LoadedFilm {
    type Error = rusqlite::Error;

    // Column order: id, uuid, film_unit_uuid (joined), camera, loaded_at,
    // load_count, shot_at_iso
    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        Ok(LoadedFilm {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            film_unit_uuid: row.get(2)?,
            camera: row.get(3)?,
            loaded_at: NaiveDate::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d").map_err(
                |e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                },
            )?,
            load_count: row.get(5)?,
            shot_at_iso: row.get(6)?,
        })
    }
}
