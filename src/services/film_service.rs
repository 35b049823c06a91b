use crate::error::AppError;
use crate::models::FilmUnit;
use crate::services::manufacturer_service;
use rusqlite::{params, Connection};

// Shared SELECT column list matching FilmUnit::try_from
const FILM_COLUMNS: &str = "f.id, f.uuid, f.name, m.name, f.film_type, f.speed, \
     f.format, f.custom_format_name, f.quantity, f.expiry_dates, f.is_frozen, \
     f.exposures, f.comments, f.image_ref_kind, f.image_ref_value, f.created_at, f.updated_at";

fn expiry_json(unit: &FilmUnit) -> Result<String, AppError> {
    serde_json::to_string(&unit.expiry_dates)
        .map_err(|e| AppError::Other(format!("Failed to serialize expiry dates: {}", e)))
}

/// Creates a new ledger row. Never deduplicates; the reconciliation layer
/// decides merge-or-create before calling this.
pub fn create_film(conn: &Connection, unit: &FilmUnit) -> Result<String, AppError> {
    unit.validate()?;

    let manufacturer = manufacturer_service::find_or_create_manufacturer(conn, &unit.manufacturer)?;

    conn.execute(
        "INSERT INTO film_units (uuid, name, manufacturer_id, film_type, speed, format,
             custom_format_name, quantity, expiry_dates, is_frozen, exposures, comments,
             image_ref_kind, image_ref_value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            unit.uuid,
            unit.name,
            manufacturer.id,
            unit.film_type.as_str(),
            unit.speed,
            unit.format.as_str(),
            unit.format.custom_name(),
            unit.quantity,
            expiry_json(unit)?,
            unit.is_frozen,
            unit.exposures,
            unit.comments,
            unit.image_ref.kind_str(),
            unit.image_ref.value(),
        ],
    )?;
    log::debug!("Created film unit {} ({})", unit.uuid, unit.name);

    Ok(unit.uuid.clone())
}

/// Loads a ledger row by uuid
pub fn get_film(conn: &Connection, uuid: &str) -> Result<FilmUnit, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM film_units f
         JOIN manufacturers m ON m.id = f.manufacturer_id
         WHERE f.uuid = ?1",
        FILM_COLUMNS
    ))?;

    let unit = stmt
        .query_row(params![uuid], |row| FilmUnit::try_from(row))
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("Film unit".to_string()),
            _ => AppError::Database(e),
        })?;

    Ok(unit)
}

/// Full-table read in insertion order (stable for the grouping engine)
pub fn list_films(conn: &Connection) -> Result<Vec<FilmUnit>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM film_units f
         JOIN manufacturers m ON m.id = f.manufacturer_id
         ORDER BY f.id",
        FILM_COLUMNS
    ))?;

    let units = stmt
        .query_map([], |row| FilmUnit::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(units)
}

/// Replaces a row by uuid, preserving created_at and stamping updated_at
pub fn update_film(conn: &Connection, unit: &FilmUnit) -> Result<(), AppError> {
    unit.validate()?;

    let manufacturer = manufacturer_service::find_or_create_manufacturer(conn, &unit.manufacturer)?;

    let rows_affected = conn.execute(
        "UPDATE film_units
         SET name = ?1, manufacturer_id = ?2, film_type = ?3, speed = ?4, format = ?5,
             custom_format_name = ?6, quantity = ?7, expiry_dates = ?8, is_frozen = ?9,
             exposures = ?10, comments = ?11, image_ref_kind = ?12, image_ref_value = ?13,
             updated_at = CURRENT_TIMESTAMP
         WHERE uuid = ?14",
        params![
            unit.name,
            manufacturer.id,
            unit.film_type.as_str(),
            unit.speed,
            unit.format.as_str(),
            unit.format.custom_name(),
            unit.quantity,
            expiry_json(unit)?,
            unit.is_frozen,
            unit.exposures,
            unit.comments,
            unit.image_ref.kind_str(),
            unit.image_ref.value(),
            unit.uuid,
        ],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Film unit".to_string()));
    }

    Ok(())
}

/// Batch delete: all named rows are removed, or none are. The error names
/// the first missing uuid.
pub fn delete_films(conn: &Connection, uuids: &[String]) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;

    for uuid in uuids {
        let rows_affected = tx.execute("DELETE FROM film_units WHERE uuid = ?1", params![uuid])?;
        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("Film unit {}", uuid)));
        }
    }

    tx.commit()?;
    log::debug!("Deleted {} film unit(s)", uuids.len());

    Ok(())
}

/// Shifts a row's quantity by `delta`, refusing to go below zero.
/// Returns the new quantity; 0 means the unit is finished (the row stays).
pub fn adjust_quantity(conn: &Connection, uuid: &str, delta: i64) -> Result<u32, AppError> {
    let current: i64 = conn
        .query_row(
            "SELECT quantity FROM film_units WHERE uuid = ?1",
            params![uuid],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("Film unit".to_string()),
            _ => AppError::Database(e),
        })?;

    let new_quantity = current + delta;
    if new_quantity < 0 {
        return Err(AppError::InsufficientStock(format!(
            "Only {} in stock, cannot remove {}",
            current, -delta
        )));
    }

    conn.execute(
        "UPDATE film_units SET quantity = ?1, updated_at = CURRENT_TIMESTAMP WHERE uuid = ?2",
        params![new_quantity, uuid],
    )?;

    Ok(new_quantity as u32)
}
