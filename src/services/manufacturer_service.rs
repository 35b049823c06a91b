use crate::error::AppError;
use crate::models::Manufacturer;
use rusqlite::{params, Connection, OptionalExtension};

/// Finds a manufacturer by name (case-insensitive, via the NOCASE collation
/// on the name column)
pub fn find_manufacturer(conn: &Connection, name: &str) -> Result<Option<Manufacturer>, AppError> {
    let mut stmt = conn.prepare("SELECT id, uuid, name FROM manufacturers WHERE name = ?1")?;

    let manufacturer = stmt
        .query_row(params![name], |row| Manufacturer::try_from(row))
        .optional()?;

    Ok(manufacturer)
}

/// Returns the existing manufacturer matching `name` case-insensitively,
/// creating it when absent. The first spelling the user enters wins.
pub fn find_or_create_manufacturer(
    conn: &Connection,
    name: &str,
) -> Result<Manufacturer, AppError> {
    if let Some(existing) = find_manufacturer(conn, name)? {
        return Ok(existing);
    }

    let manufacturer = Manufacturer::new(name.trim());
    manufacturer.validate()?;

    conn.execute(
        "INSERT INTO manufacturers (uuid, name) VALUES (?1, ?2)",
        params![manufacturer.uuid, manufacturer.name],
    )?;
    log::debug!("Created manufacturer '{}'", manufacturer.name);

    let id = conn.last_insert_rowid();
    Ok(Manufacturer {
        id: Some(id),
        ..manufacturer
    })
}

/// Lists all manufacturers sorted by name
pub fn list_manufacturers(conn: &Connection) -> Result<Vec<Manufacturer>, AppError> {
    let mut stmt = conn.prepare("SELECT id, uuid, name FROM manufacturers ORDER BY name")?;

    let manufacturers = stmt
        .query_map([], |row| Manufacturer::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(manufacturers)
}

/// Number of ledger rows referencing a manufacturer
pub fn count_film_references(conn: &Connection, manufacturer_id: i64) -> Result<i64, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM film_units WHERE manufacturer_id = ?1",
        params![manufacturer_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Deletes a manufacturer. Refused while any ledger row still references
/// it; the ledger is left unchanged.
pub fn delete_manufacturer(conn: &Connection, uuid: &str) -> Result<(), AppError> {
    let manufacturer = conn
        .query_row(
            "SELECT id, uuid, name FROM manufacturers WHERE uuid = ?1",
            params![uuid],
            |row| Manufacturer::try_from(row),
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound("Manufacturer".to_string()))?;

    let id = manufacturer.id.unwrap_or_default();
    if count_film_references(conn, id)? > 0 {
        return Err(AppError::ManufacturerInUse(manufacturer.name));
    }

    conn.execute("DELETE FROM manufacturers WHERE id = ?1", params![id])?;
    log::info!("Deleted manufacturer '{}'", manufacturer.name);

    Ok(())
}
