use crate::error::{AppError, ValidationError};
use crate::models::LoadedFilm;
use crate::services::film_service;
use chrono::Local;
use rusqlite::{params, Connection};

/// Hard cap on simultaneously loaded films, system-wide
pub const MAX_LOADED_FILMS: i64 = 5;

// Shared SELECT column list matching LoadedFilm::try_from
const LOADED_COLUMNS: &str =
    "l.id, l.uuid, f.uuid, l.camera, l.loaded_at, l.load_count, l.shot_at_iso";

fn count_loaded(conn: &Connection) -> Result<i64, AppError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM loaded_films", [], |row| row.get(0))?;
    Ok(count)
}

/// True while a camera slot is free. The UI must not attempt `load`
/// when this returns false.
pub fn can_load(conn: &Connection) -> Result<bool, AppError> {
    Ok(count_loaded(conn)? < MAX_LOADED_FILMS)
}

/// Loads a film unit into a camera.
///
/// Rolls are loaded whole: `quantity` must be 1 and the unit's stock is
/// untouched until the roll is finished. Sheets are consumed from the
/// batch immediately, so several sheets can go into one loading event.
/// The whole operation is one transaction; any refusal leaves the ledger
/// unchanged.
pub fn load(
    conn: &Connection,
    film_uuid: &str,
    camera: &str,
    quantity: u32,
    shot_at_iso: Option<u32>,
) -> Result<String, AppError> {
    if camera.trim().is_empty() {
        return Err(ValidationError::new("camera", "Camera name must not be empty").into());
    }

    let tx = conn.unchecked_transaction()?;

    if count_loaded(&tx)? >= MAX_LOADED_FILMS {
        return Err(AppError::CapacityExceeded);
    }

    let unit = film_service::get_film(&tx, film_uuid)?;

    let already_loaded: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM loaded_films WHERE film_unit_id = ?1)",
        params![unit.id],
        |row| row.get(0),
    )?;
    if already_loaded {
        return Err(AppError::InsufficientStock(format!(
            "{} is already loaded in a camera",
            unit.name
        )));
    }

    if quantity == 0 {
        return Err(AppError::InsufficientStock(
            "At least one roll or sheet must be loaded".to_string(),
        ));
    }
    if quantity > unit.quantity {
        return Err(AppError::InsufficientStock(format!(
            "Only {} of {} in stock",
            unit.quantity, unit.name
        )));
    }
    if !unit.format.is_sheet() && quantity != 1 {
        return Err(AppError::InsufficientStock(
            "Rolls are loaded one at a time".to_string(),
        ));
    }

    let uuid = uuid::Uuid::new_v4().to_string();
    let loaded_at = Local::now().date_naive().format("%Y-%m-%d").to_string();

    tx.execute(
        "INSERT INTO loaded_films (uuid, film_unit_id, camera, loaded_at, load_count, shot_at_iso)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![uuid, unit.id, camera.trim(), loaded_at, quantity, shot_at_iso],
    )?;

    // sheets come out of the shared batch right away
    if unit.format.is_sheet() {
        film_service::adjust_quantity(&tx, film_uuid, -(quantity as i64))?;
    }

    tx.commit()?;
    log::info!(
        "Loaded {} ({} unit(s)) into {}",
        unit.name,
        quantity,
        camera.trim()
    );

    Ok(uuid)
}

/// Removes a loading record and settles the source unit's stock.
///
/// A finished roll is consumed (quantity -1); a roll taken out unused
/// keeps its stock. Sheets were deducted at load time, so returning them
/// unused puts the loaded count back.
pub fn unload(conn: &Connection, loaded_uuid: &str, returned_unused: bool) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;

    let (film_uuid, load_count, is_sheet): (String, u32, bool) = tx
        .query_row(
            "SELECT f.uuid, l.load_count, f.format IN ('4x5', '5x7', '8x10')
             FROM loaded_films l
             JOIN film_units f ON f.id = l.film_unit_id
             WHERE l.uuid = ?1",
            params![loaded_uuid],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("Loaded film".to_string()),
            _ => AppError::Database(e),
        })?;

    tx.execute(
        "DELETE FROM loaded_films WHERE uuid = ?1",
        params![loaded_uuid],
    )?;

    if is_sheet {
        if returned_unused {
            film_service::adjust_quantity(&tx, &film_uuid, load_count as i64)?;
        }
    } else if !returned_unused {
        film_service::adjust_quantity(&tx, &film_uuid, -1)?;
    }

    tx.commit()?;

    Ok(())
}

/// All active loading records, oldest first
pub fn list_loaded(conn: &Connection) -> Result<Vec<LoadedFilm>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM loaded_films l
         JOIN film_units f ON f.id = l.film_unit_id
         ORDER BY l.id",
        LOADED_COLUMNS
    ))?;

    let loaded = stmt
        .query_map([], |row| LoadedFilm::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilmFormat, FilmType, FilmUnit};

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::database::schema::init_schema(&conn).unwrap();
        conn
    }

    fn add_roll(conn: &Connection, name: &str) -> String {
        let unit = FilmUnit::new(name, "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        film_service::create_film(conn, &unit).unwrap()
    }

    fn add_sheets(conn: &Connection, name: &str, quantity: u32) -> String {
        let mut unit =
            FilmUnit::new(name, "Ilford", FilmType::BlackAndWhite, 125, FilmFormat::Sheet4x5);
        unit.quantity = quantity;
        film_service::create_film(conn, &unit).unwrap()
    }

    #[test]
    fn test_load_roll_keeps_quantity_until_finished() {
        let conn = setup_test_db();
        let uuid = add_roll(&conn, "Portra 400");

        let loaded = load(&conn, &uuid, "Nikon F3", 1, None).unwrap();
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 1);

        unload(&conn, &loaded, false).unwrap();
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 0);
        assert!(list_loaded(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_return_roll_unused() {
        let conn = setup_test_db();
        let uuid = add_roll(&conn, "Portra 400");

        let loaded = load(&conn, &uuid, "Nikon F3", 1, None).unwrap();
        unload(&conn, &loaded, true).unwrap();
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 1);
    }

    #[test]
    fn test_load_sheets_deducts_immediately() {
        let conn = setup_test_db();
        let uuid = add_sheets(&conn, "FP4+", 10);

        let loaded = load(&conn, &uuid, "Linhof", 4, None).unwrap();
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 6);

        // finishing the sheets changes nothing further
        unload(&conn, &loaded, false).unwrap();
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 6);
    }

    #[test]
    fn test_return_sheets_unused_restores_batch() {
        let conn = setup_test_db();
        let uuid = add_sheets(&conn, "FP4+", 10);

        let loaded = load(&conn, &uuid, "Linhof", 4, None).unwrap();
        unload(&conn, &loaded, true).unwrap();
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 10);
    }

    #[test]
    fn test_no_double_loading() {
        let conn = setup_test_db();
        let mut unit = FilmUnit::new("Portra 400", "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        unit.quantity = 2;
        film_service::create_film(&conn, &unit).unwrap();

        load(&conn, &unit.uuid, "Nikon F3", 1, None).unwrap();
        let result = load(&conn, &unit.uuid, "Leica M6", 1, None);
        assert!(matches!(result, Err(AppError::InsufficientStock(_))));
        assert_eq!(list_loaded(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_capacity_cap_at_five() {
        let conn = setup_test_db();

        for i in 0..5 {
            let uuid = add_roll(&conn, &format!("Roll {}", i));
            load(&conn, &uuid, &format!("Camera {}", i), 1, None).unwrap();
        }
        assert!(!can_load(&conn).unwrap());

        let sixth = add_roll(&conn, "Roll 6");
        let result = load(&conn, &sixth, "Camera 6", 1, None);
        assert!(matches!(result, Err(AppError::CapacityExceeded)));

        // ledger unchanged: the sixth roll is still in stock and unloaded
        assert_eq!(film_service::get_film(&conn, &sixth).unwrap().quantity, 1);
        assert_eq!(list_loaded(&conn).unwrap().len(), 5);
    }

    #[test]
    fn test_load_more_than_stock_fails() {
        let conn = setup_test_db();
        let uuid = add_sheets(&conn, "FP4+", 3);

        let result = load(&conn, &uuid, "Linhof", 5, None);
        assert!(matches!(result, Err(AppError::InsufficientStock(_))));
        assert_eq!(film_service::get_film(&conn, &uuid).unwrap().quantity, 3);
    }

    #[test]
    fn test_roll_quantity_must_be_one() {
        let conn = setup_test_db();
        let mut unit = FilmUnit::new("Portra 400", "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        unit.quantity = 3;
        film_service::create_film(&conn, &unit).unwrap();

        let result = load(&conn, &unit.uuid, "Nikon F3", 2, None);
        assert!(matches!(result, Err(AppError::InsufficientStock(_))));
    }

    #[test]
    fn test_shot_at_iso_is_recorded() {
        let conn = setup_test_db();
        let uuid = add_roll(&conn, "HP5+");

        load(&conn, &uuid, "Nikon F3", 1, Some(1600)).unwrap();
        let loaded = list_loaded(&conn).unwrap();
        assert_eq!(loaded[0].shot_at_iso, Some(1600));
        assert_eq!(loaded[0].film_unit_uuid, uuid);
    }
}
