pub mod schema;

use crate::error::AppError;
use rusqlite::Connection;
use std::path::PathBuf;

/// Returns the path to the inventory database
pub fn get_database_path() -> PathBuf {
    PathBuf::from("./data/filmstock.db")
}

/// Initializes the database with the full schema
pub fn init_database() -> Result<Connection, AppError> {
    let db_path = get_database_path();

    // Make sure the directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&db_path)?;

    schema::init_schema(&conn)?;

    Ok(conn)
}

/// Opens a fresh in-memory database with the full schema (tests, previews)
pub fn open_in_memory() -> Result<Connection, AppError> {
    let conn = Connection::open_in_memory()?;
    schema::init_schema(&conn)?;
    Ok(conn)
}
