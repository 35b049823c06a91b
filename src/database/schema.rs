use rusqlite::{Connection, Result};

/// Initialize complete database schema for the film inventory
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Schema version table for future migrations
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Check if schema already exists
    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_schema(conn)?;
        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Create the complete schema (version 1)
fn create_schema(conn: &Connection) -> Result<()> {
    // Table: manufacturers (film brands, matched case-insensitively by name)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS manufacturers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_manufacturers_uuid ON manufacturers(uuid)",
        [],
    )?;

    // Table: film_units (the ledger; one row per roll or sheet batch)
    // updated_at stays NULL until the first edit, so no update trigger here.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS film_units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            manufacturer_id INTEGER NOT NULL,
            film_type TEXT CHECK(film_type IN ('black_and_white', 'color', 'slide', 'instant')) NOT NULL,
            speed INTEGER NOT NULL CHECK(speed > 0),
            format TEXT NOT NULL,
            custom_format_name TEXT,
            quantity INTEGER NOT NULL DEFAULT 1 CHECK(quantity >= 0),
            expiry_dates TEXT NOT NULL DEFAULT '[]',
            is_frozen INTEGER NOT NULL DEFAULT 0 CHECK(is_frozen IN (0,1)),
            exposures INTEGER CHECK(exposures IS NULL OR exposures > 0),
            comments TEXT,
            image_ref_kind TEXT CHECK(image_ref_kind IN ('none', 'auto', 'custom', 'catalog')) NOT NULL DEFAULT 'none',
            image_ref_value TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT,
            FOREIGN KEY (manufacturer_id) REFERENCES manufacturers(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_film_units_uuid ON film_units(uuid)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_film_units_name ON film_units(name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_film_units_manufacturer ON film_units(manufacturer_id)",
        [],
    )?;

    // Table: cameras (names are unique, case-insensitive; format is only a
    // suggestion affinity, never enforced)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS cameras (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            format TEXT,
            custom_format_name TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_cameras_uuid ON cameras(uuid)",
        [],
    )?;

    // Table: loaded_films (active unit-in-camera records; the UNIQUE
    // constraint on film_unit_id is the per-unit exclusivity invariant)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS loaded_films (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            film_unit_id INTEGER NOT NULL UNIQUE,
            camera TEXT NOT NULL,
            loaded_at TEXT NOT NULL,
            load_count INTEGER NOT NULL DEFAULT 1 CHECK(load_count >= 1),
            shot_at_iso INTEGER CHECK(shot_at_iso IS NULL OR shot_at_iso > 0),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (film_unit_id) REFERENCES film_units(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loaded_films_uuid ON loaded_films(uuid)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loaded_films_unit ON loaded_films(film_unit_id)",
        [],
    )?;

    Ok(())
}
