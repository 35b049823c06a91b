use crate::error::AppError;
use crate::models::ImageRef;
use crate::services::film_service;
use photo_store::{PhotoStore, PhotoStoreConfig};
use rusqlite::{params, Connection};

/// Builds the photo store the embedding application should construct once
/// and pass down explicitly (no ambient global)
pub fn default_photo_store() -> PhotoStore {
    PhotoStore::new(PhotoStoreConfig {
        storage_path: "./photos".to_string(),
        ..PhotoStoreConfig::default()
    })
}

/// Stores a user-captured reminder photo for a film unit and points the
/// unit's image reference at it. Returns the new reference.
pub fn store_custom_photo(
    conn: &Connection,
    store: &PhotoStore,
    film_uuid: &str,
    bytes: &[u8],
) -> Result<ImageRef, AppError> {
    let unit = film_service::get_film(conn, film_uuid)?;

    let relative_path = store.store(bytes, &unit.manufacturer, &unit.name)?;
    let reference = ImageRef::Custom(relative_path);

    set_image_ref(conn, film_uuid, &reference)?;
    log::debug!("Attached custom photo to {} ({})", film_uuid, unit.name);

    Ok(reference)
}

/// Points a film unit's image reference at a catalog entry, auto-detection
/// or nothing. A previously stored custom photo is removed from disk.
pub fn set_image_source(
    conn: &Connection,
    store: &PhotoStore,
    film_uuid: &str,
    reference: ImageRef,
) -> Result<(), AppError> {
    let unit = film_service::get_film(conn, film_uuid)?;

    if let ImageRef::Custom(old_path) = &unit.image_ref {
        if unit.image_ref != reference {
            store.remove(old_path)?;
        }
    }

    set_image_ref(conn, film_uuid, &reference)
}

/// Resolves an image reference to photo bytes. Only custom photos live in
/// the photo store; catalog and auto-detected sources are resolved by the
/// embedding application's asset layer, so they yield `None` here.
pub fn resolve_image(
    store: &PhotoStore,
    reference: &ImageRef,
) -> Result<Option<Vec<u8>>, AppError> {
    match reference {
        ImageRef::Custom(path) => Ok(store.resolve(path)?),
        _ => Ok(None),
    }
}

fn set_image_ref(conn: &Connection, film_uuid: &str, reference: &ImageRef) -> Result<(), AppError> {
    let rows_affected = conn.execute(
        "UPDATE film_units
         SET image_ref_kind = ?1, image_ref_value = ?2, updated_at = CURRENT_TIMESTAMP
         WHERE uuid = ?3",
        params![reference.kind_str(), reference.value(), film_uuid],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Film unit".to_string()));
    }

    Ok(())
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

    // thumbnails are off, so plain bytes stand in for an encoded photo
    fn test_store() -> (PhotoStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(PhotoStoreConfig {
            storage_path: dir.path().to_string_lossy().to_string(),
            enable_thumbnails: false,
            ..PhotoStoreConfig::default()
        });
        (store, dir)
    }

    fn sample_jpeg() -> Vec<u8> {
        b"not really a jpeg, but the store does not mind".to_vec()
    }

    #[test]
    fn test_store_and_resolve_custom_photo() {
        let conn = setup_test_db();
        let (store, _dir) = test_store();

        let unit = FilmUnit::new("Portra 400", "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        film_service::create_film(&conn, &unit).unwrap();

        let bytes = sample_jpeg();
        let reference = store_custom_photo(&conn, &store, &unit.uuid, &bytes).unwrap();
        assert!(matches!(reference, ImageRef::Custom(_)));

        let loaded = film_service::get_film(&conn, &unit.uuid).unwrap();
        assert_eq!(loaded.image_ref, reference);

        let resolved = resolve_image(&store, &loaded.image_ref).unwrap().unwrap();
        assert_eq!(resolved, bytes);
    }

    #[test]
    fn test_switching_source_removes_old_custom_photo() {
        let conn = setup_test_db();
        let (store, _dir) = test_store();

        let unit = FilmUnit::new("Portra 400", "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        film_service::create_film(&conn, &unit).unwrap();

        let reference = store_custom_photo(&conn, &store, &unit.uuid, &sample_jpeg()).unwrap();
        set_image_source(
            &conn,
            &store,
            &unit.uuid,
            ImageRef::Catalog("portra-400".to_string()),
        )
        .unwrap();

        let loaded = film_service::get_film(&conn, &unit.uuid).unwrap();
        assert_eq!(loaded.image_ref, ImageRef::Catalog("portra-400".to_string()));
        assert!(resolve_image(&store, &reference).unwrap().is_none());
    }

    #[test]
    fn test_catalog_and_auto_resolve_to_none() {
        let (store, _dir) = test_store();
        assert!(resolve_image(&store, &ImageRef::AutoDetected)
            .unwrap()
            .is_none());
        assert!(resolve_image(&store, &ImageRef::None).unwrap().is_none());
    }
}
