use crate::error::{AppError, ValidationError};
use crate::models::{Camera, FilmFormat};
use rusqlite::{params, Connection, OptionalExtension};

// Shared SELECT column list matching Camera::try_from
const CAMERA_COLUMNS: &str = "id, uuid, name, format, custom_format_name";

/// Creates a new camera. Names are unique case-insensitively.
pub fn create_camera(conn: &Connection, camera: &Camera) -> Result<String, AppError> {
    camera.validate()?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT uuid FROM cameras WHERE name = ?1",
            params![camera.name.trim()],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(ValidationError::new("name", "A camera with this name already exists").into());
    }

    conn.execute(
        "INSERT INTO cameras (uuid, name, format, custom_format_name) VALUES (?1, ?2, ?3, ?4)",
        params![
            camera.uuid,
            camera.name.trim(),
            camera.format.as_ref().map(|f| f.as_str()),
            camera.format.as_ref().and_then(|f| f.custom_name()),
        ],
    )?;
    log::debug!("Created camera '{}'", camera.name.trim());

    Ok(camera.uuid.clone())
}

/// All cameras in insertion order
pub fn list_cameras(conn: &Connection) -> Result<Vec<Camera>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cameras ORDER BY id",
        CAMERA_COLUMNS
    ))?;

    let cameras = stmt
        .query_map([], |row| Camera::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cameras)
}

pub fn delete_camera(conn: &Connection, uuid: &str) -> Result<(), AppError> {
    let rows_affected = conn.execute("DELETE FROM cameras WHERE uuid = ?1", params![uuid])?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Camera".to_string()));
    }

    Ok(())
}

/// Cameras for the picker, ranked so that format-affine ones come first.
/// The affinity only orders suggestions; loading never enforces it.
pub fn suggest_cameras(conn: &Connection, format: &FilmFormat) -> Result<Vec<Camera>, AppError> {
    let mut cameras = list_cameras(conn)?;
    cameras.sort_by_key(|c| match &c.format {
        Some(f) if f == format => 0,
        _ => 1,
    });
    Ok(cameras)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::database::schema::init_schema(&conn).unwrap();
        conn
    }

    fn camera(name: &str, format: Option<FilmFormat>) -> Camera {
        let mut c = Camera::new(name);
        c.format = format;
        c
    }

    #[test]
    fn test_create_and_list() {
        let conn = setup_test_db();
        create_camera(&conn, &camera("Nikon F3", Some(FilmFormat::Mm35))).unwrap();
        create_camera(&conn, &camera("Rolleiflex", Some(FilmFormat::Mm120))).unwrap();

        let cameras = list_cameras(&conn).unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].name, "Nikon F3");
        assert_eq!(cameras[1].format, Some(FilmFormat::Mm120));
    }

    #[test]
    fn test_names_are_unique_case_insensitive() {
        let conn = setup_test_db();
        create_camera(&conn, &camera("Nikon F3", None)).unwrap();

        let result = create_camera(&conn, &camera("NIKON f3", None));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_suggestions_rank_matching_format_first() {
        let conn = setup_test_db();
        create_camera(&conn, &camera("Nikon F3", Some(FilmFormat::Mm35))).unwrap();
        create_camera(&conn, &camera("Rolleiflex", Some(FilmFormat::Mm120))).unwrap();
        create_camera(&conn, &camera("Holga", None)).unwrap();

        let suggested = suggest_cameras(&conn, &FilmFormat::Mm120).unwrap();
        assert_eq!(suggested[0].name, "Rolleiflex");
        // the rest keep their insertion order
        assert_eq!(suggested[1].name, "Nikon F3");
        assert_eq!(suggested[2].name, "Holga");
    }

    #[test]
    fn test_delete_camera() {
        let conn = setup_test_db();
        let c = camera("Holga", None);
        create_camera(&conn, &c).unwrap();

        delete_camera(&conn, &c.uuid).unwrap();
        assert!(list_cameras(&conn).unwrap().is_empty());

        let result = delete_camera(&conn, &c.uuid);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
