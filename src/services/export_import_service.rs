// Export/import bridge: zip+JSON document form, flat CSV form, and the
// dry-run import preview that feeds the reconciliation engine on commit.

use crate::error::{AppError, ValidationError};
use crate::models::{FilmFormat, FilmType, FilmUnit};
use crate::services::film_service;
use crate::services::grouping_service;
use crate::services::reconcile_service::{self, ReconcileOutcome};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ExportMetadata {
    format_version: u32,
    exported_at: String,
    app_version: String,
    total_rows: usize,
    rolls_in_inventory: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportFilms {
    films: Vec<FilmRecord>,
}

/// One interchange record. Both document encodings carry exactly these
/// fields; unknown or missing optional fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmRecord {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub film_type: String,
    #[serde(default)]
    pub speed: u32,
    /// Enumerated format string, or the free text of a custom format
    #[serde(default)]
    pub format: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub expiry_dates: Vec<String>,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub exposures: Option<u32>,
    #[serde(default)]
    pub comments: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl FilmRecord {
    pub fn from_unit(unit: &FilmUnit) -> Self {
        Self {
            manufacturer: unit.manufacturer.clone(),
            name: unit.name.clone(),
            film_type: unit.film_type.as_str().to_string(),
            speed: unit.speed,
            format: unit.format.display_name().to_string(),
            quantity: unit.quantity,
            expiry_dates: unit.expiry_dates.clone(),
            frozen: unit.is_frozen,
            exposures: unit.exposures,
            comments: unit.comments.clone(),
        }
    }

    /// Applies the same validation rules as manual entry. The error string
    /// is row-scoped and meant for an import warning.
    pub fn to_unit(&self) -> Result<FilmUnit, String> {
        let film_type = FilmType::from_str(self.film_type.trim())
            .ok_or_else(|| format!("unknown film type '{}'", self.film_type))?;

        let mut unit = FilmUnit::new(
            self.name.trim(),
            self.manufacturer.trim(),
            film_type,
            self.speed,
            FilmFormat::from_str(self.format.trim()),
        );
        unit.quantity = self.quantity;
        unit.expiry_dates = self.expiry_dates.clone();
        unit.is_frozen = self.frozen;
        unit.exposures = self.exposures;
        unit.comments = self.comments.clone().filter(|c| !c.trim().is_empty());

        match unit.validate() {
            Ok(()) => Ok(unit),
            Err(AppError::Validation(v)) => Err(v.to_string()),
            Err(other) => Err(other.to_string()),
        }
    }
}

/// A row-scoped import problem. Never fatal: the offending row is dropped
/// from the preview and the rest of the document goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    /// 1-based data row (JSON array position, or CSV line below the header)
    pub row: usize,
    pub message: String,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub merged: usize,
    pub created: usize,
}

/// Serializes the whole ledger into a zip archive (`metadata.json` plus
/// `data/films.json`) in `base_dir` and returns the archive path.
pub async fn export_to_zip(conn: &Connection, base_dir: &Path) -> Result<PathBuf, AppError> {
    fs::create_dir_all(base_dir)?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let export_path = base_dir.join(format!("filmstock-export-{}.zip", timestamp));

    let units = film_service::list_films(conn)?;
    let metadata = ExportMetadata {
        format_version: EXPORT_FORMAT_VERSION,
        exported_at: Utc::now().to_rfc3339(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        total_rows: units.len(),
        rolls_in_inventory: grouping_service::rolls_in_inventory(&units),
    };
    let films = ExportFilms {
        films: units.iter().map(FilmRecord::from_unit).collect(),
    };

    let file = fs::File::create(&export_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options: zip::write::FileOptions<'_, ()> =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let metadata_json = serde_json::to_vec_pretty(&metadata)
        .map_err(|e| AppError::Other(format!("Failed to serialize metadata.json: {}", e)))?;
    zip.start_file("metadata.json", options)
        .map_err(|e| AppError::Other(format!("Failed to add metadata.json to zip: {}", e)))?;
    zip.write_all(&metadata_json)?;

    let films_json = serde_json::to_vec_pretty(&films)
        .map_err(|e| AppError::Other(format!("Failed to serialize films.json: {}", e)))?;
    zip.start_file("data/films.json", options)
        .map_err(|e| AppError::Other(format!("Failed to add data/films.json to zip: {}", e)))?;
    zip.write_all(&films_json)?;

    zip.finish()
        .map_err(|e| AppError::Other(format!("Failed to finalize zip file: {}", e)))?;

    log::info!(
        "Exported {} film unit(s) to {:?}",
        metadata.total_rows,
        export_path
    );

    Ok(export_path)
}

/// Serializes the ledger into the flat tabular form
pub fn export_csv(conn: &Connection) -> Result<String, AppError> {
    let units = film_service::list_films(conn)?;

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for unit in &units {
        let record = FilmRecord::from_unit(unit);
        let fields = [
            csv_field(&record.manufacturer),
            csv_field(&record.name),
            csv_field(&record.film_type),
            record.speed.to_string(),
            csv_field(&record.format),
            record.quantity.to_string(),
            csv_field(&record.expiry_dates.join(";")),
            record.frozen.to_string(),
            record
                .exposures
                .map(|e| e.to_string())
                .unwrap_or_default(),
            csv_field(record.comments.as_deref().unwrap_or("")),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    Ok(out)
}

const CSV_HEADER: &str =
    "manufacturer,name,type,speed,format,quantity,expiry_dates,frozen,exposures,comments";

/// Parses an interchange document into a dry-run preview.
///
/// The container is sniffed: a zip archive (from `export_to_zip`), a bare
/// JSON document, or CSV. Rows failing the manual-entry validation rules
/// are dropped and reported as warnings; a well-formed container with zero
/// valid rows yields an empty preview plus warnings, not an error. The
/// ledger is never touched here.
pub fn import_file(bytes: &[u8]) -> Result<(Vec<FilmRecord>, Vec<ImportWarning>), AppError> {
    let (rows, warnings) = if bytes.starts_with(b"PK\x03\x04") {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| AppError::Other(format!("Failed to read zip archive: {}", e)))?;
        let mut films_json = String::new();
        archive
            .by_name("data/films.json")
            .map_err(|_| AppError::Other("Archive contains no data/films.json".to_string()))?
            .read_to_string(&mut films_json)?;
        parse_json_document(&films_json)?
    } else {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| AppError::Other("Import file is not valid UTF-8".to_string()))?;
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            parse_json_document(text)?
        } else {
            parse_csv_document(text)
        }
    };

    Ok(validate_rows(rows, warnings))
}

/// Reads a document from disk and previews it (file-shaped work, expected
/// to run off the caller's main context)
pub async fn import_path(path: &Path) -> Result<(Vec<FilmRecord>, Vec<ImportWarning>), AppError> {
    let bytes = fs::read(path)?;
    import_file(&bytes)
}

/// Feeds every previewed row through the reconciliation engine, in one
/// all-or-nothing transaction.
pub fn commit_import(conn: &Connection, records: &[FilmRecord]) -> Result<ImportSummary, AppError> {
    let tx = conn.unchecked_transaction()?;

    let mut summary = ImportSummary::default();
    for record in records {
        let unit = record
            .to_unit()
            .map_err(|msg| AppError::Validation(ValidationError::new("import", msg)))?;
        match reconcile_service::reconcile_within(&tx, &unit)? {
            ReconcileOutcome::Merged(_) => summary.merged += 1,
            ReconcileOutcome::Created(_) => summary.created += 1,
        }
    }

    tx.commit()?;
    log::info!(
        "Import committed: {} merged, {} created",
        summary.merged,
        summary.created
    );

    Ok(summary)
}

fn parse_json_document(
    text: &str,
) -> Result<(Vec<(usize, FilmRecord)>, Vec<ImportWarning>), AppError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| AppError::Other(format!("Failed to parse JSON document: {}", e)))?;

    let films = match &value {
        serde_json::Value::Object(obj) => obj.get("films").and_then(|v| v.as_array()),
        serde_json::Value::Array(arr) => Some(arr),
        _ => None,
    }
    .ok_or_else(|| AppError::Other("Document contains no film records".to_string()))?;

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for (i, film) in films.iter().enumerate() {
        match serde_json::from_value::<FilmRecord>(film.clone()) {
            Ok(record) => rows.push((i + 1, record)),
            Err(e) => warnings.push(ImportWarning {
                row: i + 1,
                message: format!("record could not be read: {}", e),
            }),
        }
    }

    Ok((rows, warnings))
}

fn parse_csv_document(text: &str) -> (Vec<(usize, FilmRecord)>, Vec<ImportWarning>) {
    let mut table = parse_csv(text).into_iter();
    let header: Vec<String> = table
        .next()
        .unwrap_or_default()
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let col = |name: &str| header.iter().position(|h| h == name);
    let columns = (
        col("manufacturer"),
        col("name"),
        col("type"),
        col("speed"),
        col("format"),
        col("quantity"),
        col("expiry_dates"),
        col("frozen"),
        col("exposures"),
        col("comments"),
    );

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for (i, fields) in table.enumerate() {
        let row = i + 1;
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let get = |idx: Option<usize>| {
            idx.and_then(|idx| fields.get(idx))
                .map(|f| f.trim().to_string())
                .unwrap_or_default()
        };

        let speed = get(columns.3);
        let speed = match parse_optional_number(&speed) {
            Ok(n) => n.unwrap_or(0),
            Err(()) => {
                warnings.push(ImportWarning {
                    row,
                    message: format!("invalid speed '{}'", speed),
                });
                continue;
            }
        };
        let quantity = get(columns.5);
        let quantity = match parse_optional_number(&quantity) {
            Ok(n) => n.unwrap_or(1),
            Err(()) => {
                warnings.push(ImportWarning {
                    row,
                    message: format!("invalid quantity '{}'", quantity),
                });
                continue;
            }
        };
        let exposures = get(columns.8);
        let exposures = match parse_optional_number(&exposures) {
            Ok(n) => n,
            Err(()) => {
                warnings.push(ImportWarning {
                    row,
                    message: format!("invalid exposure count '{}'", exposures),
                });
                continue;
            }
        };

        let comments = get(columns.9);
        rows.push((
            row,
            FilmRecord {
                manufacturer: get(columns.0),
                name: get(columns.1),
                film_type: get(columns.2),
                speed,
                format: get(columns.4),
                quantity,
                expiry_dates: get(columns.6)
                    .split(';')
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect(),
                frozen: matches!(get(columns.7).to_ascii_lowercase().as_str(), "true" | "1"),
                exposures,
                comments: (!comments.is_empty()).then_some(comments),
            },
        ));
    }

    (rows, warnings)
}

fn parse_optional_number(s: &str) -> Result<Option<u32>, ()> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<u32>().map(Some).map_err(|_| ())
}

/// The manual-entry validation pass over parsed rows; offenders become
/// warnings and drop out of the preview
fn validate_rows(
    rows: Vec<(usize, FilmRecord)>,
    mut warnings: Vec<ImportWarning>,
) -> (Vec<FilmRecord>, Vec<ImportWarning>) {
    let mut valid = Vec::new();
    for (row, record) in rows {
        match record.to_unit() {
            Ok(_) => valid.push(record),
            Err(message) => warnings.push(ImportWarning { row, message }),
        }
    }
    warnings.sort_by_key(|w| w.row);
    (valid, warnings)
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Minimal CSV reader with RFC-style quoting (embedded commas, quotes and
/// newlines inside quoted fields)
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilmFormat, FilmType, ImageRef};

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::database::schema::init_schema(&conn).unwrap();
        conn
    }

    fn seed(conn: &Connection) -> Vec<FilmUnit> {
        let mut portra =
            FilmUnit::new("Portra 400", "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        portra.quantity = 2;
        portra.expiry_dates = vec!["12/2026".to_string(), "2027".to_string()];
        portra.exposures = Some(36);
        portra.comments = Some("fridge, top shelf".to_string());

        let mut fp4 = FilmUnit::new(
            "FP4+",
            "Ilford",
            FilmType::BlackAndWhite,
            125,
            FilmFormat::Sheet4x5,
        );
        fp4.quantity = 25;
        fp4.is_frozen = true;

        let mut minox = FilmUnit::new(
            "Minopan 100",
            "Minox",
            FilmType::BlackAndWhite,
            100,
            FilmFormat::Other("8x11".to_string()),
        );
        minox.comments = Some("tiny, weird, wonderful".to_string());

        for unit in [&portra, &fp4, &minox] {
            film_service::create_film(conn, unit).unwrap();
        }
        vec![portra, fp4, minox]
    }

    #[tokio::test]
    async fn test_zip_export_round_trip() {
        let conn = setup_test_db();
        let seeded = seed(&conn);

        let dir = tempfile::tempdir().unwrap();
        let path = export_to_zip(&conn, dir.path()).await.unwrap();
        let bytes = fs::read(&path).unwrap();

        let (records, warnings) = import_file(&bytes).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(records.len(), 3);

        // commit into a fresh database and compare the interchange fields
        let fresh = setup_test_db();
        let summary = commit_import(&fresh, &records).unwrap();
        assert_eq!(summary.created, 3);
        assert_eq!(summary.merged, 0);

        let imported = film_service::list_films(&fresh).unwrap();
        for (original, copy) in seeded.iter().zip(&imported) {
            assert_eq!(copy.name, original.name);
            assert_eq!(copy.manufacturer, original.manufacturer);
            assert_eq!(copy.film_type, original.film_type);
            assert_eq!(copy.speed, original.speed);
            assert_eq!(copy.format, original.format);
            assert_eq!(copy.quantity, original.quantity);
            assert_eq!(copy.expiry_dates, original.expiry_dates);
            assert_eq!(copy.is_frozen, original.is_frozen);
            assert_eq!(copy.exposures, original.exposures);
            assert_eq!(copy.comments, original.comments);
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let conn = setup_test_db();
        let seeded = seed(&conn);

        let csv = export_csv(&conn).unwrap();
        let (records, warnings) = import_file(csv.as_bytes()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(records.len(), 3);

        for (original, record) in seeded.iter().zip(&records) {
            let unit = record.to_unit().unwrap();
            assert_eq!(unit.name, original.name);
            assert_eq!(unit.format, original.format);
            assert_eq!(unit.quantity, original.quantity);
            assert_eq!(unit.expiry_dates, original.expiry_dates);
            assert_eq!(unit.is_frozen, original.is_frozen);
            assert_eq!(unit.exposures, original.exposures);
            assert_eq!(unit.comments, original.comments);
        }
    }

    #[test]
    fn test_import_drops_row_missing_name() {
        let doc = r#"{"films": [
            {"manufacturer": "Kodak", "name": "Portra 400", "type": "color",
             "speed": 400, "format": "35mm"},
            {"manufacturer": "Kodak", "type": "color", "speed": 200, "format": "35mm"},
            {"manufacturer": "Ilford", "name": "HP5+", "type": "black_and_white",
             "speed": 400, "format": "120"}
        ]}"#;

        let (records, warnings) = import_file(doc.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row, 2);
        assert!(warnings[0].message.contains("name"));
    }

    #[test]
    fn test_import_with_zero_valid_rows_is_not_an_error() {
        let doc = r#"{"films": [{"manufacturer": "Kodak", "type": "color"}]}"#;

        let (records, warnings) = import_file(doc.as_bytes()).unwrap();
        assert!(records.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_import_unknown_type_and_bad_expiry_are_row_scoped() {
        let csv = "manufacturer,name,type,speed,format,quantity,expiry_dates,frozen,exposures,comments\n\
                   Kodak,Portra 400,color,400,35mm,1,12/2026,false,36,\n\
                   Kodak,Gold 200,daguerreotype,200,35mm,1,,false,,\n\
                   Fuji,Provia 100F,slide,100,120,1,13/2026,false,,\n";

        let (records, warnings) = import_file(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Portra 400");
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].row, 2);
        assert!(warnings[0].message.contains("daguerreotype"));
        assert_eq!(warnings[1].row, 3);
    }

    #[test]
    fn test_csv_quoting_survives_commas_and_quotes() {
        let conn = setup_test_db();
        let mut unit = FilmUnit::new("Gold 200", "Kodak", FilmType::Color, 200, FilmFormat::Mm35);
        unit.comments = Some("say \"cheese\", please".to_string());
        film_service::create_film(&conn, &unit).unwrap();

        let csv = export_csv(&conn).unwrap();
        let (records, warnings) = import_file(csv.as_bytes()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            records[0].comments.as_deref(),
            Some("say \"cheese\", please")
        );
    }

    #[test]
    fn test_commit_import_merges_duplicates() {
        let conn = setup_test_db();
        let record = FilmRecord {
            manufacturer: "Kodak".to_string(),
            name: "Portra 400".to_string(),
            film_type: "color".to_string(),
            speed: 400,
            format: "35mm".to_string(),
            quantity: 1,
            expiry_dates: vec!["12/2026".to_string()],
            frozen: false,
            exposures: None,
            comments: None,
        };

        let summary = commit_import(&conn, &[record.clone(), record]).unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.merged, 1);

        let films = film_service::list_films(&conn).unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].quantity, 2);
    }

    #[test]
    fn test_preview_never_touches_the_ledger() {
        let conn = setup_test_db();
        seed(&conn);
        let csv = export_csv(&conn).unwrap();

        import_file(csv.as_bytes()).unwrap();
        assert_eq!(film_service::list_films(&conn).unwrap().len(), 3);

        // an abandoned preview commits nothing
        let other = setup_test_db();
        assert!(film_service::list_films(&other).unwrap().is_empty());
    }

    #[test]
    fn test_image_refs_stay_out_of_the_interchange() {
        let mut unit = FilmUnit::new("Portra 400", "Kodak", FilmType::Color, 400, FilmFormat::Mm35);
        unit.image_ref = ImageRef::Custom("kodak/portra.jpg".to_string());

        let record = FilmRecord::from_unit(&unit);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("portra.jpg"));
    }
}
