use crate::error::AppError;
use crate::models::FilmUnit;
use crate::services::film_service;
use rusqlite::{params, Connection};

/// Result of feeding an incoming record through the merge-or-create decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Quantity was added onto an existing ledger row
    Merged(String),
    /// A new ledger row was created
    Created(String),
}

impl ReconcileOutcome {
    pub fn uuid(&self) -> &str {
        match self {
            ReconcileOutcome::Merged(uuid) | ReconcileOutcome::Created(uuid) => uuid,
        }
    }
}

/// Decides whether an incoming film record is a true duplicate of an
/// existing ledger row and merges it (quantity increment), or creates a
/// new row. The match is conservative: product identity key, format pair,
/// expiry-date set, frozen flag and exposures must all be identical, so
/// deliberately distinct batches keep their own rows.
pub fn reconcile(conn: &Connection, incoming: &FilmUnit) -> Result<ReconcileOutcome, AppError> {
    let tx = conn.unchecked_transaction()?;
    let outcome = reconcile_within(&tx, incoming)?;
    tx.commit()?;
    Ok(outcome)
}

/// The decision itself, for callers that already hold a transaction
pub(crate) fn reconcile_within(
    conn: &Connection,
    incoming: &FilmUnit,
) -> Result<ReconcileOutcome, AppError> {
    incoming.validate()?;

    if let Some(existing) = find_duplicate(conn, incoming)? {
        film_service::adjust_quantity(conn, &existing.uuid, incoming.quantity as i64)?;
        log::debug!(
            "Merged {} x{} into existing row {}",
            incoming.name,
            incoming.quantity,
            existing.uuid
        );
        return Ok(ReconcileOutcome::Merged(existing.uuid));
    }

    let uuid = film_service::create_film(conn, incoming)?;
    Ok(ReconcileOutcome::Created(uuid))
}

/// Looks for an existing row that is indistinguishable from the incoming
/// one. Identity key and format narrow the candidates in SQL (manufacturer
/// matches case-insensitively via its column collation); the remaining
/// representative fields are compared in Rust.
fn find_duplicate(conn: &Connection, incoming: &FilmUnit) -> Result<Option<FilmUnit>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.uuid, f.name, m.name, f.film_type, f.speed, f.format,
                f.custom_format_name, f.quantity, f.expiry_dates, f.is_frozen,
                f.exposures, f.comments, f.image_ref_kind, f.image_ref_value,
                f.created_at, f.updated_at
         FROM film_units f
         JOIN manufacturers m ON m.id = f.manufacturer_id
         WHERE f.name = ?1 AND m.name = ?2 AND f.film_type = ?3 AND f.speed = ?4
           AND f.format = ?5 AND f.custom_format_name IS ?6
         ORDER BY f.id",
    )?;

    let candidates = stmt
        .query_map(
            params![
                incoming.name,
                incoming.manufacturer,
                incoming.film_type.as_str(),
                incoming.speed,
                incoming.format.as_str(),
                incoming.format.custom_name(),
            ],
            |row| FilmUnit::try_from(row),
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let incoming_expiry = incoming.expiry_set();
    Ok(candidates.into_iter().find(|c| {
        c.expiry_set() == incoming_expiry
            && c.is_frozen == incoming.is_frozen
            && c.exposures == incoming.exposures
    }))
}
