//! Inventory engine for photographic film stock.
//!
//! The ledger tracks individual rolls and sheet batches, the grouping
//! engine projects them into product-level aggregates for display, the
//! loading service moves units in and out of cameras under a global
//! capacity cap, and the reconciliation engine decides merge-or-create
//! for incoming records (manual adds and bulk imports).
//!
//! The engine performs no UI work and no network I/O. The embedding
//! application opens the database, constructs a [`photo_store::PhotoStore`]
//! and serializes user actions onto one logical thread of control;
//! every mutation goes through the service functions, never through
//! direct field assignment.

pub mod database;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, ValidationError};

/// Initializes env_logger for the embedding application. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).try_init();
}
