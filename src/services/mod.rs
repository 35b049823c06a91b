pub mod camera_service;
pub mod export_import_service;
pub mod film_service;
pub mod grouping_service;
pub mod loading_service;
pub mod manufacturer_service;
pub mod photo_service;
pub mod reconcile_service;

pub use export_import_service::{FilmRecord, ImportSummary, ImportWarning};
pub use grouping_service::GroupFilter;
pub use loading_service::MAX_LOADED_FILMS;
pub use reconcile_service::ReconcileOutcome;
