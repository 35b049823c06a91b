pub mod camera;
pub mod expiry_date;
pub mod film_unit;
pub mod grouped_film;
pub mod image_ref;
pub mod loaded_film;
pub mod manufacturer;

pub use camera::Camera;
pub use expiry_date::ExpiryDate;
pub use film_unit::{FilmFormat, FilmType, FilmUnit, ProductKey};
pub use grouped_film::{FormatInfo, GroupedFilm};
pub use image_ref::ImageRef;
pub use loaded_film::LoadedFilm;
pub use manufacturer::Manufacturer;
