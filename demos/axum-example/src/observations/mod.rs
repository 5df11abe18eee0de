pub mod domain;
pub use self::domain::{ImportResponse, UploadResponse};

pub(crate) mod repository;

pub(crate) mod routes;
pub use self::routes::{FlatObservation, ListOption};
