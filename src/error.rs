//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts geometry, catalog, engine and I/O errors, and provides semantic variants
//! for input validation, session state and processing failures.
use thiserror::Error;

use crate::core::validate::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Geometry error: {0}")]
    Geometry(#[from] crate::io::GeometryError),

    #[error("{0}")]
    Catalog(#[from] crate::io::CatalogError),

    #[error("Processing engine error: {0}")]
    Engine(#[from] crate::io::EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not logged in: authenticate before searching or downloading")]
    NotAuthenticated,

    #[error("A {0} task is already running")]
    TaskBusy(crate::session::TaskKind),

    #[error("No products available for download. Run a search first.")]
    NoProducts,

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Error::Config(e.to_string())
    }
}
