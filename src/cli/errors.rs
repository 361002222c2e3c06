use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("The {task} task reported an error")]
    TaskFailed { task: String },

    #[error("{failed} of {total} downloads failed")]
    PartialDownload { failed: usize, total: usize },

    #[error("Could not create HTTP client: {0}")]
    Transport(#[from] s2water::io::TransportError),

    #[error(transparent)]
    Lib(#[from] s2water::Error),
}
