use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering candidates, reading config or talking to the catalog.
///
/// Resolution and URL normalization never produce one of these: a missing
/// image is a normal outcome, not an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk image folder: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Image folder does not exist: {}", .0.display())]
    MissingFolder(PathBuf),

    #[error("Could not determine user {0} directory")]
    NoUserDir(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Candidate source '{source_label}' failed: {reason}")]
    Source {
        source_label: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
