use std::path::PathBuf;
use thiserror::Error;

/// Structural and configuration failures surfaced to the caller.
///
/// Data-availability conditions (unknown user, no positive ratings, empty
/// popularity table) are not errors; the scorers resolve them internally
/// through the cold-start fallback.
#[derive(Debug, Error)]
pub enum RecError {
    #[error("missing required data file: {0}")]
    MissingMatrix(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} matrix has inconsistent shape")]
    Shape { name: String },

    #[error("{name} matrix is not square")]
    NotSquare { name: String },

    #[error("duplicate id {id} in {name} matrix")]
    DuplicateId { name: String, id: u32 },

    #[error("{name} matrix has no entry for id {id}")]
    MissingId { name: String, id: u32 },

    #[error("top_k must be greater than zero")]
    InvalidTopK,
}
