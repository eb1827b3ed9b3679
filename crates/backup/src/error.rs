use thiserror::Error;

use elecpos_backend::BackendError;

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid archive entry \"{0}\"")]
    BadEntry(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("invalid JSON in \"{entry}\": {source}")]
    BadJson {
        entry: String,
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
