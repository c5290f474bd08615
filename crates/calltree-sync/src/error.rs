use calltree_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

pub type Result<T> = std::result::Result<T, SyncError>;
