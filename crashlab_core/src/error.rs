use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    #[error("unknown crypto provider: {name}. Available providers: {available}")]
    UnknownProvider { name: String, available: String },
    #[error("no game session found at {0}. Run init first.")]
    SessionNotFound(PathBuf),
    #[error("session state i/o failed")]
    Io(#[from] std::io::Error),
    #[error("session state is not valid JSON")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
