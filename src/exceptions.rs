use thiserror::Error;

#[derive(Error, Debug)]
pub enum CadasterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Error while contacting the external server: {0}")]
    VerifierUnavailable(String),

    #[error("{0}")]
    VerifierProtocol(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for CadasterError {
    fn from(err: rusqlite::Error) -> Self {
        CadasterError::Store(err.to_string())
    }
}
