use thiserror::Error;

/// Top level error surfaced by the contract core to its callers.
///
/// Each variant maps to exactly one HTTP status code in the external
/// interface (see `status_code`); the mapping is owned here so the
/// transport layer never has to re-derive it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ValidationError: {0}")]
    Validation(String),
    #[error("AuthFailed")]
    AuthFailed,
    #[error("Forbidden")]
    Forbidden,
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("StepAlreadyComplete")]
    StepAlreadyComplete,
    #[error("InvalidStepSignature")]
    InvalidStepSignature,
    #[error("KeyNotFound: {0}")]
    KeyNotFound(String),
    #[error("StepNotFound")]
    StepNotFound,
    #[error("StoreError: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// The status code this error is surfaced as over HTTP (spec.md §6/§7).
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::AuthFailed => 401,
            Error::InvalidStepSignature => 401,
            Error::Forbidden => 403,
            Error::NotFound(_) => 404,
            Error::StepNotFound => 404,
            Error::StepAlreadyComplete => 400,
            Error::KeyNotFound(_) => 500,
            Error::Store(_) => 500,
        }
    }
}

/// Local filesystem persistence failures. Fatal to the write path that
/// triggered them (§7 propagation policy).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Remote object-store (COS) failures. Never fatal — C5 always catches
/// these and falls back to the local store (§4.4, §7).
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote object store unavailable: {0}")]
    Unavailable(String),
    #[error("remote object store rejected authentication: {0}")]
    AuthFailed(String),
    #[error("remote object store record not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            RemoteError::Unavailable(e.to_string())
        } else if let Some(status) = e.status() {
            match status.as_u16() {
                401 | 403 => RemoteError::AuthFailed(e.to_string()),
                404 => RemoteError::NotFound(e.to_string()),
                _ => RemoteError::Unavailable(e.to_string()),
            }
        } else {
            RemoteError::Unavailable(e.to_string())
        }
    }
}
