use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilingError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("action forbidden: {} check(s) failed", .0.len())]
    ActionForbidden(Vec<String>),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("file too large: {0}")]
    FileTooLarge(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl FilingError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::ActionForbidden(_) => 403,
            Self::InvalidInput(_) => 400,
            Self::Unprocessable(_) => 422,
            Self::UnsupportedFile(_) => 415,
            Self::FileTooLarge(_) => 413,
            Self::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilingError>;
