use crate::domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Status queue is closed")]
    QueueClosed,

    #[error("Other error: {0}")]
    Other(String),
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_converts() {
        let err: AppError = DomainError::InvalidFlagName("bad name".to_string()).into();
        assert!(matches!(err, AppError::Domain(_)));
        assert_eq!(err.to_string(), "Domain error: Invalid flag name: 'bad name'");
    }

    #[test]
    fn test_queue_closed_message() {
        assert_eq!(AppError::QueueClosed.to_string(), "Status queue is closed");
    }
}
