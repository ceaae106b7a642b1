use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("issue tracker error: {0}")]
    IssueTracker(String),
    #[error("proxy error: {0}")]
    Proxy(String),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Message without the category prefix, suitable for showing to a user.
    pub fn detail(&self) -> String {
        match self {
            AppError::Configuration(message)
            | AppError::Validation(message)
            | AppError::IssueTracker(message)
            | AppError::Proxy(message)
            | AppError::Terminal(message) => message.clone(),
            AppError::Io(err) => err.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
