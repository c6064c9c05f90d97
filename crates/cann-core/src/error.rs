use thiserror::Error;

/// Errors raised by the core library.
///
/// The validation variants carry the user-facing text shown in the alert
/// popup, so `Display` is written for end users rather than for logs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("请填写{0}")]
    MissingField(&'static str),

    #[error("算子名称必须是合法的C++标识符: {0}")]
    InvalidName(String),

    #[error("{field}格式无效: {value}")]
    InvalidShape { field: &'static str, value: String },

    #[error("could not determine {0} directory")]
    NoDirectory(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True for errors caused by form input, as opposed to environment failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::MissingField(_) | CoreError::InvalidName(_) | CoreError::InvalidShape { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
