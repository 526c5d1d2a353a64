use foundation::RouteError;
use thiserror::Error;

/// Fatal synthesis failures; raised before any frame is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] RouteError),
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl SynthesisError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SynthesisError::Configuration(message.into())
    }
}
