use thiserror::Error;

/// Failure while handling one inbound message
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Logged only; the user is not told
    #[error(transparent)]
    Technical(#[from] anyhow::Error),

    /// Logged, and `human` is sent back to the user
    #[error("{cause:#}")]
    Reportable { human: String, cause: anyhow::Error },
}

impl HandlerError {
    pub fn reportable(human: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Reportable {
            human: human.into(),
            cause,
        }
    }

    /// User-facing text, if this error may be shown
    pub fn human(&self) -> Option<&str> {
        match self {
            HandlerError::Technical(_) => None,
            HandlerError::Reportable { human, .. } => Some(human),
        }
    }
}
