use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeskError>;

/// Failure taxonomy shared by every workdesk component.
///
/// The first three variants are expected outcomes of user interaction and are rendered back
/// to the user. The rest are operational failures that reach the top-level dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    /// Caller lacks the permission level required by the operation
    #[error("permission denied")]
    PermissionDenied,

    /// Referenced entity, path or token does not exist (or no longer exists)
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed validation; the current step should re-prompt
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Chat transport refused or failed an operation
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Durable store disagreed with the expected schema or state
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),

    #[error("{0}")]
    Internal(String),
}

impl DeskError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error is a normal interaction outcome rather than an operational fault.
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::NotFound(_) | Self::InvalidInput(_)
        )
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}
