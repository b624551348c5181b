use thiserror::Error;
use workdesk_protocol::DeskError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Token unknown in the current generation (stale render or never issued)
    #[error("token '{0}' is no longer valid")]
    UnknownToken(String),

    #[error("could not allocate a unique token after {0} attempts")]
    TokensExhausted(usize),

    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}

impl From<SessionError> for DeskError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownToken(_) => {
                DeskError::not_found("this menu is outdated, please open it again")
            }
            other => DeskError::internal(other.to_string()),
        }
    }
}
