use thiserror::Error;
use workdesk_protocol::DeskError;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Invalid search root '{0}'")]
    InvalidRoot(String),

    #[error("{0}")]
    Other(String),
}

impl From<SearchError> for DeskError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => DeskError::invalid("type at least one word to search for"),
            SearchError::InvalidRoot(_) => DeskError::PermissionDenied,
            SearchError::Other(message) => DeskError::Internal(message),
        }
    }
}
