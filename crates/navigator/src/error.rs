use std::path::PathBuf;
use thiserror::Error;
use workdesk_protocol::DeskError;
use workdesk_session::SessionError;

pub type Result<T> = std::result::Result<T, NavigatorError>;

#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("'{0}' no longer exists")]
    NotFound(String),

    #[error("'{0}' is outside the permitted folder")]
    OutsideRoot(String),

    #[error("invalid path '{0}'")]
    InvalidPath(String),

    #[error("'{0}' is not a folder")]
    NotADirectory(String),

    #[error("'{0}' is not a file")]
    NotAFile(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl NavigatorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.display().to_string());
        }
        Self::Io { path, source }
    }
}

impl From<NavigatorError> for DeskError {
    fn from(err: NavigatorError) -> Self {
        match err {
            NavigatorError::NotFound(what) => DeskError::NotFound(format!("'{what}'")),
            NavigatorError::OutsideRoot(_) => DeskError::PermissionDenied,
            NavigatorError::InvalidPath(_)
            | NavigatorError::NotADirectory(_)
            | NavigatorError::NotAFile(_) => DeskError::InvalidInput(err.to_string()),
            NavigatorError::Io { .. } => DeskError::Internal(err.to_string()),
            NavigatorError::Session(inner) => inner.into(),
        }
    }
}
