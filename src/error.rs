use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by the filesystem object tree (scan, clean, delete).
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The operation needs a directory node.
    #[error("file is not a directory: {}", .0.display())]
    NotDirectory(PathBuf),

    /// The operation needs a regular file node.
    #[error("file is not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    /// Control signal used by the cleaner to keep a directory that still holds files.
    /// Never surfaced outside of `FilesystemObject::clean`.
    #[error("directory not empty: {}", .0.display())]
    DirectoryNotEmpty(PathBuf),

    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        FsError::Io { op, path: path.to_path_buf(), source }
    }

    /// The disk error kind behind this error, if it came from disk at all.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            FsError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::NotFound)
    }

    pub fn is_permission_denied(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::PermissionDenied)
    }
}

/// The error type returned by HTTP handlers.
///
/// Every variant renders as `{"error": "<message>"}` with the matching status code.
#[derive(Debug)]
pub enum AppError {
    /// Unexpected failures. The outermost context is returned as the message.
    Internal(anyhow::Error),
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    MethodNotAllowed,
    /// Disk I/O failures that are not the client's fault.
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "internal error: {}", e),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::MethodNotAllowed => write!(f, "method not supported"),
            AppError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => tracing::error!("Internal error: {:?}", e),
            AppError::IoError(msg) => tracing::error!("I/O error: {}", msg),
            _ => {}
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::IoError(format!("{}: {}", err.kind(), err))
    }
}

impl From<FsError> for AppError {
    fn from(err: FsError) -> Self {
        if err.is_not_found() {
            return AppError::NotFound("file not found".to_string());
        }
        if err.is_permission_denied() {
            return AppError::Forbidden("forbidden".to_string());
        }
        match err {
            FsError::NotDirectory(_) | FsError::NotRegularFile(_) => {
                AppError::BadRequest(err.to_string())
            }
            FsError::Io { .. } => AppError::IoError(err.to_string()),
            FsError::DirectoryNotEmpty(_) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(anyhow::anyhow!("blocking task failed: {}", err))
    }
}

/// A type alias for `Result<T, AppError>`, used by the HTTP layer.
pub type AppResult<T> = Result<T, AppError>;

/// A type alias for `Result<T, FsError>`, used by the object tree.
pub type FsResult<T> = Result<T, FsError>;
