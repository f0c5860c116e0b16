use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum IoError {
    /// File does not exist.
    NotFound(PathBuf),
    /// File exists but cannot be opened.
    PermissionDenied(PathBuf),
    /// Any other read failure.
    Read { path: PathBuf, message: String },
    /// Malformed delimited data.
    Parse { path: Option<PathBuf>, line: u64, message: String },
    /// No header row.
    Empty(Option<PathBuf>),
}

impl IoError {
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => IoError::PermissionDenied(path.to_path_buf()),
            _ => IoError::Read { path: path.to_path_buf(), message: err.to_string() },
        }
    }

    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            IoError::Parse { line, message, .. } => IoError::Parse { path: Some(path.to_path_buf()), line, message },
            IoError::Empty(_) => IoError::Empty(Some(path.to_path_buf())),
            other => other,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::PermissionDenied(path) => write!(f, "permission denied: {}", path.display()),
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path: Some(path), line, message } => {
                write!(f, "{}: line {line}: {message}", path.display())
            }
            Self::Parse { path: None, line, message } => write!(f, "line {line}: {message}"),
            Self::Empty(Some(path)) => write!(f, "{}: no columns to parse", path.display()),
            Self::Empty(None) => write!(f, "no columns to parse"),
        }
    }
}

impl std::error::Error for IoError {}
