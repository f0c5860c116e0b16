use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Referenced column does not exist.
    UnknownColumn(String),
    /// Two columns with the same name.
    DuplicateColumn(String),
    /// Column lengths disagree.
    LengthMismatch { column: String, expected: usize, found: usize },
    /// Operation needs a different element type.
    TypeMismatch { column: String, expected: &'static str },
    /// Operation needs at least one row or value.
    Empty(&'static str),
    /// Invalid argument (bad operator, out-of-range quantile, ...).
    Invalid(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownColumn(name) => write!(f, "unknown column '{name}'"),
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
            Self::LengthMismatch { column, expected, found } => {
                write!(f, "column '{column}' has {found} values, expected {expected}")
            }
            Self::TypeMismatch { column, expected } => {
                write!(f, "column '{column}' must be {expected}")
            }
            Self::Empty(what) => write!(f, "{what} requires at least one value"),
            Self::Invalid(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for FrameError {}
