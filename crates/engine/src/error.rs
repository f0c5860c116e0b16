use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Dataset file missing, unreadable or not parseable as a table.
    DataLoad(String),
    /// Anything raised while running a script, including syntax errors and
    /// references to undefined names.
    ScriptExecution(String),
    /// The execution namespace could not be built.
    Setup(String),
}

impl EngineError {
    /// The underlying cause without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::DataLoad(msg) | Self::ScriptExecution(msg) | Self::Setup(msg) => msg,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataLoad(msg) => write!(f, "Error loading CSV: {msg}"),
            Self::ScriptExecution(msg) => write!(f, "Script error: {msg}"),
            Self::Setup(msg) => write!(f, "Script setup error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<dataprobe_io::IoError> for EngineError {
    fn from(err: dataprobe_io::IoError) -> Self {
        EngineError::DataLoad(err.to_string())
    }
}
