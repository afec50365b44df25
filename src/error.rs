use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, BanditError>;

/// Decoding or encoding failure from one of the on-disk formats.
pub type CodecError = Box<dyn StdError + Send + Sync>;

/// Errors raised by the agent, its model and its persistence.
///
/// File-backed failures carry the path they happened at when it is known,
/// so a caller juggling several agents can tell which weight file or
/// snapshot was at fault.
#[derive(Debug)]
pub enum BanditError {
    /// A state, target or weight matrix has the wrong shape.
    DimensionMismatch { expected: String, actual: String },

    /// A configuration value or call argument is out of range.
    InvalidParameter { name: String, reason: String },

    /// Reading or writing a weight file, state snapshot or telemetry stream failed.
    IoError { path: Option<PathBuf>, source: io::Error },

    /// A weight file or state snapshot could not be encoded or decoded.
    SerializationError { path: Option<PathBuf>, source: CodecError },

    /// NaN or infinite values in inputs, predictions or the training loss.
    NumericalError(String),

    /// Replay was asked to sample from an empty experience buffer.
    EmptyBuffer { requested: usize },

    /// Action index outside the action space.
    InvalidAction { action: usize, max_actions: usize },
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &Option<PathBuf>) -> fmt::Result {
    match path {
        Some(path) => write!(f, " at {}", path.display()),
        None => Ok(()),
    }
}

impl fmt::Display for BanditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BanditError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, actual)
            }
            BanditError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{}': {}", name, reason)
            }
            BanditError::IoError { path, source } => {
                write!(f, "io error")?;
                write_path(f, path)?;
                write!(f, ": {}", source)
            }
            BanditError::SerializationError { path, source } => {
                write!(f, "serialization error")?;
                write_path(f, path)?;
                write!(f, ": {}", source)
            }
            BanditError::NumericalError(msg) => write!(f, "numerical error: {}", msg),
            BanditError::EmptyBuffer { requested } => {
                write!(f, "cannot sample {} observations from an empty buffer", requested)
            }
            BanditError::InvalidAction { action, max_actions } => {
                write!(f, "invalid action {}: must be less than {}", action, max_actions)
            }
        }
    }
}

impl StdError for BanditError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BanditError::IoError { source, .. } => Some(source),
            BanditError::SerializationError { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

impl From<io::Error> for BanditError {
    fn from(source: io::Error) -> Self {
        BanditError::IoError { path: None, source }
    }
}

impl From<bincode::Error> for BanditError {
    fn from(source: bincode::Error) -> Self {
        let source: CodecError = source;
        BanditError::SerializationError { path: None, source }
    }
}

impl From<serde_json::Error> for BanditError {
    fn from(source: serde_json::Error) -> Self {
        BanditError::SerializationError {
            path: None,
            source: Box::new(source),
        }
    }
}

impl BanditError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        BanditError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        BanditError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The file a persistence or telemetry failure happened at, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            BanditError::IoError { path, .. } | BanditError::SerializationError { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    /// Attach `path` to file-backed errors that do not carry one yet.
    pub fn at_path(mut self, at: &Path) -> Self {
        if let BanditError::IoError { path, .. } | BanditError::SerializationError { path, .. } = &mut self {
            if path.is_none() {
                *path = Some(at.to_path_buf());
            }
        }
        self
    }
}

/// Attaches the path being read or written to a failing file operation.
pub trait PathContext<T> {
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T, E: Into<BanditError>> PathContext<T> for std::result::Result<T, E> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|err| {
            let err: BanditError = err.into();
            err.at_path(path)
        })
    }
}
