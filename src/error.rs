use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 1-based column (character offset within the line)
    pub column: usize,
    /// 0-based absolute character offset from the start of input
    pub offset: usize,
}

impl Position {
    pub fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

/// A tokenizer or parser error with the source location it was raised at.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    /// File the offending token came from; `None` for in-memory sources.
    pub file: Option<PathBuf>,
    pub position: Position,
    pub message: String,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, file: Option<&Path>, position: Position) -> Self {
        SyntaxError {
            file: file.map(Path::to_path_buf),
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self
            .file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<input>".to_string());
        write!(
            f,
            "{}:{}:{}: {}",
            file, self.position.line, self.position.column, self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Every failure the library reports.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read or written, or an include directory is missing.
    #[error("unable to access {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Grammar violation with its source position.
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),

    /// Navigation miss by name or index.
    #[error("setting not found: {path}")]
    SettingNotFound { path: String },

    /// A group already holds a child with this name.
    #[error("setting name already exists: {path}")]
    SettingNameConflict { path: String },

    /// Scalar conversion, range or array homogeneity violation.
    #[error("type error at '{path}': {message}")]
    Type { path: String, message: String },

    /// Malformed path string or other bad argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation does not apply to this kind of setting.
    #[error("operation '{operation}' not supported on '{path}'")]
    OperationNotSupported {
        operation: &'static str,
        path: String,
    },
}

impl ConfigError {
    pub(crate) fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::FileIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn type_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Type {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        ConfigError::SettingNotFound { path: path.into() }
    }

    /// Check if this error indicates a setting was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::SettingNotFound { .. })
    }

    /// Check if this error is a conversion or homogeneity violation
    pub fn is_type_error(&self) -> bool {
        matches!(self, ConfigError::Type { .. })
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, ConfigError::Syntax(_))
    }

    pub fn is_io_error(&self) -> bool {
        matches!(self, ConfigError::FileIo { .. })
    }

    /// The syntax error details, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            ConfigError::Syntax(err) => Some(err),
            _ => None,
        }
    }

    /// The settings path attached to this error, for navigation and type errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::SettingNotFound { path }
            | ConfigError::SettingNameConflict { path }
            | ConfigError::Type { path, .. }
            | ConfigError::OperationNotSupported { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
