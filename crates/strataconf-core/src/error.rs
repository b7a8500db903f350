//! Error types for strataconf
//!
//! Errors are structured: a kind, the config key involved, the source
//! location (file, line) when one is known, and an actionable help message.

use std::fmt;

/// Result type alias for strataconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strataconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Config key the error relates to (e.g., "database.port")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
}

/// A key left pending when resolution stopped making progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedKey {
    /// The pending key
    pub key: String,
    /// Its partially substituted value
    pub raw: String,
    /// Placeholder tokens that could not be replaced, in order of appearance
    pub tokens: Vec<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source file is not valid YAML/JSON/properties syntax
    Parse,
    /// A `${...}` token without a usable key name
    MalformedPlaceholder { token: String },
    /// Resolution terminated with keys still pending
    Unresolved { keys: Vec<UnresolvedKey> },
    /// I/O error (file exists but cannot be read, etc.)
    Io,
}

impl Error {
    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            path: None,
            source_location: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create a malformed placeholder error
    pub fn malformed_placeholder(token: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedPlaceholder {
                token: token.into(),
            },
            path: None,
            source_location: None,
            help: Some("Placeholders must name a key: ${name} or ${name:default}".into()),
            cause: None,
        }
    }

    /// Create an unresolved reference error listing every pending key
    pub fn unresolved(keys: Vec<UnresolvedKey>) -> Self {
        let cause = keys
            .iter()
            .map(|k| format!("{} = {} (unresolved: {})", k.key, k.raw, k.tokens.join(", ")))
            .collect::<Vec<_>>()
            .join("\n  ");
        Self {
            kind: ErrorKind::Unresolved { keys },
            path: None,
            source_location: None,
            help: Some(
                "Define the referenced keys in a source or give the placeholders a default: ${name:default}"
                    .into(),
            ),
            cause: Some(cause),
        }
    }

    /// Create an I/O error for a file that could not be read
    pub fn io(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            path: None,
            source_location: Some(SourceLocation {
                file: file.into(),
                line: None,
            }),
            help: Some("Check that the file is readable".into()),
            cause: Some(message.into()),
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Keys left unresolved, if this is an unresolved reference error
    pub fn unresolved_keys(&self) -> Option<&[UnresolvedKey]> {
        match &self.kind {
            ErrorKind::Unresolved { keys } => Some(keys),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message
        match &self.kind {
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::MalformedPlaceholder { token } => {
                write!(f, "Malformed placeholder: {}", token)?
            }
            ErrorKind::Unresolved { keys } => {
                write!(f, "Unresolved references in {} key(s)", keys.len())?
            }
            ErrorKind::Io => write!(f, "I/O error")?,
        }

        // Path context
        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        // Source location
        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
        }

        // Cause
        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        // Help
        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
