//! Error types for binding and for building sources.
//!
//! A bind never stops at the first bad node: every terminal failure becomes a
//! [`ResolveError`] and the whole set is returned as one [`ErrorReport`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shape::Shape;
use crate::value::Value;

// =============================================================================
// Source Outcomes
// =============================================================================

/// Why a source did not produce a value for a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The source has nothing under this key. The next source is tried.
    #[error("value not present")]
    NotPresent,

    /// The source cannot express this shape. Fatal for the node.
    #[error("value shape not supported")]
    Unsupported,

    /// The source holds a value that cannot be read as the requested shape.
    /// Fatal for the node.
    #[error("invalid value: {reason}")]
    Invalid { reason: String },
}

impl LoadError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// A value could not be coerced into the destination slot.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, found {found}")]
pub struct Mismatch {
    /// Shape of the destination slot.
    pub expected: Shape,
    /// Description of the offending value.
    pub found: String,
}

impl Mismatch {
    pub fn new(expected: Shape, found: &Value) -> Self {
        Self {
            expected,
            found: found.kind().to_string(),
        }
    }

    pub fn out_of_range(expected: Shape, value: i64, type_name: &str) -> Self {
        Self {
            expected,
            found: format!("{value}, which is out of range for {type_name}"),
        }
    }
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// A terminal failure for one node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// No source had a value for a required key.
    #[error("no value in any source for `{key}`")]
    NotPresent {
        /// Rendered key of the node.
        key: String,
    },

    /// A source cannot express the slot's shape.
    #[error("source `{origin}` cannot provide a {shape} value for `{key}`")]
    Unsupported {
        key: String,
        /// Name of the source that answered.
        origin: String,
        shape: Shape,
    },

    /// A source holds a value that does not fit the slot.
    #[error("source `{origin}` holds an invalid {shape} value for `{key}`: {reason}")]
    InvalidValue {
        key: String,
        origin: String,
        shape: Shape,
        reason: String,
    },
}

impl ResolveError {
    /// Rendered key of the failing node.
    pub fn key(&self) -> &str {
        match self {
            Self::NotPresent { key }
            | Self::Unsupported { key, .. }
            | Self::InvalidValue { key, .. } => key,
        }
    }

    /// Name of the source responsible, if a single source was.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::NotPresent { .. } => None,
            Self::Unsupported { origin, .. } | Self::InvalidValue { origin, .. } => Some(origin),
        }
    }
}

/// Every node failure of one bind, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    errors: Vec<ResolveError>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ResolveError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolveError> {
        self.errors.iter()
    }

    /// Rendered keys of all failing nodes.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(ResolveError::key)
    }

    pub fn as_slice(&self) -> &[ResolveError] {
        &self.errors
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorReport {}

impl IntoIterator for ErrorReport {
    type Item = ResolveError;
    type IntoIter = std::vec::IntoIter<ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorReport {
    type Item = &'a ResolveError;
    type IntoIter = std::slice::Iter<'a, ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<ResolveError> for ErrorReport {
    fn from_iter<I: IntoIterator<Item = ResolveError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// Errors returned by a bind call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// The destination is a leaf, so there is nothing to traverse.
    #[error("cannot bind into `{type_name}`: expected a record or sequence, found a {shape}")]
    NotStructured {
        type_name: &'static str,
        shape: Shape,
    },

    /// One or more nodes could not be resolved.
    #[error("failed to bind configuration ({} error(s)):\n{}", .0.len(), .0)]
    Unresolved(ErrorReport),
}

impl BindError {
    /// Node failures, empty for precondition errors.
    pub fn errors(&self) -> &[ResolveError] {
        match self {
            Self::NotStructured { .. } => &[],
            Self::Unresolved(report) => report.as_slice(),
        }
    }
}

// =============================================================================
// Source Construction Errors
// =============================================================================

/// Errors raised while building a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File not found at the specified path.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file format is unknown or its cargo feature is disabled.
    #[error("unsupported or disabled configuration file format: {0}")]
    UnsupportedFormat(String),

    /// The document could not be parsed.
    #[error("failed to parse {name}: {message}")]
    Parse { name: String, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bind operations.
pub type BindResult<T> = Result<T, BindError>;

/// Result type for source construction.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display_lists_every_error() {
        let report: ErrorReport = [
            ResolveError::NotPresent {
                key: "server.port".into(),
            },
            ResolveError::InvalidValue {
                key: "workers".into(),
                origin: "env:APP".into(),
                shape: Shape::Integer,
                reason: "`many` is not an integer".into(),
            },
        ]
        .into_iter()
        .collect();

        let text = report.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("no value in any source for `server.port`"));
        assert!(text.contains("source `env:APP` holds an invalid integer value for `workers`"));
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["server.port", "workers"]);
    }

    #[test]
    fn test_bind_error_counts() {
        let err = BindError::Unresolved(
            [ResolveError::NotPresent { key: "a".into() }]
                .into_iter()
                .collect(),
        );
        let text = err.to_string();
        assert!(text.starts_with("failed to bind configuration (1 error(s)):\n"));
        assert!(text.ends_with("no value in any source for `a`"));
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn test_origin() {
        let err = ResolveError::Unsupported {
            key: "labels".into(),
            origin: "env".into(),
            shape: Shape::Table,
        };
        assert_eq!(err.origin(), Some("env"));
        assert_eq!(err.key(), "labels");
        assert_eq!(
            ResolveError::NotPresent { key: "x".into() }.origin(),
            None
        );
    }
}
