//! Validation error types.

use std::fmt;
use thiserror::Error;

/// One step in the path to an offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object field name.
    Key(String),
    /// Array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Where the failure occurred. Empty for the root value.
    pub path: Vec<PathSegment>,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue.
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Returns the path joined with dots, e.g. `fragments.0.table`.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.dotted_path(), self.message)
    }
}

/// A payload did not match its schema.
///
/// Displays as every issue rendered `"  <path>: <message>"`, joined with `,`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Creates an error from a non-empty list of issues.
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Creates an error with a single issue at the root.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(Vec::new(), message)])
    }

    /// Returns the issues in the order they were found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// A later pipeline stage asked for a value no earlier stage stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no validated {0} in request context")]
pub struct MissingValue(pub &'static str);
