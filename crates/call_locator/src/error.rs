use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of one pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocatorError {
    /// The frame `skip` levels above the caller could not be determined.
    #[error("failed to get call stack at depth {skip}")]
    StackUnavailable { skip: usize },

    #[error("failed to read {}: {message}", .path.display())]
    SourceRead {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("failed to parse {}:{line}:{column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// No syntax node starts or ends on the line.
    #[error("failed to find an expression on line {line}")]
    NodeNotFound { line: usize },

    #[error("failed to find a call expression on line {line}")]
    NoCallExpression { line: usize },

    #[error("ambiguous call expression: multiple ({count}) deferred calls on line {line}")]
    AmbiguousCallExpression { line: usize, count: usize },
}

impl LocatorError {
    pub(crate) fn source_read(path: &Path, err: &io::Error) -> Self {
        LocatorError::SourceRead {
            path: path.to_path_buf(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, err: &syn::Error) -> Self {
        let start = err.span().start();
        LocatorError::Parse {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column,
            message: err.to_string(),
        }
    }
}

/// An argument index past the end of the resolved call's argument list.
///
/// Kept apart from [`LocatorError`]: resolution worked, the caller asked for
/// an argument that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("argument index {index} out of range: call to {callee} has {count} arguments")]
pub struct ArgumentIndexError {
    pub index: usize,
    pub count: usize,
    pub callee: String,
}

/// The single error returned by the resolver facade.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not determine source expression: {}{kind}", frame_prefix(.frame))]
pub struct ResolutionError {
    frame: Option<(PathBuf, usize)>,
    #[source]
    kind: LocatorError,
}

impl ResolutionError {
    pub(crate) fn new(frame: Option<(PathBuf, usize)>, kind: LocatorError) -> Self {
        Self { frame, kind }
    }

    pub fn kind(&self) -> &LocatorError {
        &self.kind
    }

    /// Path and line of the frame being resolved, when the stack lookup got
    /// that far.
    pub fn frame(&self) -> Option<(&Path, usize)> {
        self.frame.as_ref().map(|(path, line)| (path.as_path(), *line))
    }
}

fn frame_prefix(frame: &Option<(PathBuf, usize)>) -> String {
    frame
        .as_ref()
        .map(|(path, line)| format!("call from {}:{}: ", path.display(), line))
        .unwrap_or_default()
}
