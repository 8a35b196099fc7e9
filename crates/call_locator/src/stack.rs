//! Where in the source a call came from.

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use crate::error::LocatorError;

/// A call-stack frame reduced to a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The path as the compiler recorded it; usually relative to the workspace.
    pub path: PathBuf,
    /// 1-based.
    pub line: usize,
    /// 0-based char column, when the provider knows it.
    pub column: Option<usize>,
}

impl Frame {
    pub fn new(path: impl Into<PathBuf>, line: usize, column: Option<usize>) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }

    /// The location of the caller of the function this is called from.
    /// That function must itself be `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&Location<'_>> for Frame {
    fn from(location: &Location<'_>) -> Self {
        Self {
            path: PathBuf::from(location.file()),
            line: location.line() as usize,
            column: (location.column() as usize).checked_sub(1),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{}", column + 1)?;
        }
        Ok(())
    }
}

/// Source of call-stack frames.
pub trait FrameLocator {
    /// The frame `skip` levels above the function calling `locate`: `0` is that
    /// function's own frame, `1` its caller.
    fn locate(&self, skip: usize) -> Result<Frame, LocatorError>;
}

/// A locator for builds without stack walking. Every lookup fails, so only
/// the explicit-frame entry points work.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStack;

impl FrameLocator for NoStack {
    fn locate(&self, skip: usize) -> Result<Frame, LocatorError> {
        Err(LocatorError::StackUnavailable { skip })
    }
}

#[cfg(feature = "backtrace")]
pub use walk::BacktraceLocator;

#[cfg(feature = "backtrace")]
mod walk {
    use backtrace::{Backtrace, BacktraceSymbol};
    use tracing::trace;

    use super::{Frame, FrameLocator};
    use crate::error::LocatorError;
    use crate::utils::LOG_TARGET_SOURCE;

    /// Walks the native stack with the `backtrace` crate and reads file and
    /// line from debug info.
    ///
    /// Needs line tables in the test profile. Inlined calls are expanded into
    /// separate frames, so skip counts follow the source-level call chain.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BacktraceLocator;

    type LocateFn = fn(&BacktraceLocator, usize) -> Result<Frame, LocatorError>;

    impl FrameLocator for BacktraceLocator {
        #[inline(never)]
        fn locate(&self, skip: usize) -> Result<Frame, LocatorError> {
            let anchor = <BacktraceLocator as FrameLocator>::locate as LocateFn as usize;
            let trace = Backtrace::new();

            let mut symbols = Vec::new();
            let mut anchor_index = None;
            for frame in trace.frames() {
                if anchor_index.is_none() && frame.symbol_address() as usize == anchor {
                    anchor_index = Some(symbols.len() + frame.symbols().len().saturating_sub(1));
                }
                symbols.extend(frame.symbols());
            }
            let anchor_index = anchor_index
                .or_else(|| symbols.iter().position(is_locate_symbol))
                .ok_or(LocatorError::StackUnavailable { skip })?;

            let target = (anchor_index + 1)
                .checked_add(skip)
                .and_then(|index| symbols.get(index))
                .ok_or(LocatorError::StackUnavailable { skip })?;
            let (Some(path), Some(line)) = (target.filename(), target.lineno()) else {
                trace!(target: LOG_TARGET_SOURCE, "frame {} has no line info: {:?}", skip, target.name());
                return Err(LocatorError::StackUnavailable { skip });
            };
            Ok(Frame {
                path: path.to_path_buf(),
                line: line as usize,
                column: target.colno().and_then(|c| (c as usize).checked_sub(1)),
            })
        }
    }

    fn is_locate_symbol(symbol: &&BacktraceSymbol) -> bool {
        symbol.name().is_some_and(|name| {
            let name = format!("{name:#}");
            name.contains("BacktraceLocator as") && name.ends_with("FrameLocator>::locate")
        })
    }
}
