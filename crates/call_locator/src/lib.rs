//! Recovers the source text of the arguments passed at a call site.
//!
//! Given a frame of the running call stack, the caller's source file is
//! parsed with `syn`, the call expression on the reported line is found and
//! the requested argument is sliced back out of the original text. Test
//! helpers use this to say `assertion failed: user.is_admin()` instead of
//! `assertion failed`.
//!
//! The pipeline is [`stack`] -> [`source`] -> [`scan`] -> [`resolve`] ->
//! [`format`], tied together by [`Resolver`].

pub mod config;
pub mod error;
mod facade;
pub mod format;
pub mod resolve;
pub mod scan;
pub mod source;
pub mod stack;
pub mod syntax;
mod utils;

pub use config::{LocatorConfig, MatchStrategy};
pub use error::{ArgumentIndexError, LocatorError, ResolutionError};
pub use format::ArgumentExtractor;
pub use facade::{Resolver, caller_argument, caller_assertion_failure, with_custom_message};
pub use resolve::{CallSite, CallSiteResolver};
pub use scan::{LineMatch, LineScanner, MatchOrigin};
pub use source::{SourceCache, SourceFile};
pub use stack::{Frame, FrameLocator, NoStack};

#[cfg(feature = "backtrace")]
pub use facade::{assertion_failure, call_expr_args, formatted_call_arg};
#[cfg(feature = "backtrace")]
pub use stack::BacktraceLocator;
