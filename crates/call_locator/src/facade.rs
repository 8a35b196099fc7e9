//! The entry points: frame in, argument text out.

use std::panic::Location;

use tracing::debug;

use crate::config::LocatorConfig;
use crate::error::{LocatorError, ResolutionError};
use crate::format::ArgumentExtractor;
use crate::resolve::{CallSite, CallSiteResolver};
use crate::scan::LineScanner;
use crate::source::{SourceCache, SourceFile, resolve_source_path};
use crate::stack::{Frame, FrameLocator};
use crate::utils::{LOG_TARGET_FACADE, LogStyle};

#[cfg(feature = "backtrace")]
type DefaultLocator = crate::stack::BacktraceLocator;
#[cfg(not(feature = "backtrace"))]
type DefaultLocator = crate::stack::NoStack;

const FAILURE_PREFIX: &str = "assertion failed";
const FAILURE_FALLBACK: &str = "expression is false";

thread_local! {
    static DEFAULT: Resolver<DefaultLocator> =
        Resolver::new(DefaultLocator::default()).with_config(LocatorConfig::from_env());
}

/// Ties stack lookup, parsing, scanning, resolution and formatting together.
pub struct Resolver<L> {
    locator: L,
    cache: SourceCache,
    config: LocatorConfig,
}

impl<L: Default> Default for Resolver<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L> Resolver<L> {
    pub fn new(locator: L) -> Self {
        Self {
            locator,
            cache: SourceCache::new(),
            config: LocatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LocatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache(mut self, cache: SourceCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Source text of argument `index` of the call made at `frame`.
    ///
    /// # Panics
    /// When the call has no argument `index`.
    pub fn formatted_argument_at(&self, frame: &Frame, index: usize) -> Result<String, ResolutionError> {
        let text = self.call_site_at(frame, |file, site| {
            ArgumentExtractor::new(file).extract(site, index)
        })?;
        match text {
            Ok(text) => Ok(text),
            Err(e) => panic!("{e}"),
        }
    }

    /// Source text of every argument of the call made at `frame`.
    pub fn argument_texts_at(&self, frame: &Frame) -> Result<Vec<String>, ResolutionError> {
        self.call_site_at(frame, |file, site| ArgumentExtractor::new(file).extract_all(site))
    }

    /// Resolves the call made at `frame` and runs `f` on it.
    ///
    /// Each scanner candidate is resolved in strategy order and the first one
    /// that yields a call wins. Ambiguity stops the search.
    pub fn call_site_at<R>(
        &self,
        frame: &Frame,
        f: impl FnOnce(&SourceFile, &CallSite<'_>) -> R,
    ) -> Result<R, ResolutionError> {
        let path = resolve_source_path(&frame.path);
        let file = self.cache.load(&path).map_err(|e| failure(frame, e))?;
        let scanner = LineScanner::new(&file, &self.config);
        let resolver = CallSiteResolver::new(&file, &self.config);

        let mut first_error = None;
        for candidate in scanner
            .candidates(frame.line, frame.column)
            .map_err(|e| failure(frame, e))?
        {
            match resolver.resolve(&candidate) {
                Ok(site) => return Ok(f(&file, &site)),
                Err(e @ LocatorError::AmbiguousCallExpression { .. }) => {
                    return Err(failure(frame, e));
                }
                Err(e) => {
                    debug!(target: LOG_TARGET_FACADE, "{} candidate failed: {}", candidate.origin, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        let cause = first_error.unwrap_or(LocatorError::NodeNotFound { line: frame.line });
        Err(failure(frame, cause))
    }
}

impl<L: FrameLocator> Resolver<L> {
    /// Source text of argument `index` of the call made by the frame `skip`
    /// levels up: `0` is the function calling this method.
    ///
    /// # Panics
    /// When the call has no argument `index`.
    #[inline(never)]
    pub fn formatted_argument(&self, skip: usize, index: usize) -> Result<String, ResolutionError> {
        let frame = self
            .locator
            .locate(caller_depth(skip)?)
            .map_err(|e| ResolutionError::new(None, e))?;
        self.formatted_argument_at(&frame, index)
    }

    /// Source text of every argument of the call made by the frame `skip`
    /// levels up.
    #[inline(never)]
    pub fn argument_texts(&self, skip: usize) -> Result<Vec<String>, ResolutionError> {
        let frame = self
            .locator
            .locate(caller_depth(skip)?)
            .map_err(|e| ResolutionError::new(None, e))?;
        self.argument_texts_at(&frame)
    }
}

/// Frame depth, counted from `locate`, of the caller `skip` levels above the
/// facade function.
fn caller_depth(skip: usize) -> Result<usize, ResolutionError> {
    skip.checked_add(1)
        .ok_or_else(|| ResolutionError::new(None, LocatorError::StackUnavailable { skip }))
}

fn failure(frame: &Frame, kind: LocatorError) -> ResolutionError {
    let shown = frame.to_string();
    debug!(target: LOG_TARGET_FACADE,
        "{} {}: {}",
        "Unresolved".log_error(),
        shown.as_str().log_path(),
        kind
    );
    ResolutionError::new(Some((frame.path.clone(), frame.line)), kind)
}

/// Source text of argument `index` of the call made by the frame `skip`
/// levels up, using this thread's default resolver.
///
/// ```ignore
/// fn check(value: bool) {
///     if !value {
///         // "check(user.is_admin())" -> "user.is_admin()"
///         panic!("{}", call_locator::formatted_call_arg(1, 0).unwrap());
///     }
/// }
/// ```
///
/// # Panics
/// When the call has no argument `index`.
#[cfg(feature = "backtrace")]
#[inline(never)]
pub fn formatted_call_arg(skip: usize, index: usize) -> Result<String, ResolutionError> {
    // Locate before entering the thread-local so its frames are not counted.
    let frame = DefaultLocator::default()
        .locate(caller_depth(skip)?)
        .map_err(|e| ResolutionError::new(None, e))?;
    DEFAULT.with(|resolver| resolver.formatted_argument_at(&frame, index))
}

/// Source text of every argument of the call made by the frame `skip` levels
/// up.
#[cfg(feature = "backtrace")]
#[inline(never)]
pub fn call_expr_args(skip: usize) -> Result<Vec<String>, ResolutionError> {
    let frame = DefaultLocator::default()
        .locate(caller_depth(skip)?)
        .map_err(|e| ResolutionError::new(None, e))?;
    DEFAULT.with(|resolver| resolver.argument_texts_at(&frame))
}

/// Source text of argument `index` at the call site of the enclosing
/// `#[track_caller]` function. Needs no stack walking.
///
/// # Panics
/// When the call has no argument `index`.
#[track_caller]
pub fn caller_argument(index: usize) -> Result<String, ResolutionError> {
    let frame = Frame::from(Location::caller());
    DEFAULT.with(|resolver| resolver.formatted_argument_at(&frame, index))
}

/// `assertion failed: <argument>` for the call made by the frame `skip`
/// levels up. Resolution failures are logged and produce a generic message.
#[cfg(feature = "backtrace")]
#[inline(never)]
pub fn assertion_failure(skip: usize, index: usize) -> String {
    let resolved = caller_depth(skip)
        .and_then(|depth| {
            DefaultLocator::default()
                .locate(depth)
                .map_err(|e| ResolutionError::new(None, e))
        })
        .and_then(|frame| DEFAULT.with(|resolver| resolver.formatted_argument_at(&frame, index)));
    failure_message(resolved)
}

/// [`assertion_failure`] for the call site of the enclosing `#[track_caller]`
/// function.
#[track_caller]
pub fn caller_assertion_failure(index: usize) -> String {
    failure_message(caller_argument(index))
}

fn failure_message(resolved: Result<String, ResolutionError>) -> String {
    match resolved {
        Ok(expr) => format!("{FAILURE_PREFIX}: {expr}"),
        Err(e) => {
            debug!(target: LOG_TARGET_FACADE, "failed to resolve assertion source: {e}");
            format!("{FAILURE_PREFIX}: {FAILURE_FALLBACK}")
        }
    }
}

/// Joins a resolved source expression and a user message as `source: custom`.
/// Either side may be empty.
pub fn with_custom_message(source: &str, custom: &str) -> String {
    match (source.is_empty(), custom.is_empty()) {
        (_, true) => source.to_string(),
        (true, false) => custom.to_string(),
        (false, false) => format!("{source}: {custom}"),
    }
}
