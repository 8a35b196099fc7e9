use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::utils::LOG_TARGET_FACADE;

pub const ENV_STRATEGIES: &str = "CALL_LOCATOR_STRATEGIES";
pub const ENV_DEFER_MACROS: &str = "CALL_LOCATOR_DEFER_MACROS";

/// How the line scanner decides a node belongs to the reported position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// A call reported exactly at the line and column: the start of a
    /// function call, or a method call's method name. Skipped when the frame
    /// has no column.
    StartPosition,
    StartLine,
    /// The node ends on the line and is not a scope.
    EndLine,
}

impl MatchStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            MatchStrategy::StartPosition => "start-position",
            MatchStrategy::StartLine => "start-line",
            MatchStrategy::EndLine => "end-line",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown match strategy {0:?}; expected start-position, start-line or end-line")]
pub struct UnknownStrategy(pub String);

impl FromStr for MatchStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "start-position" => Ok(MatchStrategy::StartPosition),
            "start-line" => Ok(MatchStrategy::StartLine),
            "end-line" => Ok(MatchStrategy::EndLine),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Tunables for the scanner and resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Strategies in the order they are tried.
    pub strategies: Vec<MatchStrategy>,
    /// Macro names (last path segment) that schedule their body for scope exit.
    pub deferred_macros: Vec<String>,
    /// Fall back to deferred constructs whose enclosing scope closes on the
    /// reported line.
    pub scan_deferred_scopes: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                MatchStrategy::StartPosition,
                MatchStrategy::StartLine,
                MatchStrategy::EndLine,
            ],
            deferred_macros: vec!["defer".to_string()],
            scan_deferred_scopes: true,
        }
    }
}

impl LocatorConfig {
    /// Defaults overridden by `CALL_LOCATOR_STRATEGIES` and
    /// `CALL_LOCATOR_DEFER_MACROS`.
    pub fn from_env() -> Self {
        Self::from_values(
            env::var(ENV_STRATEGIES).ok().as_deref(),
            env::var(ENV_DEFER_MACROS).ok().as_deref(),
        )
    }

    /// Same as [`from_env`](Self::from_env) with the variable values passed in.
    /// Unknown or empty entries are logged and skipped; a value with no valid
    /// entry leaves the default in place.
    pub fn from_values(strategies: Option<&str>, deferred_macros: Option<&str>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = strategies {
            let parsed: Vec<MatchStrategy> = split_list(raw)
                .filter_map(|entry| match entry.parse() {
                    Ok(strategy) => Some(strategy),
                    Err(e) => {
                        warn!(target: LOG_TARGET_FACADE, "{}: {}", ENV_STRATEGIES, e);
                        None
                    }
                })
                .collect();
            if parsed.is_empty() {
                warn!(target: LOG_TARGET_FACADE, "{} has no valid entries, using defaults", ENV_STRATEGIES);
            } else {
                config.strategies = parsed;
            }
        }

        if let Some(raw) = deferred_macros {
            let names: Vec<String> = split_list(raw)
                .filter(|name| {
                    let valid = syn::parse_str::<syn::Ident>(name).is_ok();
                    if !valid {
                        warn!(target: LOG_TARGET_FACADE, "{}: {:?} is not a macro name", ENV_DEFER_MACROS, name);
                    }
                    valid
                })
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                warn!(target: LOG_TARGET_FACADE, "{} has no valid entries, using defaults", ENV_DEFER_MACROS);
            } else {
                config.deferred_macros = names;
            }
        }

        config
    }

    pub fn with_strategies(mut self, strategies: impl Into<Vec<MatchStrategy>>) -> Self {
        self.strategies = strategies.into();
        self
    }

    pub fn with_deferred_macros<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deferred_macros = names.into_iter().map(Into::into).collect();
        self
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}
