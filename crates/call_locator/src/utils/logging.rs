pub use colored::Colorize;
use std::fmt;

use colored::{Color, ColoredString};

use crate::source::SourceFile;
use crate::syntax::SyntaxNode;

pub const LOG_TARGET_SOURCE: &str = "locator_source";
pub const LOG_TARGET_SCAN: &str = "locator_scan";
pub const LOG_TARGET_RESOLVE: &str = "locator_resolve";
pub const LOG_TARGET_FACADE: &str = "locator_facade";

// Color scheme constants (Tokyo Night inspired)
const COLOR_HEADER: Color = Color::TrueColor {
    r: 122,
    g: 162,
    b: 247,
}; // Soft blue
const COLOR_NAME: Color = Color::TrueColor {
    r: 255,
    g: 202,
    b: 158,
}; // Peach
const COLOR_PATH: Color = Color::TrueColor {
    r: 158,
    g: 206,
    b: 255,
}; // Sky blue
const COLOR_ERROR: Color = Color::TrueColor {
    r: 247,
    g: 118,
    b: 142,
}; // Soft red

// Logging trait for consistent styling
pub(crate) trait LogStyle: Colorize + Sized {
    fn log_header(self) -> ColoredString {
        self.color(COLOR_HEADER).bold()
    }

    fn log_name(self) -> ColoredString {
        self.color(COLOR_NAME)
    }

    fn log_path(self) -> ColoredString {
        self.color(COLOR_PATH)
    }

    fn log_error(self) -> ColoredString {
        self.color(COLOR_ERROR).bold()
    }
}

impl LogStyle for &str {}

/// Renders a node as `(kind) source` for debug logs, or `none`.
pub(crate) struct NodeDisplay<'a> {
    pub file: &'a SourceFile,
    pub node: Option<SyntaxNode<'a>>,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.node else {
            return f.write_str("none");
        };
        let span = node.span();
        let text = self
            .file
            .snippet(span)
            .map(|s| s.lines().next().unwrap_or_default().to_string())
            .unwrap_or_else(|| "<unavailable>".to_string());
        write!(
            f,
            "({}) {}:{} {}",
            node.kind_name().log_name(),
            span.start.line,
            span.start.column,
            text
        )
    }
}
