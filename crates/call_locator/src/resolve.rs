//! Narrowing a matched node down to the one call expression it stands for.

use syn::ExprIf;
use tracing::debug;

use crate::config::LocatorConfig;
use crate::error::LocatorError;
use crate::scan::{LineMatch, deferred_on_line};
use crate::source::SourceFile;
use crate::syntax::{CallExpr, NodeKind, SyntaxNode};
use crate::utils::{LOG_TARGET_RESOLVE, LogStyle};

/// The call expression a frame was reported for.
#[derive(Clone, Copy)]
pub struct CallSite<'a> {
    pub call: CallExpr<'a>,
    /// Innermost `if` whose condition or branches contain the call.
    pub conditional: Option<&'a ExprIf>,
    /// The call is the body of a deferred construct.
    pub deferred: bool,
}

pub struct CallSiteResolver<'a> {
    file: &'a SourceFile,
    config: &'a LocatorConfig,
}

impl<'a> CallSiteResolver<'a> {
    pub fn new(file: &'a SourceFile, config: &'a LocatorConfig) -> Self {
        Self { file, config }
    }

    pub fn resolve(&self, found: &LineMatch<'a>) -> Result<CallSite<'a>, LocatorError> {
        let mut site = self
            .find(found.node, false, None)
            .ok_or(LocatorError::NoCallExpression { line: found.line })?;
        if site.conditional.is_none() {
            site.conditional = found.conditional;
        }

        if site.deferred && found.origin.is_line_based() {
            let count = deferred_on_line(self.file, self.config, found.line);
            if count > 1 {
                debug!(target: LOG_TARGET_RESOLVE,
                    "{} {} deferred calls on line {}",
                    "Ambiguous".log_error(),
                    count,
                    found.line
                );
                return Err(LocatorError::AmbiguousCallExpression {
                    line: found.line,
                    count,
                });
            }
        }

        debug!(target: LOG_TARGET_RESOLVE,
            "{} call to {} ({} args, deferred: {}, in if: {})",
            "Resolved".log_header(),
            site.call.callee().as_str().log_name(),
            site.call.arg_count(),
            site.deferred,
            site.conditional.is_some()
        );
        Ok(site)
    }

    fn find(
        &self,
        node: SyntaxNode<'a>,
        deferred: bool,
        conditional: Option<&'a ExprIf>,
    ) -> Option<CallSite<'a>> {
        match node.classify(&self.config.deferred_macros) {
            NodeKind::Call(call) => Some(CallSite {
                call,
                conditional,
                deferred,
            }),
            NodeKind::Deferred(mac) => SyntaxNode::Macro(mac)
                .children(self.file)
                .into_iter()
                .find_map(|child| self.find(child, true, conditional)),
            // Children of an `if` are the condition followed by the branches.
            NodeKind::Conditional(expr_if) => node
                .children(self.file)
                .into_iter()
                .find_map(|child| self.find(child, deferred, Some(expr_if))),
            NodeKind::Other => node
                .children(self.file)
                .into_iter()
                .find_map(|child| self.find(child, deferred, conditional)),
        }
    }
}
