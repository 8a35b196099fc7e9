//! Finding the syntax node a reported line refers to.

use std::fmt;

use syn::ExprIf;
use tracing::{debug, trace};

use crate::config::{LocatorConfig, MatchStrategy};
use crate::error::LocatorError;
use crate::source::SourceFile;
use crate::syntax::{NodeKind, Position, SyntaxNode};
use crate::utils::{LOG_TARGET_SCAN, LogStyle, NodeDisplay};

/// How a [`LineMatch`] was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    Strategy(MatchStrategy),
    /// No node matched; the line closes the scope of a single deferred call.
    DeferredScope,
}

impl MatchOrigin {
    /// The match relied on the line alone, without a column.
    pub fn is_line_based(&self) -> bool {
        matches!(
            self,
            MatchOrigin::Strategy(MatchStrategy::StartLine | MatchStrategy::EndLine)
        )
    }
}

impl fmt::Display for MatchOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOrigin::Strategy(strategy) => write!(f, "{strategy}"),
            MatchOrigin::DeferredScope => f.write_str("deferred-scope"),
        }
    }
}

/// The node the scanner settled on for a line.
#[derive(Clone, Copy)]
pub struct LineMatch<'a> {
    pub node: SyntaxNode<'a>,
    pub line: usize,
    pub origin: MatchOrigin,
    /// Innermost `if` enclosing `node`, not counting `node` itself.
    pub conditional: Option<&'a ExprIf>,
}

pub struct LineScanner<'a> {
    file: &'a SourceFile,
    config: &'a LocatorConfig,
}

impl<'a> LineScanner<'a> {
    pub fn new(file: &'a SourceFile, config: &'a LocatorConfig) -> Self {
        Self { file, config }
    }

    /// The first match, trying the configured strategies in order.
    pub fn scan(&self, line: usize, column: Option<usize>) -> Result<LineMatch<'a>, LocatorError> {
        self.candidates(line, column)?
            .into_iter()
            .next()
            .ok_or(LocatorError::NodeNotFound { line })
    }

    /// One match per strategy that found a node, in strategy order, skipping
    /// repeats of the same node. When no strategy matches, the deferred-scope
    /// match if there is one.
    ///
    /// Fails with `NoCallExpression` when the line holds only comments, and
    /// when the deferred-scope lookup is ambiguous.
    pub fn candidates(
        &self,
        line: usize,
        column: Option<usize>,
    ) -> Result<Vec<LineMatch<'a>>, LocatorError> {
        if self.file.is_comment_line(line) {
            debug!(target: LOG_TARGET_SCAN, "line {} holds only a comment", line);
            return Err(LocatorError::NoCallExpression { line });
        }

        let mut found: Vec<LineMatch<'a>> = Vec::new();
        for &strategy in &self.config.strategies {
            let Some(candidate) = self.find(strategy, line, column) else {
                trace!(target: LOG_TARGET_SCAN, "{} no match on line {}", strategy, line);
                continue;
            };
            if found.iter().any(|prev| same_node(prev.node, candidate.node)) {
                continue;
            }
            debug!(target: LOG_TARGET_SCAN,
                "{} {} -> {}",
                "Matched".log_header(),
                strategy,
                NodeDisplay { file: self.file, node: Some(candidate.node) }
            );
            found.push(candidate);
        }

        if found.is_empty() && self.config.scan_deferred_scopes {
            found.extend(self.deferred_scope(line)?);
        }
        Ok(found)
    }

    fn find(
        &self,
        strategy: MatchStrategy,
        line: usize,
        column: Option<usize>,
    ) -> Option<LineMatch<'a>> {
        let matches = |node: &SyntaxNode<'a>| -> bool {
            let span = node.span();
            match strategy {
                MatchStrategy::StartPosition => column
                    .is_some_and(|column| node.call_position() == Some(Position::new(line, column))),
                MatchStrategy::StartLine => span.start.line == line,
                MatchStrategy::EndLine => span.end.line == line && !node.is_scope(),
            }
        };
        if strategy == MatchStrategy::StartPosition && column.is_none() {
            return None;
        }

        let mut ancestors = Vec::new();
        self.file
            .items()
            .find_map(|item| self.find_in(item, line, &matches, &mut ancestors))
            .map(|(node, conditional)| LineMatch {
                node,
                line,
                origin: MatchOrigin::Strategy(strategy),
                conditional,
            })
    }

    // Preorder walk, pruning subtrees that do not cover `line`.
    fn find_in(
        &self,
        node: SyntaxNode<'a>,
        line: usize,
        matches: &impl Fn(&SyntaxNode<'a>) -> bool,
        ancestors: &mut Vec<SyntaxNode<'a>>,
    ) -> Option<(SyntaxNode<'a>, Option<&'a ExprIf>)> {
        if !node.span().covers_line(line) {
            return None;
        }
        if matches(&node) {
            let conditional = ancestors.iter().rev().find_map(SyntaxNode::as_conditional);
            return Some((node, conditional));
        }
        ancestors.push(node);
        let found = node
            .children(self.file)
            .into_iter()
            .find_map(|child| self.find_in(child, line, matches, ancestors));
        ancestors.pop();
        found
    }

    /// Deferred calls run when their scope closes, so a frame may report the
    /// closing line of that scope. Looks for deferred constructs whose
    /// innermost enclosing scope ends on `line`.
    fn deferred_scope(&self, line: usize) -> Result<Option<LineMatch<'a>>, LocatorError> {
        let mut hits = Vec::new();
        let mut ancestors = Vec::new();
        for item in self.file.items() {
            self.collect_deferred(item, line, &mut ancestors, &mut hits);
        }

        match hits.as_slice() {
            [] => Ok(None),
            [(node, conditional)] => {
                debug!(target: LOG_TARGET_SCAN,
                    "{} deferred-scope -> {}",
                    "Matched".log_header(),
                    NodeDisplay { file: self.file, node: Some(*node) }
                );
                Ok(Some(LineMatch {
                    node: *node,
                    line,
                    origin: MatchOrigin::DeferredScope,
                    conditional: *conditional,
                }))
            }
            _ => Err(LocatorError::AmbiguousCallExpression {
                line,
                count: hits.len(),
            }),
        }
    }

    fn collect_deferred(
        &self,
        node: SyntaxNode<'a>,
        line: usize,
        ancestors: &mut Vec<SyntaxNode<'a>>,
        hits: &mut Vec<(SyntaxNode<'a>, Option<&'a ExprIf>)>,
    ) {
        if !node.span().covers_line(line) {
            return;
        }
        ancestors.push(node);
        for child in node.children(self.file) {
            if let NodeKind::Deferred(_) = child.classify(&self.config.deferred_macros) {
                let scope_ends_here = ancestors
                    .iter()
                    .rev()
                    .find(|ancestor| ancestor.is_scope())
                    .is_some_and(|scope| scope.span().end.line == line);
                if scope_ends_here {
                    let conditional = ancestors.iter().rev().find_map(SyntaxNode::as_conditional);
                    hits.push((child, conditional));
                }
            } else {
                self.collect_deferred(child, line, ancestors, hits);
            }
        }
        ancestors.pop();
    }
}

/// Deferred constructs covering `line`, not counting constructs nested inside
/// another one.
pub(crate) fn deferred_on_line(file: &SourceFile, config: &LocatorConfig, line: usize) -> usize {
    fn count(node: SyntaxNode<'_>, file: &SourceFile, config: &LocatorConfig, line: usize) -> usize {
        if !node.span().covers_line(line) {
            return 0;
        }
        match node.classify(&config.deferred_macros) {
            NodeKind::Deferred(_) => 1,
            _ => node
                .children(file)
                .into_iter()
                .map(|child| count(child, file, config, line))
                .sum(),
        }
    }
    file.items().map(|item| count(item, file, config, line)).sum()
}

fn same_node(a: SyntaxNode<'_>, b: SyntaxNode<'_>) -> bool {
    a.span() == b.span() && a.kind_name() == b.kind_name()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SourceFile {
        SourceFile::parse("scan.rs", src.to_string()).expect("valid source")
    }

    const CALLS: &str = "\
fn t() {
    let total = add(one(), two());
    check(
        a,
        \"b\",
    );
    if ready(x) {
        go();
    }
}
";

    #[test]
    fn start_line_takes_the_outermost_node() {
        let file = parse(CALLS);
        let config = LocatorConfig::default();
        let found = LineScanner::new(&file, &config).scan(2, None).unwrap();
        assert_eq!(found.origin, MatchOrigin::Strategy(MatchStrategy::StartLine));
        assert_eq!(found.node.kind_name(), "let");
    }

    #[test]
    fn start_position_picks_an_inner_call() {
        let file = parse(CALLS);
        let config = LocatorConfig::default();
        // `two()` on line 2 starts at column 27.
        let found = LineScanner::new(&file, &config).scan(2, Some(27)).unwrap();
        assert_eq!(found.origin, MatchOrigin::Strategy(MatchStrategy::StartPosition));
        assert_eq!(file.snippet(found.node.span()), Some("two()"));
    }

    #[test]
    fn start_position_skips_a_receiver_starting_at_the_column() {
        let file = parse("fn t() {\n    check(x).unwrap();\n}\n");
        let config = LocatorConfig::default();
        let found = LineScanner::new(&file, &config).scan(2, Some(4)).unwrap();
        assert_eq!(file.snippet(found.node.span()), Some("check(x)"));

        // The method name is where `.unwrap()` itself is reported.
        let found = LineScanner::new(&file, &config).scan(2, Some(13)).unwrap();
        assert_eq!(found.node.kind_name(), "method call");
    }

    #[test]
    fn closing_line_of_a_call_matches_by_end_line() {
        let file = parse(CALLS);
        let config = LocatorConfig::default();
        let found = LineScanner::new(&file, &config).scan(6, None).unwrap();
        assert_eq!(found.origin, MatchOrigin::Strategy(MatchStrategy::EndLine));
        assert_eq!(found.node.kind_name(), "stmt");
    }

    #[test]
    fn nodes_inside_if_record_the_conditional() {
        let file = parse(CALLS);
        let config = LocatorConfig::default();
        let found = LineScanner::new(&file, &config).scan(8, None).unwrap();
        assert!(found.conditional.is_some());
    }

    #[test]
    fn closing_braces_match_nothing() {
        let file = parse(CALLS);
        let config = LocatorConfig::default();
        let err = LineScanner::new(&file, &config).scan(10, None).err();
        assert_eq!(err, Some(LocatorError::NodeNotFound { line: 10 }));
    }

    #[test]
    fn strategy_order_follows_config() {
        let file = parse(CALLS);
        let config = LocatorConfig::default()
            .with_strategies([MatchStrategy::EndLine, MatchStrategy::StartLine]);
        let candidates = LineScanner::new(&file, &config).candidates(3, None).unwrap();
        let origins: Vec<_> = candidates.iter().map(|c| c.origin).collect();
        assert_eq!(
            origins,
            vec![
                MatchOrigin::Strategy(MatchStrategy::EndLine),
                MatchOrigin::Strategy(MatchStrategy::StartLine),
            ]
        );
        // The callee path `check` is the first node ending on line 3.
        assert_eq!(candidates[0].node.kind_name(), "path");
        assert_eq!(candidates[1].node.kind_name(), "stmt");
    }

    #[test]
    fn comment_only_lines_have_no_call() {
        let src = "fn t() {\n    // check(a)\n    go(b); // done\n    /* check(c)\n       check(d) */\n}\n";
        let file = parse(src);
        let config = LocatorConfig::default();
        let scanner = LineScanner::new(&file, &config);
        for line in [2, 4, 5] {
            assert_eq!(
                scanner.scan(line, None).err(),
                Some(LocatorError::NoCallExpression { line })
            );
        }
        assert_eq!(scanner.scan(3, None).unwrap().node.kind_name(), "stmt");
    }

    const DEFERRED: &str = "\
fn one() {
    defer! { check(a) }
    work();
}
fn two() {
    defer! { first() }
    defer! { second() }
}
";

    #[test]
    fn scope_end_of_a_single_deferred_call() {
        let file = parse(DEFERRED);
        let config = LocatorConfig::default();
        let found = LineScanner::new(&file, &config).scan(4, None).unwrap();
        assert_eq!(found.origin, MatchOrigin::DeferredScope);
        assert!(matches!(
            found.node.classify(&config.deferred_macros),
            NodeKind::Deferred(_)
        ));
    }

    #[test]
    fn scope_end_of_several_deferred_calls_is_ambiguous() {
        let file = parse(DEFERRED);
        let config = LocatorConfig::default();
        let err = LineScanner::new(&file, &config).scan(8, None).err();
        assert_eq!(
            err,
            Some(LocatorError::AmbiguousCallExpression { line: 8, count: 2 })
        );
    }

    #[test]
    fn deferred_scope_fallback_can_be_disabled() {
        let file = parse(DEFERRED);
        let config = LocatorConfig {
            scan_deferred_scopes: false,
            ..LocatorConfig::default()
        };
        let err = LineScanner::new(&file, &config).scan(4, None).err();
        assert_eq!(err, Some(LocatorError::NodeNotFound { line: 4 }));
    }

    #[test]
    fn counts_deferred_constructs_on_a_line() {
        let file = parse("fn t() {\n    defer! { a() }; defer! { b() };\n    defer! { c() }\n}\n");
        let config = LocatorConfig::default();
        assert_eq!(deferred_on_line(&file, &config, 2), 2);
        assert_eq!(deferred_on_line(&file, &config, 3), 1);
    }
}
