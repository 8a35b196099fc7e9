//! Turning a resolved call's arguments back into source text.

use itertools::Itertools;
use quote::ToTokens;
use syn::Expr;
use tracing::trace;

use crate::error::ArgumentIndexError;
use crate::resolve::CallSite;
use crate::source::SourceFile;
use crate::syntax::Span;
use crate::utils::LOG_TARGET_RESOLVE;

pub struct ArgumentExtractor<'a> {
    file: &'a SourceFile,
}

impl<'a> ArgumentExtractor<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Self { file }
    }

    /// Source text of argument `index` of the call.
    pub fn extract(&self, site: &CallSite<'a>, index: usize) -> Result<String, ArgumentIndexError> {
        let args = site.call.args();
        let arg = args.get(index).ok_or_else(|| ArgumentIndexError {
            index,
            count: args.len(),
            callee: site.call.callee(),
        })?;
        Ok(self.format(arg))
    }

    /// Source text of every argument, in order.
    pub fn extract_all(&self, site: &CallSite<'a>) -> Vec<String> {
        site.call.args().into_iter().map(|arg| self.format(arg)).collect()
    }

    /// The expression as written, with continuation lines shifted left by the
    /// indentation of the line it starts on. Falls back to the token rendering
    /// when the span does not map into this file.
    pub fn format(&self, expr: &Expr) -> String {
        let span = Span::of(expr);
        match self.file.snippet(span) {
            Some(text) if !text.is_empty() => {
                let indent = self
                    .file
                    .line_text(span.start.line)
                    .map(|line| &line[..line.len() - line.trim_start().len()])
                    .unwrap_or_default();
                dedent(text, indent)
            }
            _ => {
                trace!(target: LOG_TARGET_RESOLVE, "no source text for argument, printing tokens");
                expr.to_token_stream().to_string()
            }
        }
    }
}

/// Removes `indent` from every line after the first. Text is returned
/// unchanged when some non-empty continuation line lacks the indent, as inside
/// a multi-line string literal.
fn dedent(text: &str, indent: &str) -> String {
    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or_default();
    let rest: Vec<&str> = lines.collect();
    let indented = rest
        .iter()
        .all(|line| line.trim().is_empty() || line.starts_with(indent));
    if indent.is_empty() || rest.is_empty() || !indented {
        return text.to_string();
    }
    std::iter::once(first)
        .chain(
            rest.iter()
                .map(|line| line.strip_prefix(indent).unwrap_or(line.trim_start())),
        )
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocatorConfig;
    use crate::resolve::CallSiteResolver;
    use crate::scan::LineScanner;

    fn with_site<R>(src: &str, line: usize, f: impl FnOnce(&ArgumentExtractor<'_>, &CallSite<'_>) -> R) -> R {
        let file = SourceFile::parse("format.rs", src.to_string()).expect("valid source");
        let config = LocatorConfig::default();
        let found = LineScanner::new(&file, &config).scan(line, None).unwrap();
        let site = CallSiteResolver::new(&file, &config).resolve(&found).unwrap();
        f(&ArgumentExtractor::new(&file), &site)
    }

    #[test]
    fn arguments_keep_their_source_form() {
        let src = "fn t() {\n    check(a.b.c, (x + 1) * 2, \"this text\", &v[0]);\n}\n";
        let all = with_site(src, 2, |ex, site| ex.extract_all(site));
        assert_eq!(all, vec!["a.b.c", "(x + 1) * 2", "\"this text\"", "&v[0]"]);
    }

    #[test]
    fn multi_line_arguments_span_lines() {
        let src = "fn t() {\n    check(\n        vec![\n            1,\n        ],\n    );\n}\n";
        let text = with_site(src, 6, |ex, site| ex.extract(site, 0)).unwrap();
        assert_eq!(text, "vec![\n    1,\n]");
    }

    #[test]
    fn multi_line_string_literals_keep_their_text() {
        let src = "fn t() {\n    check(\"one\ntwo\");\n}\n";
        let text = with_site(src, 2, |ex, site| ex.extract(site, 0)).unwrap();
        assert_eq!(text, "\"one\ntwo\"");
    }

    #[test]
    fn out_of_range_index_is_reported_with_the_callee() {
        let src = "fn t() {\n    assert::check(a, b);\n}\n";
        let err = with_site(src, 2, |ex, site| ex.extract(site, 2)).unwrap_err();
        assert_eq!(
            err,
            ArgumentIndexError {
                index: 2,
                count: 2,
                callee: "assert::check".to_string()
            }
        );
        assert!(err.to_string().starts_with("argument index 2 out of range"));
    }

    #[test]
    fn synthetic_expressions_print_their_tokens() {
        let file = SourceFile::parse("format.rs", "fn t() {}\n".to_string()).unwrap();
        let expr: Expr = syn::parse_quote!(a + b);
        // Spans from `parse_quote!` do not point into the file.
        let text = ArgumentExtractor::new(&file).format(&expr);
        assert_eq!(text, "a + b");
    }
}
