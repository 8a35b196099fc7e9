use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use syn::punctuated::Punctuated;
use syn::visit::Visit;
use syn::{Block, Expr, Macro, Stmt, Token};
use tracing::debug;

use crate::error::LocatorError;
use crate::syntax::{Position, Span, SyntaxNode};
use crate::utils::{LOG_TARGET_SOURCE, LogStyle};

/// A parsed source file plus the index needed to map spans back to text.
///
/// Built once and never mutated. The tree holds `proc-macro2` spans, which are
/// resolved through a thread-local source map, so a `SourceFile` stays on the
/// thread that parsed it.
pub struct SourceFile {
    path: PathBuf,
    text: String,
    /// Byte offset of the first byte of each line; `line_starts[0] == 0`.
    line_starts: Vec<usize>,
    /// Byte ranges of comments, sorted. syn drops comments from the tree.
    comments: Vec<Range<usize>>,
    ast: syn::File,
    macro_bodies: HashMap<Span, MacroBody>,
}

/// The parsed token body of a macro invocation.
pub(crate) enum MacroBody {
    /// `assert!(a, b)`, `vec![x, y]`, `defer! { check(a) }`
    Exprs(Vec<Expr>),
    /// `defer! { first(); second(); }`
    Stmts(Vec<Stmt>),
}

impl SourceFile {
    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self, LocatorError> {
        let text = fs::read_to_string(path).map_err(|e| LocatorError::source_read(path, &e))?;
        Self::parse(path, text)
    }

    /// Parses in-memory source. `path` is only used for diagnostics.
    pub fn parse(path: impl Into<PathBuf>, text: String) -> Result<Self, LocatorError> {
        let path = path.into();
        let text = normalize_source(text);
        let ast = syn::parse_file(&text).map_err(|e| LocatorError::parse(&path, &e))?;
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        let macro_bodies = expand_macro_bodies(&ast);
        let comments = comment_ranges(&text);

        let shown = path.display().to_string();
        debug!(target: LOG_TARGET_SOURCE,
            "{} {} ({} items, {} macro bodies)",
            "Parsed".log_header(),
            shown.as_str().log_path(),
            ast.items.len(),
            macro_bodies.len()
        );

        Ok(Self {
            path,
            text,
            line_starts,
            comments,
            ast,
            macro_bodies,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ast(&self) -> &syn::File {
        &self.ast
    }

    /// Top-level items as syntax nodes, in source order.
    pub fn items(&self) -> impl Iterator<Item = SyntaxNode<'_>> {
        self.ast.items.iter().map(SyntaxNode::Item)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 1-based line without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.raw_line(line).map(|text| text.trim_end_matches('\r'))
    }

    /// 1-based line containing the byte `offset`.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Byte offset of `pos`, or `None` when the position lies outside the file.
    pub fn offset_of(&self, pos: Position) -> Option<usize> {
        let line = self.raw_line(pos.line)?;
        let start = self.line_starts[pos.line - 1];
        line.char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(line.len()))
            .nth(pos.column)
            .map(|idx| start + idx)
    }

    /// The source text covered by `span`.
    pub fn snippet(&self, span: Span) -> Option<&str> {
        let start = self.offset_of(span.start)?;
        let end = self.offset_of(span.end)?;
        self.text.get(start..end)
    }

    /// The line has text and all of it is inside comments.
    pub fn is_comment_line(&self, line: usize) -> bool {
        let Some(text) = self.raw_line(line) else {
            return false;
        };
        let start = self.line_starts[line - 1];
        let mut code = text
            .char_indices()
            .filter(|(_, c)| !c.is_whitespace())
            .peekable();
        code.peek().is_some() && code.all(|(idx, _)| self.in_comment(start + idx))
    }

    fn in_comment(&self, offset: usize) -> bool {
        let idx = self.comments.partition_point(|range| range.end <= offset);
        self.comments
            .get(idx)
            .is_some_and(|range| range.start <= offset)
    }

    pub(crate) fn macro_body(&self, mac: &Macro) -> Option<&MacroBody> {
        self.macro_bodies.get(&Span::of(mac))
    }

    // Line text including a trailing '\r', so char columns line up with proc-macro2.
    fn raw_line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        self.text.get(start..end)
    }
}

impl MacroBody {
    fn parse(mac: &Macro) -> Option<Self> {
        if mac.tokens.is_empty() {
            return None;
        }
        if let Ok(exprs) = mac.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
            return Some(MacroBody::Exprs(exprs.into_iter().collect()));
        }
        mac.parse_body_with(Block::parse_within)
            .ok()
            .map(MacroBody::Stmts)
    }

    fn visit_with<'ast>(&'ast self, visitor: &mut impl Visit<'ast>) {
        match self {
            MacroBody::Exprs(exprs) => exprs.iter().for_each(|expr| visitor.visit_expr(expr)),
            MacroBody::Stmts(stmts) => stmts.iter().for_each(|stmt| visitor.visit_stmt(stmt)),
        }
    }
}

/// Strips a byte-order mark and blanks a leading shebang so that syn sees the
/// same offsets and lines as the index built over the returned text.
fn normalize_source(mut text: String) -> String {
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    if text.starts_with("#!") && !text[2..].trim_start().starts_with('[') {
        let end = text.find('\n').unwrap_or(text.len());
        text.replace_range(..end, &" ".repeat(end));
    }
    text
}

/// Byte ranges of line and block comments, doc comments included. Literals
/// are skipped so comment markers inside strings do not count.
fn comment_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = text[i..].find('\n').map_or(text.len(), |n| i + n);
                ranges.push(i..end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = block_comment_end(bytes, i);
                ranges.push(i..end);
                i = end;
            }
            b'"' => i = string_end(bytes, i + 1),
            b'r' if raw_string_hashes(bytes, i).is_some() => i = raw_string_end(bytes, i),
            b'\'' => i = char_end(text, i),
            _ => i += 1,
        }
    }
    ranges
}

// Block comments nest.
fn block_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

// `i` is just past the opening quote.
fn string_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Number of `#`s when `r` at `i` opens a raw string (`r"`, `r#"`).
fn raw_string_hashes(bytes: &[u8], i: usize) -> Option<usize> {
    let hashes = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
    (bytes.get(i + 1 + hashes) == Some(&b'"')).then_some(hashes)
}

fn raw_string_end(bytes: &[u8], i: usize) -> usize {
    let hashes = raw_string_hashes(bytes, i).unwrap_or_default();
    let mut j = i + hashes + 2;
    while j < bytes.len() {
        if bytes[j] == b'"'
            && bytes[j + 1..].iter().take(hashes).filter(|&&b| b == b'#').count() == hashes
        {
            return j + 1 + hashes;
        }
        j += 1;
    }
    bytes.len()
}

// A char literal (`'x'`, `'\n'`, `'\''`) or a lifetime, which has no closing quote.
fn char_end(text: &str, i: usize) -> usize {
    let bytes = text.as_bytes();
    if bytes.get(i + 1) == Some(&b'\\') {
        return bytes
            .get(i + 3..)
            .and_then(|rest| rest.iter().position(|&b| b == b'\''))
            .map_or(bytes.len(), |n| i + 3 + n + 1);
    }
    let Some(c) = text[i + 1..].chars().next() else {
        return bytes.len();
    };
    let close = i + 1 + c.len_utf8();
    if bytes.get(close) == Some(&b'\'') {
        close + 1
    } else {
        i + 1
    }
}

#[derive(Default)]
struct MacroCollector {
    found: Vec<Macro>,
}

impl<'ast> Visit<'ast> for MacroCollector {
    fn visit_macro(&mut self, mac: &'ast Macro) {
        self.found.push(mac.clone());
    }
}

/// Parses every macro body in the file, including macros nested inside other
/// macro bodies. Keyed by the invocation's span, which is unique per macro.
fn expand_macro_bodies(ast: &syn::File) -> HashMap<Span, MacroBody> {
    let mut collector = MacroCollector::default();
    collector.visit_file(ast);
    let mut pending = collector.found;
    let mut bodies = HashMap::new();

    while let Some(mac) = pending.pop() {
        let Some(body) = MacroBody::parse(&mac) else {
            continue;
        };
        let mut nested = MacroCollector::default();
        body.visit_with(&mut nested);
        pending.extend(nested.found);
        bodies.insert(Span::of(&mac), body);
    }
    bodies
}
