use itertools::Itertools;
use syn::visit::{self, Visit};
use syn::{
    Attribute, Expr, ExprCall, ExprIf, ExprMethodCall, ImplItem, Item, Macro, MacroDelimiter,
    Stmt, TraitItem,
};

use super::{Position, Span};
use crate::source::{MacroBody, SourceFile};

/// A borrowed node of a [`SourceFile`]'s tree.
#[derive(Clone, Copy)]
pub enum SyntaxNode<'a> {
    Item(&'a Item),
    ImplItem(&'a ImplItem),
    TraitItem(&'a TraitItem),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    /// A macro invocation. Its children are the parsed body, when the body is
    /// an expression or statement list.
    Macro(&'a Macro),
}

/// What the call-site resolver sees when it looks at a node.
#[derive(Clone, Copy)]
pub enum NodeKind<'a> {
    Call(CallExpr<'a>),
    Conditional(&'a ExprIf),
    Deferred(&'a Macro),
    Other,
}

/// A function or method invocation.
#[derive(Clone, Copy)]
pub enum CallExpr<'a> {
    Function(&'a ExprCall),
    Method(&'a ExprMethodCall),
}

impl<'a> SyntaxNode<'a> {
    pub fn span(&self) -> Span {
        match *self {
            SyntaxNode::Item(node) => Span::of(node),
            SyntaxNode::ImplItem(node) => Span::of(node),
            SyntaxNode::TraitItem(node) => Span::of(node),
            SyntaxNode::Stmt(node) => Span::of(node),
            SyntaxNode::Expr(node) => Span::of(node),
            SyntaxNode::Macro(node) => Span::of(node),
        }
    }

    pub fn classify(&self, deferred_macros: &[String]) -> NodeKind<'a> {
        match *self {
            SyntaxNode::Expr(Expr::Call(call)) => NodeKind::Call(CallExpr::Function(call)),
            SyntaxNode::Expr(Expr::MethodCall(call)) => NodeKind::Call(CallExpr::Method(call)),
            SyntaxNode::Expr(Expr::If(expr_if)) => NodeKind::Conditional(expr_if),
            SyntaxNode::Macro(mac) if is_deferred_macro(mac, deferred_macros) => {
                NodeKind::Deferred(mac)
            }
            SyntaxNode::Stmt(Stmt::Macro(stmt)) if is_deferred_macro(&stmt.mac, deferred_macros) => {
                NodeKind::Deferred(&stmt.mac)
            }
            SyntaxNode::Item(_)
            | SyntaxNode::ImplItem(_)
            | SyntaxNode::TraitItem(_)
            | SyntaxNode::Stmt(_)
            | SyntaxNode::Expr(_)
            | SyntaxNode::Macro(_) => NodeKind::Other,
        }
    }

    /// Direct children in source order.
    pub fn children(&self, file: &'a SourceFile) -> Vec<SyntaxNode<'a>> {
        let mut collector = ChildCollector::default();
        match *self {
            SyntaxNode::Item(node) => visit::visit_item(&mut collector, node),
            SyntaxNode::ImplItem(node) => visit::visit_impl_item(&mut collector, node),
            SyntaxNode::TraitItem(node) => visit::visit_trait_item(&mut collector, node),
            SyntaxNode::Stmt(node) => visit::visit_stmt(&mut collector, node),
            SyntaxNode::Expr(node) => visit::visit_expr(&mut collector, node),
            SyntaxNode::Macro(mac) => match file.macro_body(mac) {
                Some(MacroBody::Exprs(exprs)) => {
                    collector.children.extend(exprs.iter().map(SyntaxNode::Expr))
                }
                Some(MacroBody::Stmts(stmts)) => {
                    collector.children.extend(stmts.iter().map(SyntaxNode::Stmt))
                }
                None => {}
            },
        }
        collector.children
    }

    /// Nodes whose closing brace ends a scope. A closing brace is never the
    /// reported position of a call, so end-line matching skips these.
    pub fn is_scope(&self) -> bool {
        match *self {
            SyntaxNode::Item(_) | SyntaxNode::ImplItem(_) | SyntaxNode::TraitItem(_) => true,
            SyntaxNode::Stmt(Stmt::Item(_)) => true,
            SyntaxNode::Stmt(Stmt::Macro(stmt)) => is_brace_macro(&stmt.mac),
            SyntaxNode::Stmt(Stmt::Expr(expr, _)) => expr_is_scope(expr),
            SyntaxNode::Stmt(Stmt::Local(_)) => false,
            SyntaxNode::Expr(expr) => expr_is_scope(expr),
            SyntaxNode::Macro(mac) => is_brace_macro(mac),
        }
    }

    pub fn as_conditional(&self) -> Option<&'a ExprIf> {
        match *self {
            SyntaxNode::Expr(Expr::If(expr_if)) => Some(expr_if),
            _ => None,
        }
    }

    /// Where a frame reports a call made by this node: the start of a
    /// function call, or the method name of a method call. `None` for nodes
    /// that are not calls.
    pub fn call_position(&self) -> Option<Position> {
        match *self {
            SyntaxNode::Expr(Expr::Call(call)) => Some(Span::of(call).start),
            SyntaxNode::Expr(Expr::MethodCall(call)) => Some(call.method.span().start().into()),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match *self {
            SyntaxNode::Item(Item::Fn(_)) => "fn",
            SyntaxNode::Item(Item::Impl(_)) => "impl",
            SyntaxNode::Item(Item::Mod(_)) => "mod",
            SyntaxNode::Item(_) => "item",
            SyntaxNode::ImplItem(_) => "impl item",
            SyntaxNode::TraitItem(_) => "trait item",
            SyntaxNode::Stmt(Stmt::Local(_)) => "let",
            SyntaxNode::Stmt(Stmt::Macro(_)) => "macro stmt",
            SyntaxNode::Stmt(_) => "stmt",
            SyntaxNode::Expr(Expr::Call(_)) => "call",
            SyntaxNode::Expr(Expr::MethodCall(_)) => "method call",
            SyntaxNode::Expr(Expr::If(_)) => "if",
            SyntaxNode::Expr(Expr::Let(_)) => "let expr",
            SyntaxNode::Expr(Expr::Block(_)) => "block",
            SyntaxNode::Expr(Expr::Closure(_)) => "closure",
            SyntaxNode::Expr(Expr::Lit(_)) => "literal",
            SyntaxNode::Expr(Expr::Path(_)) => "path",
            SyntaxNode::Expr(_) => "expr",
            SyntaxNode::Macro(_) => "macro",
        }
    }
}

impl<'a> CallExpr<'a> {
    /// The parenthesised arguments. A method receiver is not an argument.
    pub fn args(&self) -> Vec<&'a Expr> {
        match *self {
            CallExpr::Function(call) => call.args.iter().collect(),
            CallExpr::Method(call) => call.args.iter().collect(),
        }
    }

    pub fn arg_count(&self) -> usize {
        match *self {
            CallExpr::Function(call) => call.args.len(),
            CallExpr::Method(call) => call.args.len(),
        }
    }

    pub fn span(&self) -> Span {
        match *self {
            CallExpr::Function(call) => Span::of(call),
            CallExpr::Method(call) => Span::of(call),
        }
    }

    /// Name of the callee as written: `check`, `assert::check`, `.check`.
    pub fn callee(&self) -> String {
        match *self {
            CallExpr::Function(call) => match &*call.func {
                Expr::Path(path) => path
                    .path
                    .segments
                    .iter()
                    .map(|segment| segment.ident.to_string())
                    .join("::"),
                _ => "<expression>".to_string(),
            },
            CallExpr::Method(call) => format!(".{}", call.method),
        }
    }
}

fn is_deferred_macro(mac: &Macro, deferred_macros: &[String]) -> bool {
    mac.path
        .segments
        .last()
        .is_some_and(|segment| deferred_macros.iter().any(|name| segment.ident == name))
}

fn is_brace_macro(mac: &Macro) -> bool {
    matches!(mac.delimiter, MacroDelimiter::Brace(_))
}

fn expr_is_scope(expr: &Expr) -> bool {
    match expr {
        Expr::Closure(closure) => matches!(*closure.body, Expr::Block(_)),
        Expr::Block(_)
        | Expr::If(_)
        | Expr::Match(_)
        | Expr::Loop(_)
        | Expr::While(_)
        | Expr::ForLoop(_)
        | Expr::Unsafe(_)
        | Expr::Const(_)
        | Expr::Async(_)
        | Expr::TryBlock(_) => true,
        _ => false,
    }
}

/// Records the first layer of nodes reached by syn's default walker without
/// recursing further.
#[derive(Default)]
struct ChildCollector<'a> {
    children: Vec<SyntaxNode<'a>>,
}

impl<'a> Visit<'a> for ChildCollector<'a> {
    fn visit_attribute(&mut self, _: &'a Attribute) {}

    fn visit_item(&mut self, node: &'a Item) {
        self.children.push(SyntaxNode::Item(node));
    }

    fn visit_impl_item(&mut self, node: &'a ImplItem) {
        self.children.push(SyntaxNode::ImplItem(node));
    }

    fn visit_trait_item(&mut self, node: &'a TraitItem) {
        self.children.push(SyntaxNode::TraitItem(node));
    }

    fn visit_stmt(&mut self, node: &'a Stmt) {
        self.children.push(SyntaxNode::Stmt(node));
    }

    fn visit_expr(&mut self, node: &'a Expr) {
        self.children.push(SyntaxNode::Expr(node));
    }

    fn visit_macro(&mut self, node: &'a Macro) {
        self.children.push(SyntaxNode::Macro(node));
    }
}
