//! Borrowed views over a parsed `syn` tree.
//!
//! `syn` has no common node type, so [`SyntaxNode`] wraps the handful of node
//! families the locator walks (items, statements, expressions and macro
//! invocations) in one closed enum. Children are enumerated by running the
//! default `syn::visit` walker for one level, which keeps the child order
//! identical to source order.

mod node;
mod span;

pub use node::{CallExpr, NodeKind, SyntaxNode};
pub use span::{Position, Span};
