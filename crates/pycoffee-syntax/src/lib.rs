//! Mutable, lossless concrete syntax tree for Python sources.
//!
//! Elements live in an arena and are addressed by [`NodeId`]. Parent links are
//! kept in a side table so that rewrites can ask about their enclosing scope
//! without the tree owning cycles.

mod builder;
mod operator;
mod syntax_kind;
mod syntax_set;
mod tree;

/// Builds a `SyntaxTree` from parser events.
pub use builder::Builder;
/// Binding strength of the outermost operator of an expression.
pub use operator::Operator;
/// Token and node kinds used throughout the tree.
pub use syntax_kind::SyntaxKind;
/// Compact set for grouping `SyntaxKind` values.
pub use syntax_set::SyntaxSet;
/// The arena tree and its elements.
pub use tree::{Element, Fragment, Leaf, Node, NodeId, SyntaxTree};
pub use text_size::{TextRange, TextSize};
