//! Incremental builder for the arena tree.

use text_size::TextRange;

use crate::SyntaxKind::{self, *};
use crate::{NodeId, SyntaxSet, SyntaxTree};

/// Nodes that survive even with a single child.
///
/// Every other node with exactly one child is replaced by that child, so an
/// expression like `x` is a bare `NAME` rather than a tower of wrappers.
const KEEP_SINGLE_CHILD: SyntaxSet =
    SyntaxSet::new([FILE_INPUT, SIMPLE_STMT, SUITE, PARAMETERS, PARAM, TRAILER, ERROR_NODE]);

/// Builds a `SyntaxTree` from start/token/finish events.
pub struct Builder {
    tree: SyntaxTree,
    opened: Vec<(SyntaxKind, Vec<NodeId>)>,
    finished: Vec<NodeId>,
}

impl Drop for Builder {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.opened.is_empty() {
            panic!("you should call `Builder::finish()` after closing every node");
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self { tree: SyntaxTree::empty(), opened: Vec::with_capacity(64), finished: Vec::new() }
    }

    pub fn start_node(&mut self, kind: SyntaxKind) {
        self.opened.push((kind, Vec::new()));
    }

    pub fn token(&mut self, kind: SyntaxKind, value: &str, prefix: &str, range: TextRange) {
        let leaf = self.tree.alloc_leaf(kind, value, prefix, range);
        self.attach(leaf);
    }

    pub fn finish_node(&mut self) {
        let Some((kind, children)) = self.opened.pop() else {
            panic!("finish_node without a matching start_node");
        };

        if let [only] = children[..]
            && !KEEP_SINGLE_CHILD.contains(kind)
        {
            self.attach(only);
        } else if !children.is_empty() {
            let node = self.tree.alloc_node(kind, children);
            self.attach(node);
        }
    }

    fn attach(&mut self, id: NodeId) {
        match self.opened.last_mut() {
            Some((_, children)) => children.push(id),
            None => self.finished.push(id),
        }
    }

    pub fn finish(mut self) -> SyntaxTree {
        assert!(self.opened.is_empty(), "unclosed nodes: {:?}", self.opened);

        let finished = std::mem::take(&mut self.finished);
        let mut tree = std::mem::replace(&mut self.tree, SyntaxTree::empty());
        let single = match finished.as_slice() {
            &[root] if tree.kind(root) == FILE_INPUT => Some(root),
            _ => None,
        };
        let root = match single {
            Some(root) => root,
            None => tree.alloc_node(FILE_INPUT, finished),
        };
        tree.set_root(root);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn single_child_wrappers_collapse() {
        let mut builder = Builder::new();
        builder.start_node(FILE_INPUT);
        builder.start_node(SIMPLE_STMT);
        builder.start_node(EXPR_STMT);
        builder.start_node(TEST);
        builder.token(NAME, "x", "", range(0, 1));
        builder.finish_node();
        builder.finish_node();
        builder.token(NEWLINE, "\n", "", range(1, 2));
        builder.finish_node();
        builder.token(ENDMARKER, "", "", range(2, 2));
        builder.finish_node();
        let tree = builder.finish();

        let root = tree.root();
        let simple = tree.children(root)[0];
        assert_eq!(tree.kind(simple), SIMPLE_STMT);
        assert_eq!(tree.kind(tree.children(simple)[0]), NAME);
        assert_eq!(tree.parent(tree.children(simple)[0]), Some(simple));
    }

    #[test]
    fn kept_kinds_and_empty_nodes() {
        let mut builder = Builder::new();
        builder.start_node(FILE_INPUT);
        builder.start_node(PARAM);
        builder.token(NAME, "self", "", range(0, 4));
        builder.finish_node();
        builder.start_node(ARGLIST);
        builder.finish_node();
        builder.finish_node();
        let tree = builder.finish();

        let children = tree.children(tree.root());
        assert_eq!(children.len(), 1);
        assert_eq!(tree.kind(children[0]), PARAM);
    }
}
