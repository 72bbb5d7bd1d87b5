use std::fmt::Write as _;

use text_size::{TextRange, TextSize};

use crate::{Operator, SyntaxKind, SyntaxSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Terminal token: its verbatim leading trivia and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub kind: SyntaxKind,
    pub value: String,
    pub prefix: String,
    pub range: TextRange,
    /// Set once the identifier escaper renamed this leaf.
    pub escaped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: SyntaxKind,
    pub children: Vec<NodeId>,
}

/// Already-converted output spliced back into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub value: String,
    pub prefix: String,
    /// The operator this text presents when embedded in a larger expression.
    pub outermost: Operator,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Leaf(Leaf),
    Node(Node),
    Fragment(Fragment),
}

/// Arena holding every element of one parsed file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    elements: Vec<Element>,
    parents: Vec<Option<NodeId>>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn empty() -> Self {
        Self { elements: Vec::new(), parents: Vec::new(), root: NodeId(0) }
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.elements[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        match self.get(id) {
            Element::Leaf(leaf) => leaf.kind,
            Element::Node(node) => node.kind,
            Element::Fragment(_) => SyntaxKind::FRAGMENT,
        }
    }

    pub fn is_node(&self, id: NodeId) -> bool {
        matches!(self.get(id), Element::Node(_))
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        match self.get(id) {
            Element::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut Leaf> {
        match &mut self.elements[id.index()] {
            Element::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn fragment(&self, id: NodeId) -> Option<&Fragment> {
        match self.get(id) {
            Element::Fragment(fragment) => Some(fragment),
            _ => None,
        }
    }

    /// Text of a leaf or fragment; empty for inner nodes.
    pub fn value(&self, id: NodeId) -> &str {
        match self.get(id) {
            Element::Leaf(leaf) => &leaf.value,
            Element::Fragment(fragment) => &fragment.value,
            Element::Node(_) => "",
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        match &mut self.elements[id.index()] {
            Element::Leaf(leaf) => leaf.value = value.into(),
            Element::Fragment(fragment) => fragment.value = value.into(),
            Element::Node(_) => debug_assert!(false, "set_value on an inner node"),
        }
    }

    /// Leading trivia; for inner nodes, the trivia of their first leaf.
    pub fn prefix(&self, id: NodeId) -> &str {
        match self.get(id) {
            Element::Leaf(leaf) => &leaf.prefix,
            Element::Fragment(fragment) => &fragment.prefix,
            Element::Node(_) => self.first_leaf(id).map_or("", |leaf| self.prefix(leaf)),
        }
    }

    pub fn set_prefix(&mut self, id: NodeId, prefix: impl Into<String>) {
        let Some(target) = self.first_leaf(id) else { return };
        match &mut self.elements[target.index()] {
            Element::Leaf(leaf) => leaf.prefix = prefix.into(),
            Element::Fragment(fragment) => fragment.prefix = prefix.into(),
            Element::Node(_) => unreachable!("first_leaf returned an inner node"),
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Element::Node(node) => &node.children,
            _ => &[],
        }
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    /// Iterates over enclosing nodes, starting from the immediate parent.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&id| self.parent(id))
    }

    pub fn search_ancestor(&self, id: NodeId, kinds: &SyntaxSet) -> Option<NodeId> {
        self.ancestors(id).find(|&ancestor| kinds.contains(self.kind(ancestor)))
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id) {
            Element::Node(node) => node.children.iter().find_map(|&child| self.first_leaf(child)),
            _ => Some(id),
        }
    }

    pub fn last_leaf(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id) {
            Element::Node(node) => {
                node.children.iter().rev().find_map(|&child| self.last_leaf(child))
            }
            _ => Some(id),
        }
    }

    /// The leaf following `id` in document order.
    pub fn next_leaf(&self, mut id: NodeId) -> Option<NodeId> {
        while let Some(parent) = self.parent(id) {
            let siblings = self.children(parent);
            let position = siblings.iter().position(|&child| child == id)?;
            if let Some(leaf) = siblings[position + 1..].iter().find_map(|&s| self.first_leaf(s))
            {
                return Some(leaf);
            }
            id = parent;
        }
        None
    }

    /// The leaf preceding `id` in document order.
    pub fn prev_leaf(&self, mut id: NodeId) -> Option<NodeId> {
        while let Some(parent) = self.parent(id) {
            let siblings = self.children(parent);
            let position = siblings.iter().position(|&child| child == id)?;
            if let Some(leaf) = siblings[..position].iter().rev().find_map(|&s| self.last_leaf(s))
            {
                return Some(leaf);
            }
            id = parent;
        }
        None
    }

    /// Leaves and fragments under `id`, in document order.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match self.get(id) {
                Element::Node(node) => stack.extend(node.children.iter().rev()),
                _ => leaves.push(id),
            }
        }
        leaves
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        match self.get(id) {
            Element::Leaf(leaf) => leaf.range,
            Element::Fragment(fragment) => fragment.range,
            Element::Node(node) => node
                .children
                .iter()
                .map(|&child| self.range(child))
                .reduce(TextRange::cover)
                .unwrap_or_else(|| TextRange::empty(TextSize::new(0))),
        }
    }

    /// Concatenation of every prefix and value under `id`.
    pub fn text(&self, id: NodeId) -> String {
        let mut text = String::new();
        for leaf in self.leaves(id) {
            text.push_str(self.prefix(leaf));
            text.push_str(self.value(leaf));
        }
        text
    }

    pub fn alloc_leaf(
        &mut self,
        kind: SyntaxKind,
        value: impl Into<String>,
        prefix: impl Into<String>,
        range: TextRange,
    ) -> NodeId {
        debug_assert!(kind.is_leaf() && kind != SyntaxKind::FRAGMENT);
        self.alloc(Element::Leaf(Leaf {
            kind,
            value: value.into(),
            prefix: prefix.into(),
            range,
            escaped: false,
        }))
    }

    pub fn alloc_fragment(
        &mut self,
        value: impl Into<String>,
        prefix: impl Into<String>,
        outermost: Operator,
        range: TextRange,
    ) -> NodeId {
        self.alloc(Element::Fragment(Fragment {
            value: value.into(),
            prefix: prefix.into(),
            outermost,
            range,
        }))
    }

    pub fn alloc_node(&mut self, kind: SyntaxKind, children: Vec<NodeId>) -> NodeId {
        let id = self.alloc(Element::Node(Node { kind, children: Vec::new() }));
        self.set_children(id, children);
        id
    }

    fn alloc(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.elements.len() as u32);
        self.elements.push(element);
        self.parents.push(None);
        id
    }

    fn children_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        match &mut self.elements[id.index()] {
            Element::Node(node) => &mut node.children,
            _ => panic!("{id:?} is not an inner node"),
        }
    }

    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for old in std::mem::take(self.children_mut(id)) {
            self.parents[old.index()] = None;
        }
        for &child in &children {
            self.parents[child.index()] = Some(id);
        }
        *self.children_mut(id) = children;
    }

    /// Replaces `range` of the children of `id`, returning the removed ones.
    pub fn splice_children(
        &mut self,
        id: NodeId,
        range: std::ops::Range<usize>,
        replace_with: impl IntoIterator<Item = NodeId>,
    ) -> Vec<NodeId> {
        let replace_with: Vec<NodeId> = replace_with.into_iter().collect();
        let removed: Vec<NodeId> = self.children_mut(id).splice(range, replace_with.clone()).collect();
        for old in &removed {
            self.parents[old.index()] = None;
        }
        for child in replace_with {
            self.parents[child.index()] = Some(id);
        }
        removed
    }

    pub fn insert_child(&mut self, id: NodeId, index: usize, child: NodeId) {
        self.splice_children(id, index..index, [child]);
    }

    pub fn push_child(&mut self, id: NodeId, child: NodeId) {
        let len = self.children(id).len();
        self.insert_child(id, len, child);
    }

    pub fn remove_child(&mut self, id: NodeId, index: usize) -> NodeId {
        self.splice_children(id, index..index + 1, [])[0]
    }

    pub fn replace_child(&mut self, id: NodeId, index: usize, new: NodeId) -> NodeId {
        self.splice_children(id, index..index + 1, [new])[0]
    }

    /// Indented dump: one element per line, leaves with their value and
    /// non-empty prefix.
    pub fn debug_dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(id, 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, level: usize, out: &mut String) {
        let indent = "  ".repeat(level);
        match self.get(id) {
            Element::Node(node) => {
                _ = writeln!(out, "{indent}{:?}", node.kind);
                for &child in &node.children {
                    self.dump_into(child, level + 1, out);
                }
            }
            Element::Leaf(leaf) => {
                _ = write!(out, "{indent}{:?} {:?}", leaf.kind, leaf.value);
                if !leaf.prefix.is_empty() {
                    _ = write!(out, " prefix={:?}", leaf.prefix);
                }
                out.push('\n');
            }
            Element::Fragment(fragment) => {
                _ = write!(out, "{indent}FRAGMENT {:?} {:?}", fragment.value, fragment.outermost);
                if !fragment.prefix.is_empty() {
                    _ = write!(out, " prefix={:?}", fragment.prefix);
                }
                out.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::SyntaxKind::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    /// `x = y\n`
    fn sample() -> (SyntaxTree, [NodeId; 4]) {
        let mut tree = SyntaxTree::empty();
        let x = tree.alloc_leaf(NAME, "x", "", range(0, 1));
        let eq = tree.alloc_leaf(OPERATOR, "=", " ", range(2, 3));
        let y = tree.alloc_leaf(NAME, "y", " ", range(4, 5));
        let stmt = tree.alloc_node(EXPR_STMT, vec![x, eq, y]);
        let newline = tree.alloc_leaf(NEWLINE, "\n", "", range(5, 6));
        let simple = tree.alloc_node(SIMPLE_STMT, vec![stmt, newline]);
        let root = tree.alloc_node(FILE_INPUT, vec![simple]);
        tree.set_root(root);
        (tree, [x, eq, y, newline])
    }

    #[test]
    fn text_is_verbatim() {
        let (tree, _) = sample();
        assert_eq!(tree.text(tree.root()), "x = y\n");
        assert_eq!(tree.range(tree.root()), range(0, 6));
    }

    #[test]
    fn leaf_navigation_crosses_nodes() {
        let (tree, [x, eq, y, newline]) = sample();
        assert_eq!(tree.first_leaf(tree.root()), Some(x));
        assert_eq!(tree.last_leaf(tree.root()), Some(newline));
        assert_eq!(tree.next_leaf(y), Some(newline));
        assert_eq!(tree.prev_leaf(newline), Some(y));
        assert_eq!(tree.prev_leaf(x), None);
        assert_eq!(tree.next_leaf(newline), None);
        assert_eq!(tree.leaves(tree.root()), vec![x, eq, y, newline]);
    }

    #[test]
    fn ancestors_follow_parent_table() {
        let (tree, [x, ..]) = sample();
        let kinds: Vec<_> = tree.ancestors(x).map(|id| tree.kind(id)).collect();
        assert_eq!(kinds, [EXPR_STMT, SIMPLE_STMT, FILE_INPUT]);
        let found = tree.search_ancestor(x, &SyntaxSet::new([SIMPLE_STMT, CLASSDEF]));
        assert_eq!(found.map(|id| tree.kind(id)), Some(SIMPLE_STMT));
    }

    #[test]
    fn splicing_updates_parents() {
        let (mut tree, [x, eq, y, _]) = sample();
        let stmt = tree.parent(x).unwrap();
        let colon = tree.alloc_fragment(":", "", Operator::Atom, range(2, 3));

        let old = tree.replace_child(stmt, 1, colon);
        assert_eq!(old, eq);
        assert_eq!(tree.parent(eq), None);
        assert_eq!(tree.parent(colon), Some(stmt));
        tree.set_prefix(y, " ");
        assert_eq!(tree.text(tree.root()), "x: y\n");

        let removed = tree.remove_child(stmt, 0);
        assert_eq!(removed, x);
        assert_eq!(tree.index_in_parent(y), Some(1));
        assert_eq!(tree.text(stmt), ": y");
    }

    #[test]
    fn dump_shows_prefixes_and_fragments() {
        let (mut tree, [x, ..]) = sample();
        let stmt = tree.parent(x).unwrap();
        let at = tree.alloc_fragment("@x", "", Operator::Access, range(0, 1));
        tree.replace_child(stmt, 0, at);
        expect![[r#"
            FILE_INPUT
              SIMPLE_STMT
                EXPR_STMT
                  FRAGMENT "@x" Access
                  OPERATOR "=" prefix=" "
                  NAME "y" prefix=" "
                NEWLINE "\n"
        "#]]
        .assert_eq(&tree.debug_dump(tree.root()));
    }
}
