use pycoffee_syntax::{Element, NodeId, Operator, SyntaxKind, SyntaxTree};

use crate::{ConvertError, Converter};

/// The operator that dominates `id` when it is printed.
///
/// Leaves are atoms and fragments report the operator they were built
/// with. For inner nodes the subtree is searched level by level for an
/// operator or keyword leaf, and the first hit on the shallowest level
/// wins. A fragment ends the search at its level. A node such as `-a`
/// whose operator is not a leaf of its own counts as a hit one level
/// below it. Returns `None` when nothing in the subtree looks like an
/// operator.
pub fn top_op(tree: &SyntaxTree, id: NodeId) -> Option<Operator> {
    match tree.get(id) {
        Element::Leaf(_) => return Some(Operator::Atom),
        Element::Fragment(fragment) => return Some(fragment.outermost),
        Element::Node(node) => {
            if let Some(op) = compound_operator(node.kind) {
                return Some(op);
            }
        }
    }

    let mut frontier: Vec<Pending> =
        tree.children(id).iter().copied().map(Pending::Element).collect();
    while !frontier.is_empty() {
        let mut rest = Vec::new();
        for pending in frontier {
            let id = match pending {
                Pending::Compound(op) => return Some(op),
                Pending::Element(id) => id,
            };
            match tree.get(id) {
                Element::Fragment(fragment) => return Some(fragment.outermost),
                Element::Leaf(leaf) => {
                    if matches!(leaf.kind, SyntaxKind::OPERATOR | SyntaxKind::KEYWORD)
                        && let Some(op) = Operator::from_symbol(&leaf.value)
                    {
                        return Some(op);
                    }
                }
                Element::Node(node) => match compound_operator(node.kind) {
                    Some(op) => rest.push(Pending::Compound(op)),
                    None => rest.extend(node.children.iter().copied().map(Pending::Element)),
                },
            }
        }
        frontier = rest;
    }
    None
}

/// An entry of the search frontier in [`top_op`].
enum Pending {
    Element(NodeId),
    /// The operator of a compound node, found on the level of its children.
    Compound(Operator),
}

/// Nodes whose operator is not spelled by a single leaf.
fn compound_operator(kind: SyntaxKind) -> Option<Operator> {
    match kind {
        SyntaxKind::COMP_OP => Some(Operator::Comparison),
        SyntaxKind::FACTOR => Some(Operator::Unary),
        _ => None,
    }
}

impl Converter {
    /// Serializes `id`, parenthesized if it binds looser than `context`.
    ///
    /// The result never starts with the node's own prefix, callers decide
    /// where the text goes.
    pub fn maybe_paren(&mut self, id: NodeId, context: Operator) -> Result<String, ConvertError> {
        let text = self.recurse(id)?;
        let text = text.trim_start();

        let inner = match top_op(&self.tree, id) {
            Some(op) => op,
            None => {
                let range = self.tree.range(id);
                self.warn(format!("could not classify `{text}`, parenthesizing it"), range);
                Operator::Lambda
            }
        };
        let bare_integer = context == Operator::Access
            && self.tree.kind(id) == SyntaxKind::NUMBER
            && !text.contains(['.', 'e', 'E', 'x', 'X', 'o', 'O', 'b', 'B']);

        if inner.binds_looser_than(context) || bare_integer {
            Ok(format!("({text})"))
        } else {
            Ok(text.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use pycoffee_parse::{Dialect, parse};
    use pycoffee_syntax::{NodeId, Operator, SyntaxKind, SyntaxTree};

    use super::top_op;
    use crate::Converter;

    /// Tree of `x = <expr>\n` and the id of `<expr>`.
    fn value_of(expr: &str) -> (SyntaxTree, NodeId) {
        let (tree, diagnostics) = parse(&format!("x = {expr}\n"), Dialect::default()).into_parts();
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let stmt = tree.child(tree.child(tree.root(), 0).unwrap(), 0).unwrap();
        assert_eq!(tree.kind(stmt), SyntaxKind::EXPR_STMT);
        let value = tree.child(stmt, 2).unwrap();
        (tree, value)
    }

    #[test]
    fn classifies_outermost_operator() {
        let cases = [
            ("a", Operator::Atom),
            ("a or b and c", Operator::Or),
            ("a + b * c", Operator::Additive),
            ("a * (b + c)", Operator::Multiplicative),
            ("-a", Operator::Unary),
            ("-a or b", Operator::Or),
            ("-a * b", Operator::Multiplicative),
            ("not a", Operator::Not),
            ("a is not b", Operator::Comparison),
            ("a if b else c", Operator::If),
            ("lambda: a", Operator::Lambda),
            ("a.b(c)", Operator::Access),
            ("[a, b]", Operator::Access),
            ("a ** b", Operator::Power),
            ("await a", Operator::Await),
        ];
        for (expr, expected) in cases {
            let (tree, value) = value_of(expr);
            assert_eq!(top_op(&tree, value), Some(expected), "{expr}");
        }
    }

    #[test]
    fn fragments_stop_the_search() {
        let (mut tree, value) = value_of("a + b");
        let fragment = tree.alloc_fragment("x.length", "", Operator::Access, tree.range(value));
        tree.replace_child(value, 0, fragment);
        assert_eq!(top_op(&tree, value), Some(Operator::Access));
    }

    #[test]
    fn parenthesizes_only_looser_operands() {
        let cases = [
            ("a + b", Operator::Access, "(a + b)"),
            ("a + b", Operator::Additive, "a + b"),
            ("a + b", Operator::Comparison, "a + b"),
            ("a.b", Operator::Access, "a.b"),
            ("a or b", Operator::And, "(a or b)"),
            ("-a or b", Operator::And, "(-a or b)"),
            ("-a or b", Operator::Comparison, "(-a or b)"),
            ("-a", Operator::Multiplicative, "-a"),
            ("10", Operator::Access, "(10)"),
            ("1.5", Operator::Access, "1.5"),
            ("10", Operator::Additive, "10"),
        ];
        for (expr, context, expected) in cases {
            let (tree, value) = value_of(expr);
            let mut converter = Converter::new(tree);
            let text = converter.maybe_paren(value, context).unwrap();
            assert_eq!(text, expected, "{expr} under {context:?}");
        }
    }
}
