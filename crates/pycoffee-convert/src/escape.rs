use std::sync::LazyLock;

use pycoffee_syntax::{SyntaxKind, SyntaxTree};
use regex::Regex;

/// Python identifiers that CoffeeScript reserves, optionally preceded by
/// underscores so that already escaped names move one step further out.
static RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^_*(this|function|var|new|delete|typeof|instanceof|switch|case|default|do|then|unless|until|loop|of|by|when|yes|no|on|off|undefined|null|let|const|enum|export|extends|debugger|void)$",
    )
    .unwrap()
});

/// Prefixes an underscore to every name that would be a reserved word in
/// CoffeeScript.
///
/// Attribute names are left alone. Renamed leaves are marked, so running
/// the pass again changes nothing.
pub fn escape_identifiers(tree: &mut SyntaxTree) {
    let mut cursor = tree.first_leaf(tree.root());
    let mut after_dot = false;

    while let Some(id) = cursor {
        cursor = tree.next_leaf(id);
        let Some(leaf) = tree.leaf_mut(id) else { continue };

        let attribute = after_dot;
        after_dot = leaf.kind == SyntaxKind::OPERATOR && leaf.value == ".";

        if leaf.kind != SyntaxKind::NAME || leaf.escaped || attribute {
            continue;
        }
        if RESERVED.is_match(&leaf.value) {
            tracing::trace!(name = %leaf.value, "escaping reserved name");
            leaf.value.insert(0, '_');
            leaf.escaped = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use pycoffee_parse::{Dialect, parse};

    use super::escape_identifiers;

    fn escaped(text: &str) -> String {
        let (mut tree, _) = parse(text, Dialect::default()).into_parts();
        escape_identifiers(&mut tree);
        tree.text(tree.root())
    }

    #[test]
    fn reserved_names_get_an_underscore() {
        assert_eq!(escaped("this = function(new)\n"), "_this = _function(_new)\n");
        assert_eq!(escaped("_this = __loop\n"), "__this = ___loop\n");
        assert_eq!(escaped("thistle = functions\n"), "thistle = functions\n");
    }

    #[test]
    fn attributes_are_left_alone() {
        assert_eq!(escaped("x.this = y.new(z.do)\n"), "x.this = y.new(z.do)\n");
        assert_eq!(escaped("x . this\n"), "x . this\n");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let source = "def when(this, yes=no):\n    return this.off(on)\n";
        let (mut tree, _) = parse(source, Dialect::default()).into_parts();
        escape_identifiers(&mut tree);
        let once = tree.text(tree.root());
        escape_identifiers(&mut tree);
        assert_eq!(tree.text(tree.root()), once);
        assert_eq!(once, "def _when(_this, _yes=_no):\n    return _this.off(_on)\n");
    }
}
