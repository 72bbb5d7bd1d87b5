use pycoffee_errors::Diagnostic;
use pycoffee_parse::Dialect;
use pycoffee_syntax::{Element, NodeId, SyntaxKind, SyntaxTree, TextRange};
use rustc_hash::FxHashMap;

use crate::ConvertError;
use crate::comments::terminate_comments;
use crate::strings::convert_string;

/// How a method in a class body was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MethodKind {
    Static,
    Class,
}

/// Rewrites a tree in place while serializing it.
///
/// Each inner node is handed to its rewrite rule before its children are
/// serialized, so rules see their enclosing context untouched and their own
/// subtree not yet converted.
pub struct Converter {
    pub(crate) tree: SyntaxTree,
    diagnostics: Vec<Diagnostic>,
    /// Function definitions whose decorator was folded into the method name.
    pub(crate) method_kinds: FxHashMap<NodeId, MethodKind>,
    /// Function bodies whose receiver parameter was renamed to `this`.
    pub(crate) receivers: FxHashMap<NodeId, String>,
    /// Set on the converter of an f-string field that sits in a class.
    pub(crate) field_in_class: bool,
}

impl Converter {
    pub fn new(tree: SyntaxTree) -> Self {
        Self {
            tree,
            diagnostics: Vec::new(),
            method_kinds: FxHashMap::default(),
            receivers: FxHashMap::default(),
            field_in_class: false,
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>, range: TextRange) {
        let message = message.into();
        tracing::debug!(?range, %message, "conversion warning");
        self.diagnostics.push(Diagnostic::warning(message, range));
    }

    /// Converts the subtree at `id` and returns its CoffeeScript text.
    pub fn recurse(&mut self, id: NodeId) -> Result<String, ConvertError> {
        match self.tree.get(id) {
            Element::Fragment(fragment) => Ok(format!("{}{}", fragment.prefix, fragment.value)),
            Element::Leaf(_) => Ok(self.leaf(id)),
            Element::Node(_) => {
                self.rewrite(id)?;
                let mut text = String::new();
                for child in self.tree.children(id).to_vec() {
                    text.push_str(&self.recurse(child)?);
                }
                Ok(text)
            }
        }
    }

    fn leaf(&mut self, id: NodeId) -> String {
        let Some(leaf) = self.tree.leaf(id) else { return String::new() };
        let (kind, range) = (leaf.kind, leaf.range);
        let mut text = terminate_comments(&leaf.prefix);
        let value = leaf.value.clone();

        let after_dot = matches!(kind, SyntaxKind::NAME | SyntaxKind::KEYWORD)
            && self.tree.prev_leaf(id).is_some_and(|prev| {
                self.tree.kind(prev) == SyntaxKind::OPERATOR && self.tree.value(prev) == "."
            });
        let value = match (kind, value.as_str()) {
            (SyntaxKind::STRING, _) => {
                let converted = convert_string(&value, |expr| self.field(id, expr, range));
                for warning in converted.warnings {
                    self.warn(warning, range);
                }
                converted.text
            }
            (SyntaxKind::NUMBER, _) => self.number(&value, range),
            (SyntaxKind::NAME, "this") if !after_dot => "@".to_owned(),
            (SyntaxKind::NAME, "print") if !after_dot && self.is_called(id) => {
                "console.log".to_owned()
            }
            (SyntaxKind::NAME | SyntaxKind::KEYWORD, "None") if !after_dot => "null".to_owned(),
            (SyntaxKind::NAME | SyntaxKind::KEYWORD, "True") if !after_dot => "true".to_owned(),
            (SyntaxKind::NAME | SyntaxKind::KEYWORD, "False") if !after_dot => "false".to_owned(),
            (SyntaxKind::KEYWORD, "print") => "console.log()".to_owned(),
            (SyntaxKind::KEYWORD, "pass") => "null".to_owned(),
            (SyntaxKind::KEYWORD, "raise") => {
                self.warn("bare `raise` has no CoffeeScript analog, name the caught error", range);
                "throw".to_owned()
            }
            (SyntaxKind::OPERATOR, "<>") => "!=".to_owned(),
            (SyntaxKind::ERROR_LEAF, "`") => {
                self.warn("backquote repr has no CoffeeScript analog", range);
                value
            }
            (SyntaxKind::ERROR_LEAF, _) => {
                self.warn(format!("unparsed input `{value}` copied verbatim"), range);
                value
            }
            _ => value,
        };
        text.push_str(&value);
        text
    }

    /// Whether the leaf `id` is followed by a call trailer.
    fn is_called(&self, id: NodeId) -> bool {
        let (Some(parent), Some(index)) = (self.tree.parent(id), self.tree.index_in_parent(id))
        else {
            return false;
        };
        self.tree.child(parent, index + 1).is_some_and(|trailer| {
            self.tree.kind(trailer) == SyntaxKind::TRAILER
                && self.tree.child(trailer, 0).is_some_and(|open| self.tree.value(open) == "(")
        })
    }

    /// Converts the expression of a replacement field of the f-string leaf
    /// `string`. A field that does not parse is copied unchanged.
    fn field(&mut self, string: NodeId, expr: &str, range: TextRange) -> String {
        let (tree, errors) = pycoffee_parse::parse(&format!("{expr}\n"), Dialect::default())
            .into_parts();
        let stmt = tree.child(tree.root(), 0).filter(|_| errors.is_empty());
        let Some(field) = stmt.and_then(|stmt| tree.child(stmt, 0)) else {
            self.warn(format!("f-string field `{expr}` does not parse, copied verbatim"), range);
            return expr.to_owned();
        };

        let mut nested = Converter::new(tree);
        nested.field_in_class = self.in_class(string);
        if let Some(receiver) = self.receiver_of(string) {
            nested.rename_in(field, &receiver, "this");
        }
        let converted = nested.recurse(field);
        for diagnostic in nested.into_diagnostics() {
            self.warn(diagnostic.message(), range);
        }
        match converted {
            Ok(text) => text.trim().to_owned(),
            Err(err) => {
                self.warn(format!("f-string field `{expr}` copied verbatim: {err}"), range);
                expr.to_owned()
            }
        }
    }

    /// The receiver name of the nearest enclosing method of `id`.
    fn receiver_of(&self, id: NodeId) -> Option<String> {
        self.tree.ancestors(id).find_map(|ancestor| self.receivers.get(&ancestor).cloned())
    }

    fn number(&mut self, literal: &str, range: TextRange) -> String {
        let mut number = literal.replace('_', "");
        if number.ends_with(['l', 'L']) {
            number.pop();
        }
        if number.ends_with(['j', 'J']) {
            self.warn(format!("imaginary literal `{literal}` has no CoffeeScript analog"), range);
        }

        let legacy_octal = number.len() > 1
            && number.starts_with('0')
            && number.bytes().all(|b| b.is_ascii_digit())
            && number.bytes().any(|b| b != b'0');
        if legacy_octal {
            number.replace_range(..1, "0o");
        }
        number
    }
}

#[cfg(test)]
mod tests {
    use pycoffee_parse::{Dialect, parse};

    use super::Converter;

    fn leaves(text: &str, dialect: Dialect) -> (String, Vec<String>) {
        let (tree, _) = parse(text, dialect).into_parts();
        let root = tree.root();
        let mut converter = Converter::new(tree);
        let text = converter.recurse(root).unwrap();
        let messages = converter.diagnostics().iter().map(|d| d.message().to_owned()).collect();
        (text, messages)
    }

    #[test]
    fn literal_spellings() {
        let (text, messages) = leaves("x = [None, True, False, 10L, 0755, 1_000]\n", Dialect::new(2, 7));
        assert_eq!(text, "x = [null, true, false, 10, 0o755, 1000]\n");
        assert!(messages.is_empty());

        let (text, _) = leaves("x = (None, 0, 00, 0x1F)\n", Dialect::default());
        assert_eq!(text, "x = [null, 0, 00, 0x1F]\n");
    }

    #[test]
    fn attribute_names_keep_their_spelling() {
        let (text, _) = leaves("x.None = y.True\n", Dialect::new(2, 7));
        assert_eq!(text, "x.None = y.True\n");
    }

    #[test]
    fn imaginary_literals_warn() {
        let (text, messages) = leaves("z = 3j\n", Dialect::default());
        assert_eq!(text, "z = 3j\n");
        assert_eq!(messages, ["imaginary literal `3j` has no CoffeeScript analog"]);
    }

    #[test]
    fn block_comments_in_prefixes_are_closed() {
        let (text, _) = leaves("### note\nx = 1  ### why\n", Dialect::default());
        assert_eq!(text, "### note ###\nx = 1  ### why ###\n");
    }
}
