use pycoffee_syntax::NodeId;
use pycoffee_syntax::Operator;
use pycoffee_syntax::SyntaxKind::*;

use crate::{ConvertError, Converter};

impl Converter {
    /// `if`, `while` and `for`: header colons go away, `elif` becomes
    /// `else if`, `while True` becomes `loop`, and a negated condition turns
    /// the statement into `unless` or `until`.
    pub(super) fn control_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let kind = self.tree.kind(id);
        let keyword = self.expect_child(id, 0, "compound statement")?;

        for index in (0..self.tree.children(id).len()).rev() {
            let child = self.tree.children(id)[index];
            if self.is_op(child, ":") {
                self.remove_colon(id, index);
            } else if self.is_kw(child, "elif") {
                self.tree.set_value(child, "else if");
            } else if self.is_kw(child, "else") && kind != IF_STMT {
                let range = self.tree.range(child);
                self.warn("`else` clause of a loop has no CoffeeScript analog", range);
            }
        }

        let condition = self.expect_child(id, 1, "compound statement")?;
        if kind == WHILE_STMT && is_true(self, condition) {
            self.tree.set_value(keyword, "loop");
            self.tree.remove_child(id, 1);
        } else if matches!(kind, IF_STMT | WHILE_STMT)
            && self.tree.kind(condition) == NOT_TEST
            && self.tree.child(condition, 0).is_some_and(|not| self.is_kw(not, "not"))
        {
            let negated = self.expect_child(condition, 1, "negated condition")?;
            let prefix = self.tree.prefix(condition).to_owned();
            self.tree.set_value(keyword, if kind == IF_STMT { "unless" } else { "until" });
            self.tree.remove_child(condition, 1);
            self.tree.replace_child(id, 1, negated);
            self.tree.set_prefix(negated, prefix);
        }

        self.then_before_inline_bodies(id);
        Ok(())
    }

    /// `except E as e` becomes `catch e`; only the first handler survives
    /// in CoffeeScript.
    pub(super) fn try_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let mut handlers = 0;
        for index in (0..self.tree.children(id).len()).rev() {
            let child = self.tree.children(id)[index];
            if self.is_op(child, ":") {
                self.remove_colon(id, index);
            } else if self.is_kw(child, "else") {
                let range = self.tree.range(child);
                self.warn("`else` clause of `try` has no CoffeeScript analog", range);
            }
        }

        for child in self.tree.children(id).to_vec() {
            let clause = match self.tree.kind(child) {
                EXCEPT_CLAUSE => self.except_clause(child)?,
                KEYWORD if self.tree.value(child) == "except" => {
                    self.tree.set_value(child, "catch");
                    true
                }
                _ => false,
            };
            if clause {
                handlers += 1;
                if handlers == 2 {
                    let range = self.tree.range(child);
                    self.warn("CoffeeScript has a single `catch`, later handlers are invalid", range);
                }
            }
        }

        self.then_before_inline_bodies(id);
        Ok(())
    }

    /// `with open(p) as f:` becomes `do (f = open(p)) ->`, which scopes
    /// the names but neither enters nor exits the managers.
    pub(super) fn with_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        const CONSTRUCT: &str = "with statement";
        let keyword = self.expect_child(id, 0, CONSTRUCT)?;
        let Some(colon_index) = self.position(id, |child| self.is_op(child, ":")) else {
            return Err(self.structure_error(id, CONSTRUCT, "expected `:`"));
        };
        let range = self.tree.range(keyword);
        self.warn("`with` does not enter or exit context managers in CoffeeScript", range);

        let items: Vec<NodeId> = self.tree.children(id)[1..colon_index]
            .iter()
            .copied()
            .filter(|&item| !self.is_op(item, ","))
            .collect();
        for (position, item) in items.into_iter().enumerate() {
            let separator = if position == 0 { "" } else { " " };
            let range = self.tree.range(item);
            let assign = self.tree.alloc_fragment(" =", "", Operator::Atom, range);
            if self.tree.kind(item) == WITH_ITEM && self.tree.children(item).len() == 3 {
                let manager = self.tree.children(item)[0];
                let target = self.tree.children(item)[2];
                self.tree.set_children(item, vec![target, assign, manager]);
                self.tree.set_prefix(target, separator);
                self.tree.set_prefix(manager, " ");
            } else {
                let name = if position == 0 { "_".to_owned() } else { format!("_{position}") };
                let name = self.tree.alloc_fragment(name, separator, Operator::Atom, range);
                let index = self.tree.index_in_parent(item).unwrap_or(1);
                self.tree.splice_children(id, index..index, [name, assign]);
                self.tree.set_prefix(item, " ");
            }
        }

        let opening = self.fragment_like(keyword, "do (", Operator::Atom);
        self.tree.replace_child(id, 0, opening);
        let colon_index = self.position(id, |child| self.is_op(child, ":")).unwrap_or(colon_index);
        let colon = self.tree.children(id)[colon_index];
        let arrow = if self.in_class(id) { "=>" } else { "->" };
        self.tree.set_value(colon, format!(") {arrow}"));
        Ok(())
    }

    /// Returns whether `clause` became a `catch`.
    fn except_clause(&mut self, clause: NodeId) -> Result<bool, ConvertError> {
        let keyword = self.expect_child(clause, 0, "except clause")?;
        if !self.is_kw(keyword, "except") {
            return Ok(false);
        }
        self.tree.set_value(keyword, "catch");
        if let Some(filter) = self.tree.child(clause, 1) {
            let range = self.tree.range(filter);
            let filter = self.tree.text(filter);
            self.warn(
                format!("exception filter `{}` is dropped, every error is caught", filter.trim()),
                range,
            );
            let end = if self.tree.children(clause).len() >= 4 { 3 } else { 2 };
            self.tree.splice_children(clause, 1..end, []);
        }
        Ok(true)
    }

    /// A body on the header line needs `then`, except after `else`, `try`
    /// and `finally`.
    fn then_before_inline_bodies(&mut self, id: NodeId) {
        let mut index = 1;
        while let Some(child) = self.tree.child(id, index) {
            let previous = self.tree.children(id)[index - 1];
            let bare = ["else", "try", "finally"].iter().any(|word| self.is_kw(previous, word));
            if self.is_inline_body(child) && !bare {
                let range = self.tree.range(child);
                let then = self.tree.alloc_fragment(" then", "", Operator::Atom, range);
                self.tree.insert_child(id, index, then);
                index += 1;
            }
            index += 1;
        }
    }
}

/// `True` is a keyword in Python 3 and a name in Python 2.
fn is_true(converter: &Converter, id: NodeId) -> bool {
    matches!(converter.tree.kind(id), NAME | KEYWORD) && converter.tree.value(id) == "True"
}
