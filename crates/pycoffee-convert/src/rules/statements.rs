use pycoffee_syntax::NodeId;
use pycoffee_syntax::Operator;
use pycoffee_syntax::SyntaxKind::*;

use crate::{ConvertError, Converter};

impl Converter {
    /// Python 2 `print a, b` becomes `console.log a, b`.
    pub(super) fn print_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "print statement")?;
        self.tree.set_value(keyword, "console.log");

        if self.tree.child(id, 1).is_some_and(|child| self.is_op(child, ">>")) {
            let range = self.tree.range(id);
            self.warn("`print >>file` writes to the console instead", range);
            let comma = self.tree.child(id, 3).is_some_and(|child| self.is_op(child, ","));
            let end = if comma { 4 } else { 3 }.min(self.tree.children(id).len());
            self.tree.splice_children(id, 1..end, []);
        }

        if let Some(&last) = self.tree.children(id).last()
            && self.is_op(last, ",")
        {
            let range = self.tree.range(last);
            self.warn("no analog of a trailing comma suppressing the newline of `print`", range);
            let index = self.tree.children(id).len() - 1;
            self.tree.remove_child(id, index);
        }

        if self.tree.children(id).len() == 1 {
            self.tree.set_value(keyword, "console.log()");
        }
        Ok(())
    }

    pub(super) fn assert_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "assert statement")?;
        self.tree.set_value(keyword, "console.assert");
        Ok(())
    }

    /// `del a, b` becomes `delete a; delete b`.
    pub(super) fn del_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "del statement")?;
        let targets = self.expect_child(id, 1, "del statement")?;
        self.tree.set_value(keyword, "delete");
        if self.tree.kind(targets) != EXPRLIST {
            return Ok(());
        }

        if let Some(&last) = self.tree.children(targets).last()
            && self.is_op(last, ",")
        {
            let index = self.tree.children(targets).len() - 1;
            self.tree.remove_child(targets, index);
        }
        let mut index = 0;
        while let Some(child) = self.tree.child(targets, index) {
            if self.is_op(child, ",") {
                let separator = self.fragment_like(child, ";", Operator::Atom);
                self.tree.replace_child(targets, index, separator);
                if let Some(next) = self.tree.child(targets, index + 1) {
                    let delete = self.fragment_like(next, "delete", Operator::Atom);
                    self.tree.insert_child(targets, index + 1, delete);
                    index += 1;
                }
            }
            index += 1;
        }
        Ok(())
    }

    /// `raise E` becomes `throw E`.
    pub(super) fn raise_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "raise statement")?;
        self.tree.set_value(keyword, "throw");

        let Some(separator) = self.tree.child(id, 2) else { return Ok(()) };
        let len = self.tree.children(id).len();
        if self.is_kw(separator, "from") {
            let range = self.tree.range(separator);
            self.warn("the cause given by `raise ... from` is dropped", range);
            self.tree.splice_children(id, 2..len, []);
        } else if self.is_op(separator, ",") {
            let value = self.expect_child(id, 3, "raise statement")?;
            if len > 4 {
                let range = self.tree.range(id);
                self.warn("the traceback argument of `raise` is dropped", range);
            }
            self.tree.set_prefix(value, "");
            let range = self.tree.range(value);
            let open = self.tree.alloc_fragment("(", "", Operator::Atom, range);
            let close = self.tree.alloc_fragment(")", "", Operator::Atom, range);
            self.tree.splice_children(id, 2..len, [open, value, close]);
        }
        Ok(())
    }

    /// `exec code` has to become JavaScript `eval`.
    pub(super) fn exec_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "exec statement")?;
        let range = self.tree.range(id);
        self.warn("`exec` becomes `eval`, which runs JavaScript", range);
        self.tree.set_value(keyword, "eval");

        if let Some(scope) = self.position(id, |child| self.is_kw(child, "in")) {
            let range = self.tree.range(id);
            self.warn("the namespaces given to `exec` are dropped", range);
            let len = self.tree.children(id).len();
            self.tree.splice_children(id, scope..len, []);
        }
        Ok(())
    }

    /// Imports and scope declarations have no CoffeeScript counterpart and
    /// are kept as comments.
    pub(super) fn comment_out(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self
            .tree
            .first_leaf(id)
            .map_or_else(String::new, |leaf| self.tree.value(leaf).to_owned());
        let range = self.tree.range(id);
        let message = format!("`{keyword}` statement has no CoffeeScript analog, commented out");
        self.warn(message, range);
        self.replace_with_comment(id);
        Ok(())
    }

    /// Assignments: annotations are dropped, and a name assigned directly
    /// in a class body becomes a property `name: value`.
    pub(super) fn expr_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        if let Some(&annotated) = self.tree.children(id).last()
            && self.tree.kind(annotated) == ANNASSIGN
        {
            if self.tree.children(annotated).len() < 4 {
                let range = self.tree.range(id);
                self.warn("annotation without a value declares nothing, commented out", range);
                self.replace_with_comment(id);
                return Ok(());
            }
            let rest = self.tree.children(annotated)[2..].to_vec();
            self.tree.set_children(annotated, Vec::new());
            let index = self.tree.children(id).len() - 1;
            self.tree.splice_children(id, index..index + 1, rest);
        }

        let property = self.tree.children(id).len() == 3
            && self.child_is(id, 0, NAME)
            && self.tree.child(id, 1).is_some_and(|assign| self.is_op(assign, "="))
            && self.is_class_level_stmt(id);
        if property && let Some(assign) = self.tree.child(id, 1) {
            self.tree.set_value(assign, ":");
            self.tree.set_prefix(assign, "");
        }
        Ok(())
    }

    /// Replaces the contents of the statement `id` with its source text as
    /// a comment. A statement followed by `;` gets a block comment so the
    /// rest of the line survives.
    fn replace_with_comment(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.tree.parent(id), self.tree.index_in_parent(id))
        else {
            return;
        };
        let prefix = self.tree.prefix(id).to_owned();
        let text = self.tree.text(id);
        let source = &text[prefix.len()..];

        let inline = self.tree.child(parent, index + 1).is_some_and(|next| self.is_op(next, ";"));
        let comment = if inline {
            format!("### {} ###", source.replace("###", "## #"))
        } else {
            format!("# {}", source.replace('\n', "\n# "))
        };
        let range = self.tree.range(id);
        let fragment = self.tree.alloc_fragment(comment, prefix, Operator::Atom, range);
        self.tree.set_children(id, vec![fragment]);
    }
}
