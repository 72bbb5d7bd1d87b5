use pycoffee_syntax::NodeId;
use pycoffee_syntax::Operator;
use pycoffee_syntax::SyntaxKind::*;

use crate::{ConvertError, Converter};

impl Converter {
    /// `a if c else b` becomes `if c then a else b`.
    pub(super) fn conditional_expr(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let &[then, keyword, condition, otherwise, alternative] = self.tree.children(id) else {
            return Ok(());
        };
        if !self.is_kw(keyword, "if") || !self.is_kw(otherwise, "else") {
            let message = "expected `if` and `else`";
            return Err(self.structure_error(id, "conditional expression", message));
        }

        let lead = self.tree.prefix(then).to_owned();
        let inner = self.tree.prefix(keyword).to_owned();
        self.tree.set_prefix(keyword, lead);
        self.tree.set_prefix(then, inner);
        let range = self.tree.range(keyword);
        let then_keyword = self.tree.alloc_fragment("then", " ", Operator::If, range);
        let reordered = vec![keyword, condition, then_keyword, then, otherwise, alternative];
        self.tree.set_children(id, reordered);
        Ok(())
    }

    /// The walrus `a := b` is a plain assignment.
    pub(super) fn named_expr(&mut self, id: NodeId) -> Result<(), ConvertError> {
        if let Some(walrus) = self.tree.child(id, 1)
            && self.is_op(walrus, ":=")
        {
            self.tree.set_value(walrus, "=");
        }
        Ok(())
    }

    /// `is not` becomes `isnt`; `not in` is spelled the same.
    pub(super) fn comp_op(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let (Some(first), Some(second)) = (self.tree.child(id, 0), self.tree.child(id, 1)) else {
            return Ok(());
        };
        if self.is_kw(first, "is") && self.is_kw(second, "not") {
            self.tree.set_value(first, "isnt");
            self.tree.remove_child(id, 1);
        }
        Ok(())
    }

    /// `*rest` becomes the postfix splat `rest...`.
    pub(super) fn star_expr(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let star = self.expect_child(id, 0, "star expression")?;
        if !self.is_op(star, "*") {
            return Ok(());
        }
        let range = self.tree.range(star);
        self.remove_keeping_prefix(id, 0);
        let splat = self.tree.alloc_fragment("...", "", Operator::Atom, range);
        self.tree.push_child(id, splat);
        Ok(())
    }

    /// Parenthesized and bracketed displays, and runs of adjacent strings.
    pub(super) fn atom(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let children = self.tree.children(id).to_vec();
        let Some(&first) = children.first() else { return Ok(()) };

        if children.len() > 1 && children.iter().all(|&child| self.tree.kind(child) == STRING) {
            for index in (1..children.len()).rev() {
                let range = self.tree.range(children[index]);
                let plus = self.tree.alloc_fragment(" +", "", Operator::Additive, range);
                self.tree.insert_child(id, index, plus);
                if self.tree.prefix(children[index]).is_empty() {
                    self.tree.set_prefix(children[index], " ");
                }
            }
            return Ok(());
        }

        let Some(&last) = children.last() else { return Ok(()) };
        let inner = children.get(1).copied().filter(|&inner| inner != last);
        if self.is_op(first, "(") {
            let tuple = match inner {
                None => true,
                Some(inner) => {
                    self.tree.kind(inner) == TESTLIST_COMP
                        && self.position(inner, |child| self.is_op(child, ",")).is_some()
                }
            };
            if tuple {
                self.tree.set_value(first, "[");
                self.tree.set_value(last, "]");
            }
        } else if self.is_op(first, "[") {
            if let Some(inner) = inner
                && self.is_comprehension(inner)
            {
                self.tree.set_value(first, "(");
                self.tree.set_value(last, ")");
            }
        } else if self.is_op(first, "{")
            && let Some(inner) = inner
            && self.tree.kind(inner) != DICTORSETMAKER
        {
            let range = self.tree.range(id);
            self.warn("set displays have no CoffeeScript analog", range);
        }
        Ok(())
    }

    /// Bare tuples in assignments, `for` targets and `return` values are
    /// arrays.
    pub(super) fn bare_tuple(&mut self, id: NodeId) -> Result<(), ConvertError> {
        if self.tree.parent(id).is_some_and(|parent| self.tree.kind(parent) == DEL_STMT) {
            return Ok(());
        }
        let Some(first) = self.tree.child(id, 0) else { return Ok(()) };
        let open = self.fragment_like(first, "[", Operator::Atom);
        self.tree.set_prefix(first, "");
        let range = self.tree.range(id);
        let close = self.tree.alloc_fragment("]", "", Operator::Atom, range);
        self.tree.insert_child(id, 0, open);
        self.tree.push_child(id, close);
        Ok(())
    }

    /// Dict displays: `**other` becomes `other...`, and keys that Python
    /// evaluates are computed keys `[key]`.
    pub(super) fn dictorsetmaker(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let dict = self
            .tree
            .children(id)
            .iter()
            .any(|&child| self.is_op(child, ":") || self.is_op(child, "**"));
        if self.tree.children(id).iter().any(|&child| self.tree.kind(child) == COMP_FOR) {
            let range = self.tree.range(id);
            let what = if dict { "dict" } else { "set" };
            self.warn(format!("{what} comprehensions have no CoffeeScript analog"), range);
            return Ok(());
        }
        if !dict {
            let range = self.tree.range(id);
            self.warn("set displays have no CoffeeScript analog", range);
            return Ok(());
        }

        let mut index = 0;
        while let Some(child) = self.tree.child(id, index) {
            if self.is_op(child, "**") {
                let range = self.tree.range(child);
                self.remove_keeping_prefix(id, index);
                let splat = self.tree.alloc_fragment("...", "", Operator::Atom, range);
                self.tree.insert_child(id, index + 1, splat);
                index += 2;
                continue;
            }
            let is_key = self.tree.child(id, index + 1).is_some_and(|next| self.is_op(next, ":"));
            if is_key && !self.is_literal_key(child) {
                let open = self.fragment_like(child, "[", Operator::Atom);
                self.tree.set_prefix(child, "");
                let range = self.tree.range(child);
                let close = self.tree.alloc_fragment("]", "", Operator::Atom, range);
                self.tree.splice_children(id, index..index + 1, [open, child, close]);
                index += 2;
            }
            index += 1;
        }
        Ok(())
    }

    /// Only one `for` clause fits a CoffeeScript comprehension.
    pub(super) fn comp_for(&mut self, id: NodeId) -> Result<(), ConvertError> {
        if let Some(keyword) = self.tree.child(id, 0)
            && self.is_kw(keyword, "async")
        {
            let range = self.tree.range(keyword);
            self.warn("asynchronous comprehensions are converted as synchronous ones", range);
            self.remove_keeping_prefix(id, 0);
        }
        self.warn_nested_loop(id);
        Ok(())
    }

    /// A comprehension filter is `when`; further filters join it with `and`.
    pub(super) fn comp_if(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "comprehension filter")?;
        let chained = self.tree.parent(id).is_some_and(|parent| self.tree.kind(parent) == COMP_IF);
        if chained {
            self.tree.set_value(keyword, "and");
            let condition = self.expect_child(id, 1, "comprehension filter")?;
            let prefix = self.tree.prefix(condition).to_owned();
            let text = self.maybe_paren(condition, Operator::And)?;
            let range = self.tree.range(condition);
            let condition = self.tree.alloc_fragment(text, prefix, Operator::And, range);
            self.tree.replace_child(id, 1, condition);
        } else {
            self.tree.set_value(keyword, "when");
        }
        self.warn_nested_loop(id);
        Ok(())
    }

    /// `a[lo:hi]` becomes `a[lo...hi]` and `a[lo:]` becomes `a[lo..]`.
    pub(super) fn subscript(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let Some(colon_index) = self.position(id, |child| self.is_op(child, ":")) else {
            return Ok(());
        };
        if let Some(&step) = self.tree.children(id).last()
            && self.tree.kind(step) == SLICEOP
        {
            if self.tree.children(step).len() > 1 {
                let range = self.tree.range(step);
                self.warn("slice steps have no CoffeeScript analog, the step is dropped", range);
            }
            let index = self.tree.children(id).len() - 1;
            self.tree.remove_child(id, index);
        }

        let colon = self.tree.children(id)[colon_index];
        let bounded = self.tree.child(id, colon_index + 1).is_some();
        self.tree.set_value(colon, if bounded { "..." } else { ".." });
        Ok(())
    }

    pub(super) fn is_comprehension(&self, inner: NodeId) -> bool {
        self.tree.kind(inner) == TESTLIST_COMP
            && self.tree.children(inner).iter().any(|&child| self.tree.kind(child) == COMP_FOR)
    }

    fn is_literal_key(&self, key: NodeId) -> bool {
        match self.tree.kind(key) {
            STRING | NUMBER => true,
            ATOM => self.tree.children(key).iter().all(|&child| self.tree.kind(child) == STRING),
            _ => false,
        }
    }

    fn warn_nested_loop(&mut self, id: NodeId) {
        if let Some(&nested) = self.tree.children(id).last()
            && self.tree.kind(nested) == COMP_FOR
        {
            let range = self.tree.range(nested);
            self.warn("nested comprehension loops have no CoffeeScript analog", range);
        }
    }
}
