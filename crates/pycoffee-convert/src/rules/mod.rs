//! One rewrite per syntactic construct.
//!
//! A rule runs on an inner node right before its children are serialized.
//! It may reshape the children, splice in fragments of converted text, or
//! report a diagnostic and leave the construct as it is.

mod calls;
mod classes;
mod control;
mod expressions;
mod functions;
mod statements;

use std::ops::Range;

use pycoffee_syntax::SyntaxKind::{self, *};
use pycoffee_syntax::{NodeId, Operator, SyntaxSet};

use crate::{ConvertError, Converter};

const DEFINITION_WRAPPERS: SyntaxSet = SyntaxSet::new([DECORATED, ASYNC_FUNCDEF]);

impl Converter {
    pub(crate) fn rewrite(&mut self, id: NodeId) -> Result<(), ConvertError> {
        match self.tree.kind(id) {
            PRINT_STMT => self.print_stmt(id),
            ASSERT_STMT => self.assert_stmt(id),
            DEL_STMT => self.del_stmt(id),
            RAISE_STMT => self.raise_stmt(id),
            EXEC_STMT => self.exec_stmt(id),
            GLOBAL_STMT | NONLOCAL_STMT | IMPORT_NAME | IMPORT_FROM => self.comment_out(id),
            EXPR_STMT => self.expr_stmt(id),
            IF_STMT | WHILE_STMT | FOR_STMT => self.control_stmt(id),
            TRY_STMT => self.try_stmt(id),
            WITH_STMT => self.with_stmt(id),
            FUNCDEF => self.funcdef(id),
            LAMBDEF => self.lambdef(id),
            CLASSDEF => self.classdef(id),
            DECORATED => self.decorated(id),
            ASYNC_FUNCDEF | ASYNC_STMT => self.async_stmt(id),
            TEST => self.conditional_expr(id),
            NAMEDEXPR_TEST => self.named_expr(id),
            COMP_OP => self.comp_op(id),
            STAR_EXPR => self.star_expr(id),
            ATOM_EXPR => self.atom_expr(id),
            ATOM => self.atom(id),
            TRAILER => self.trailer(id),
            TESTLIST_STAR_EXPR | EXPRLIST | TESTLIST => self.bare_tuple(id),
            DICTORSETMAKER => self.dictorsetmaker(id),
            COMP_FOR => self.comp_for(id),
            COMP_IF => self.comp_if(id),
            SUBSCRIPT => self.subscript(id),
            SUBSCRIPTLIST => {
                let range = self.tree.range(id);
                self.warn("multi-dimensional subscripts have no CoffeeScript analog", range);
                Ok(())
            }
            FILE_INPUT | SIMPLE_STMT | ANNASSIGN | RETURN_STMT | DOTTED_NAME | EXCEPT_CLAUSE
            | WITH_ITEM | PARAMETERS | PARAM | DECORATOR | DECORATORS | SUITE | OR_TEST
            | AND_TEST | NOT_TEST | COMPARISON | EXPR | XOR_EXPR | AND_EXPR | SHIFT_EXPR
            | ARITH_EXPR | TERM | FACTOR | POWER | TESTLIST_COMP | ARGLIST | ARGUMENT | SLICEOP
            | YIELD_EXPR | ERROR_NODE | TOMBSTONE => Ok(()),
            NAME | KEYWORD | NUMBER | STRING | OPERATOR | NEWLINE | INDENT | DEDENT | ENDMARKER
            | ERROR_LEAF | FRAGMENT => Ok(()),
        }
    }

    pub(crate) fn is_op(&self, id: NodeId, value: &str) -> bool {
        self.tree.kind(id) == OPERATOR && self.tree.value(id) == value
    }

    pub(crate) fn is_kw(&self, id: NodeId, value: &str) -> bool {
        self.tree.kind(id) == KEYWORD && self.tree.value(id) == value
    }

    pub(crate) fn child_is(&self, id: NodeId, index: usize, kind: SyntaxKind) -> bool {
        self.tree.child(id, index).is_some_and(|child| self.tree.kind(child) == kind)
    }

    pub(crate) fn position(&self, id: NodeId, matches: impl Fn(NodeId) -> bool) -> Option<usize> {
        self.tree.children(id).iter().position(|&child| matches(child))
    }

    pub(crate) fn expect_child(
        &self,
        id: NodeId,
        index: usize,
        construct: &'static str,
    ) -> Result<NodeId, ConvertError> {
        self.tree.child(id, index).ok_or_else(|| {
            ConvertError::structure(
                construct,
                format!("missing child {index}"),
                self.tree.range(id),
            )
        })
    }

    pub(crate) fn structure_error(
        &self,
        id: NodeId,
        construct: &'static str,
        message: &str,
    ) -> ConvertError {
        ConvertError::structure(construct, message, self.tree.range(id))
    }

    /// Builds a fragment whose prefix is the one of `template`.
    pub(crate) fn fragment_like(
        &mut self,
        template: NodeId,
        value: impl Into<String>,
        outermost: Operator,
    ) -> NodeId {
        let prefix = self.tree.prefix(template).to_owned();
        let range = self.tree.range(template);
        self.tree.alloc_fragment(value, prefix, outermost, range)
    }

    /// Replaces `range` of the children of `id` with one fragment carrying
    /// the prefix of the first replaced child.
    pub(crate) fn replace_with_fragment(
        &mut self,
        id: NodeId,
        range: Range<usize>,
        value: impl Into<String>,
        outermost: Operator,
    ) -> NodeId {
        let children = &self.tree.children(id)[range.clone()];
        let prefix = children.first().map(|&first| self.tree.prefix(first).to_owned());
        let covered = children
            .iter()
            .map(|&child| self.tree.range(child))
            .reduce(|a, b| a.cover(b))
            .unwrap_or_else(|| self.tree.range(id));
        let fragment =
            self.tree.alloc_fragment(value, prefix.unwrap_or_default(), outermost, covered);
        self.tree.splice_children(id, range, [fragment]);
        fragment
    }

    /// Removes a child and hands its prefix to whatever follows it.
    pub(crate) fn remove_keeping_prefix(&mut self, id: NodeId, index: usize) {
        let removed = self.tree.remove_child(id, index);
        let prefix = self.tree.prefix(removed).to_owned();
        if let Some(next) = self.tree.child(id, index) {
            self.tree.set_prefix(next, prefix);
        }
    }

    /// Removes a `:` that ends a compound statement header.
    pub(crate) fn remove_colon(&mut self, id: NodeId, index: usize) {
        let colon = self.tree.remove_child(id, index);
        if !self.tree.prefix(colon).is_empty() {
            let range = self.tree.range(colon);
            self.warn("whitespace or comment before `:` is dropped", range);
        }
    }

    /// Renames the references to `from` under `root`. Attribute names and
    /// keyword argument names are skipped, shadowing is not tracked.
    pub(crate) fn rename_in(&mut self, root: NodeId, from: &str, to: &str) {
        let leaves = self.tree.leaves(root);
        let mut after_dot = false;
        for (index, &leaf) in leaves.iter().enumerate() {
            let attribute = after_dot;
            after_dot = self.is_op(leaf, ".");
            if attribute || self.tree.kind(leaf) != NAME || self.tree.value(leaf) != from {
                continue;
            }
            let keyword_arg = leaves.get(index + 1).is_some_and(|&next| self.is_op(next, "="))
                && self.tree.parent(leaf).is_some_and(|p| self.tree.kind(p) == ARGUMENT);
            if !keyword_arg {
                self.tree.set_value(leaf, to);
            }
        }
    }

    /// The class whose body directly contains the definition `id`.
    pub(crate) fn enclosing_class_body(&self, id: NodeId) -> Option<NodeId> {
        let mut container = id;
        while let Some(parent) = self.tree.parent(container) {
            if !DEFINITION_WRAPPERS.contains(self.tree.kind(parent)) {
                break;
            }
            container = parent;
        }
        let suite = self.tree.parent(container)?;
        let class = self.tree.parent(suite)?;
        (self.tree.kind(suite) == SUITE && self.tree.kind(class) == CLASSDEF).then_some(class)
    }

    pub(crate) fn in_class(&self, id: NodeId) -> bool {
        self.field_in_class
            || self.tree.search_ancestor(id, &SyntaxSet::new([CLASSDEF])).is_some()
    }

    /// Whether the simple statement holding `id` sits directly in a class
    /// body.
    pub(crate) fn is_class_level_stmt(&self, stmt: NodeId) -> bool {
        let Some(simple) = self.tree.parent(stmt) else { return false };
        self.tree.kind(simple) == SIMPLE_STMT && self.enclosing_class_body(simple).is_some()
    }

    /// Whether a statement body is a single statement on the header line.
    pub(crate) fn is_inline_body(&self, id: NodeId) -> bool {
        self.tree.kind(id) == SIMPLE_STMT
    }

    /// Indentation of the last line of `id`'s prefix.
    pub(crate) fn indentation(&self, id: NodeId) -> String {
        let prefix = self.tree.prefix(id);
        let line = prefix.rsplit('\n').next().unwrap_or(prefix);
        line.chars().take_while(|c| matches!(c, ' ' | '\t')).collect()
    }
}
