use pycoffee_syntax::NodeId;
use pycoffee_syntax::Operator;
use pycoffee_syntax::SyntaxKind::*;

use crate::converter::MethodKind;
use crate::{ConvertError, Converter};

const FUNCDEF_CONSTRUCT: &str = "function definition";
const LAMBDA_CONSTRUCT: &str = "lambda";

impl Converter {
    /// `def f(a, *b):` becomes `f = (a, ...b) ->`, and in a class body
    /// `def m(self, a):` becomes `m: (a) =>` with `self` read as `@`.
    pub(super) fn funcdef(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let def = self.expect_child(id, 0, FUNCDEF_CONSTRUCT)?;
        let name = self.expect_child(id, 1, FUNCDEF_CONSTRUCT)?;
        let params = self.expect_child(id, 2, FUNCDEF_CONSTRUCT)?;
        if !self.is_kw(def, "def")
            || self.tree.kind(name) != NAME
            || self.tree.kind(params) != PARAMETERS
        {
            return Err(self.structure_error(id, FUNCDEF_CONSTRUCT, "expected `def name(...)`"));
        }
        if self.is_op(self.expect_child(id, 3, FUNCDEF_CONSTRUCT)?, "->") {
            self.tree.splice_children(id, 3..5, []);
        }
        let colon = self.expect_child(id, 3, FUNCDEF_CONSTRUCT)?;
        let body = self.expect_child(id, 4, FUNCDEF_CONSTRUCT)?;
        if !self.is_op(colon, ":") || !matches!(self.tree.kind(body), SUITE | SIMPLE_STMT) {
            return Err(self.structure_error(id, FUNCDEF_CONSTRUCT, "expected `:` and a body"));
        }

        for param in self.tree.children(params).to_vec() {
            if self.tree.kind(param) == PARAM {
                self.strip_annotation(param);
            }
        }
        self.fix_parameters(params);
        self.remove_keeping_prefix(id, 0);

        let class = self.enclosing_class_body(id);
        let method_kind = self.method_kinds.get(&id).copied();
        let mut receiver = false;
        if class.is_some() {
            let renamed = match (method_kind, self.tree.value(name)) {
                (None, "__init__") => Some("constructor".to_owned()),
                (None, "__str__") => Some("toString".to_owned()),
                (Some(_), method) => Some(format!("@{method}")),
                (None, _) => None,
            };
            if let Some(renamed) = renamed {
                self.tree.set_value(name, renamed);
            }
            if method_kind != Some(MethodKind::Static) {
                receiver = self.strip_receiver(params, body);
                if !receiver {
                    let range = self.tree.range(name);
                    let method = self.tree.value(name).to_owned();
                    self.warn(format!("method `{method}` has no receiver parameter"), range);
                }
            }
        }
        let separator = if class.is_some() { ": " } else { " = " };
        let range = self.tree.range(name);
        let separator = self.tree.alloc_fragment(separator, "", Operator::Atom, range);
        self.tree.insert_child(id, 1, separator);

        let mut space = " ";
        if self.tree.children(params).len() == 2 {
            let index = self.tree.index_in_parent(params).unwrap_or(2);
            self.tree.remove_child(id, index);
            space = "";
        }

        match self.final_returns(body) {
            Some(returns) => self.elide_returns(&returns),
            None => self.append_null(body),
        }

        let bound = match class {
            Some(_) => receiver && method_kind.is_none() && self.tree.value(name) != "constructor",
            None => self.in_class(id),
        };
        let arrow = if bound { "=>" } else { "->" };
        self.tree.set_value(colon, format!("{space}{arrow}"));
        Ok(())
    }

    /// `lambda a: e` becomes `(a) -> e`; in a class body assignment a
    /// leading receiver parameter is dropped and the arrow is bound.
    pub(super) fn lambdef(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, LAMBDA_CONSTRUCT)?;
        let Some(colon_index) = self.position(id, |child| self.is_op(child, ":")) else {
            return Err(self.structure_error(id, LAMBDA_CONSTRUCT, "expected `:`"));
        };
        let body = self.expect_child(id, colon_index + 1, LAMBDA_CONSTRUCT)?;

        let class_level = self
            .tree
            .parent(id)
            .is_some_and(|stmt| {
                self.tree.kind(stmt) == EXPR_STMT && self.is_class_level_stmt(stmt)
            });
        let receiver = class_level && self.strip_receiver(id, body);
        self.fix_parameters(id);

        let bound = if class_level { receiver } else { self.in_class(id) };
        let arrow = if bound { "=>" } else { "->" };

        let colon_index = self.position(id, |child| self.is_op(child, ":")).unwrap_or(colon_index);
        let colon = self.expect_child(id, colon_index, LAMBDA_CONSTRUCT)?;
        if colon_index > 1 {
            let opening = self.fragment_like(keyword, "(", Operator::Lambda);
            self.tree.replace_child(id, 0, opening);
            if let Some(first) = self.tree.child(id, 1) {
                let prefix = self.tree.prefix(first).trim_start().to_owned();
                self.tree.set_prefix(first, prefix);
            }
            self.tree.set_value(colon, format!(") {arrow}"));
        } else {
            let arrow = self.fragment_like(keyword, arrow, Operator::Lambda);
            self.tree.replace_child(id, 0, arrow);
            self.tree.remove_child(id, colon_index);
        }
        Ok(())
    }

    /// Folds `@staticmethod` and `@classmethod` into the method they
    /// decorate. Other decorators stay as written.
    pub(super) fn decorated(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let container = self.expect_child(id, 0, "decorated definition")?;
        let definition = self.expect_child(id, 1, "decorated definition")?;
        let function = match self.tree.kind(definition) {
            FUNCDEF => Some(definition),
            ASYNC_FUNCDEF => self.tree.child(definition, 1),
            _ => None,
        };
        let method = function.filter(|&function| self.enclosing_class_body(function).is_some());

        let decorators = match self.tree.kind(container) {
            DECORATORS => self.tree.children(container).to_vec(),
            _ => vec![container],
        };
        let mut kept = Vec::new();
        for decorator in decorators {
            let name = self.tree.child(decorator, 1).map(|name| self.tree.text(name));
            let name = name.as_deref().map_or("", str::trim);
            let called = self.tree.children(decorator).len() > 3;
            let kind = match name {
                "staticmethod" if !called => Some(MethodKind::Static),
                "classmethod" if !called => Some(MethodKind::Class),
                _ => None,
            };
            match (kind, method) {
                (Some(kind), Some(method)) => {
                    self.method_kinds.entry(method).or_insert(kind);
                }
                _ => {
                    let range = self.tree.range(decorator);
                    let message =
                        format!("decorator `@{name}` is not applied, CoffeeScript has no decorators");
                    self.warn(message, range);
                    kept.push(decorator);
                }
            }
        }

        let prefix = self.tree.prefix(container).to_owned();
        if kept.is_empty() {
            self.tree.remove_child(id, 0);
            self.tree.set_prefix(definition, prefix);
        } else if self.tree.kind(container) == DECORATORS {
            self.tree.set_children(container, kept);
            self.tree.set_prefix(container, prefix);
        }
        Ok(())
    }

    /// CoffeeScript infers `async` from `await` in the body.
    pub(super) fn async_stmt(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let keyword = self.expect_child(id, 0, "async statement")?;
        if !self.is_kw(keyword, "async") {
            return Ok(());
        }
        if self.tree.kind(id) == ASYNC_STMT {
            let range = self.tree.range(keyword);
            let message = "`async for` and `async with` are converted as their synchronous forms";
            self.warn(message, range);
        }
        self.remove_keeping_prefix(id, 0);
        Ok(())
    }

    /// Drops `: annotation` from a parameter.
    fn strip_annotation(&mut self, param: NodeId) {
        if let Some(colon) = self.position(param, |child| self.is_op(child, ":")) {
            let end = (colon + 2).min(self.tree.children(param).len());
            self.tree.splice_children(param, colon..end, []);
        }
    }

    /// Rewrites the `PARAM` children of `owner`: `*args` to `...args`,
    /// `**kwargs` is reported, the bare `*` and `/` markers are dropped.
    fn fix_parameters(&mut self, owner: NodeId) {
        let mut index = 0;
        while let Some(param) = self.tree.child(owner, index) {
            index += 1;
            if self.tree.kind(param) != PARAM {
                continue;
            }
            let Some(first) = self.tree.child(param, 0) else { continue };
            let named = self.child_is(param, 1, NAME);
            if self.is_op(first, "*") && named {
                self.tree.set_value(first, "...");
            } else if self.is_op(first, "**") {
                let range = self.tree.range(param);
                self.warn("no analog of `**kwargs` parameters in CoffeeScript", range);
            } else if self.is_op(first, "*") || self.is_op(first, "/") {
                if self.is_op(first, "*") {
                    let range = self.tree.range(param);
                    self.warn("keyword-only parameters become positional", range);
                }
                index -= 1;
                self.remove_keeping_prefix(owner, index);
            }
        }

        let last_param = self
            .tree
            .children(owner)
            .iter()
            .rev()
            .copied()
            .find(|&child| self.tree.kind(child) == PARAM);
        if let Some(param) = last_param
            && let Some(&comma) = self.tree.children(param).last()
            && self.is_op(comma, ",")
        {
            let index = self.tree.children(param).len() - 1;
            self.tree.remove_child(param, index);
        }
    }

    /// Removes a leading plain parameter of `owner` and makes `body` refer
    /// to it as `this`. Returns whether there was one.
    fn strip_receiver(&mut self, owner: NodeId, body: NodeId) -> bool {
        let Some(index) = self.position(owner, |child| self.tree.kind(child) == PARAM) else {
            return false;
        };
        let param = self.tree.children(owner)[index];
        let Some(name) = self.tree.child(param, 0).filter(|&name| self.tree.kind(name) == NAME)
        else {
            return false;
        };

        let receiver = self.tree.value(name).to_owned();
        self.tree.remove_child(owner, index);
        if let Some(next) = self.tree.child(owner, index)
            && self.tree.kind(next) == PARAM
        {
            let prefix = self.tree.prefix(next).trim_start().to_owned();
            self.tree.set_prefix(next, prefix);
        }
        self.rename_in(body, &receiver, "this");
        self.receivers.insert(body, receiver);
        true
    }

    /// The `return` statements that end every path through `block`, if
    /// the block cannot fall off its end.
    fn final_returns(&self, block: NodeId) -> Option<Vec<NodeId>> {
        match self.tree.kind(block) {
            SIMPLE_STMT => {
                let last = self.last_small_stmt(block)?;
                (self.tree.kind(last) == RETURN_STMT).then(|| vec![last])
            }
            SUITE => self.final_returns(*self.tree.children(block).last()?),
            IF_STMT => {
                let children = self.tree.children(block);
                if !children.iter().any(|&child| self.is_kw(child, "else")) {
                    return None;
                }
                let mut returns = Vec::new();
                for &child in children {
                    if matches!(self.tree.kind(child), SUITE | SIMPLE_STMT) {
                        returns.extend(self.final_returns(child)?);
                    }
                }
                Some(returns)
            }
            _ => None,
        }
    }

    /// The last statement of a `;` separated line.
    fn last_small_stmt(&self, stmt: NodeId) -> Option<NodeId> {
        if self.tree.kind(stmt) != SIMPLE_STMT {
            return None;
        }
        self.tree
            .children(stmt)
            .iter()
            .rev()
            .copied()
            .find(|&child| self.tree.kind(child) != NEWLINE && !self.is_op(child, ";"))
    }

    /// The last expression is the result of a CoffeeScript function.
    fn elide_returns(&mut self, returns: &[NodeId]) {
        for &stmt in returns {
            if let Some(keyword) = self.tree.child(stmt, 0) {
                self.tree.set_value(keyword, "");
            }
            if let Some(value) = self.tree.child(stmt, 1) {
                self.tree.set_prefix(value, "");
            }
        }
    }

    /// Makes a body without a final `return` evaluate to `null`. A final
    /// `pass` already does.
    fn append_null(&mut self, body: NodeId) {
        let last_stmt = match self.tree.kind(body) {
            SUITE => self.tree.children(body).last().copied(),
            _ => Some(body),
        };
        let pass = last_stmt
            .and_then(|stmt| self.last_small_stmt(stmt))
            .is_some_and(|last| self.is_kw(last, "pass"));
        if pass {
            return;
        }

        let range = self.tree.range(body);
        if self.tree.kind(body) == SIMPLE_STMT {
            let len = self.tree.children(body).len();
            let at = match self.tree.children(body).last() {
                Some(&newline) if self.tree.kind(newline) == NEWLINE => len - 1,
                _ => len,
            };
            let null = self.tree.alloc_fragment("; null", "", Operator::Atom, range);
            self.tree.insert_child(body, at, null);
            return;
        }

        let Some(&last) = self.tree.children(body).last() else { return };
        let indent = self.indentation(last);
        let terminated =
            self.tree.last_leaf(body).is_some_and(|leaf| self.tree.value(leaf).ends_with('\n'));
        let null = if terminated {
            self.tree.alloc_fragment("null\n", indent, Operator::Atom, range)
        } else {
            self.tree.alloc_fragment("null", format!("\n{indent}"), Operator::Atom, range)
        };
        self.tree.push_child(body, null);
    }
}
