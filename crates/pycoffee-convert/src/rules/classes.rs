use pycoffee_syntax::NodeId;
use pycoffee_syntax::Operator;
use pycoffee_syntax::SyntaxKind::*;

use crate::{ConvertError, Converter};

const CLASSDEF_CONSTRUCT: &str = "class definition";

impl Converter {
    /// `class C(Base):` becomes `class C extends Base`.
    pub(super) fn classdef(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let len = self.tree.children(id).len();
        let colon = match len.checked_sub(2).and_then(|index| self.tree.child(id, index)) {
            Some(colon) if self.is_op(colon, ":") => len - 2,
            _ => {
                let message = "expected `:` before the body";
                return Err(self.structure_error(id, CLASSDEF_CONSTRUCT, message));
            }
        };
        self.remove_colon(id, colon);

        let body = self.expect_child(id, colon, CLASSDEF_CONSTRUCT)?;
        if self.is_inline_body(body) {
            let range = self.tree.range(body);
            let then = self.tree.alloc_fragment(" then", "", Operator::Atom, range);
            self.tree.insert_child(id, colon, then);
        }

        let opening = self.expect_child(id, 2, CLASSDEF_CONSTRUCT)?;
        if !self.is_op(opening, "(") {
            return Ok(());
        }
        let Some(closing) = self.position(id, |child| self.is_op(child, ")")) else {
            let message = "expected `)` after the bases";
            return Err(self.structure_error(id, CLASSDEF_CONSTRUCT, message));
        };

        let mut bases = Vec::new();
        for argument in self.call_args_between(id, 2, closing) {
            if self.tree.kind(argument) != ARGUMENT {
                if !(self.tree.kind(argument) == NAME && self.tree.value(argument) == "object") {
                    bases.push(argument);
                }
                continue;
            }
            let range = self.tree.range(argument);
            let text = self.tree.text(argument);
            self.warn(format!("class argument `{}` is dropped", text.trim()), range);
        }

        let Some((&base, rest)) = bases.split_first() else {
            self.tree.splice_children(id, 2..closing + 1, []);
            return Ok(());
        };
        if !rest.is_empty() {
            let dropped: Vec<String> =
                rest.iter().map(|&base| format!("`{}`", self.tree.text(base).trim())).collect();
            let range = self.tree.range(id);
            self.warn(
                format!("CoffeeScript classes have a single base, {} dropped", dropped.join(", ")),
                range,
            );
        }

        let range = self.tree.range(opening);
        let extends = self.tree.alloc_fragment(" extends", "", Operator::Atom, range);
        self.tree.set_prefix(base, " ");
        self.tree.splice_children(id, 2..closing + 1, [extends, base]);
        Ok(())
    }
}
