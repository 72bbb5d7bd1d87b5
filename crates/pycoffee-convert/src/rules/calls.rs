//! Calls and attribute chains: builtins with a CoffeeScript spelling,
//! `str.format`, the `re` module and renamed string and list methods.

use pycoffee_syntax::NodeId;
use pycoffee_syntax::Operator;
use pycoffee_syntax::SyntaxKind::*;
use rustc_hash::FxHashMap;

use crate::strings::{
    FormatPiece, StringParts, format_pieces, prepare_string_for_interpolation, regexp_backrefs,
    string_to_regexp,
};
use crate::{ConvertError, Converter};

const METHOD_RENAMES: &[(&str, &str)] = &[
    ("append", "push"),
    ("startswith", "startsWith"),
    ("endswith", "endsWith"),
    ("find", "indexOf"),
    ("rfind", "lastIndexOf"),
    ("lower", "toLowerCase"),
    ("upper", "toUpperCase"),
    ("strip", "trim"),
    ("lstrip", "trimStart"),
    ("rstrip", "trimEnd"),
];

const BUILTINS: &[&str] =
    &["range", "str", "bin", "oct", "hex", "int", "float", "ord", "chr", "isinstance", "len"];

/// Flag names exported by the `re` module.
const RE_FLAGS: &[&str] = &[
    "A", "ASCII", "DEBUG", "I", "IGNORECASE", "L", "LOCALE", "M", "MULTILINE", "S", "DOTALL",
    "T", "TEMPLATE", "U", "UNICODE", "X", "VERBOSE",
];

impl Converter {
    /// Call, subscript and attribute suffixes.
    pub(super) fn trailer(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let opening = self.expect_child(id, 0, "trailer")?;
        if self.is_op(opening, "[") {
            if let Some(slice) = self.tree.child(id, 1)
                && self.is_op(slice, ":")
            {
                self.tree.set_value(slice, "..");
            }
            return Ok(());
        }
        if !self.is_op(opening, "(") {
            return Ok(());
        }
        if !self.is_call_trailer(id) {
            return Err(self.structure_error(id, "call", "expected `)` closing the arguments"));
        }
        let prefix = self.tree.prefix(opening).trim_start().to_owned();
        self.tree.set_prefix(opening, prefix);

        let args = self.call_args(id);
        let mut keywords = Vec::new();
        for &arg in &args {
            if let Some(name) = self.keyword_name(arg) {
                keywords.push(format!("`{name}`"));
                continue;
            }
            let Some(first) = self.tree.child(arg, 0).filter(|_| self.tree.kind(arg) == ARGUMENT)
            else {
                continue;
            };
            if self.is_op(first, "*") {
                self.tree.set_value(first, "...");
            } else if self.is_op(first, "**") {
                let range = self.tree.range(arg);
                self.warn("no analog of `**kwargs` in calls", range);
            }
        }
        if !keywords.is_empty() {
            let keywords = keywords.join(", ");
            let message = match self.callee_name(id) {
                Some(callee) => {
                    format!("unsupported keyword argument(s) {keywords} in call to `{callee}`")
                }
                None => format!("unsupported keyword argument(s) {keywords}"),
            };
            let range = self.tree.range(id);
            self.warn(message, range);
        }

        // A function literal swallows the arguments that follow it.
        if let Some((_, leading)) = args.split_last() {
            for &arg in leading {
                if self.tree.kind(arg) == LAMBDEF {
                    self.parenthesize(arg);
                }
            }
        }
        Ok(())
    }

    pub(super) fn atom_expr(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let handled = self.string_format(id)? || self.builtin_call(id)? || self.this_attribute(id);
        if !handled {
            self.module_call(id)?;
        }
        self.string_join(id)?;
        self.rename_methods(id);
        self.extend_to_push(id);
        Ok(())
    }

    /// Arguments between the children `open` and `close` of `id`, with
    /// an argument list flattened and commas skipped.
    pub(crate) fn call_args_between(&self, id: NodeId, open: usize, close: usize) -> Vec<NodeId> {
        let inner = self.tree.children(id).get(open + 1..close).unwrap_or_default();
        let mut args = Vec::new();
        for &child in inner {
            if self.tree.kind(child) == ARGLIST {
                args.extend(
                    self.tree.children(child).iter().copied().filter(|&arg| !self.is_op(arg, ",")),
                );
            } else if !self.is_op(child, ",") {
                args.push(child);
            }
        }
        args
    }

    fn call_args(&self, trailer: NodeId) -> Vec<NodeId> {
        let close = self.tree.children(trailer).len().saturating_sub(1);
        self.call_args_between(trailer, 0, close)
    }

    fn is_call_trailer(&self, id: NodeId) -> bool {
        self.tree.kind(id) == TRAILER
            && self.tree.children(id).len() >= 2
            && self.tree.child(id, 0).is_some_and(|open| self.is_op(open, "("))
            && self.tree.children(id).last().is_some_and(|&close| self.is_op(close, ")"))
    }

    /// The attribute of a `.name` trailer.
    fn method_name(&self, id: NodeId) -> Option<&str> {
        let &[dot, name] = self.tree.children(id) else { return None };
        let attribute = self.tree.kind(id) == TRAILER
            && self.is_op(dot, ".")
            && self.tree.kind(name) == NAME;
        attribute.then(|| self.tree.value(name))
    }

    fn keyword_name(&self, arg: NodeId) -> Option<&str> {
        if self.tree.kind(arg) != ARGUMENT {
            return None;
        }
        let assign = self.tree.child(arg, 1)?;
        if !self.is_op(assign, "=") {
            return None;
        }
        Some(self.tree.value(self.tree.child(arg, 0)?))
    }

    fn is_splat(&self, arg: NodeId) -> bool {
        self.tree.kind(arg) == ARGUMENT
            && self
                .tree
                .child(arg, 0)
                .is_some_and(|star| self.is_op(star, "*") || self.is_op(star, "**"))
    }

    fn callee_name(&self, trailer: NodeId) -> Option<String> {
        let index = self.tree.index_in_parent(trailer)?;
        let parent = self.tree.parent(trailer)?;
        let callee = self.tree.child(parent, index.checked_sub(1)?)?;
        match self.tree.kind(callee) {
            NAME => Some(self.tree.value(callee).to_owned()),
            _ => self.method_name(callee).map(str::to_owned),
        }
    }

    fn parenthesize(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.tree.parent(id), self.tree.index_in_parent(id))
        else {
            return;
        };
        let open = self.fragment_like(id, "(", Operator::Atom);
        self.tree.set_prefix(id, "");
        let range = self.tree.range(id);
        let close = self.tree.alloc_fragment(")", "", Operator::Atom, range);
        self.tree.splice_children(parent, index..index + 1, [open, id, close]);
    }

    /// `"{} and {}".format(a, b)` becomes `"#{a} and #{b}"`.
    fn string_format(&mut self, id: NodeId) -> Result<bool, ConvertError> {
        let &[literal, method, call, ..] = self.tree.children(id) else { return Ok(false) };
        if self.tree.kind(literal) != STRING
            || self.method_name(method) != Some("format")
            || !self.is_call_trailer(call)
        {
            return Ok(false);
        }

        let args = self.call_args(call);
        if args.iter().any(|&arg| self.keyword_name(arg).is_some()) {
            return Ok(false);
        }
        let range = self.tree.range(id);
        if args.iter().any(|&arg| self.is_splat(arg)) {
            self.warn("`*args` passed to `.format` is not converted", range);
            return Ok(false);
        }
        let source = self.tree.value(literal).to_owned();
        let parts = StringParts::split(&source);
        if parts.is_raw() || parts.is_formatted() {
            self.warn("`.format` on a raw string or f-string is not converted", range);
            return Ok(false);
        }

        let prepared = prepare_string_for_interpolation(&source);
        let parts = StringParts::split(&prepared);
        let pieces = match format_pieces(parts.body) {
            Ok(pieces) => pieces,
            Err(field) => {
                self.warn(format!("unsupported placeholder `{field}` in `.format` string"), range);
                return Ok(false);
            }
        };
        let needed = pieces
            .iter()
            .filter_map(|piece| match piece {
                FormatPiece::Field(index) => Some(index + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        if needed > args.len() {
            let given = args.len();
            self.warn(format!("`.format` needs {needed} argument(s), {given} given"), range);
            return Ok(false);
        }

        let mut values = Vec::with_capacity(args.len());
        for &arg in &args {
            values.push(self.recurse(arg)?.trim().to_owned());
        }
        let mut text = String::from(parts.quote);
        for piece in pieces {
            match piece {
                FormatPiece::Text(body) => text.push_str(body),
                FormatPiece::Brace(brace) => text.push(brace),
                FormatPiece::Field(index) => {
                    text.push_str("#{");
                    text.push_str(&values[index]);
                    text.push('}');
                }
            }
        }
        text.push_str(parts.quote);
        self.replace_with_fragment(id, 0..3, text, Operator::Atom);
        Ok(true)
    }

    /// Builtins with a direct CoffeeScript spelling.
    fn builtin_call(&mut self, id: NodeId) -> Result<bool, ConvertError> {
        let &[function, call, ..] = self.tree.children(id) else { return Ok(false) };
        if self.tree.kind(function) != NAME || !self.is_call_trailer(call) {
            return Ok(false);
        }
        let name = self.tree.value(function).to_owned();
        // Spelled `console.log` when the name is serialized, after the
        // call trailer has named it in its warnings.
        if name == "print" {
            return Ok(true);
        }
        if !BUILTINS.contains(&name.as_str()) {
            return Ok(false);
        }

        let args = self.call_args(call);
        if args.iter().any(|&arg| self.keyword_name(arg).is_some()) {
            return Ok(false);
        }
        let range = self.tree.range(id);
        if args.iter().any(|&arg| self.is_splat(arg)) {
            self.warn(format!("`*args` passed to `{name}` is not converted"), range);
            return Ok(false);
        }

        let loop_iterable = self
            .tree
            .parent(id)
            .is_some_and(|parent| matches!(self.tree.kind(parent), FOR_STMT | COMP_FOR));
        let (text, outermost) = match (name.as_str(), args.as_slice()) {
            ("int" | "float", _) => {
                let parse = if name == "int" { "parseInt" } else { "parseFloat" };
                self.tree.set_value(function, parse);
                return Ok(true);
            }
            ("range", &[stop]) => (format!("[0...{}]", self.operand(stop)?), Operator::Atom),
            ("range", &[start, stop]) => {
                let start = self.operand(start)?;
                (format!("[{start}...{}]", self.operand(stop)?), Operator::Atom)
            }
            ("range", &[start, stop, step]) => {
                let (start, stop, step) =
                    (self.operand(start)?, self.operand(stop)?, self.operand(step)?);
                let text = if loop_iterable {
                    format!("[{start}...{stop}] by {step}")
                } else {
                    format!("(_i for _i in [{start}...{stop}] by {step})")
                };
                (text, Operator::Atom)
            }
            ("str", &[]) => ("''".to_owned(), Operator::Atom),
            ("str" | "bin" | "oct" | "hex", &[value]) => {
                let base = match name.as_str() {
                    "bin" => "2",
                    "oct" => "8",
                    "hex" => "16",
                    _ => "",
                };
                let value = self.maybe_paren(value, Operator::Access)?;
                (format!("{value}.toString({base})"), Operator::Access)
            }
            ("ord", &[value]) => {
                let value = self.maybe_paren(value, Operator::Access)?;
                (format!("{value}.charCodeAt()"), Operator::Access)
            }
            ("chr", &[code]) => {
                (format!("String.fromCharCode({})", self.operand(code)?), Operator::Access)
            }
            ("isinstance", &[value, class]) => {
                if self.is_tuple(class) {
                    self.warn("`isinstance` with a tuple of types is not converted", range);
                    return Ok(false);
                }
                let value = self.maybe_paren(value, Operator::Comparison)?;
                let class = self.maybe_paren(class, Operator::Comparison)?;
                (format!("{value} instanceof {class}"), Operator::Comparison)
            }
            ("len", &[value]) => {
                let value = self.maybe_paren(value, Operator::Access)?;
                (format!("{value}.length"), Operator::Access)
            }
            _ => {
                let count = args.len();
                self.warn(format!("`{name}` with {count} argument(s) is not converted"), range);
                return Ok(false);
            }
        };
        self.replace_with_fragment(id, 0..2, text, outermost);
        Ok(true)
    }

    fn operand(&mut self, id: NodeId) -> Result<String, ConvertError> {
        Ok(self.recurse(id)?.trim().to_owned())
    }

    fn is_tuple(&self, id: NodeId) -> bool {
        self.tree.kind(id) == ATOM
            && self.tree.child(id, 0).is_some_and(|open| self.is_op(open, "("))
            && self.tree.child(id, 1).is_some_and(|inner| {
                self.tree.kind(inner) == TESTLIST_COMP
                    && self.position(inner, |child| self.is_op(child, ",")).is_some()
            })
    }

    /// `this.x` inside a class is `@x`.
    fn this_attribute(&mut self, id: NodeId) -> bool {
        let &[receiver, attribute, ..] = self.tree.children(id) else { return false };
        let this = self.tree.kind(receiver) == NAME && self.tree.value(receiver) == "this";
        if !this || self.method_name(attribute).is_none() || !self.in_class(id) {
            return false;
        }
        self.tree.set_value(receiver, "@");
        self.tree.remove_child(attribute, 0);
        true
    }

    fn module_call(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let &[module, method, call, ..] = self.tree.children(id) else { return Ok(()) };
        if self.tree.kind(module) != NAME
            || self.tree.value(module) != "re"
            || !self.is_call_trailer(call)
        {
            return Ok(());
        }
        match self.method_name(method) {
            Some("sub") => self.regexp_sub(id, call),
            Some("compile") => self.regexp_compile(id, call),
            _ => Ok(()),
        }
    }

    /// `re.sub(p, r, s)` becomes `s.replace(/p/g, r)`.
    fn regexp_sub(&mut self, id: NodeId, call: NodeId) -> Result<(), ConvertError> {
        let range = self.tree.range(id);
        let Some((positional, mut keywords)) = self.split_keywords(call, &["count", "flags"]) else {
            return Ok(());
        };
        let &[pattern, replacement, subject, ref extra @ ..] = positional.as_slice() else {
            let count = positional.len();
            self.warn(format!("`re.sub` with {count} argument(s) is not converted"), range);
            return Ok(());
        };
        if extra.len() > 2 {
            let count = positional.len();
            self.warn(format!("`re.sub` with {count} argument(s) is not converted"), range);
            return Ok(());
        }
        let count = keywords.remove("count").or_else(|| extra.first().copied());
        let flags = keywords.remove("flags").or_else(|| extra.get(1).copied());

        if self.tree.kind(pattern) != STRING {
            self.warn("`re.sub` pattern is not a string literal, not converted", range);
            return Ok(());
        }
        let Some(flags) = self.flags_of(flags) else { return Ok(()) };
        let global = match count {
            None => true,
            Some(count) if self.tree.kind(count) == NUMBER && self.tree.value(count) == "1" => false,
            Some(count) if self.tree.kind(count) == NUMBER && self.tree.value(count) == "0" => true,
            Some(count) => {
                let text = self.tree.text(count);
                let message = format!("`re.sub` count `{}` is not supported", text.trim());
                self.warn(message, range);
                true
            }
        };

        let mut regexp = self.regexp_literal(pattern, &flags);
        if global {
            regexp.push('g');
        }
        if self.tree.kind(replacement) == STRING {
            let backrefs = regexp_backrefs(self.tree.value(replacement));
            self.tree.set_value(replacement, backrefs);
        }
        let subject = self.maybe_paren(subject, Operator::Access)?;
        let replacement = self.operand(replacement)?;
        let text = format!("{subject}.replace({regexp}, {replacement})");
        self.replace_with_fragment(id, 0..3, text, Operator::Access);
        Ok(())
    }

    /// `re.compile(p)` becomes the literal `/p/`.
    fn regexp_compile(&mut self, id: NodeId, call: NodeId) -> Result<(), ConvertError> {
        let range = self.tree.range(id);
        let Some((positional, mut keywords)) = self.split_keywords(call, &["flags"]) else {
            return Ok(());
        };
        let (pattern, flags) = match positional.as_slice() {
            &[pattern] => (pattern, keywords.remove("flags")),
            &[pattern, flags] => (pattern, Some(flags)),
            _ => {
                let count = positional.len();
                self.warn(format!("`re.compile` with {count} argument(s) is not converted"), range);
                return Ok(());
            }
        };
        if self.tree.kind(pattern) != STRING {
            self.warn("`re.compile` pattern is not a string literal, not converted", range);
            return Ok(());
        }
        let Some(flags) = self.flags_of(flags) else { return Ok(()) };
        let regexp = self.regexp_literal(pattern, &flags);
        self.replace_with_fragment(id, 0..3, regexp, Operator::Atom);
        Ok(())
    }

    /// Positional arguments and the values of the `allowed` keywords.
    /// `None` if the call has other keywords or splats; those are
    /// reported by the call trailer itself.
    fn split_keywords(
        &self,
        call: NodeId,
        allowed: &[&'static str],
    ) -> Option<(Vec<NodeId>, FxHashMap<&'static str, NodeId>)> {
        let mut positional = Vec::new();
        let mut keywords = FxHashMap::default();
        for arg in self.call_args(call) {
            if self.is_splat(arg) {
                return None;
            }
            match self.keyword_name(arg) {
                Some(name) => {
                    let keyword = allowed.iter().find(|&&keyword| keyword == name)?;
                    keywords.insert(*keyword, self.tree.child(arg, 2)?);
                }
                None => positional.push(arg),
            }
        }
        Some((positional, keywords))
    }

    /// Flag names from `re.I`, `I` or `re.I | re.M`, or `None` after
    /// reporting an expression that is none of these.
    fn flags_of(&mut self, flags: Option<NodeId>) -> Option<Vec<String>> {
        let Some(flags) = flags else { return Some(Vec::new()) };
        let names = self.flag_names(flags);
        if names.is_none() {
            let range = self.tree.range(flags);
            let text = self.tree.text(flags);
            self.warn(format!("unrecognized `re` flags `{}`, not converted", text.trim()), range);
        }
        names
    }

    fn flag_names(&self, id: NodeId) -> Option<Vec<String>> {
        match self.tree.kind(id) {
            NAME => {
                let name = self.tree.value(id);
                RE_FLAGS.contains(&name).then(|| vec![name.to_owned()])
            }
            ATOM_EXPR => {
                let &[module, attribute] = self.tree.children(id) else { return None };
                if self.tree.kind(module) != NAME || self.tree.value(module) != "re" {
                    return None;
                }
                let name = self.method_name(attribute)?;
                RE_FLAGS.contains(&name).then(|| vec![name.to_owned()])
            }
            EXPR => {
                let mut names = Vec::new();
                for &child in self.tree.children(id) {
                    if !self.is_op(child, "|") {
                        names.extend(self.flag_names(child)?);
                    }
                }
                Some(names)
            }
            _ => None,
        }
    }

    fn regexp_literal(&mut self, pattern: NodeId, flags: &[String]) -> String {
        let flags: Vec<&str> = flags.iter().map(String::as_str).collect();
        let regexp = string_to_regexp(self.tree.value(pattern), &flags);
        let range = self.tree.range(pattern);
        for flag in regexp.unsupported {
            self.warn(format!("regex flag `{flag}` has no JavaScript analog"), range);
        }
        regexp.text
    }

    /// `", ".join(items)` becomes `items.join(", ")`.
    fn string_join(&mut self, id: NodeId) -> Result<(), ConvertError> {
        let &[separator, method, call, ..] = self.tree.children(id) else { return Ok(()) };
        let literal = self.tree.kind(separator) == STRING
            || (self.tree.kind(separator) == ATOM
                && self.tree.children(separator).iter().all(|&s| self.tree.kind(s) == STRING));
        if !literal || self.method_name(method) != Some("join") || !self.is_call_trailer(call) {
            return Ok(());
        }
        let &[items] = self.call_args(call).as_slice() else { return Ok(()) };
        if self.tree.kind(items) == ARGUMENT {
            return Ok(());
        }

        let separator_text = self.operand(separator)?;
        let items = self.maybe_paren(items, Operator::Access)?;
        let text = format!("{items}.join({separator_text})");
        self.replace_with_fragment(id, 0..3, text, Operator::Access);
        Ok(())
    }

    fn rename_methods(&mut self, id: NodeId) {
        for trailer in self.tree.children(id).to_vec() {
            let Some(method) = self.method_name(trailer) else { continue };
            if let Some(&(_, renamed)) = METHOD_RENAMES.iter().find(|(from, _)| *from == method)
                && let Some(name) = self.tree.child(trailer, 1)
            {
                self.tree.set_value(name, renamed);
            }
        }
    }

    /// `.extend(xs)` becomes `.push(xs...)`, and `.extend([a, b])`
    /// becomes `.push(a, b)`.
    fn extend_to_push(&mut self, id: NodeId) {
        let mut index = 0;
        while let (Some(method), Some(call)) =
            (self.tree.child(id, index), self.tree.child(id, index + 1))
        {
            index += 1;
            if self.method_name(method) != Some("extend") || !self.is_call_trailer(call) {
                continue;
            }
            let args = self.call_args(call);
            let &[arg] = args.as_slice() else {
                let (range, count) = (self.tree.range(call), args.len());
                self.warn(format!("`.extend` with {count} argument(s) is not converted"), range);
                continue;
            };
            if self.tree.kind(arg) == ARGUMENT {
                let range = self.tree.range(call);
                self.warn("`.extend` with a keyword or splat argument is not converted", range);
                continue;
            }

            if let Some(name) = self.tree.child(method, 1) {
                self.tree.set_value(name, "push");
            }
            self.spread_into(call, arg);
        }
    }

    fn spread_into(&mut self, call: NodeId, arg: NodeId) {
        let Some(index) = self.tree.index_in_parent(arg) else { return };
        let list = self.tree.kind(arg) == ATOM
            && self.tree.child(arg, 0).is_some_and(|open| self.is_op(open, "["));
        let elements = match self.tree.children(arg) {
            [_, _] if list => Some(Vec::new()),
            &[_, inner, _] if list && self.tree.kind(inner) != TESTLIST_COMP => Some(vec![inner]),
            &[_, inner, _] if list && !self.is_comprehension(inner) => {
                Some(self.tree.children(inner).to_vec())
            }
            _ => None,
        };

        match elements {
            Some(mut elements) => {
                if elements.last().is_some_and(|&comma| self.is_op(comma, ",")) {
                    elements.pop();
                }
                if let Some(&first) = elements.first() {
                    let prefix = self.tree.prefix(arg).to_owned();
                    self.tree.set_prefix(first, prefix);
                }
                self.tree.splice_children(call, index..index + 1, elements);
            }
            None => {
                let splat = self.fragment_like(arg, "...", Operator::Atom);
                self.tree.set_prefix(arg, "");
                self.tree.remove_child(call, index);
                let argument = self.tree.alloc_node(ARGUMENT, vec![splat, arg]);
                self.tree.insert_child(call, index, argument);
            }
        }
    }
}
