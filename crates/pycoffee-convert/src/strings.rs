//! Rewriting of Python string literals into CoffeeScript strings and
//! regular expressions.
//!
//! Every function here takes the literal as written in the source, quotes
//! and prefix letters included.

use std::fmt::Write as _;

/// A string literal split into its prefix letters, quote and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StringParts<'a> {
    pub(crate) prefix: &'a str,
    pub(crate) quote: &'a str,
    pub(crate) body: &'a str,
}

impl<'a> StringParts<'a> {
    pub(crate) fn split(literal: &'a str) -> Self {
        let start = literal.find(['\'', '"']).unwrap_or(literal.len());
        let (prefix, rest) = literal.split_at(start);
        let quote = match rest.get(..3) {
            Some(triple @ ("'''" | "\"\"\"")) => triple,
            _ => rest.get(..1).unwrap_or_default(),
        };
        let body = rest
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .unwrap_or_else(|| rest.get(quote.len()..).unwrap_or_default());
        Self { prefix, quote, body }
    }

    pub(crate) fn is_raw(&self) -> bool {
        self.prefix.contains(['r', 'R'])
    }

    pub(crate) fn is_formatted(&self) -> bool {
        self.prefix.contains(['f', 'F'])
    }

    fn is_single_quoted(&self) -> bool {
        self.quote.starts_with('\'')
    }

    /// Double quoted counterpart of the quote.
    fn double_quote(&self) -> &'static str {
        if self.quote.len() == 3 { "\"\"\"" } else { "\"" }
    }
}

/// Escapes `#` so that CoffeeScript cannot read `#{` as an interpolation.
///
/// Single quoted strings do not interpolate and are returned unchanged.
/// A `#` already preceded by an odd run of backslashes is left alone.
pub fn avoid_string_for_interpolation(literal: &str) -> String {
    if StringParts::split(literal).is_single_quoted() {
        return literal.to_owned();
    }
    escape_unescaped(literal, '#')
}

/// Requotes a literal with double quotes so that interpolations can be
/// spliced into it, then escapes its `#` characters.
pub fn prepare_string_for_interpolation(literal: &str) -> String {
    let parts = StringParts::split(literal);
    if !parts.is_single_quoted() {
        return avoid_string_for_interpolation(literal);
    }

    let body = if parts.quote.len() == 3 {
        parts.body.replace("\"\"\"", "\\\"\"\"")
    } else {
        escape_unescaped(parts.body, '"')
    };
    let quote = parts.double_quote();
    avoid_string_for_interpolation(&format!("{}{quote}{body}{quote}", parts.prefix))
}

/// Converts the back-references of a `re.sub` replacement literal to the
/// `$N` syntax of `String.prototype.replace`.
///
/// `\0` and `\g<0>` become `$&`, `\g<name>` becomes `$<name>`, and literal
/// dollar signs are doubled. In non-raw literals the backslash itself has
/// to be escaped, so only `\\N` counts as a back-reference there.
pub fn regexp_backrefs(literal: &str) -> String {
    let raw = StringParts::split(literal).is_raw();
    let mut out = String::with_capacity(literal.len());
    let mut rest = literal;

    while let Some(c) = rest.chars().next() {
        match c {
            '$' => {
                out.push_str("$$");
                rest = &rest[1..];
            }
            '\\' => {
                let escaped = &rest[1..];
                let reference = if raw { Some(escaped) } else { escaped.strip_prefix('\\') };
                if let Some((backref, len)) = reference.and_then(parse_backref) {
                    out.push_str(&backref);
                    rest = &escaped[escaped.len() - reference.map_or(0, str::len) + len..];
                    continue;
                }
                let len = 1 + escaped.chars().next().map_or(0, char::len_utf8);
                out.push_str(&rest[..len]);
                rest = &rest[len..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// Reads `N` or `g<ref>` at the start of `text`, returning the `$` form and
/// the number of bytes consumed.
fn parse_backref(text: &str) -> Option<(String, usize)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let group = &text[..digits];
        return Some((dollar_group(group), digits));
    }

    let name = text.strip_prefix("g<")?;
    let end = name.find('>')?;
    let name = &name[..end];
    if name.is_empty() {
        return None;
    }
    let backref = if name.bytes().all(|b| b.is_ascii_digit()) {
        dollar_group(name)
    } else {
        format!("$<{name}>")
    };
    Some((backref, end + 3))
}

fn dollar_group(group: &str) -> String {
    if group.bytes().all(|b| b == b'0') { "$&".to_owned() } else { format!("${group}") }
}

/// A converted regular expression literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regexp {
    pub text: String,
    /// Flag names that have no CoffeeScript counterpart.
    pub unsupported: Vec<String>,
}

/// Builds a regex literal from a pattern literal and the names of the `re`
/// flags applied to it.
///
/// `VERBOSE` switches to the `///` heregex delimiter, whose whitespace and
/// comment rules match Python's verbose mode.
pub fn string_to_regexp(literal: &str, flags: &[&str]) -> Regexp {
    let parts = StringParts::split(literal);

    let mut suffix = String::new();
    let mut verbose = false;
    let mut unsupported = Vec::new();
    for &flag in flags {
        let letter = match flag {
            "I" | "IGNORECASE" => 'i',
            "M" | "MULTILINE" => 'm',
            "S" | "DOTALL" => 's',
            "X" | "VERBOSE" => {
                verbose = true;
                continue;
            }
            _ => {
                unsupported.push(flag.to_owned());
                continue;
            }
        };
        if !suffix.contains(letter) {
            suffix.push(letter);
        }
    }

    let mut body =
        if parts.is_raw() { parts.body.to_owned() } else { parts.body.replace("\\\\", "\\") };
    body = body.replace("(?P<", "(?<");
    body = named_group_references(&body);
    if !verbose {
        body = escape_unescaped(&body, '/').replace('\n', "\\n");
    }
    if body.is_empty() {
        body.push_str("(?:)");
    }

    let delimiter = if verbose { "///" } else { "/" };
    Regexp { text: format!("{delimiter}{body}{delimiter}{suffix}"), unsupported }
}

/// `(?P=name)` to `\k<name>`.
fn named_group_references(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("(?P=") {
        let Some(end) = rest[start..].find(')') else { break };
        out.push_str(&rest[..start]);
        _ = write!(out, "\\k<{}>", &rest[start + 4..start + end]);
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    out
}

/// A string leaf rewritten for CoffeeScript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertedString {
    pub(crate) text: String,
    pub(crate) warnings: Vec<String>,
}

/// Drops `u` and `b` prefixes, re-escapes raw strings and turns f-strings
/// into interpolated strings, passing each replacement field expression
/// through `field`.
pub(crate) fn convert_string(
    literal: &str,
    field: impl FnMut(&str) -> String,
) -> ConvertedString {
    let parts = StringParts::split(literal);
    let body = if parts.is_raw() { unraw(parts.body, parts.quote) } else { parts.body.to_owned() };

    if parts.is_formatted() {
        return interpolate(&body, &parts, field);
    }
    let text = avoid_string_for_interpolation(&format!("{}{body}{}", parts.quote, parts.quote));
    ConvertedString { text, warnings: Vec::new() }
}

/// Spells out the backslashes of a raw string body.
fn unraw(body: &str, quote: &str) -> String {
    let quote_char = quote.chars().next();
    let mut out = String::with_capacity(body.len() + 4);
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push_str("\\\\");
        if let Some(&next) = chars.peek()
            && Some(next) == quote_char
        {
            out.push('\\');
            out.push(next);
            chars.next();
        }
    }
    out
}

/// f-string body to a CoffeeScript interpolated string.
fn interpolate(
    body: &str,
    parts: &StringParts<'_>,
    mut field_expr: impl FnMut(&str) -> String,
) -> ConvertedString {
    let mut text = String::from(parts.double_quote());
    let mut warnings = Vec::new();
    let mut rest = body;
    let mut backslashes = 0usize;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("{{") || rest.starts_with("}}") {
            text.push(c);
            rest = &rest[2..];
            backslashes = 0;
            continue;
        }
        if c == '{' {
            let Some(end) = replacement_field_end(rest) else {
                warnings.push("unbalanced `{` in f-string".to_owned());
                text.push_str(&escape_unescaped(rest, '#'));
                break;
            };
            let field = &rest[1..end];
            let (expr, dropped) = split_field(field);
            if let Some(dropped) = dropped {
                warnings.push(format!("`{dropped}` in f-string field `{{{field}}}` is dropped"));
            }
            _ = write!(text, "#{{{}}}", field_expr(expr.trim()));
            rest = &rest[end + 1..];
            backslashes = 0;
            continue;
        }

        let even = backslashes % 2 == 0;
        if even && (c == '#' || (c == '"' && parts.is_single_quoted())) {
            text.push('\\');
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        text.push(c);
        rest = &rest[c.len_utf8()..];
    }

    text.push_str(parts.double_quote());
    ConvertedString { text, warnings }
}

/// Index of the `}` closing the replacement field opened at the start of
/// `text`.
fn replacement_field_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (index, c) in text.char_indices() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' | '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a replacement field into its expression and the conversion or
/// format spec that CoffeeScript cannot express.
fn split_field(field: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    let bytes = field.as_bytes();
    for (index, &b) in bytes.iter().enumerate() {
        match b {
            b'[' | b'(' | b'{' => depth += 1,
            b']' | b')' | b'}' => depth = depth.saturating_sub(1),
            b'!' if depth == 0 && bytes.get(index + 1) != Some(&b'=') => {
                return (&field[..index], Some(&field[index..]));
            }
            b':' if depth == 0 => return (&field[..index], Some(&field[index..])),
            b'=' if depth == 0
                && index + 1 == bytes.len()
                && !matches!(bytes.get(index.wrapping_sub(1)), Some(b'=' | b'!' | b'<' | b'>')) =>
            {
                return (&field[..index], Some("="));
            }
            _ => {}
        }
    }
    (field, None)
}

/// One piece of a `str.format` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FormatPiece<'a> {
    Text(&'a str),
    Brace(char),
    Field(usize),
}

/// Parses the `{}`, `{N}`, `{{` and `}}` placeholders of a format template.
///
/// Any other replacement field is returned as the error.
pub(crate) fn format_pieces(body: &str) -> Result<Vec<FormatPiece<'_>>, String> {
    let mut pieces = Vec::new();
    let mut next_auto = 0;
    let mut numbering: Option<bool> = None;
    let mut rest = body;

    while !rest.is_empty() {
        let Some(at) = rest.find(['{', '}']) else {
            pieces.push(FormatPiece::Text(rest));
            break;
        };
        if at > 0 {
            pieces.push(FormatPiece::Text(&rest[..at]));
            rest = &rest[at..];
        }

        if rest.starts_with("{{") || rest.starts_with("}}") {
            pieces.push(FormatPiece::Brace(rest.as_bytes()[0] as char));
            rest = &rest[2..];
            continue;
        }
        if rest.starts_with('}') {
            return Err("}".to_owned());
        }

        let Some(end) = rest.find('}') else { return Err(rest.to_owned()) };
        let field = &rest[1..end];
        let automatic = field.is_empty();
        if *numbering.get_or_insert(automatic) != automatic {
            return Err(rest[..=end].to_owned());
        }
        let index = if automatic {
            next_auto += 1;
            next_auto - 1
        } else {
            field.parse().map_err(|_| rest[..=end].to_owned())?
        };
        pieces.push(FormatPiece::Field(index));
        rest = &rest[end + 1..];
    }
    Ok(pieces)
}

/// Backslash-escapes every `target` not already escaped.
fn escape_unescaped(text: &str, target: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut backslashes = 0usize;
    for c in text.chars() {
        if c == target && backslashes % 2 == 0 {
            out.push('\\');
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        out.push(c);
    }
    out
}
