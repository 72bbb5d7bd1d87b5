mod cursor;
mod dialect;

use std::collections::VecDeque;

use cursor::{Cursor, EOF_CHAR};
pub use dialect::{Dialect, ParseDialectError};
pub use pycoffee_syntax::SyntaxKind;
use pycoffee_syntax::SyntaxKind::*;
use text_size::{TextRange, TextSize};

/// A token and the trivia in front of it.
///
/// Whitespace, comments, line continuations and blank lines are not tokens:
/// they form the `prefix` of the next token. A comment closing a code line
/// belongs to the `NEWLINE` that ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub prefix: TextRange,
    pub range: TextRange,
}

impl Token {
    fn layout(kind: SyntaxKind, at: TextSize) -> Self {
        Self { kind, prefix: TextRange::empty(at), range: TextRange::empty(at) }
    }
}

const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "!=", "<>", "->", ":=", "**", "//", "<<", ">>", "<=", ">=",
    "==", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "@", "&",
    "|", "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "=",
];

pub struct Tokenizer<'src> {
    text: &'src str,
    cursor: Cursor<'src>,
    dialect: Dialect,
    current: Token,
    pending: VecDeque<Token>,
    indents: Vec<u32>,
    depth: u32,
    at_line_start: bool,
    line_has_tokens: bool,
    finished: bool,
}

impl<'src> Tokenizer<'src> {
    pub fn new(text: &'src str, dialect: Dialect) -> Self {
        let mut tokenizer = Self {
            text,
            cursor: Cursor::new(text),
            dialect,
            current: Token::layout(ENDMARKER, TextSize::new(0)),
            pending: VecDeque::new(),
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            line_has_tokens: false,
            finished: false,
        };
        tokenizer.next_token();
        tokenizer
    }

    pub fn peek(&self) -> &Token {
        &self.current
    }

    pub fn text(&self, token: &Token) -> &'src str {
        &self.text[token.range]
    }

    /// Advances and returns the token that was current.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return std::mem::replace(&mut self.current, next);
            }
            if self.finished {
                let end = self.cursor.offset();
                self.pending.push_back(Token::layout(ENDMARKER, end));
            } else {
                self.fill();
            }
        }
    }

    fn fill(&mut self) {
        let prefix_start = self.cursor.offset();

        if self.at_line_start && self.depth == 0 {
            let Some(width) = self.blank_lines_and_indentation() else {
                self.finish(prefix_start);
                return;
            };
            self.at_line_start = false;
            self.indentation(width);
        }

        self.inline_trivia();
        if self.cursor.is_eof() {
            self.finish(prefix_start);
            return;
        }

        let start = self.cursor.offset();
        let kind = self.scan();
        let token = Token {
            kind,
            prefix: TextRange::new(prefix_start, start),
            range: TextRange::new(start, self.cursor.offset()),
        };

        if kind == NEWLINE {
            self.at_line_start = true;
            self.line_has_tokens = false;
        } else {
            self.line_has_tokens = true;
        }
        self.pending.push_back(token);
    }

    /// Skips blank and comment-only lines plus the indentation of the next
    /// code line. Returns its width, or `None` at the end of input.
    fn blank_lines_and_indentation(&mut self) -> Option<u32> {
        loop {
            let mut width = 0;
            loop {
                match self.cursor.peek() {
                    ' ' => width += 1,
                    '\t' => width = (width / 8 + 1) * 8,
                    '\x0c' => width = 0,
                    _ => break,
                }
                self.cursor.advance();
            }

            match self.cursor.peek() {
                '#' => {
                    self.cursor.advance_while(|c| c != '\n' && c != '\r');
                    self.cursor.eat_newline();
                }
                '\n' | '\r' => {
                    self.cursor.eat_newline();
                }
                '\\' if matches!(self.cursor.second(), '\n' | '\r') => {
                    self.cursor.advance();
                    self.cursor.eat_newline();
                }
                _ if self.cursor.is_eof() => return None,
                _ => return Some(width),
            }
        }
    }

    fn indentation(&mut self, width: u32) {
        let at = self.cursor.offset();
        let top = self.indents.last().copied().unwrap_or(0);

        if width > top {
            self.indents.push(width);
            self.pending.push_back(Token::layout(INDENT, at));
            return;
        }

        while self.indents.len() > 1 && self.indents.last().is_some_and(|&top| width < top) {
            self.indents.pop();
            self.pending.push_back(Token::layout(DEDENT, at));
        }
    }

    fn inline_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                ' ' | '\t' | '\x0c' => {
                    self.cursor.advance();
                }
                '\\' if matches!(self.cursor.second(), '\n' | '\r') => {
                    self.cursor.advance();
                    self.cursor.eat_newline();
                }
                '#' => self.cursor.advance_while(|c| c != '\n' && c != '\r'),
                '\n' | '\r' if self.depth > 0 => {
                    self.cursor.eat_newline();
                }
                _ => break,
            }
        }
    }

    fn finish(&mut self, prefix_start: TextSize) {
        let end = self.cursor.offset();
        let mut prefix_start = prefix_start;

        if self.line_has_tokens {
            self.pending.push_back(Token {
                kind: NEWLINE,
                prefix: TextRange::new(prefix_start, end),
                range: TextRange::empty(end),
            });
            self.line_has_tokens = false;
            prefix_start = end;
        }

        for _ in 1..self.indents.len() {
            self.pending.push_back(Token::layout(DEDENT, end));
        }
        self.indents.truncate(1);

        self.pending.push_back(Token {
            kind: ENDMARKER,
            prefix: TextRange::new(prefix_start, end),
            range: TextRange::empty(end),
        });
        self.finished = true;
    }

    fn scan(&mut self) -> SyntaxKind {
        let first = self.cursor.peek();
        match first {
            '\n' | '\r' => {
                self.cursor.eat_newline();
                NEWLINE
            }
            '"' | '\'' => self.string(),
            '0'..='9' => self.number(),
            '.' if self.cursor.second().is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.identifier(),
            _ => self.operator(),
        }
    }

    fn identifier(&mut self) -> SyntaxKind {
        let start = self.cursor.offset();
        self.cursor.advance_while(is_identifier_continue);
        let word = &self.text[TextRange::new(start, self.cursor.offset())];

        if matches!(self.cursor.peek(), '"' | '\'') && is_string_prefix(word) {
            return self.string();
        }

        if self.dialect.is_keyword(word) { KEYWORD } else { NAME }
    }

    fn string(&mut self) -> SyntaxKind {
        let quote = self.cursor.advance();
        let triple = self.cursor.peek() == quote && self.cursor.second() == quote;
        if triple {
            self.cursor.advance_by(2);
        }

        loop {
            match self.cursor.peek() {
                EOF_CHAR if self.cursor.is_eof() => return ERROR_LEAF,
                '\\' => {
                    self.cursor.advance();
                    if !self.cursor.eat_newline() {
                        self.cursor.advance();
                    }
                }
                '\n' | '\r' if !triple => return ERROR_LEAF,
                c if c == quote => {
                    if !triple {
                        self.cursor.advance();
                        return STRING;
                    }
                    if self.cursor.second() == quote && self.cursor.third() == quote {
                        self.cursor.advance_by(3);
                        return STRING;
                    }
                    self.cursor.advance();
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn number(&mut self) -> SyntaxKind {
        if self.cursor.peek() == '0'
            && matches!(self.cursor.second(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B')
        {
            self.cursor.advance_by(2);
            self.cursor.advance_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
            if self.cursor.peek() == '.' {
                self.cursor.advance();
                self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
            }
            self.exponent();
        }

        if matches!(self.cursor.peek(), 'j' | 'J' | 'l' | 'L') {
            self.cursor.advance();
        }
        NUMBER
    }

    fn exponent(&mut self) {
        if !matches!(self.cursor.peek(), 'e' | 'E') {
            return;
        }
        let signed = matches!(self.cursor.second(), '+' | '-');
        let digit = if signed { self.cursor.third() } else { self.cursor.second() };
        if digit.is_ascii_digit() {
            self.cursor.advance_by(if signed { 2 } else { 1 });
            self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
        }
    }

    fn operator(&mut self) -> SyntaxKind {
        let rest = self.cursor.rest();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            self.cursor.advance();
            return ERROR_LEAF;
        };

        match *op {
            "(" | "[" | "{" => self.depth += 1,
            ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.cursor.advance_by(op.len());
        OPERATOR
    }
}

/// Tokenizes all of `text`, up to and including the `ENDMARKER`.
pub fn tokenize(text: &str, dialect: Dialect) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(text, dialect);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token();
        tokens.push(token);
        if token.kind == ENDMARKER {
            return tokens;
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_string_prefix(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    matches!(lower.as_str(), "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf" | "ur")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str, dialect: Dialect) -> Vec<(SyntaxKind, &str)> {
        tokenize(text, dialect).into_iter().map(|token| (token.kind, &text[token.range])).collect()
    }

    fn py3(text: &str) -> Vec<(SyntaxKind, &str)> {
        kinds(text, Dialect::default())
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            py3("x = y\n"),
            [(NAME, "x"), (OPERATOR, "="), (NAME, "y"), (NEWLINE, "\n"), (ENDMARKER, "")]
        );
    }

    #[test]
    fn test_prefix_holds_whitespace() {
        let text = "x  =\ty\n";
        let tokens = tokenize(text, Dialect::default());
        assert_eq!(&text[tokens[1].prefix], "  ");
        assert_eq!(&text[tokens[2].prefix], "\t");
    }

    #[test]
    fn test_trailing_comment_belongs_to_newline() {
        let text = "x = 1  # one\n";
        let tokens = tokenize(text, Dialect::default());
        let newline = tokens.iter().find(|token| token.kind == NEWLINE).unwrap();
        assert_eq!(&text[newline.prefix], "  # one");
        assert_eq!(&text[newline.range], "\n");
    }

    #[test]
    fn test_blank_and_comment_lines_prefix_next_token() {
        let text = "a\n\n# note\n\nb\n";
        let tokens = tokenize(text, Dialect::default());
        let b = tokens.iter().find(|token| &text[token.range] == "b").unwrap();
        assert_eq!(&text[b.prefix], "\n# note\n\n");
    }

    #[test]
    fn test_indent_and_dedent() {
        assert_eq!(
            py3("if x:\n    y\nz\n"),
            [
                (KEYWORD, "if"),
                (NAME, "x"),
                (OPERATOR, ":"),
                (NEWLINE, "\n"),
                (INDENT, ""),
                (NAME, "y"),
                (NEWLINE, "\n"),
                (DEDENT, ""),
                (NAME, "z"),
                (NEWLINE, "\n"),
                (ENDMARKER, "")
            ]
        );
    }

    #[test]
    fn test_dedents_at_end_of_input() {
        let kinds: Vec<_> = py3("def f():\n  if x:\n    y").into_iter().map(|(k, _)| k).collect();
        assert_eq!(&kinds[kinds.len() - 4..], [NEWLINE, DEDENT, DEDENT, ENDMARKER]);
    }

    #[test]
    fn test_newlines_inside_brackets_are_trivia() {
        let text = "f(a,\n  b)\n";
        let tokens = tokenize(text, Dialect::default());
        let b = tokens.iter().find(|token| &text[token.range] == "b").unwrap();
        assert_eq!(&text[b.prefix], "\n  ");
        assert_eq!(tokens.iter().filter(|token| token.kind == NEWLINE).count(), 1);
    }

    #[test]
    fn test_line_continuation() {
        let text = "x = 1 + \\\n    2\n";
        let tokens = tokenize(text, Dialect::default());
        let two = tokens.iter().find(|token| &text[token.range] == "2").unwrap();
        assert_eq!(&text[two.prefix], " \\\n    ");
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            py3(r#"'a' "b\"" r'\d' '''x'y''' f"{v}" b'z'"#)
                .into_iter()
                .filter(|(kind, _)| *kind == STRING)
                .map(|(_, text)| text)
                .collect::<Vec<_>>(),
            ["'a'", r#""b\"""#, r"r'\d'", "'''x'y'''", r#"f"{v}""#, "b'z'"]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(py3("'abc\n")[0], (ERROR_LEAF, "'abc"));
    }

    #[test]
    fn test_numbers() {
        for input in ["123", "0x1f", "0o755", "0b1010", "1_000", "1.5", ".5", "1e10", "2.5e-3", "3j", "10L"] {
            assert_eq!(py3(input)[0], (NUMBER, input), "input: {input}");
        }
    }

    #[test]
    fn test_longest_operator_match() {
        let ops: Vec<_> = py3("a **= b // c <> d -> e ... f")
            .into_iter()
            .filter(|(kind, _)| *kind == OPERATOR)
            .map(|(_, text)| text)
            .collect();
        assert_eq!(ops, ["**=", "//", "<>", "->", "..."]);
    }

    #[test]
    fn test_keywords_depend_on_dialect() {
        assert_eq!(py3("print")[0], (NAME, "print"));
        assert_eq!(kinds("print", Dialect::new(2, 7))[0], (KEYWORD, "print"));
        assert_eq!(py3("None")[0], (KEYWORD, "None"));
        assert_eq!(kinds("None", Dialect::new(2, 7))[0], (NAME, "None"));
    }

    #[test]
    fn test_unknown_character() {
        assert_eq!(py3("`x`")[0], (ERROR_LEAF, "`"));
    }

    #[test]
    fn test_missing_final_newline() {
        let text = "x  # tail";
        let tokens = tokenize(text, Dialect::default());
        assert_eq!(tokens[1].kind, NEWLINE);
        assert_eq!(&text[tokens[1].prefix], "  # tail");
        assert_eq!(tokens[2].kind, ENDMARKER);
    }

    #[test]
    fn test_lossless() {
        let text = "class A(B):\n    def f(self, *a):  # c\n\n        return [x\n for x in a]\r\n# end\n";
        let tokens = tokenize(text, Dialect::default());
        let rebuilt: String =
            tokens.iter().map(|token| format!("{}{}", &text[token.prefix], &text[token.range])).collect();
        assert_eq!(rebuilt, text);
    }
}
