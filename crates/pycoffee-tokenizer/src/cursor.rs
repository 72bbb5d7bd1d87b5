use std::str::Chars;

use text_size::{TextLen, TextSize};

pub(crate) const EOF_CHAR: char = '\0';

pub(crate) struct Cursor<'src> {
    chars: Chars<'src>,
    len: TextSize,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(text: &'src str) -> Self {
        Self { chars: text.chars(), len: text.text_len() }
    }

    /// Byte offset of the next character.
    pub(crate) fn offset(&self) -> TextSize {
        self.len - self.chars.as_str().text_len()
    }

    pub(crate) fn rest(&self) -> &'src str {
        self.chars.as_str()
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    pub(crate) fn peek(&self) -> char {
        self.nth(0)
    }

    pub(crate) fn second(&self) -> char {
        self.nth(1)
    }

    pub(crate) fn third(&self) -> char {
        self.nth(2)
    }

    fn nth(&self, n: usize) -> char {
        self.chars.clone().nth(n).unwrap_or(EOF_CHAR)
    }

    pub(crate) fn advance(&mut self) -> char {
        self.chars.next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }

    /// Consumes `\n`, `\r\n` or `\r`; returns whether one was there.
    pub(crate) fn eat_newline(&mut self) -> bool {
        match self.peek() {
            '\n' => {
                self.advance();
                true
            }
            '\r' => {
                self.advance();
                if self.peek() == '\n' {
                    self.advance();
                }
                true
            }
            _ => false,
        }
    }
}
