use drop_bomb::DropBomb;
use pycoffee_errors::Diagnostic;
use pycoffee_syntax::{Builder, SyntaxKind, SyntaxTree};
use pycoffee_tokenizer::{Dialect, Token, tokenize};
use text_size::TextRange;

pub(crate) struct Parser<'src> {
    text: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(text: &'src str, dialect: Dialect) -> Self {
        Self {
            text,
            tokens: tokenize(text, dialect),
            pos: 0,
            events: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn token(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        self.token(n).kind
    }

    pub(crate) fn current_text(&self) -> &'src str {
        self.nth_text(0)
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'src str {
        &self.text[self.token(n).range]
    }

    pub(crate) fn current_range(&self) -> TextRange {
        self.token(0).range
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn nth_at_kw(&self, n: usize, keyword: &str) -> bool {
        self.nth(n) == SyntaxKind::KEYWORD && self.nth_text(n) == keyword
    }

    pub(crate) fn at_kw(&self, keyword: &str) -> bool {
        self.nth_at_kw(0, keyword)
    }

    pub(crate) fn at_op(&self, op: &str) -> bool {
        self.at(SyntaxKind::OPERATOR) && self.current_text() == op
    }

    pub(crate) fn bump(&mut self) {
        if self.at(SyntaxKind::ENDMARKER) {
            return;
        }
        debug_assert!(!self.current().is_layout(), "layout tokens are skipped, not bumped");
        self.events.push(Event::Token(self.pos));
        self.pos += 1;
    }

    /// Consumes an `INDENT` or `DEDENT`, which never reach the tree.
    pub(crate) fn skip(&mut self) {
        debug_assert!(self.current().is_layout());
        self.pos += 1;
    }

    pub(crate) fn bump_endmarker(&mut self) {
        debug_assert!(self.at(SyntaxKind::ENDMARKER));
        self.events.push(Event::Token(self.pos));
    }

    pub(crate) fn eat_op(&mut self, op: &str) -> bool {
        let at = self.at_op(op);
        if at {
            self.bump();
        }
        at
    }

    pub(crate) fn eat_kw(&mut self, keyword: &str) -> bool {
        let at = self.at_kw(keyword);
        if at {
            self.bump();
        }
        at
    }

    pub(crate) fn expect_op(&mut self, op: &str) {
        if !self.eat_op(op) {
            self.error(format!("expected `{op}`"));
        }
    }

    pub(crate) fn expect_kw(&mut self, keyword: &str) {
        if !self.eat_kw(keyword) {
            self.error(format!("expected `{keyword}`"));
        }
    }

    pub(crate) fn expect_name(&mut self) {
        if self.at(SyntaxKind::NAME) {
            self.bump();
        } else {
            self.error("expected a name");
        }
    }

    pub(crate) fn start(&mut self) -> Marker {
        let pos = self.events.len() as u32;
        self.events.push(Event::TOMBSTONE);
        Marker::new(pos)
    }

    /// Reports an error at the current token, once per position.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        if self.diagnostics.last().is_some_and(|last| last.range().start() == range.start()) {
            return;
        }
        let message = message.into();
        tracing::debug!(%message, ?range, "syntax error");
        self.diagnostics.push(Diagnostic::error(message, range));
    }

    pub(crate) fn error_unexpected(&mut self) {
        let message = match self.current() {
            SyntaxKind::ENDMARKER => "unexpected end of input".to_owned(),
            SyntaxKind::NEWLINE => "unexpected end of line".to_owned(),
            SyntaxKind::INDENT => "unexpected indent".to_owned(),
            SyntaxKind::DEDENT => "unexpected dedent".to_owned(),
            _ => format!("unexpected `{}`", self.current_text()),
        };
        self.error(message);
    }

    pub(crate) fn finish(self) -> (SyntaxTree, Vec<Diagnostic>) {
        let Parser { text, tokens, pos: _, mut events, diagnostics } = self;
        let mut builder = Builder::new();
        let mut forward_parents = Vec::new();

        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::TOMBSTONE) {
                Event::Start { kind, forward_parent } => {
                    if kind == SyntaxKind::TOMBSTONE {
                        continue;
                    }

                    forward_parents.push(kind);
                    let mut idx = i;
                    let mut fp = forward_parent;
                    while let Some(fwd) = fp {
                        idx += fwd as usize;

                        fp = match std::mem::replace(&mut events[idx], Event::TOMBSTONE) {
                            Event::Start { kind, forward_parent } => {
                                if kind != SyntaxKind::TOMBSTONE {
                                    forward_parents.push(kind);
                                }
                                forward_parent
                            }
                            _ => unreachable!(),
                        };
                    }

                    for kind in forward_parents.drain(..).rev() {
                        builder.start_node(kind);
                    }
                }
                Event::Finish => builder.finish_node(),
                Event::Token(index) => {
                    let Token { kind, prefix, range } = tokens[index];
                    builder.token(kind, &text[range], &text[prefix], range);
                }
            }
        }

        (builder.finish(), diagnostics)
    }
}

enum Event {
    Start { kind: SyntaxKind, forward_parent: Option<u32> },
    Token(usize),
    Finish,
}

impl Event {
    const TOMBSTONE: Self = Self::Start { kind: SyntaxKind::TOMBSTONE, forward_parent: None };
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(position: u32) -> Self {
        Self { position, bomb: DropBomb::new("Marker must be either completed or abandoned") }
    }

    pub(crate) fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.bomb.defuse();

        match &mut p.events[self.position as usize] {
            Event::Start { kind: slot, .. } => *slot = kind,
            _ => unreachable!(),
        }

        p.events.push(Event::Finish);
        CompletedMarker { position: self.position }
    }
}

pub(crate) struct CompletedMarker {
    position: u32,
}

impl CompletedMarker {
    /// Opens a node that will wrap the already completed one.
    pub(crate) fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new = p.start();

        match &mut p.events[self.position as usize] {
            Event::Start { forward_parent, .. } => {
                *forward_parent = Some(new.position - self.position);
            }
            _ => unreachable!(),
        }

        new
    }
}
