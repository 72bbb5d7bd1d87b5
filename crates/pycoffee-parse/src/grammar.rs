use pycoffee_syntax::SyntaxKind::{self, *};

use crate::parser::Parser;

mod exprs;
pub(crate) mod stmts;

/// Whether the current token can begin an expression.
pub(crate) fn at_expr_start(p: &Parser<'_>) -> bool {
    match p.current() {
        NAME | NUMBER | STRING | ERROR_LEAF => true,
        KEYWORD => matches!(p.current_text(), "lambda" | "not" | "None" | "True" | "False" | "await"),
        OPERATOR => matches!(p.current_text(), "(" | "[" | "{" | "-" | "+" | "~" | "*" | "..."),
        _ => false,
    }
}

fn at_line_end(p: &Parser<'_>) -> bool {
    p.at(NEWLINE) || p.at(ENDMARKER)
}

/// Wraps everything up to the end of the logical line in an `ERROR_NODE`.
fn error_to_line_end(p: &mut Parser<'_>) {
    if at_line_end(p) {
        return;
    }
    p.error_unexpected();
    let m = p.start();
    while !at_line_end(p) {
        p.bump();
    }
    m.complete(p, ERROR_NODE);
}

/// Comma separated expressions, allowing a trailing comma.
fn comma_list(p: &mut Parser<'_>, kind: SyntaxKind, mut element: impl FnMut(&mut Parser<'_>)) {
    let m = p.start();
    loop {
        element(p);
        if !p.eat_op(",") || !at_expr_start(p) {
            break;
        }
    }
    m.complete(p, kind);
}
