use pycoffee_syntax::SyntaxKind::{self, *};

use super::{at_expr_start, at_line_end, error_to_line_end, exprs};
use crate::parser::Parser;

pub(crate) fn file_input(p: &mut Parser<'_>) {
    let m = p.start();

    while !p.at(ENDMARKER) {
        match p.current() {
            INDENT => {
                p.error("unexpected indent");
                p.skip();
            }
            DEDENT => p.skip(),
            NEWLINE => p.bump(),
            _ => stmt(p),
        }
    }

    p.bump_endmarker();
    m.complete(p, FILE_INPUT);
}

fn stmt(p: &mut Parser<'_>) {
    if p.at_op("@") {
        return decorated(p);
    }
    if p.at(KEYWORD) {
        match p.current_text() {
            "if" => return if_stmt(p),
            "while" => return while_stmt(p),
            "for" => return for_stmt(p),
            "try" => return try_stmt(p),
            "with" => return with_stmt(p),
            "def" => return funcdef(p),
            "class" => return classdef(p),
            "async" => return async_stmt(p),
            _ => {}
        }
    }
    simple_stmt(p);
}

fn simple_stmt(p: &mut Parser<'_>) {
    let m = p.start();

    small_stmt(p);
    while p.eat_op(";") {
        if at_line_end(p) {
            break;
        }
        small_stmt(p);
    }
    error_to_line_end(p);

    p.bump();
    m.complete(p, SIMPLE_STMT);
}

fn small_stmt(p: &mut Parser<'_>) {
    let keyword = if p.at(KEYWORD) { p.current_text() } else { "" };
    match keyword {
        "pass" | "break" | "continue" => p.bump(),
        "del" => {
            let m = p.start();
            p.bump();
            exprs::exprlist(p);
            m.complete(p, DEL_STMT);
        }
        "return" => {
            let m = p.start();
            p.bump();
            if at_expr_start(p) {
                exprs::testlist_star_expr(p);
            }
            m.complete(p, RETURN_STMT);
        }
        "raise" => raise_stmt(p),
        "global" => names_stmt(p, GLOBAL_STMT),
        "nonlocal" => names_stmt(p, NONLOCAL_STMT),
        "assert" => {
            let m = p.start();
            p.bump();
            exprs::test(p);
            if p.eat_op(",") {
                exprs::test(p);
            }
            m.complete(p, ASSERT_STMT);
        }
        "import" => import_name(p),
        "from" => import_from(p),
        "print" => print_stmt(p),
        "exec" => exec_stmt(p),
        _ => expr_stmt(p),
    }
}

fn expr_stmt(p: &mut Parser<'_>) {
    let m = p.start();

    if p.at_kw("yield") {
        exprs::yield_expr(p);
    } else {
        exprs::testlist_star_expr(p);
    }

    if p.at_op(":") {
        let annotation = p.start();
        p.bump();
        exprs::test(p);
        if p.eat_op("=") {
            assigned_value(p);
        }
        annotation.complete(p, ANNASSIGN);
    } else if p.at(OPERATOR) && is_augmented_assignment(p.current_text()) {
        p.bump();
        assigned_value(p);
    } else {
        while p.eat_op("=") {
            assigned_value(p);
        }
    }

    m.complete(p, EXPR_STMT);
}

fn assigned_value(p: &mut Parser<'_>) {
    if p.at_kw("yield") {
        exprs::yield_expr(p);
    } else {
        exprs::testlist_star_expr(p);
    }
}

fn is_augmented_assignment(op: &str) -> bool {
    matches!(
        op,
        "+=" | "-=" | "*=" | "@=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" | "**=" | "//="
    )
}

/// `print [>> test] [test (, test)* [,]]`, Python 2 only.
fn print_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();

    if p.eat_op(">>") {
        exprs::test(p);
        if !p.eat_op(",") {
            m.complete(p, PRINT_STMT);
            return;
        }
    }
    while at_expr_start(p) {
        exprs::test(p);
        if !p.eat_op(",") {
            break;
        }
    }

    m.complete(p, PRINT_STMT);
}

fn exec_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    exprs::expr(p);
    if p.eat_kw("in") {
        exprs::test(p);
        if p.eat_op(",") {
            exprs::test(p);
        }
    }
    m.complete(p, EXEC_STMT);
}

fn raise_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();

    if at_expr_start(p) {
        exprs::test(p);
        if p.eat_kw("from") {
            exprs::test(p);
        } else if p.eat_op(",") {
            // Python 2: `raise E, V[, T]`
            exprs::test(p);
            if p.eat_op(",") {
                exprs::test(p);
            }
        }
    }

    m.complete(p, RAISE_STMT);
}

fn names_stmt(p: &mut Parser<'_>, kind: SyntaxKind) {
    let m = p.start();
    p.bump();
    p.expect_name();
    while p.eat_op(",") {
        p.expect_name();
    }
    m.complete(p, kind);
}

fn dotted_name(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_name();
    while p.eat_op(".") {
        p.expect_name();
    }
    m.complete(p, DOTTED_NAME);
}

fn import_name(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    loop {
        dotted_name(p);
        if p.eat_kw("as") {
            p.expect_name();
        }
        if !p.eat_op(",") {
            break;
        }
    }
    m.complete(p, IMPORT_NAME);
}

fn import_from(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();

    while p.at_op(".") || p.at_op("...") {
        p.bump();
    }
    if p.at(NAME) {
        dotted_name(p);
    }
    p.expect_kw("import");

    if !p.eat_op("*") {
        let parenthesized = p.eat_op("(");
        loop {
            p.expect_name();
            if p.eat_kw("as") {
                p.expect_name();
            }
            if !p.eat_op(",") || p.at_op(")") {
                break;
            }
        }
        if parenthesized {
            p.expect_op(")");
        }
    }

    m.complete(p, IMPORT_FROM);
}

fn if_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    exprs::namedexpr_test(p);
    p.expect_op(":");
    suite(p);

    while p.at_kw("elif") {
        p.bump();
        exprs::namedexpr_test(p);
        p.expect_op(":");
        suite(p);
    }
    else_clause(p);

    m.complete(p, IF_STMT);
}

fn else_clause(p: &mut Parser<'_>) {
    if p.eat_kw("else") {
        p.expect_op(":");
        suite(p);
    }
}

fn while_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    exprs::namedexpr_test(p);
    p.expect_op(":");
    suite(p);
    else_clause(p);
    m.complete(p, WHILE_STMT);
}

fn for_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    exprs::exprlist(p);
    p.expect_kw("in");
    exprs::testlist(p);
    p.expect_op(":");
    suite(p);
    else_clause(p);
    m.complete(p, FOR_STMT);
}

fn try_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    p.expect_op(":");
    suite(p);

    let mut handled = false;
    while p.at_kw("except") {
        handled = true;
        except_clause(p);
        p.expect_op(":");
        suite(p);
    }
    if handled {
        else_clause(p);
    }
    if p.eat_kw("finally") {
        handled = true;
        p.expect_op(":");
        suite(p);
    }
    if !handled {
        p.error("expected `except` or `finally`");
    }

    m.complete(p, TRY_STMT);
}

/// `except [test [(as | ,) test]]`
fn except_clause(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    if at_expr_start(p) {
        exprs::test(p);
        if p.eat_kw("as") || p.eat_op(",") {
            exprs::test(p);
        }
    }
    m.complete(p, EXCEPT_CLAUSE);
}

fn with_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    loop {
        let item = p.start();
        exprs::test(p);
        if p.eat_kw("as") {
            exprs::expr(p);
        }
        item.complete(p, WITH_ITEM);
        if !p.eat_op(",") {
            break;
        }
    }
    p.expect_op(":");
    suite(p);
    m.complete(p, WITH_STMT);
}

fn funcdef(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    p.expect_name();
    parameters(p);
    if p.eat_op("->") {
        exprs::test(p);
    }
    p.expect_op(":");
    suite(p);
    m.complete(p, FUNCDEF);
}

fn parameters(p: &mut Parser<'_>) {
    let m = p.start();
    if p.eat_op("(") {
        exprs::params(p, ")", true);
        p.expect_op(")");
    } else {
        p.error("expected `(`");
    }
    m.complete(p, PARAMETERS);
}

fn classdef(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    p.expect_name();
    if p.eat_op("(") {
        if !p.at_op(")") {
            exprs::arglist(p);
        }
        p.expect_op(")");
    }
    p.expect_op(":");
    suite(p);
    m.complete(p, CLASSDEF);
}

fn decorated(p: &mut Parser<'_>) {
    let m = p.start();

    let decorators = p.start();
    while p.at_op("@") {
        decorator(p);
    }
    decorators.complete(p, DECORATORS);

    match p.current_text() {
        "def" if p.at(KEYWORD) => funcdef(p),
        "class" if p.at(KEYWORD) => classdef(p),
        "async" if p.at(KEYWORD) => async_stmt(p),
        _ => p.error("expected a function or class definition"),
    }

    m.complete(p, DECORATED);
}

/// `@ dotted_name [( [arglist] )] NEWLINE`
fn decorator(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    dotted_name(p);
    if p.eat_op("(") {
        if !p.at_op(")") {
            exprs::arglist(p);
        }
        p.expect_op(")");
    }
    error_to_line_end(p);
    p.bump();
    m.complete(p, DECORATOR);
}

fn async_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    let kind = match p.current_text() {
        "def" if p.at(KEYWORD) => {
            funcdef(p);
            ASYNC_FUNCDEF
        }
        "with" if p.at(KEYWORD) => {
            with_stmt(p);
            ASYNC_STMT
        }
        "for" if p.at(KEYWORD) => {
            for_stmt(p);
            ASYNC_STMT
        }
        _ => {
            p.error("expected `def`, `with` or `for`");
            ASYNC_STMT
        }
    };
    m.complete(p, kind);
}

/// Indented block, or a simple statement on the header line.
fn suite(p: &mut Parser<'_>) {
    if !p.at(NEWLINE) {
        simple_stmt(p);
        return;
    }

    let m = p.start();
    p.bump();

    if p.at(INDENT) {
        p.skip();
        while !p.at(DEDENT) && !p.at(ENDMARKER) {
            if p.at(INDENT) {
                p.error("unexpected indent");
                p.skip();
            } else {
                stmt(p);
            }
        }
        if p.at(DEDENT) {
            p.skip();
        }
    } else {
        p.error("expected an indented block");
    }

    m.complete(p, SUITE);
}
