use pycoffee_syntax::SyntaxKind::{self, *};

use super::{at_expr_start, comma_list};
use crate::parser::{CompletedMarker, Parser};

pub(crate) fn namedexpr_test(p: &mut Parser<'_>) {
    let m = p.start();
    test(p);
    if p.eat_op(":=") {
        test(p);
    }
    m.complete(p, NAMEDEXPR_TEST);
}

/// `or_test [if or_test else test] | lambdef`
pub(crate) fn test(p: &mut Parser<'_>) {
    if p.at_kw("lambda") {
        return lambdef(p, false);
    }

    let m = p.start();
    or_test(p);
    if p.eat_kw("if") {
        or_test(p);
        p.expect_kw("else");
        test(p);
    }
    m.complete(p, TEST);
}

fn test_nocond(p: &mut Parser<'_>) {
    if p.at_kw("lambda") {
        lambdef(p, true);
    } else {
        or_test(p);
    }
}

fn lambdef(p: &mut Parser<'_>, nocond: bool) {
    let m = p.start();
    p.bump();
    params(p, ":", false);
    p.expect_op(":");
    if nocond {
        test_nocond(p);
    } else {
        test(p);
    }
    m.complete(p, LAMBDEF);
}

/// Parameters up to (not including) `closing`, each wrapped in a `PARAM`
/// that owns its trailing comma.
pub(crate) fn params(p: &mut Parser<'_>, closing: &str, annotated: bool) {
    while !p.at_op(closing) && !p.at(NEWLINE) && !p.at(ENDMARKER) {
        if !(p.at(NAME) || p.at_op("*") || p.at_op("**") || p.at_op("/")) {
            p.error("expected a parameter");
            let m = p.start();
            p.bump();
            m.complete(p, ERROR_NODE);
            continue;
        }

        let m = p.start();
        if p.at_op("*") || p.at_op("**") {
            p.bump();
            if p.at(NAME) {
                p.bump();
            }
        } else {
            p.bump();
        }
        if annotated && p.eat_op(":") {
            test(p);
        }
        if p.eat_op("=") {
            test(p);
        }
        let comma = p.eat_op(",");
        m.complete(p, PARAM);

        if !comma {
            break;
        }
    }
}

fn or_test(p: &mut Parser<'_>) {
    let m = p.start();
    and_test(p);
    while p.eat_kw("or") {
        and_test(p);
    }
    m.complete(p, OR_TEST);
}

fn and_test(p: &mut Parser<'_>) {
    let m = p.start();
    not_test(p);
    while p.eat_kw("and") {
        not_test(p);
    }
    m.complete(p, AND_TEST);
}

fn not_test(p: &mut Parser<'_>) {
    if p.at_kw("not") {
        let m = p.start();
        p.bump();
        not_test(p);
        m.complete(p, NOT_TEST);
    } else {
        comparison(p);
    }
}

fn comparison(p: &mut Parser<'_>) {
    let m = p.start();
    expr(p);
    while comp_op(p) {
        expr(p);
    }
    m.complete(p, COMPARISON);
}

/// Consumes a comparison operator; `not in` and `is not` become `COMP_OP`.
fn comp_op(p: &mut Parser<'_>) -> bool {
    match p.current() {
        OPERATOR if matches!(p.current_text(), "<" | ">" | "==" | ">=" | "<=" | "!=" | "<>") => {
            p.bump();
        }
        KEYWORD => match p.current_text() {
            "in" => p.bump(),
            "not" if p.nth_at_kw(1, "in") => {
                let m = p.start();
                p.bump();
                p.bump();
                m.complete(p, COMP_OP);
            }
            "is" => {
                let m = p.start();
                p.bump();
                p.eat_kw("not");
                m.complete(p, COMP_OP);
            }
            _ => return false,
        },
        _ => return false,
    }
    true
}

fn star_expr(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    expr(p);
    m.complete(p, STAR_EXPR);
}

fn binary(p: &mut Parser<'_>, kind: SyntaxKind, ops: &[&str], operand: fn(&mut Parser<'_>)) {
    let m = p.start();
    operand(p);
    while p.at(OPERATOR) && ops.contains(&p.current_text()) {
        p.bump();
        operand(p);
    }
    m.complete(p, kind);
}

pub(crate) fn expr(p: &mut Parser<'_>) {
    binary(p, EXPR, &["|"], xor_expr);
}

fn xor_expr(p: &mut Parser<'_>) {
    binary(p, XOR_EXPR, &["^"], and_expr);
}

fn and_expr(p: &mut Parser<'_>) {
    binary(p, AND_EXPR, &["&"], shift_expr);
}

fn shift_expr(p: &mut Parser<'_>) {
    binary(p, SHIFT_EXPR, &["<<", ">>"], arith_expr);
}

fn arith_expr(p: &mut Parser<'_>) {
    binary(p, ARITH_EXPR, &["+", "-"], term);
}

fn term(p: &mut Parser<'_>) {
    binary(p, TERM, &["*", "/", "%", "//", "@"], factor);
}

fn factor(p: &mut Parser<'_>) {
    if p.at(OPERATOR) && matches!(p.current_text(), "+" | "-" | "~") {
        let m = p.start();
        p.bump();
        factor(p);
        m.complete(p, FACTOR);
    } else {
        power(p);
    }
}

fn power(p: &mut Parser<'_>) {
    let lhs = atom_expr(p);
    if p.at_op("**") {
        let m = lhs.precede(p);
        p.bump();
        factor(p);
        m.complete(p, POWER);
    }
}

fn atom_expr(p: &mut Parser<'_>) -> CompletedMarker {
    let m = p.start();
    p.eat_kw("await");
    if atom(p) {
        while trailer(p) {}
    }
    m.complete(p, ATOM_EXPR)
}

fn trailer(p: &mut Parser<'_>) -> bool {
    if !p.at(OPERATOR) || !matches!(p.current_text(), "(" | "[" | ".") {
        return false;
    }

    let m = p.start();
    let opening = p.current_text();
    p.bump();
    match opening {
        "(" => {
            if !p.at_op(")") {
                arglist(p);
            }
            p.expect_op(")");
        }
        "[" => {
            subscriptlist(p);
            p.expect_op("]");
        }
        _ => p.expect_name(),
    }
    m.complete(p, TRAILER);
    true
}

/// Returns `false` if no atom could be parsed and nothing was consumed.
fn atom(p: &mut Parser<'_>) -> bool {
    match p.current() {
        NAME | NUMBER => p.bump(),
        STRING => {
            let m = p.start();
            while p.at(STRING) {
                p.bump();
            }
            m.complete(p, ATOM);
        }
        KEYWORD if matches!(p.current_text(), "None" | "True" | "False") => p.bump(),
        OPERATOR => match p.current_text() {
            "(" => {
                let m = p.start();
                p.bump();
                if p.at_kw("yield") {
                    yield_expr(p);
                } else if !p.at_op(")") {
                    testlist_comp(p, ")");
                }
                p.expect_op(")");
                m.complete(p, ATOM);
            }
            "[" => {
                let m = p.start();
                p.bump();
                if !p.at_op("]") {
                    testlist_comp(p, "]");
                }
                p.expect_op("]");
                m.complete(p, ATOM);
            }
            "{" => {
                let m = p.start();
                p.bump();
                if !p.at_op("}") {
                    dictorsetmaker(p);
                }
                p.expect_op("}");
                m.complete(p, ATOM);
            }
            "..." => p.bump(),
            _ => {
                p.error("expected expression");
                return false;
            }
        },
        ERROR_LEAF => {
            let text = p.current_text();
            if text.contains(['\'', '"']) {
                p.error("unterminated string literal");
            } else {
                p.error(format!("unexpected character `{text}`"));
            }
            let m = p.start();
            p.bump();
            m.complete(p, ERROR_NODE);
        }
        _ => {
            p.error("expected expression");
            return false;
        }
    }
    true
}

fn test_or_star(p: &mut Parser<'_>) {
    if p.at_op("*") {
        star_expr(p);
    } else {
        namedexpr_test(p);
    }
}

fn at_comp_for(p: &Parser<'_>) -> bool {
    p.at_kw("for") || (p.at_kw("async") && p.nth_at_kw(1, "for"))
}

fn testlist_comp(p: &mut Parser<'_>, closing: &str) {
    let m = p.start();
    test_or_star(p);
    if at_comp_for(p) {
        comp_for(p);
    } else {
        while p.eat_op(",") {
            if p.at_op(closing) || !at_expr_start(p) {
                break;
            }
            test_or_star(p);
        }
    }
    m.complete(p, TESTLIST_COMP);
}

/// `[async] for exprlist in or_test [comp_iter]`
fn comp_for(p: &mut Parser<'_>) {
    let m = p.start();
    p.eat_kw("async");
    p.expect_kw("for");
    exprlist(p);
    p.expect_kw("in");
    or_test(p);
    comp_iter(p);
    m.complete(p, COMP_FOR);
}

fn comp_iter(p: &mut Parser<'_>) {
    if at_comp_for(p) {
        comp_for(p);
    } else if p.at_kw("if") {
        let m = p.start();
        p.bump();
        test_nocond(p);
        comp_iter(p);
        m.complete(p, COMP_IF);
    }
}

fn dictorsetmaker(p: &mut Parser<'_>) {
    let m = p.start();
    loop {
        if p.eat_op("**") {
            expr(p);
        } else if p.at_op("*") {
            star_expr(p);
        } else {
            test(p);
            if p.eat_op(":") {
                test(p);
            }
        }

        if at_comp_for(p) {
            comp_for(p);
            break;
        }
        if !p.eat_op(",") || p.at_op("}") {
            break;
        }
    }
    m.complete(p, DICTORSETMAKER);
}

pub(crate) fn arglist(p: &mut Parser<'_>) {
    let m = p.start();
    loop {
        argument(p);
        if !p.eat_op(",") || p.at_op(")") {
            break;
        }
    }
    m.complete(p, ARGLIST);
}

/// `test [comp_for] | test = test | * test | ** test`
fn argument(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_op("*") || p.at_op("**") {
        p.bump();
        test(p);
    } else {
        test(p);
        if p.eat_op("=") {
            test(p);
        } else if at_comp_for(p) {
            comp_for(p);
        }
    }
    m.complete(p, ARGUMENT);
}

fn subscriptlist(p: &mut Parser<'_>) {
    let m = p.start();
    loop {
        subscript(p);
        if !p.eat_op(",") || p.at_op("]") {
            break;
        }
    }
    m.complete(p, SUBSCRIPTLIST);
}

/// `test | [test] : [test] [sliceop]`
fn subscript(p: &mut Parser<'_>) {
    let m = p.start();
    if !p.at_op(":") {
        test(p);
    }
    if p.eat_op(":") {
        if at_expr_start(p) {
            test(p);
        }
        if p.at_op(":") {
            let step = p.start();
            p.bump();
            if at_expr_start(p) {
                test(p);
            }
            step.complete(p, SLICEOP);
        }
    }
    m.complete(p, SUBSCRIPT);
}

pub(crate) fn exprlist(p: &mut Parser<'_>) {
    comma_list(p, EXPRLIST, |p| if p.at_op("*") { star_expr(p) } else { expr(p) });
}

pub(crate) fn testlist(p: &mut Parser<'_>) {
    comma_list(p, TESTLIST, test);
}

pub(crate) fn testlist_star_expr(p: &mut Parser<'_>) {
    comma_list(p, TESTLIST_STAR_EXPR, |p| if p.at_op("*") { star_expr(p) } else { test(p) });
}

/// `yield [from test | testlist_star_expr]`
pub(crate) fn yield_expr(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    if p.eat_kw("from") {
        test(p);
    } else if at_expr_start(p) {
        testlist_star_expr(p);
    }
    m.complete(p, YIELD_EXPR);
}
