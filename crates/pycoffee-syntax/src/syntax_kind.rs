#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum SyntaxKind {
    NAME,
    KEYWORD,
    NUMBER,
    STRING,
    OPERATOR,
    NEWLINE,
    INDENT,
    DEDENT,
    ENDMARKER,
    ERROR_LEAF,
    /// Text already rewritten into CoffeeScript.
    FRAGMENT,

    FILE_INPUT,
    SIMPLE_STMT,
    EXPR_STMT,
    ANNASSIGN,
    TESTLIST_STAR_EXPR,
    PRINT_STMT,
    EXEC_STMT,
    DEL_STMT,
    RETURN_STMT,
    RAISE_STMT,
    GLOBAL_STMT,
    NONLOCAL_STMT,
    ASSERT_STMT,
    IMPORT_NAME,
    IMPORT_FROM,
    DOTTED_NAME,
    IF_STMT,
    WHILE_STMT,
    FOR_STMT,
    TRY_STMT,
    EXCEPT_CLAUSE,
    WITH_STMT,
    WITH_ITEM,
    FUNCDEF,
    PARAMETERS,
    PARAM,
    CLASSDEF,
    DECORATOR,
    DECORATORS,
    DECORATED,
    ASYNC_STMT,
    ASYNC_FUNCDEF,
    SUITE,
    NAMEDEXPR_TEST,
    TEST,
    LAMBDEF,
    OR_TEST,
    AND_TEST,
    NOT_TEST,
    COMPARISON,
    COMP_OP,
    STAR_EXPR,
    EXPR,
    XOR_EXPR,
    AND_EXPR,
    SHIFT_EXPR,
    ARITH_EXPR,
    TERM,
    FACTOR,
    POWER,
    ATOM_EXPR,
    ATOM,
    TRAILER,
    TESTLIST_COMP,
    EXPRLIST,
    TESTLIST,
    DICTORSETMAKER,
    ARGLIST,
    ARGUMENT,
    COMP_FOR,
    COMP_IF,
    SUBSCRIPTLIST,
    SUBSCRIPT,
    SLICEOP,
    YIELD_EXPR,
    ERROR_NODE,
    TOMBSTONE,
}

impl SyntaxKind {
    pub fn is_leaf(self) -> bool {
        self <= Self::FRAGMENT
    }

    /// Leaves that only structure the token stream and never reach the tree.
    pub fn is_layout(self) -> bool {
        matches!(self, Self::INDENT | Self::DEDENT)
    }
}
