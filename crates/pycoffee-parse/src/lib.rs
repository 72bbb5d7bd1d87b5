//! Error-tolerant Python parser.
//!
//! Produces a lossless [`SyntaxTree`] whose node shapes follow parso: nodes
//! with a single child are collapsed into that child, trivia lives in the
//! prefix of the following leaf, and a syntax error never stops the parse.

mod grammar;
mod parser;
#[cfg(test)]
mod tests;

use pycoffee_errors::Diagnostic;
use pycoffee_syntax::SyntaxTree;
pub use pycoffee_tokenizer::Dialect;

#[derive(Debug, Clone)]
pub struct Parse {
    tree: SyntaxTree,
    diagnostics: Vec<Diagnostic>,
}

impl Parse {
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn into_parts(self) -> (SyntaxTree, Vec<Diagnostic>) {
        (self.tree, self.diagnostics)
    }
}

pub fn parse(text: &str, dialect: Dialect) -> Parse {
    let mut parser = parser::Parser::new(text, dialect);
    grammar::stmts::file_input(&mut parser);
    let (tree, diagnostics) = parser.finish();
    Parse { tree, diagnostics }
}
