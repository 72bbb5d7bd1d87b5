//! Python to CoffeeScript conversion over a lossless syntax tree.
//!
//! The tree is first swept for identifiers that CoffeeScript reserves, then
//! serialized depth first. Each inner node is rewritten in place right
//! before its children are printed, so the output keeps every comment and
//! every bit of whitespace the rules do not touch.

mod comments;
mod converter;
mod error;
mod escape;
mod precedence;
mod rules;
mod strings;
#[cfg(test)]
mod tests;

use pycoffee_errors::Diagnostic;
use pycoffee_syntax::SyntaxTree;

pub use comments::terminate_comments;
pub use converter::Converter;
pub use error::ConvertError;
pub use escape::escape_identifiers;
pub use precedence::top_op;
pub use strings::{
    Regexp, avoid_string_for_interpolation, prepare_string_for_interpolation, regexp_backrefs,
    string_to_regexp,
};

/// CoffeeScript text together with the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts a whole parsed file.
///
/// A construct without a CoffeeScript counterpart yields a warning and is
/// kept close to verbatim. A tree shape the rules rely on being violated
/// fails the whole file.
pub fn convert(mut tree: SyntaxTree) -> Result<Conversion, ConvertError> {
    escape_identifiers(&mut tree);
    let root = tree.root();
    let mut converter = Converter::new(tree);
    let text = converter.recurse(root)?;
    Ok(Conversion { text, diagnostics: converter.into_diagnostics() })
}
