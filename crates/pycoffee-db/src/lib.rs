use camino::Utf8PathBuf;
pub use line_index::LineIndex;
pub use pycoffee_errors::Diagnostic;
pub use pycoffee_tokenizer::Dialect;
use salsa::{Accumulator as _, Database};

#[salsa::db]
#[derive(Default, Clone)]
pub struct RootDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl Database for RootDatabase {}

#[salsa::input(debug)]
pub struct File {
    #[returns(ref)]
    pub path: Utf8PathBuf,
    #[returns(deref)]
    pub text: String,
    pub dialect: Dialect,
}

#[salsa::tracked]
impl File {
    #[salsa::tracked(returns(ref), no_eq)]
    pub fn line_index(self, db: &dyn Database) -> LineIndex {
        LineIndex::new(self.text(db))
    }
}

/// Parses and converts `file`, accumulating every [`Diagnostic`] on the way.
///
/// Syntax errors do not stop the conversion, the error subtrees are copied
/// through. Returns `None` when the tree breaks an assumption of the
/// rewrite rules.
#[salsa::tracked]
pub fn convert_file(db: &dyn Database, file: File) -> Option<String> {
    let _span = tracing::debug_span!("convert_file", path = %file.path(db)).entered();

    let (tree, diagnostics) = pycoffee_parse::parse(file.text(db), file.dialect(db)).into_parts();
    for diagnostic in diagnostics {
        diagnostic.accumulate(db);
    }

    match pycoffee_convert::convert(tree) {
        Ok(conversion) => {
            tracing::debug!(warnings = conversion.diagnostics.len(), "converted");
            for diagnostic in conversion.diagnostics {
                diagnostic.accumulate(db);
            }
            Some(conversion.text)
        }
        Err(err) => {
            tracing::debug!(%err, "conversion failed");
            Diagnostic::error(err.to_string(), err.range()).accumulate(db);
            None
        }
    }
}

/// Diagnostics of [`convert_file`], in the order they were raised.
pub fn diagnostics(db: &dyn Database, file: File) -> Vec<Diagnostic> {
    convert_file::accumulated::<Diagnostic>(db, file).into_iter().cloned().collect()
}
