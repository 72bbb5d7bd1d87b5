use pycoffee_syntax::TextRange;

/// A tree shape the rewrite rules rely on was violated.
///
/// Unlike diagnostics these stop the conversion of the current file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed {construct}: {message}")]
    Structure { construct: &'static str, message: String, range: TextRange },
}

impl ConvertError {
    pub(crate) fn structure(
        construct: &'static str,
        message: impl Into<String>,
        range: TextRange,
    ) -> Self {
        Self::Structure { construct, message: message.into(), range }
    }

    pub fn range(&self) -> TextRange {
        match self {
            Self::Structure { range, .. } => *range,
        }
    }
}
