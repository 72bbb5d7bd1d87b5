use std::fmt::{self, Display};

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The source could not be parsed as written.
    Error,
    /// The conversion degraded: the output needs a manual look.
    Warning,
}

impl Severity {
    fn level(self) -> Level {
        match self {
            Self::Error => Level::Error,
            Self::Warning => Level::Warning,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warning => "WARN",
        })
    }
}

#[salsa::accumulator]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { severity: Severity::Error, message: message.into(), range }
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Self { severity: Severity::Warning, message: message.into(), range }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let level = self.severity.level();
        let message = level.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(level.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_warning_with_origin() {
        let text = "print >>f, x\n";
        let diagnostic = Diagnostic::warning(
            "no analog of `print >>file` in CoffeeScript",
            TextRange::new(6.into(), 8.into()),
        );

        let rendered = diagnostic.render(&Renderer::plain(), "demo.py", text).to_string();
        assert!(rendered.starts_with("warning: no analog of `print >>file`"), "{rendered}");
        assert!(rendered.contains("demo.py"), "{rendered}");
        assert!(rendered.contains("here"), "{rendered}");
    }

    #[test]
    fn constructors_set_severity() {
        let range = TextRange::empty(0.into());
        assert!(Diagnostic::error("boom", range).is_error());
        assert!(!Diagnostic::warning("hmm", range).is_error());
        assert_eq!(Diagnostic::warning("hmm", range).severity().to_string(), "WARN");
    }
}
