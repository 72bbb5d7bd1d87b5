use std::borrow::Cow;

/// Line break style of an input file, restored on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Newline {
    Lf,
    CrLf,
    Cr,
}

impl Newline {
    /// The style of the first line break; `\n` when there is none.
    pub(crate) fn detect(text: &str) -> Self {
        let Some(index) = text.find(['\r', '\n']) else { return Self::Lf };
        match &text.as_bytes()[index..] {
            [b'\r', b'\n', ..] => Self::CrLf,
            [b'\r', ..] => Self::Cr,
            _ => Self::Lf,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Rewrites every line break to `\n`.
    pub(crate) fn normalize(text: &str) -> Cow<'_, str> {
        if text.contains('\r') {
            Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
        } else {
            Cow::Borrowed(text)
        }
    }

    pub(crate) fn apply(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Lf => Cow::Borrowed(text),
            _ => Cow::Owned(text.replace('\n', self.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_first_line_break() {
        assert_eq!(Newline::detect("a = 1\r\nb = 2\n"), Newline::CrLf);
        assert_eq!(Newline::detect("a = 1\rb = 2\r"), Newline::Cr);
        assert_eq!(Newline::detect("a = 1\n"), Newline::Lf);
        assert_eq!(Newline::detect("a = 1"), Newline::Lf);
    }

    #[test]
    fn normalize_then_apply_restores_style() {
        let text = "if x:\r\n    y()\r\n";
        let normalized = Newline::normalize(text);
        assert_eq!(normalized, "if x:\n    y()\n");
        assert_eq!(Newline::detect(text).apply(&normalized), text);
    }

    #[test]
    fn mixed_breaks_are_all_normalized() {
        assert_eq!(Newline::normalize("a\rb\r\nc\n"), "a\nb\nc\n");
        assert!(matches!(Newline::normalize("a\nb\n"), Cow::Borrowed(_)));
    }
}
