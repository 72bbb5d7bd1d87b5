use std::fmt;
use std::str::FromStr;

/// Python language version the source is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dialect {
    pub major: u8,
    pub minor: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Python version `{0}`, expected N.N (e.g. 2.7)")]
pub struct ParseDialectError(String);

impl Default for Dialect {
    fn default() -> Self {
        Self::new(3, 6)
    }
}

impl Dialect {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// `print` and `exec` are statements; `True`, `False`, `None` are names.
    pub fn print_statement(self) -> bool {
        self.major < 3
    }

    pub fn is_keyword(self, word: &str) -> bool {
        const COMMON: &[&str] = &[
            "and", "as", "assert", "break", "class", "continue", "def", "del", "elif", "else",
            "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
            "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
        ];
        const PYTHON2: &[&str] = &["exec", "print"];
        const PYTHON3: &[&str] = &["False", "None", "True", "async", "await", "nonlocal"];

        COMMON.contains(&word)
            || if self.print_statement() { PYTHON2 } else { PYTHON3 }.contains(&word)
    }
}

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseDialectError(s.to_owned());
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        let major: u8 = major.parse().ok().ok_or_else(error)?;
        let minor: u8 = minor.parse().ok().ok_or_else(error)?;
        if !(2..=3).contains(&major) {
            return Err(error());
        }
        Ok(Self { major, minor })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versions() {
        assert_eq!("2.7".parse(), Ok(Dialect::new(2, 7)));
        assert_eq!("3".parse(), Ok(Dialect::new(3, 0)));
        assert_eq!(Dialect::default().to_string(), "3.6");
        assert!("4.0".parse::<Dialect>().is_err());
        assert!("three".parse::<Dialect>().is_err());
    }

    #[test]
    fn keywords_follow_version() {
        let py2 = Dialect::new(2, 7);
        let py3 = Dialect::default();
        assert!(py2.is_keyword("print") && !py3.is_keyword("print"));
        assert!(!py2.is_keyword("None") && py3.is_keyword("None"));
        assert!(py2.is_keyword("lambda") && py3.is_keyword("lambda"));
        assert!(!py3.is_keyword("self"));
    }
}
