/// Outermost operator of an expression, ordered from loosest to tightest.
///
/// Comparing two values answers whether an expression needs parentheses
/// when spliced under another operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Lambda,
    If,
    Or,
    And,
    Not,
    /// `in`, `not in`, `is`, `is not`, the ordering operators and `instanceof`.
    Comparison,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Power,
    Await,
    /// Subscription, attribute access, calls and bracketed displays.
    Access,
    /// Names and literals.
    Atom,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "lambda" => Self::Lambda,
            "if" => Self::If,
            "or" => Self::Or,
            "and" => Self::And,
            "not" => Self::Not,
            "in" | "not in" | "is" | "is not" | "not is" | "isnt" | "<" | "<=" | ">" | ">="
            | "!=" | "<>" | "==" | "instanceof" => Self::Comparison,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&" => Self::BitAnd,
            "<<" | ">>" => Self::Shift,
            "+" | "-" => Self::Additive,
            "*" | "/" | "//" | "%" | "@" => Self::Multiplicative,
            "u+" | "u-" | "~" => Self::Unary,
            "**" => Self::Power,
            "await" => Self::Await,
            "[" | "." | "(" | "{" => Self::Access,
            _ => return None,
        };
        Some(op)
    }

    pub const fn binding_power(self) -> u8 {
        self as u8
    }

    pub fn binds_looser_than(self, other: Self) -> bool {
        self.binding_power() < other.binding_power()
    }
}

#[cfg(test)]
mod tests {
    use super::Operator;

    #[test]
    fn table_is_totally_ordered() {
        let ladder = [
            "lambda", "if", "or", "and", "not", "in", "|", "^", "&", "<<", "+", "*", "~", "**",
            "await", ".",
        ];
        let ops = ladder.map(|symbol| Operator::from_symbol(symbol).unwrap());
        for pair in ops.windows(2) {
            assert!(pair[0].binds_looser_than(pair[1]), "{:?} vs {:?}", pair[0], pair[1]);
        }
        assert_eq!(Operator::Atom.binding_power(), 16);
    }

    #[test]
    fn comparison_spellings_share_a_level() {
        for symbol in ["not in", "is not", "isnt", "<>", "instanceof", ">="] {
            assert_eq!(Operator::from_symbol(symbol), Some(Operator::Comparison), "{symbol}");
        }
        assert_eq!(Operator::from_symbol(","), None);
        assert_eq!(Operator::from_symbol("x"), None);
    }
}
