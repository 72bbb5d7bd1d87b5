use crate::SyntaxKind;

const SLOTS: usize = SyntaxKind::TOMBSTONE as usize / u64::BITS as usize + 1;

/// Bitset over [`SyntaxKind`], usable in `const` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntaxSet {
    bits: [u64; SLOTS],
}

impl SyntaxSet {
    pub const EMPTY: Self = Self { bits: [0; SLOTS] };

    const fn slot(kind: SyntaxKind) -> (usize, u64) {
        let kind = kind as usize;
        (kind / u64::BITS as usize, 1 << (kind % u64::BITS as usize))
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut set = Self::EMPTY;
        let mut i = 0;
        while i < N {
            set = set.with(kinds[i]);
            i += 1;
        }
        set
    }

    pub const fn with(mut self, kind: SyntaxKind) -> Self {
        let (slot, mask) = Self::slot(kind);
        self.bits[slot] |= mask;
        self
    }

    pub const fn union(mut self, other: &Self) -> Self {
        let mut i = 0;
        while i < SLOTS {
            self.bits[i] |= other.bits[i];
            i += 1;
        }
        self
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let (slot, mask) = Self::slot(kind);
        self.bits[slot] & mask != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind::*;

    #[test]
    fn kinds_in_both_slots() {
        const SET: SyntaxSet = SyntaxSet::new([NAME, YIELD_EXPR, ERROR_NODE]);
        assert!(SET.contains(NAME));
        assert!(SET.contains(YIELD_EXPR));
        assert!(SET.contains(ERROR_NODE));
        assert!(!SET.contains(KEYWORD));
        assert!(!SET.contains(SLICEOP));
    }

    #[test]
    fn union_keeps_members() {
        let set = SyntaxSet::new([IF_STMT]).union(&SyntaxSet::new([WHILE_STMT]));
        assert!(set.contains(IF_STMT) && set.contains(WHILE_STMT));
        assert_eq!(SyntaxSet::EMPTY, SyntaxSet::default());
    }
}
