//! Fixed-width text comparison: padding trim, collation ordering, LIKE.

use std::cmp::Ordering;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Collation of a text column.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Collation {
    /// Bytewise after trimming NUL padding. Values equal under this collation
    /// have identical stored bytes.
    #[default]
    Binary = 0,
    /// ASCII case-insensitive; trailing NULs and spaces are padding.
    CaseInsensitive = 1,
}

impl Collation {
    #[inline]
    pub fn is_binary(self) -> bool {
        self == Collation::Binary
    }

    /// Strip trailing padding.
    pub fn trim(self, bytes: &[u8]) -> &[u8] {
        let keep = match self {
            Collation::Binary => bytes.iter().rposition(|&b| b != 0),
            Collation::CaseInsensitive => bytes.iter().rposition(|&b| b != 0 && b != b' '),
        };
        &bytes[..keep.map_or(0, |i| i + 1)]
    }

    #[inline]
    fn fold(self, b: u8) -> u8 {
        match self {
            Collation::Binary => b,
            Collation::CaseInsensitive => b.to_ascii_lowercase(),
        }
    }

    /// Order two stored values after trimming their padding.
    pub fn compare(self, a: &[u8], b: &[u8]) -> Ordering {
        let a = self.trim(a);
        let b = self.trim(b);
        match self {
            Collation::Binary => a.cmp(b),
            Collation::CaseInsensitive => a
                .iter()
                .map(|&c| self.fold(c))
                .cmp(b.iter().map(|&c| self.fold(c))),
        }
    }

    /// SQL `LIKE`: `%` matches any run, `_` one byte, `\` escapes the next byte.
    /// Both operands have their NUL padding trimmed first.
    pub fn like(self, subject: &[u8], pattern: &[u8]) -> bool {
        let subject = Collation::Binary.trim(subject);
        let pattern = Collation::Binary.trim(pattern);
        let (mut s, mut p) = (0usize, 0usize);
        // Pattern position after the last `%` and the subject position it resumed at.
        let mut backtrack: Option<(usize, usize)> = None;
        while s < subject.len() {
            let step = match pattern.get(p) {
                Some(b'%') => {
                    backtrack = Some((p + 1, s));
                    p += 1;
                    continue;
                }
                Some(b'_') => Some(1),
                Some(b'\\') if p + 1 < pattern.len() => {
                    (self.fold(pattern[p + 1]) == self.fold(subject[s])).then_some(2)
                }
                Some(&c) => (self.fold(c) == self.fold(subject[s])).then_some(1),
                None => None,
            };
            match (step, backtrack) {
                (Some(n), _) => {
                    s += 1;
                    p += n;
                }
                (None, Some((bp, bs))) => {
                    p = bp;
                    s = bs + 1;
                    backtrack = Some((bp, bs + 1));
                }
                (None, None) => return false,
            }
        }
        pattern[p..].iter().all(|&c| c == b'%')
    }
}
