//! Byte case folding.
//!
//! Two tables are supported: plain ASCII, and the ISO-8859-1 table used when a
//! regex is compiled with the locale flag.

/// Which case table a comparison uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FoldTable {
    Ascii,
    Locale,
}

/// \return whether a byte is an uppercase letter in ISO-8859-1.
#[inline(always)]
fn is_upper_latin1(b: u8) -> bool {
    b.is_ascii_uppercase() || ((0xC0..=0xDE).contains(&b) && b != 0xD7)
}

/// \return whether a byte is a lowercase letter with an uppercase partner in
/// ISO-8859-1. Note 0xDF and 0xFF have no single byte uppercase.
#[inline(always)]
fn is_lower_latin1(b: u8) -> bool {
    b.is_ascii_lowercase() || ((0xE0..=0xFE).contains(&b) && b != 0xF7)
}

/// Fold a byte to lowercase using ASCII rules.
#[inline(always)]
pub fn fold_ascii(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

/// Fold a byte to lowercase using ISO-8859-1 rules.
#[inline(always)]
pub fn fold_latin1(b: u8) -> u8 {
    if is_upper_latin1(b) {
        b + 0x20
    } else {
        b
    }
}

/// \return the other-case partner of a byte, or the byte itself.
#[inline]
pub fn other_case(b: u8, table: FoldTable) -> u8 {
    match table {
        FoldTable::Ascii if b.is_ascii_uppercase() => b + 0x20,
        FoldTable::Ascii if b.is_ascii_lowercase() => b - 0x20,
        FoldTable::Locale if is_upper_latin1(b) => b + 0x20,
        FoldTable::Locale if is_lower_latin1(b) => b - 0x20,
        _ => b,
    }
}

impl FoldTable {
    /// Fold a byte using this table.
    #[inline(always)]
    pub fn fold(self, b: u8) -> u8 {
        match self {
            FoldTable::Ascii => fold_ascii(b),
            FoldTable::Locale => fold_latin1(b),
        }
    }

    /// \return whether two bytes are equal after folding.
    #[inline(always)]
    pub fn eq(self, a: u8, b: u8) -> bool {
        a == b || self.fold(a) == self.fold(b)
    }

    /// \return whether two equal-length slices are equal after folding.
    pub fn eq_slices(self, a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(&x, &y)| self.eq(x, y))
    }

    /// Fold every byte of a literal.
    pub fn fold_bytes(self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|&b| self.fold(b)).collect()
    }
}
