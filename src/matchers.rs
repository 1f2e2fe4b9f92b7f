//! Zero-width tests and backreference comparison.

use crate::charclass::PosixClass;
use crate::folds::FoldTable;
use core::ops::Range;

/// \return the table used for classes and folding.
#[inline(always)]
pub fn table_for(locale: bool) -> FoldTable {
    if locale {
        FoldTable::Locale
    } else {
        FoldTable::Ascii
    }
}

/// \return whether this is a word byte.
#[inline(always)]
pub fn is_word_byte(b: u8, table: FoldTable) -> bool {
    PosixClass::Word.matches(b, table)
}

/// \return whether \p pos sits between a word byte and a non-word byte.
pub fn is_word_boundary(input: &[u8], pos: usize, table: FoldTable) -> bool {
    let prev = pos > 0 && is_word_byte(input[pos - 1], table);
    let curr = input.get(pos).map_or(false, |&b| is_word_byte(b, table));
    prev != curr
}

/// ^ with m: the start, or just after a newline that is not the final byte.
#[inline]
pub fn is_line_start(input: &[u8], pos: usize) -> bool {
    pos == 0 || (input[pos - 1] == b'\n' && pos < input.len())
}

/// $ with m: just before a newline, or the end.
#[inline]
pub fn is_line_end(input: &[u8], pos: usize) -> bool {
    pos == input.len() || input[pos] == b'\n'
}

/// $ without m, and \Z: the end, or just before a final newline.
#[inline]
pub fn is_end_or_final_newline(input: &[u8], pos: usize) -> bool {
    pos == input.len() || (pos + 1 == input.len() && input[pos] == b'\n')
}

/// Check whether the text in \p orig_range appears at \p pos, advancing past it
/// if so.
pub fn backref(input: &[u8], orig_range: Range<usize>, pos: &mut usize) -> bool {
    let len = orig_range.end - orig_range.start;
    match input.get(*pos..*pos + len) {
        Some(candidate) if candidate == &input[orig_range] => {
            *pos += len;
            true
        }
        _ => false,
    }
}

/// Case-insensitive version of backref.
pub fn backref_icase(
    input: &[u8],
    orig_range: Range<usize>,
    pos: &mut usize,
    table: FoldTable,
) -> bool {
    let len = orig_range.end - orig_range.start;
    match input.get(*pos..*pos + len) {
        Some(candidate) if table.eq_slices(candidate, &input[orig_range]) => {
            *pos += len;
            true
        }
        _ => false,
    }
}

/// Compare literal bytes at \p pos, advancing past them if they match.
/// If \p fold is set, \p bytes are already folded with that table.
#[inline]
pub fn literal(input: &[u8], bytes: &[u8], fold: Option<FoldTable>, pos: &mut usize) -> bool {
    let candidate = match input.get(*pos..*pos + bytes.len()) {
        Some(candidate) => candidate,
        None => return false,
    };
    let matched = match fold {
        None => candidate == bytes,
        Some(table) => candidate
            .iter()
            .zip(bytes.iter())
            .all(|(&c, &b)| table.fold(c) == b),
    };
    if matched {
        *pos += bytes.len();
    }
    matched
}
