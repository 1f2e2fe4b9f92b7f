//! Single byte matchers, used for simple nodes and for the bodies of the
//! single byte loops.

use crate::charclass::{CharClass, PosixClass};
use crate::folds::FoldTable;
use crate::matchers;

/// A trait for things that match a single byte.
pub trait SingleByteMatcher {
    /// \return whether we match the byte at the given position, advancing
    /// the position if so. On a false return, the position is unchanged.
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool;
}

/// Shared logic: test the byte at \p pos and advance on success.
#[inline(always)]
fn advance_if<F: Fn(u8) -> bool>(input: &[u8], pos: &mut usize, f: F) -> bool {
    match input.get(*pos) {
        Some(&b) if f(b) => {
            *pos += 1;
            true
        }
        _ => false,
    }
}

/// Op::Exact of length 1.
pub struct Byte {
    pub b: u8,
}

impl SingleByteMatcher for Byte {
    #[inline(always)]
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool {
        advance_if(input, pos, |b| b == self.b)
    }
}

/// Op::ExactFold and Op::ExactFoldLocale of length 1. The byte is folded.
pub struct ByteFold {
    pub b: u8,
    pub table: FoldTable,
}

impl SingleByteMatcher for ByteFold {
    #[inline(always)]
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool {
        advance_if(input, pos, |b| self.table.fold(b) == self.b)
    }
}

/// Op::AnyOf
pub struct Class<'a> {
    pub cc: &'a CharClass,
}

impl SingleByteMatcher for Class<'_> {
    #[inline(always)]
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool {
        advance_if(input, pos, |b| self.cc.matches(b))
    }
}

/// Op::SAny
pub struct AnyByte;

impl SingleByteMatcher for AnyByte {
    #[inline(always)]
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool {
        advance_if(input, pos, |_| true)
    }
}

/// Op::ReAny
pub struct AnyExceptNewline;

impl SingleByteMatcher for AnyExceptNewline {
    #[inline(always)]
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool {
        advance_if(input, pos, |b| b != b'\n')
    }
}

/// Op::Alnum, Op::Space and Op::Digit.
pub struct Escape {
    pub class: PosixClass,
    pub invert: bool,
    pub table: FoldTable,
}

impl Escape {
    pub fn new(class: PosixClass, invert: bool, locale: bool) -> Escape {
        Escape {
            class,
            invert,
            table: matchers::table_for(locale),
        }
    }
}

impl SingleByteMatcher for Escape {
    #[inline(always)]
    fn matches(&self, input: &[u8], pos: &mut usize) -> bool {
        advance_if(input, pos, |b| self.class.matches(b, self.table) != self.invert)
    }
}
