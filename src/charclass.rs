//! Character classes: bracket expressions, \w-style escapes, and POSIX classes.
//!
//! A class is a 256-bit bitmap plus, for locale-sensitive classes, a list of
//! named classes and a fold bit that are consulted at match time. Classes
//! compiled without the locale flag have folding, inversion and named classes
//! baked into the bitmap.

use crate::bytesearch::ByteBitmap;
use crate::folds::{other_case, FoldTable};
use core::fmt;

/// A named class, either POSIX `[:name:]` or one of the Perl escapes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PosixClass {
    /// \w, and `[:word:]`.
    Word,
    Alnum,
    Alpha,
    Ascii,
    Blank,
    Cntrl,
    /// \d, and `[:digit:]`.
    Digit,
    Graph,
    Lower,
    Print,
    Punct,
    /// \s: space, tab, newline, carriage return, form feed.
    PerlSpace,
    /// `[:space:]`, which also includes vertical tab.
    Space,
    Upper,
    XDigit,
}

impl PosixClass {
    /// Look up a POSIX class by the name between `[:` and `:]`.
    pub fn from_name(name: &[u8]) -> Option<PosixClass> {
        Some(match name {
            b"alnum" => PosixClass::Alnum,
            b"alpha" => PosixClass::Alpha,
            b"ascii" => PosixClass::Ascii,
            b"blank" => PosixClass::Blank,
            b"cntrl" => PosixClass::Cntrl,
            b"digit" => PosixClass::Digit,
            b"graph" => PosixClass::Graph,
            b"lower" => PosixClass::Lower,
            b"print" => PosixClass::Print,
            b"punct" => PosixClass::Punct,
            b"space" => PosixClass::Space,
            b"upper" => PosixClass::Upper,
            b"word" => PosixClass::Word,
            b"xdigit" => PosixClass::XDigit,
            _ => return None,
        })
    }

    /// \return whether byte \p b is in this class under ASCII rules.
    #[inline]
    pub fn matches_ascii(self, b: u8) -> bool {
        match self {
            PosixClass::Word => b.is_ascii_alphanumeric() || b == b'_',
            PosixClass::Alnum => b.is_ascii_alphanumeric(),
            PosixClass::Alpha => b.is_ascii_alphabetic(),
            PosixClass::Ascii => b.is_ascii(),
            PosixClass::Blank => b == b' ' || b == b'\t',
            PosixClass::Cntrl => b.is_ascii_control(),
            PosixClass::Digit => b.is_ascii_digit(),
            PosixClass::Graph => b.is_ascii_graphic(),
            PosixClass::Lower => b.is_ascii_lowercase(),
            PosixClass::Print => b.is_ascii_graphic() || b == b' ',
            PosixClass::Punct => b.is_ascii_punctuation(),
            PosixClass::PerlSpace => matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C),
            PosixClass::Space => matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C),
            PosixClass::Upper => b.is_ascii_uppercase(),
            PosixClass::XDigit => b.is_ascii_hexdigit(),
        }
    }

    /// \return whether byte \p b is in this class under ISO-8859-1 rules.
    pub fn matches_locale(self, b: u8) -> bool {
        if b.is_ascii() {
            return self.matches_ascii(b);
        }
        match self {
            PosixClass::Word | PosixClass::Alnum | PosixClass::Alpha => latin1_alpha(b),
            PosixClass::Lower => latin1_lower(b),
            PosixClass::Upper => (0xC0..=0xDE).contains(&b) && b != 0xD7,
            PosixClass::Punct => latin1_punct(b),
            PosixClass::Graph => latin1_alpha(b) || latin1_punct(b),
            PosixClass::Print => b >= 0xA0,
            PosixClass::Cntrl => b < 0xA0,
            PosixClass::Ascii
            | PosixClass::Blank
            | PosixClass::Digit
            | PosixClass::PerlSpace
            | PosixClass::Space
            | PosixClass::XDigit => false,
        }
    }

    /// \return whether byte \p b is in this class, using the given table.
    #[inline]
    pub fn matches(self, b: u8, table: FoldTable) -> bool {
        match table {
            FoldTable::Ascii => self.matches_ascii(b),
            FoldTable::Locale => self.matches_locale(b),
        }
    }
}

fn latin1_lower(b: u8) -> bool {
    matches!(b, 0xAA | 0xB5 | 0xBA) || ((0xDF..=0xFF).contains(&b) && b != 0xF7)
}

fn latin1_alpha(b: u8) -> bool {
    latin1_lower(b) || ((0xC0..=0xDE).contains(&b) && b != 0xD7)
}

fn latin1_punct(b: u8) -> bool {
    ((0xA1..=0xBF).contains(&b) && !matches!(b, 0xAA | 0xB5 | 0xBA)) || b == 0xD7 || b == 0xF7
}

/// A compiled class.
#[derive(Clone, PartialEq, Eq)]
pub struct CharClass {
    bitmap: ByteBitmap,

    // Named classes tested at match time. Only populated for locale classes.
    classes: Vec<(PosixClass, bool)>,

    // Invert the result at match time. Only set for locale classes.
    invert: bool,

    // Also test the locale other-case of the byte. Only set for locale classes.
    fold: bool,
}

impl CharClass {
    /// \return whether the class matches byte \p b.
    #[inline]
    pub fn matches(&self, b: u8) -> bool {
        let mut m = self.bitmap.contains(b);
        if !m && self.fold {
            m = self.bitmap.contains(other_case(b, FoldTable::Locale));
        }
        if !m {
            m = self
                .classes
                .iter()
                .any(|&(class, negated)| class.matches_locale(b) != negated);
        }
        m != self.invert
    }

    /// \return whether this class must be evaluated with locale tables.
    pub fn is_locale(&self) -> bool {
        self.fold || self.invert || !self.classes.is_empty()
    }

    /// \return the set of all bytes this class matches.
    pub fn to_bitmap(&self) -> ByteBitmap {
        if !self.is_locale() {
            return self.bitmap;
        }
        let mut result = ByteBitmap::default();
        for b in 0..=255u8 {
            if self.matches(b) {
                result.set(b)
            }
        }
        result
    }

    /// \return the only byte this class matches, if it matches exactly one.
    pub fn single_byte(&self) -> Option<u8> {
        let bm = self.to_bitmap();
        if bm.count_bits() == 1 {
            bm.to_vec().first().copied()
        } else {
            None
        }
    }

    /// \return whether this class matches no byte at all.
    pub fn is_empty(&self) -> bool {
        self.to_bitmap().count_bits() == 0
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invert {
            write!(f, "^")?;
        }
        write!(f, "{:?}", self.bitmap)?;
        for (class, negated) in &self.classes {
            write!(f, " [:{}{:?}:]", if *negated { "^" } else { "" }, class)?;
        }
        if self.fold {
            write!(f, " fold")?;
        }
        Ok(())
    }
}

/// Accumulates the members of a bracket expression.
#[derive(Debug, Clone)]
pub struct CharClassBuilder {
    bitmap: ByteBitmap,
    classes: Vec<(PosixClass, bool)>,
    invert: bool,
    icase: bool,
    locale: bool,
}

impl CharClassBuilder {
    pub fn new(invert: bool, icase: bool, locale: bool) -> Self {
        CharClassBuilder {
            bitmap: ByteBitmap::default(),
            classes: Vec::new(),
            invert,
            icase,
            locale,
        }
    }

    pub fn add_byte(&mut self, b: u8) {
        self.bitmap.set(b)
    }

    /// Add an inclusive range. The caller has checked lo <= hi.
    pub fn add_range(&mut self, lo: u8, hi: u8) {
        debug_assert!(lo <= hi, "Range should be ordered");
        for b in lo..=hi {
            self.bitmap.set(b)
        }
    }

    /// Add a named class, possibly negated as in `\W` or `[:^alpha:]`.
    pub fn add_class(&mut self, class: PosixClass, negated: bool) {
        if self.locale {
            self.classes.push((class, negated));
            return;
        }
        for b in 0..=255u8 {
            if class.matches_ascii(b) != negated {
                self.bitmap.set(b)
            }
        }
    }

    pub fn build(self) -> CharClass {
        let CharClassBuilder {
            mut bitmap,
            classes,
            invert,
            icase,
            locale,
        } = self;
        if locale {
            return CharClass {
                bitmap,
                classes,
                invert,
                fold: icase,
            };
        }
        if icase {
            for b in bitmap.to_vec() {
                bitmap.set(other_case(b, FoldTable::Ascii))
            }
        }
        if invert {
            bitmap.bitnot();
        }
        CharClass {
            bitmap,
            classes: Vec::new(),
            invert: false,
            fold: false,
        }
    }
}

/// Build the class for a Perl escape like \d or \W.
pub fn escape_class(class: PosixClass, negated: bool, locale: bool) -> CharClass {
    let mut builder = CharClassBuilder::new(false, false, locale);
    builder.add_class(class, negated);
    builder.build()
}
