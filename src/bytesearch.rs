use core::fmt;
use memchr::memmem;

/// Facilities for searching bytes.
pub trait ByteSearcher {
    /// Search for ourselves in a slice of bytes.
    /// The length of the slice is unspecified and may be 0.
    /// \return the next index of ourselves in the slice, or None.
    fn find_in(&self, rhs: &[u8]) -> Option<usize>;
}

/// A helper function for formatting bitmaps, using - ranges.
fn format_bitmap<Func>(name: &str, f: &mut fmt::Formatter<'_>, contains: Func) -> fmt::Result
where
    Func: Fn(u8) -> bool,
{
    write!(f, "{}[", name)?;
    let mut idx = 0;
    let mut maybe_space = "";
    while idx < 256 {
        // Compute the next value not contained.
        let mut end = idx;
        while end < 256 && contains(end as u8) {
            end += 1;
        }
        match end - idx {
            0 => (),
            1 => write!(f, "{}{}", maybe_space, idx)?,
            _ => write!(f, "{}{}-{}", maybe_space, idx, end - 1)?,
        };
        if end > idx {
            maybe_space = " ";
        }
        idx = end + 1
    }
    write!(f, "]")?;
    Ok(())
}

/// A bitmap covering all bytes.
#[derive(Default, Copy, Clone, PartialEq, Eq)]
#[repr(align(4))]
pub struct ByteBitmap([u16; 16]);

impl ByteBitmap {
    /// Construct from a sequence of bytes.
    pub fn new(bytes: &[u8]) -> ByteBitmap {
        let mut bb = ByteBitmap::default();
        for &b in bytes {
            bb.set(b)
        }
        bb
    }

    /// Construct a bitmap with every byte set.
    #[cfg(test)]
    pub fn full() -> ByteBitmap {
        ByteBitmap([0xFFFF; 16])
    }

    /// \return whether this bitmap contains a given byte val.
    #[inline(always)]
    pub fn contains(&self, val: u8) -> bool {
        let byte = val >> 4;
        let bit = val & 0xF;
        (self.0[byte as usize] & (1 << bit)) != 0
    }

    /// Set a bit in this bitmap.
    #[inline(always)]
    pub fn set(&mut self, val: u8) {
        let byte = val >> 4;
        let bit = val & 0xF;
        self.0[byte as usize] |= 1 << bit;
    }

    /// Update ourselves from another bitmap, in place.
    pub fn bitor(&mut self, rhs: &ByteBitmap) {
        for idx in 0..self.0.len() {
            self.0[idx] |= rhs.0[idx];
        }
    }

    /// Invert our bits, in place.
    pub fn bitnot(&mut self) -> &mut Self {
        for val in self.0.iter_mut() {
            *val = !*val;
        }
        self
    }

    /// Count number of set bits.
    pub fn count_bits(&self) -> u32 {
        self.0.iter().map(|v| v.count_ones()).sum()
    }

    /// \return whether every byte is set.
    pub fn is_full(&self) -> bool {
        self.count_bits() == 256
    }

    /// \return all set bytes, as a vec.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_vec(&self) -> Vec<u8> {
        (0..=255).filter(|b| self.contains(*b)).collect()
    }
}

impl ByteSearcher for ByteBitmap {
    #[inline(always)]
    fn find_in(&self, bytes: &[u8]) -> Option<usize> {
        bytes.iter().position(|&b| self.contains(b))
    }
}

impl fmt::Debug for ByteBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_bitmap("ByteBitmap", f, |v| self.contains(v))
    }
}

/// The set of bytes that may begin a match, used by the search driver to
/// skip positions cheaply. Small sets use memchr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartClass {
    One(u8),
    Two([u8; 2]),
    Three([u8; 3]),
    Bitmap(ByteBitmap),
}

impl StartClass {
    /// Build a start class from a bitmap.
    /// \return None if the bitmap contains every byte, since then it skips nothing.
    pub fn from_bitmap(bm: ByteBitmap) -> Option<StartClass> {
        if bm.is_full() {
            return None;
        }
        let bytes = bm.to_vec();
        Some(match *bytes.as_slice() {
            [a] => StartClass::One(a),
            [a, b] => StartClass::Two([a, b]),
            [a, b, c] => StartClass::Three([a, b, c]),
            _ => StartClass::Bitmap(bm),
        })
    }

    #[cfg(test)]
    pub fn contains(&self, b: u8) -> bool {
        match self {
            StartClass::One(x) => b == *x,
            StartClass::Two(xs) => xs.contains(&b),
            StartClass::Three(xs) => xs.contains(&b),
            StartClass::Bitmap(bm) => bm.contains(b),
        }
    }
}

impl ByteSearcher for StartClass {
    #[inline]
    fn find_in(&self, rhs: &[u8]) -> Option<usize> {
        match self {
            StartClass::One(x) => memchr::memchr(*x, rhs),
            StartClass::Two([a, b]) => memchr::memchr2(*a, *b, rhs),
            StartClass::Three([a, b, c]) => memchr::memchr3(*a, *b, *c, rhs),
            StartClass::Bitmap(bm) => bm.find_in(rhs),
        }
    }
}

/// An owned literal searcher for required substrings.
#[derive(Clone)]
pub struct LiteralSearcher {
    bytes: Box<[u8]>,
    finder: memmem::Finder<'static>,
}

impl LiteralSearcher {
    pub fn new(bytes: &[u8]) -> LiteralSearcher {
        LiteralSearcher {
            bytes: bytes.into(),
            finder: memmem::Finder::new(bytes).into_owned(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl ByteSearcher for LiteralSearcher {
    #[inline]
    fn find_in(&self, rhs: &[u8]) -> Option<usize> {
        self.finder.find(rhs)
    }
}

impl fmt::Debug for LiteralSearcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiteralSearcher({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

impl PartialEq for LiteralSearcher {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for LiteralSearcher {}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bitmap(bytes: &[u8]) -> ByteBitmap {
        let mut bm = ByteBitmap::default();
        for &b in bytes {
            bm.set(b)
        }
        bm
    }

    #[test]
    fn bitmap_search() {
        assert_eq!(make_bitmap(&[]).find_in(&[1, 2, 3]), None);
        assert_eq!(make_bitmap(&[]).bitnot().find_in(&[1, 2, 3]), Some(0));
        assert_eq!(make_bitmap(&[1]).bitnot().find_in(&[1, 2, 3]), Some(1));
        assert_eq!(make_bitmap(&[2]).bitnot().find_in(&[1, 2, 3]), Some(0));
        assert_eq!(
            make_bitmap(&[4, 5, 6, 7]).find_in(&[8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20]),
            None
        );
        assert_eq!(
            make_bitmap(&[4, 5, 6, 7])
                .find_in(&[8, 9, 10, 11, 12, 13, 4, 14, 6, 15, 7, 16, 17, 18, 19, 20]),
            Some(6)
        );
        assert!(ByteBitmap::full().is_full());
        assert_eq!(make_bitmap(&[0, 255]).count_bits(), 2);
    }

    #[test]
    fn bitmap_debug() {
        assert_eq!(
            format!("{:?}", make_bitmap(&[1, 2, 3, 7, 255])),
            "ByteBitmap[1-3 7 255]"
        );
    }

    #[test]
    fn start_class_search() {
        let text = b"hello world";
        assert_eq!(StartClass::from_bitmap(ByteBitmap::full()), None);
        let one = StartClass::from_bitmap(make_bitmap(b"w")).unwrap();
        assert_eq!(one, StartClass::One(b'w'));
        assert_eq!(one.find_in(text), Some(6));
        let two = StartClass::from_bitmap(make_bitmap(b"rl")).unwrap();
        assert_eq!(two.find_in(text), Some(2));
        let three = StartClass::from_bitmap(make_bitmap(b"xyd")).unwrap();
        assert_eq!(three.find_in(text), Some(10));
        let many = StartClass::from_bitmap(make_bitmap(b"abcdw")).unwrap();
        assert!(matches!(many, StartClass::Bitmap(_)));
        assert_eq!(many.find_in(text), Some(6));
        assert!(many.contains(b'c'));
        let empty = StartClass::from_bitmap(make_bitmap(b"")).unwrap();
        assert_eq!(empty.find_in(text), None);
    }

    #[test]
    fn literal_search() {
        let text = b"hello world, hello again";
        assert_eq!(LiteralSearcher::new(b"hello").find_in(text), Some(0));
        assert_eq!(LiteralSearcher::new(b"world").find_in(text), Some(6));
        assert_eq!(LiteralSearcher::new(b"again").find_in(text), Some(19));
        assert_eq!(LiteralSearcher::new(b"xyzab").find_in(text), None);
        assert_eq!(LiteralSearcher::new(b"aaaa").find_in(b"baaaaaaaaab"), Some(1));
        assert_eq!(LiteralSearcher::new(&[255, 254]).find_in(&[0, 255, 254]), Some(1));
        assert_eq!(LiteralSearcher::new(b"abc").len(), 3);
    }
}
