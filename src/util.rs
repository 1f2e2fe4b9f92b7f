use core::ops::{Index, IndexMut};
use core::slice::SliceIndex;

// Marks a state the compiler never produces. Reaching it is a bug.
macro_rules! rs_unreachable {
    () => {{
        unreachable!()
    }};
    ($msg:expr) => {
        unreachable!($msg)
    };
}

/// A trait for indexing compiler-produced tables.
/// An out of bounds index means the program is corrupt, so these panic with a
/// message that says so rather than the generic slice message.
pub trait DebugCheckIndex<Idx>: Index<Idx> + IndexMut<Idx> {
    fn iat(&self, index: Idx) -> &Self::Output;
    fn mat(&mut self, index: Idx) -> &mut Self::Output;
}

impl<Idx, T> DebugCheckIndex<Idx> for Vec<T>
where
    Idx: SliceIndex<[T]> + Clone,
{
    #[inline(always)]
    fn iat(&self, idx: Idx) -> &Self::Output {
        match self.get(idx) {
            Some(v) => v,
            None => panic!("Program index out of bounds"),
        }
    }

    #[inline(always)]
    fn mat(&mut self, idx: Idx) -> &mut Self::Output {
        match self.get_mut(idx) {
            Some(v) => v,
            None => panic!("Program index out of bounds"),
        }
    }
}

impl<Idx, T> DebugCheckIndex<Idx> for [T]
where
    Idx: SliceIndex<[T]> + Clone,
{
    #[inline(always)]
    fn iat(&self, idx: Idx) -> &Self::Output {
        match self.get(idx) {
            Some(v) => v,
            None => panic!("Program index out of bounds"),
        }
    }

    #[inline(always)]
    fn mat(&mut self, idx: Idx) -> &mut Self::Output {
        match self.get_mut(idx) {
            Some(v) => v,
            None => panic!("Program index out of bounds"),
        }
    }
}

/// Saturating add for optional upper bounds, where None means unbounded.
#[inline]
pub fn add_max(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => a.checked_add(b),
        _ => None,
    }
}

/// Multiply an optional upper bound by an optional count.
#[inline]
pub fn mul_max(a: Option<usize>, count: Option<usize>) -> Option<usize> {
    match (a, count) {
        (Some(0), _) | (_, Some(0)) => Some(0),
        (Some(a), Some(c)) => a.checked_mul(c),
        _ => None,
    }
}
