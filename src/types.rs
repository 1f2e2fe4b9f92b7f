/// A group index is u16.
/// CaptureGroupID 0 corresponds to the first capture group.
pub type CaptureGroupID = u16;

/// The maximum number of capture groups supported.
pub const MAX_CAPTURE_GROUPS: usize = 65535;

/// The maximum number of loops supported.
pub const MAX_LOOPS: usize = 65535;
pub type LoopID = u16;

/// Quantifier bounds must be strictly less than this.
pub const REG_INFTY: usize = 32767;

/// The deepest group nesting the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

/// An instruction pointer.
pub type IP = usize;

/// Per-match state of a general (CURLYX) loop.
#[derive(Debug, Copy, Clone)]
pub struct LoopData {
    /// Number of iterations entered so far.
    pub iters: usize,

    /// Input position at the start of the current iteration.
    pub entry: usize,
}

impl LoopData {
    pub fn new(entry: usize) -> LoopData {
        LoopData { iters: 0, entry }
    }
}

/// Per-match state of a capture group.
/// `open` is the tentative start recorded when the group is entered; `start`
/// and `end` are only written when the group closes.
#[derive(Debug, Copy, Clone, Default)]
pub struct GroupData {
    pub open: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl GroupData {
    pub fn new() -> GroupData {
        GroupData::default()
    }

    pub fn matched(&self) -> bool {
        self.end.is_some()
    }

    pub fn as_range(&self) -> Option<core::ops::Range<usize>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(start..end),
            _ => None,
        }
    }

    /// Reset the group to "not entered."
    pub fn reset(&mut self) {
        *self = GroupData::default();
    }
}
