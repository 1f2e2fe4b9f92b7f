//! Program nodes for a compiled regex.
//!
//! A program is a flat vector of instructions. Each instruction carries an
//! opcode and a forward offset to the instruction that follows it in
//! sequence; bodies of loops, lookarounds and branches sit immediately after
//! their owning instruction.

use crate::api;
use crate::charclass::CharClass;
use crate::study::StudyData;
use crate::types::{CaptureGroupID, LoopID, IP};
use core::fmt;

/// An absolute instruction index.
pub type JumpTarget = usize;

/// Bounds and greediness shared by the counted loop forms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoopFields {
    pub min_iters: usize,
    /// usize::MAX means unbounded.
    pub max_iters: usize,
    pub greedy: bool,
}

/// What an IfThen tests.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IfCondition {
    /// Whether the group has matched.
    Group(CaptureGroupID),

    /// Whether the assertion whose body follows the IfThen succeeds.
    Assertion {
        negate: bool,
        behind: Option<usize>,
    },
}

/// The list of opcodes.
#[derive(Debug, Clone)]
pub enum Op {
    /// End of the program. Success if the minimum end position was reached.
    End,

    /// End of a sub-program (lookaround, independent group, CURLYM body).
    /// Always accepts.
    Succeed,

    /// Match the empty string.
    Nothing,

    /// Join point after a set of branches.
    Tail,

    /// Unconditional join at the end of a conditional's yes arm.
    LongJump,

    /// Always fails.
    Fail,

    /// Start of the subject: ^ without m, and \A.
    SBol,

    /// Start of a line: ^ with m.
    MBol,

    /// End of the subject or before a final newline: $ without m, and \Z.
    SEol,

    /// End of a line: $ with m.
    MEol,

    /// Very end of the subject: \z.
    Eos,

    /// Where the search began: \G.
    GPos,

    /// \b or \B.
    Bound { invert: bool, locale: bool },

    /// Literal bytes.
    Exact(Box<[u8]>),

    /// Literal bytes compared with ASCII folding. The bytes are pre-folded.
    ExactFold(Box<[u8]>),

    /// Literal bytes compared with ISO-8859-1 folding. The bytes are pre-folded.
    ExactFoldLocale(Box<[u8]>),

    /// One byte from a class.
    AnyOf(Box<CharClass>),

    /// Any byte except newline.
    ReAny,

    /// Any byte.
    SAny,

    /// \w and \W.
    Alnum { invert: bool, locale: bool },

    /// \s and \S.
    Space { invert: bool, locale: bool },

    /// \d and \D.
    Digit { invert: bool },

    /// One alternative. The body follows; `next` reaches the next Branch or
    /// the Tail that joins them.
    Branch,

    /// Enter a capture group.
    Open(CaptureGroupID),

    /// Exit a capture group.
    Close(CaptureGroupID),

    /// Greedy `*` over the single-byte node that follows.
    Star,

    /// Greedy `+` over the single-byte node that follows.
    Plus,

    /// Counted loop over the single-byte node that follows.
    Curly(LoopFields),

    /// Counted loop over a single-byte node wrapped in a capture group.
    CurlyN {
        fields: LoopFields,
        group: CaptureGroupID,
    },

    /// Counted loop over a fixed-width, capture-free body ending in Succeed.
    CurlyM { fields: LoopFields, width: usize },

    /// General loop. The body follows and ends in a WhileM.
    CurlyX { fields: LoopFields, loop_id: LoopID },

    /// End of a general loop's body; `begin` is its CurlyX.
    WhileM { begin: JumpTarget },

    /// Backreference.
    Ref(CaptureGroupID),

    /// Backreference with ASCII folding.
    RefFold(CaptureGroupID),

    /// Backreference with ISO-8859-1 folding.
    RefFoldLocale(CaptureGroupID),

    /// Positive lookaround. The body follows and ends in Succeed.
    IfMatch { behind: Option<usize> },

    /// Negative lookaround. The body follows and ends in Succeed.
    UnlessM { behind: Option<usize> },

    /// Independent subexpression. The body follows and ends in Succeed.
    Suspend,

    /// Conditional. An assertion body, if any, follows and ends in Succeed.
    IfThen {
        cond: IfCondition,
        yes: JumpTarget,
        no: JumpTarget,
    },
}

impl Op {
    /// \return whether this op always consumes exactly one byte and may be the
    /// body of a Star, Plus, Curly or CurlyN.
    pub fn is_single_byte(&self) -> bool {
        match self {
            Op::Exact(bytes) | Op::ExactFold(bytes) | Op::ExactFoldLocale(bytes) => {
                bytes.len() == 1
            }
            Op::AnyOf(..)
            | Op::ReAny
            | Op::SAny
            | Op::Alnum { .. }
            | Op::Space { .. }
            | Op::Digit { .. } => true,
            _ => false,
        }
    }
}

/// A node in a program.
#[derive(Debug, Clone)]
pub struct Insn {
    pub op: Op,

    /// Forward offset to the next node in sequence; 0 means none.
    pub next: u32,
}

impl Insn {
    pub fn new(op: Op) -> Insn {
        Insn { op, next: 0 }
    }
}

/// A compiled program plus what the study pass learned about it.
#[derive(Debug, Clone)]
pub struct CompiledRegex {
    /// Sequence of instructions. The first instruction is the entry point.
    pub insns: Vec<Insn>,

    /// Number of capture groups, not counting the whole match.
    pub groups: u16,

    /// Number of general loops.
    pub loops: u16,

    /// Flags the regex was compiled with.
    pub flags: api::Flags,

    /// The parser's cost score.
    pub cost: u32,

    /// Hints for the search driver.
    pub study: StudyData,
}

impl CompiledRegex {
    /// \return the node following \p ip in sequence, if any.
    #[inline(always)]
    pub fn next(&self, ip: IP) -> Option<IP> {
        match self.insns[ip].next {
            0 => None,
            off => Some(ip + off as usize),
        }
    }

    /// \return the node following \p ip. It is a bug for there to be none.
    #[inline(always)]
    pub fn follow(&self, ip: IP) -> IP {
        match self.next(ip) {
            Some(next) => next,
            None => rs_unreachable!("Node has no successor"),
        }
    }
}

impl fmt::Display for CompiledRegex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ip, insn) in self.insns.iter().enumerate() {
            match self.next(ip) {
                Some(next) => writeln!(f, "{:4}: {:?} -> {}", ip, insn.op, next)?,
                None => writeln!(f, "{:4}: {:?}", ip, insn.op)?,
            }
        }
        write!(f, "{:?}", self.study)
    }
}
