//! Errors reported by the compiler and the matcher.

use core::ops::Range;
use thiserror::Error;

/// The reason a pattern failed to compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Unmatched (")]
    UnmatchedOpen,

    #[error("Unmatched )")]
    UnmatchedClose,

    #[error("Unmatched [")]
    UnmatchedBracket,

    #[error("Quantifier follows nothing")]
    QuantifierFollowsNothing,

    #[error("Nested quantifiers")]
    NestedQuantifiers,

    #[error("Can't do {{n,m}} with n > m")]
    MinGreaterThanMax,

    #[error("Quantifier in {{,}} bigger than {0}")]
    QuantifierTooBig(usize),

    #[error("Reference to nonexistent group")]
    NonexistentGroup,

    #[error("Trailing \\")]
    TrailingBackslash,

    #[error("Missing control char name in \\c")]
    MissingControlChar,

    #[error("Invalid [] range")]
    InvalidRange,

    #[error("Character class [:{0}:] unknown")]
    UnknownPosixClass(String),

    #[error("POSIX syntax [{0} {0}] is reserved for future extensions")]
    ReservedPosixSyntax(char),

    #[error("Sequence (?{0}...) not recognized")]
    UnknownGroupSyntax(char),

    #[error("Sequence (?#... not terminated")]
    UnterminatedComment,

    #[error("Embedded code (?{{...}}) is an unsupported extension")]
    EmbeddedCode,

    #[error("Unknown switch condition (?(...))")]
    BadCondition,

    #[error("Switch (?(condition)... contains too many branches")]
    TooManyBranches,

    #[error("Variable length lookbehind not implemented")]
    VariableLookbehind,

    #[error("Missing right brace on \\x{{}}")]
    MissingBrace,

    #[error("Unsupported escape \\{0}")]
    UnsupportedEscape(char),

    #[error("Code point too large in character class")]
    WideCharInClass,

    #[error("Too many capture groups")]
    TooManyGroups,

    #[error("Too many loops")]
    TooManyLoops,

    #[error("Pattern nested too deeply")]
    NestingTooDeep,
}

/// Represents an error encountered during regex compilation.
///
/// The span covers the pattern text that caused the error, as byte offsets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at offset {}", .span.start)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub span: Range<usize>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Range<usize>) -> CompileError {
        CompileError { kind, span }
    }

    /// The byte offset in the pattern where the error begins.
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// A human-readable description, without the position.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// An error encountered while matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The step budget ran out before the search finished.
    #[error("Step budget of {0} exhausted")]
    BudgetExhausted(u64),
}
