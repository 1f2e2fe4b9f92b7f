use crate::classicalbacktrack::BacktrackExecutor;
use crate::emit;
use crate::error::{CompileError, MatchError};
use crate::exec;
use crate::insn::CompiledRegex;
use crate::optimizer;
use crate::parse;
use crate::study;
use crate::study::StudyData;

use core::{fmt, str::FromStr};
use log::{debug, warn};

/// Compile-time switches for a pattern. Inline `(?imsx-imsx)` groups adjust
/// the first four within their scope.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// Case-insensitive matching.
    /// Equivalent to the 'i' flag in Perl.
    pub icase: bool,

    /// ^ and $ also match around interior newlines.
    /// Equivalent to the 'm' flag in Perl.
    pub multiline: bool,

    /// If set, . matches newlines as well as any other byte.
    /// Equivalent to the 's' flag in Perl.
    pub dot_all: bool,

    /// If set, unescaped whitespace and #-comments in the pattern are ignored.
    /// Equivalent to the 'x' flag in Perl.
    pub extended: bool,

    /// If set, \w, \s, \b, POSIX classes and case folding use ISO-8859-1
    /// rather than ASCII.
    pub locale: bool,

    /// Skip the IR passes. Study still runs.
    pub no_opt: bool,
}

impl Flags {
    /// Construct a Flags from an iterator of flag letters.
    /// 'i' means to ignore case, 'm' means multiline, 's' lets . match newlines,
    /// 'x' means extended syntax and 'l' means locale.
    /// Other letters are ignored.
    #[inline]
    pub fn new<T: Iterator<Item = char>>(chars: T) -> Self {
        let mut result = Self::default();
        for c in chars {
            match c {
                'i' => result.icase = true,
                'm' => result.multiline = true,
                's' => result.dot_all = true,
                'x' => result.extended = true,
                'l' => result.locale = true,
                _ => {
                    // Silently skip unsupported flags.
                }
            }
        }
        result
    }
}

impl From<&str> for Flags {
    /// Construct a Flags from a string of flag letters.
    ///
    /// See also: [`Flags::new`].
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s.chars())
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.icase {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        if self.dot_all {
            f.write_str("s")?;
        }
        if self.extended {
            f.write_str("x")?;
        }
        if self.locale {
            f.write_str("l")?;
        }
        Ok(())
    }
}

/// Range is used to express the extent of a match, as byte offsets into the
/// subject.
pub type Range = core::ops::Range<usize>;

/// An iterator type which yields `Match`es found in a subject.
pub type Matches<'r> = exec::Matches<BacktrackExecutor<'r>>;

/// Per-call options for [`Regex::exec`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Byte offset at which the search begins. Lookbehind and \b may still
    /// look at earlier bytes.
    pub start: usize,

    /// The match must end at least this many bytes past `start`.
    pub end_min: usize,

    /// Give up after this many VM steps. Overrides the regex's own budget.
    pub step_budget: Option<u64>,
}

/// A Match represents a portion of a subject which was found to match a Regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte range of the whole match; empty for a zero-length match.
    pub range: Range,

    /// One entry per capture group, in order of their opening parens.
    /// None means the group was not set on the winning path.
    pub captures: Vec<Option<Range>>,
}

impl Match {
    /// Access a group by index, using the convention of Perl's $0, $1...
    /// Index 0 is the total match, index 1 is the first capture group.
    #[inline]
    pub fn group(&self, idx: usize) -> Option<Range> {
        if idx == 0 {
            Some(self.range.clone())
        } else {
            self.captures.get(idx - 1).cloned().flatten()
        }
    }

    /// A copy of the match range.
    #[inline]
    pub fn range(&self) -> Range {
        self.range.clone()
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Iterate over group 0 followed by each capture group.
    #[inline]
    pub fn groups(&self) -> Groups {
        Groups::new(self)
    }
}

/// Iterator returned by [`Match::groups`].
#[derive(Clone)]
pub struct Groups<'m> {
    mat: &'m Match,
    i: usize,
    max: usize,
}

impl<'m> Groups<'m> {
    #[inline]
    fn new(mat: &'m Match) -> Self {
        Self {
            mat,
            i: 0,
            max: mat.captures.len() + 1,
        }
    }
}

impl Iterator for Groups<'_> {
    type Item = Option<Range>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let i = self.i;
        if i < self.max {
            self.i += 1;
            Some(self.mat.group(i))
        } else {
            None
        }
    }
}

/// Compile `pattern` with `flags`.
pub fn compile(pattern: &str, flags: Flags) -> Result<Regex, CompileError> {
    Regex::with_flags(pattern, flags)
}

/// Search `subject` for the leftmost match beginning at or after `start`
/// whose end is at least `end_min` bytes past `start`.
pub fn find(re: &Regex, subject: &[u8], start: usize, end_min: usize) -> Option<Match> {
    let opts = ExecOptions {
        start,
        end_min,
        step_budget: re.step_budget,
    };
    match re.exec(subject, opts) {
        Ok(m) => m,
        Err(err) => {
            warn!("{}; reporting no match", err);
            None
        }
    }
}

/// A compiled pattern.
/// It is immutable; matching borrows it and keeps all match state on the side,
/// so it may be shared across threads.
#[derive(Debug, Clone)]
pub struct Regex {
    cr: CompiledRegex,
    step_budget: Option<u64>,
}

impl From<CompiledRegex> for Regex {
    fn from(cr: CompiledRegex) -> Self {
        Self {
            cr,
            step_budget: None,
        }
    }
}

impl Regex {
    /// Compile `pattern` with default flags. Compilation parses, optimizes
    /// and studies the pattern, so keep the Regex around when reusing it.
    #[inline]
    pub fn new(pattern: &str) -> Result<Regex, CompileError> {
        Self::with_flags(pattern, Flags::default())
    }

    /// Compile `pattern` with `flags`, given as `Flags` or a letter string.
    pub fn with_flags<F>(pattern: &str, flags: F) -> Result<Regex, CompileError>
    where
        F: Into<Flags>,
    {
        let flags = flags.into();
        let mut ire = parse::try_parse(pattern, flags)?;
        if !flags.no_opt {
            optimizer::optimize(&mut ire);
        }
        let mut cr = emit::emit(&ire);
        study::study(&mut cr);
        debug!(
            "compiled {:?} with flags '{}': {} nodes, {} groups, {} loops, cost {}",
            pattern,
            flags,
            cr.insns.len(),
            cr.groups,
            cr.loops,
            cr.cost
        );
        Ok(Regex::from(cr))
    }

    /// Limit every search to `budget` VM steps. A search that runs out is
    /// reported as no match by `find` and as an error by `exec`.
    #[inline]
    pub fn with_step_budget(mut self, budget: u64) -> Regex {
        self.step_budget = Some(budget);
        self
    }

    /// Leftmost match in `text`.
    #[inline]
    pub fn find(&self, text: &str) -> Option<Match> {
        self.find_bytes(text.as_bytes())
    }

    /// Searches `subject` to find the first match.
    #[inline]
    pub fn find_bytes(&self, subject: &[u8]) -> Option<Match> {
        self.find_at(subject, 0)
    }

    /// Searches `subject` for the first match beginning at or after `start`.
    /// Note this may be different from passing a sliced subject in the case
    /// of lookbehind assertions and anchors.
    #[inline]
    pub fn find_at(&self, subject: &[u8], start: usize) -> Option<Match> {
        find(self, subject, start, 0)
    }

    /// Non-overlapping matches in `text`, left to right.
    #[inline]
    pub fn find_iter<'r>(&'r self, text: &'r str) -> Matches<'r> {
        self.find_iter_bytes(text.as_bytes())
    }

    /// Searches `subject`, returning an iterator over non-overlapping matches.
    #[inline]
    pub fn find_iter_bytes<'r>(&'r self, subject: &'r [u8]) -> Matches<'r> {
        self.find_iter_at(subject, 0)
    }

    /// Returns an iterator for matches found in `subject` starting at byte
    /// index `start`.
    #[inline]
    pub fn find_iter_at<'r>(&'r self, subject: &'r [u8], start: usize) -> Matches<'r> {
        exec::Matches::new(
            BacktrackExecutor::new(&self.cr, subject, self.step_budget),
            start,
        )
    }

    /// Search with explicit options, reporting budget exhaustion as an error.
    pub fn exec(&self, subject: &[u8], opts: ExecOptions) -> Result<Option<Match>, MatchError> {
        if opts.start > subject.len() {
            return Ok(None);
        }
        let budget = opts.step_budget.or(self.step_budget);
        BacktrackExecutor::new(&self.cr, subject, budget).search(opts.start, opts.end_min)
    }

    /// Number of capture groups, not counting the whole match.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.cr.groups as usize
    }

    /// Shortest possible match length.
    #[inline]
    pub fn min_len(&self) -> usize {
        self.cr.study.min_len
    }

    /// Longest possible match length, or None if unbounded.
    #[inline]
    pub fn max_len(&self) -> Option<usize> {
        self.cr.study.max_len
    }

    /// The parser's cost score for the pattern.
    #[inline]
    pub fn cost(&self) -> u32 {
        self.cr.cost
    }

    /// What the study pass learned about the program.
    #[inline]
    pub fn study(&self) -> &StudyData {
        &self.cr.study
    }
}

impl fmt::Display for Regex {
    /// Dumps the program and its study data.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.cr, f)
    }
}

impl FromStr for Regex {
    type Err = CompileError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, CompileError> {
        Self::new(s)
    }
}

// Access to the compiler phases, for the tool and for tests.
#[doc(hidden)]
pub mod backends {
    pub use crate::emit::emit;
    pub use crate::optimizer::optimize;
    pub use crate::parse::try_parse;
    pub use crate::study::study;
}
