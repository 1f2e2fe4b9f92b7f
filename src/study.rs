//! Analysis of a finished program: match length bounds, required substrings,
//! anchoring and the start class. None of it changes what matches; the search
//! driver uses it to skip start positions that cannot succeed.

use crate::bytesearch::{ByteBitmap, LiteralSearcher, StartClass};
use crate::charclass::{escape_class, PosixClass};
use crate::folds::{other_case, FoldTable};
use crate::insn::{CompiledRegex, LoopFields, Op};
use crate::types::IP;
use crate::util::{add_max, mul_max, DebugCheckIndex};
use log::trace;

/// Give up on computing a start class past this nesting.
const START_CLASS_MAX_DEPTH: usize = 32;

/// Where a match may begin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Anchoring {
    /// Anywhere.
    None,

    /// Only at offset 0.
    StartOfText,

    /// Only at the search start or just after a newline.
    /// `implicit` is set when this was inferred from a leading `.*`.
    StartOfLine { implicit: bool },

    /// Only at the search start.
    SearchStart,
}

impl Default for Anchoring {
    fn default() -> Self {
        Anchoring::None
    }
}

/// A literal that every match contains, at an offset from the match start in
/// `min_offset..=max_offset`. A max of None means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSubstring {
    pub searcher: LiteralSearcher,
    pub min_offset: usize,
    pub max_offset: Option<usize>,
}

impl RequiredSubstring {
    /// \return whether the substring sits at a fixed offset.
    pub fn is_anchored(&self) -> bool {
        self.max_offset == Some(self.min_offset)
    }
}

/// What the study pass learned about a program.
#[derive(Debug, Clone, Default)]
pub struct StudyData {
    /// Shortest possible match.
    pub min_len: usize,

    /// Longest possible match, or None if unbounded.
    pub max_len: Option<usize>,

    /// Length bounds of each top-level alternative, or of the whole pattern if
    /// it is not an alternation.
    pub branch_lengths: Vec<(usize, Option<usize>)>,

    pub anchor: Anchoring,

    /// The longest required literal at a fixed offset.
    pub anchored_substr: Option<RequiredSubstring>,

    /// The longest required literal at a variable offset.
    pub floating_substr: Option<RequiredSubstring>,

    /// The required literal the driver checks: the longer of the two above.
    pub check: Option<RequiredSubstring>,

    /// The bytes a match may begin with.
    pub start_class: Option<StartClass>,
}

type Bounds = (usize, Option<usize>);

fn add_bounds(a: Bounds, b: Bounds) -> Bounds {
    (a.0.saturating_add(b.0), add_max(a.1, b.1))
}

fn union_bounds(a: Bounds, b: Bounds) -> Bounds {
    let max = match (a.1, b.1) {
        (Some(x), Some(y)) => Some(x.max(y)),
        _ => None,
    };
    (a.0.min(b.0), max)
}

fn max_iters(fields: &LoopFields) -> Option<usize> {
    if fields.max_iters == usize::MAX {
        None
    } else {
        Some(fields.max_iters)
    }
}

fn loop_bounds(body: Bounds, fields: &LoopFields) -> Bounds {
    (
        body.0.saturating_mul(fields.min_iters),
        mul_max(body.1, max_iters(fields)),
    )
}

/// \return the bounds of the node at \p ip, and the node following the whole
/// construct.
fn node_bounds(cr: &CompiledRegex, ip: IP) -> (Bounds, Option<IP>) {
    let bounds = match &cr.insns.iat(ip).op {
        Op::Exact(bytes) | Op::ExactFold(bytes) | Op::ExactFoldLocale(bytes) => {
            (bytes.len(), Some(bytes.len()))
        }
        Op::AnyOf(..)
        | Op::ReAny
        | Op::SAny
        | Op::Alnum { .. }
        | Op::Space { .. }
        | Op::Digit { .. } => (1, Some(1)),
        Op::Ref(..) | Op::RefFold(..) | Op::RefFoldLocale(..) => (0, None),
        Op::Star => (0, None),
        Op::Plus => (1, None),
        Op::Curly(fields) | Op::CurlyN { fields, .. } => loop_bounds((1, Some(1)), fields),
        Op::CurlyM { fields, width } => loop_bounds((*width, Some(*width)), fields),
        Op::CurlyX { fields, .. } => loop_bounds(seq_bounds(cr, ip + 1), fields),
        Op::Suspend => seq_bounds(cr, ip + 1),
        Op::Branch => {
            let mut result: Option<Bounds> = None;
            let mut branch = ip;
            loop {
                let b = seq_bounds(cr, branch + 1);
                result = Some(result.map_or(b, |r| union_bounds(r, b)));
                let next = cr.follow(branch);
                match cr.insns.iat(next).op {
                    Op::Branch => branch = next,
                    _ => return (result.unwrap_or((0, Some(0))), cr.next(next)),
                }
            }
        }
        &Op::IfThen { yes, no, .. } => {
            let join = cr.follow(ip);
            let b = union_bounds(seq_bounds(cr, yes), seq_bounds(cr, no));
            return (b, cr.next(join));
        }
        _ => (0, Some(0)),
    };
    (bounds, cr.next(ip))
}

/// \return the bounds of the sequence beginning at \p ip, up to the node
/// that terminates it.
fn seq_bounds(cr: &CompiledRegex, start: IP) -> Bounds {
    let mut total = (0, Some(0));
    let mut ip = Some(start);
    while let Some(cur) = ip {
        match cr.insns.iat(cur).op {
            Op::End | Op::Succeed | Op::WhileM { .. } | Op::Tail | Op::LongJump => break,
            _ => {
                let (b, next) = node_bounds(cr, cur);
                total = add_bounds(total, b);
                ip = next;
            }
        }
    }
    total
}

/// \return the bounds of each top-level alternative.
fn branch_lengths(cr: &CompiledRegex) -> Vec<Bounds> {
    if !matches!(cr.insns.iat(0).op, Op::Branch) {
        return vec![seq_bounds(cr, 0)];
    }
    let mut result = Vec::new();
    let mut branch = 0;
    loop {
        result.push(seq_bounds(cr, branch + 1));
        let next = cr.follow(branch);
        match cr.insns.iat(next).op {
            Op::Branch => branch = next,
            _ => {
                // Only a top-level alternation if the join leads to End.
                let top = cr
                    .next(next)
                    .map_or(false, |after| matches!(cr.insns.iat(after).op, Op::End));
                return if top {
                    result
                } else {
                    vec![seq_bounds(cr, 0)]
                };
            }
        }
    }
}

/// \return whether the op at \p ip matches nothing and can be skipped when
/// collecting literal runs.
fn is_zero_width(op: &Op) -> bool {
    matches!(
        op,
        Op::Nothing
            | Op::Open(..)
            | Op::Close(..)
            | Op::SBol
            | Op::MBol
            | Op::SEol
            | Op::MEol
            | Op::Eos
            | Op::GPos
            | Op::Bound { .. }
            | Op::IfMatch { .. }
            | Op::UnlessM { .. }
    )
}

/// Collects literal runs along the main sequence of a program.
#[derive(Debug, Default)]
struct LiteralRuns {
    run: Vec<u8>,
    run_offset: Bounds,
    offset: Bounds,
    found: Vec<(Vec<u8>, Bounds)>,
}

impl LiteralRuns {
    fn extend(&mut self, bytes: &[u8]) {
        if self.run.is_empty() {
            self.run_offset = self.offset;
        }
        self.run.extend_from_slice(bytes);
        self.offset = add_bounds(self.offset, (bytes.len(), Some(bytes.len())));
    }

    fn commit(&mut self) {
        if !self.run.is_empty() {
            let run = core::mem::take(&mut self.run);
            self.found.push((run, self.run_offset));
        }
    }

    fn advance(&mut self, b: Bounds) {
        self.commit();
        self.offset = add_bounds(self.offset, b);
    }

    fn longest(&self, anchored: bool) -> Option<RequiredSubstring> {
        let mut best: Option<&(Vec<u8>, Bounds)> = None;
        for cand in &self.found {
            let is_anchored = cand.1 .1 == Some(cand.1 .0);
            if is_anchored != anchored {
                continue;
            }
            if best.map_or(true, |b| cand.0.len() > b.0.len()) {
                best = Some(cand);
            }
        }
        best.map(|(bytes, (min_offset, max_offset))| RequiredSubstring {
            searcher: LiteralSearcher::new(bytes),
            min_offset: *min_offset,
            max_offset: *max_offset,
        })
    }
}

fn collect_literal_runs(cr: &CompiledRegex) -> LiteralRuns {
    let mut runs = LiteralRuns {
        offset: (0, Some(0)),
        run_offset: (0, Some(0)),
        ..Default::default()
    };
    let mut ip = Some(0);
    while let Some(cur) = ip {
        let op = &cr.insns.iat(cur).op;
        match op {
            Op::End => break,
            Op::Exact(bytes) => {
                runs.extend(bytes);
                ip = cr.next(cur);
            }
            Op::Star | Op::Plus | Op::Curly(..) => {
                let fields = match op {
                    Op::Star => LoopFields {
                        min_iters: 0,
                        max_iters: usize::MAX,
                        greedy: true,
                    },
                    Op::Plus => LoopFields {
                        min_iters: 1,
                        max_iters: usize::MAX,
                        greedy: true,
                    },
                    Op::Curly(fields) => *fields,
                    _ => rs_unreachable!(),
                };
                match &cr.insns.iat(cur + 1).op {
                    // x{3,5} contributes xxx to the current run.
                    Op::Exact(bytes) if fields.min_iters > 0 => {
                        for _ in 0..fields.min_iters {
                            runs.extend(bytes);
                        }
                        if fields.max_iters != fields.min_iters {
                            let extra = max_iters(&fields).map(|m| m - fields.min_iters);
                            runs.advance((0, extra));
                        }
                    }
                    _ => runs.advance(loop_bounds((1, Some(1)), &fields)),
                }
                ip = cr.next(cur);
            }
            _ if is_zero_width(op) => ip = cr.next(cur),
            _ => {
                let (b, next) = node_bounds(cr, cur);
                runs.advance(b);
                ip = next;
            }
        }
    }
    runs.commit();
    runs
}

/// \return whether the program contains a backreference.
fn has_backrefs(cr: &CompiledRegex) -> bool {
    cr.insns
        .iter()
        .any(|insn| matches!(insn.op, Op::Ref(..) | Op::RefFold(..) | Op::RefFoldLocale(..)))
}

fn compute_anchoring(cr: &CompiledRegex) -> Anchoring {
    let mut ip = 0;
    let mut saw_open = false;
    loop {
        match cr.insns.iat(ip).op {
            Op::Open(..) => saw_open = true,
            Op::Nothing => {}
            _ => break,
        }
        match cr.next(ip) {
            Some(next) => ip = next,
            None => return Anchoring::None,
        }
    }
    match cr.insns.iat(ip).op {
        Op::SBol => Anchoring::StartOfText,
        Op::MBol => Anchoring::StartOfLine { implicit: false },
        Op::GPos => Anchoring::SearchStart,
        // A leading .* can only match from the start of a line, so trying
        // later positions on the same line finds nothing new.
        Op::Star if !saw_open || !has_backrefs(cr) => match cr.insns.iat(ip + 1).op {
            Op::ReAny => Anchoring::StartOfLine { implicit: true },
            Op::SAny => Anchoring::SearchStart,
            _ => Anchoring::None,
        },
        _ => Anchoring::None,
    }
}

/// \return the set of bytes a single byte op matches.
fn single_byte_set(op: &Op) -> Option<ByteBitmap> {
    let escape_bitmap = |class, invert, locale| escape_class(class, invert, locale).to_bitmap();
    Some(match op {
        Op::Exact(bytes) => ByteBitmap::new(&bytes[..1]),
        Op::ExactFold(bytes) => ByteBitmap::new(&[bytes[0], other_case(bytes[0], FoldTable::Ascii)]),
        Op::ExactFoldLocale(bytes) => {
            ByteBitmap::new(&[bytes[0], other_case(bytes[0], FoldTable::Locale)])
        }
        Op::AnyOf(cc) => cc.to_bitmap(),
        Op::ReAny => {
            let mut bm = ByteBitmap::new(b"\n");
            bm.bitnot();
            bm
        }
        &Op::Alnum { invert, locale } => escape_bitmap(PosixClass::Word, invert, locale),
        &Op::Space { invert, locale } => escape_bitmap(PosixClass::PerlSpace, invert, locale),
        &Op::Digit { invert } => escape_bitmap(PosixClass::Digit, invert, false),
        _ => return None,
    })
}

fn union(a: Option<ByteBitmap>, b: Option<ByteBitmap>) -> Option<ByteBitmap> {
    let mut a = a?;
    a.bitor(&b?);
    Some(a)
}

/// \return the set of bytes that a match of the sequence at \p ip may begin
/// with, or None if any byte may begin it, or it may match empty.
fn first_bytes(cr: &CompiledRegex, ip: IP, depth: usize) -> Option<ByteBitmap> {
    if depth > START_CLASS_MAX_DEPTH {
        return None;
    }
    let depth = depth + 1;
    let op = &cr.insns.iat(ip).op;
    match op {
        Op::Exact(bytes) | Op::ExactFold(bytes) | Op::ExactFoldLocale(bytes)
            if bytes.is_empty() =>
        {
            first_bytes(cr, cr.next(ip)?, depth)
        }
        Op::Exact(..)
        | Op::ExactFold(..)
        | Op::ExactFoldLocale(..)
        | Op::AnyOf(..)
        | Op::ReAny
        | Op::Alnum { .. }
        | Op::Space { .. }
        | Op::Digit { .. } => single_byte_set(op),
        Op::Fail => Some(ByteBitmap::default()),
        _ if is_zero_width(op) => first_bytes(cr, cr.next(ip)?, depth),
        Op::Tail | Op::LongJump => first_bytes(cr, cr.next(ip)?, depth),
        Op::Branch => {
            let mut result = Some(ByteBitmap::default());
            let mut branch = ip;
            loop {
                result = union(result, first_bytes(cr, branch + 1, depth));
                let next = cr.follow(branch);
                match cr.insns.iat(next).op {
                    Op::Branch => branch = next,
                    _ => return result,
                }
            }
        }
        Op::Star | Op::Plus | Op::Curly(..) | Op::CurlyN { .. } => {
            let min = match op {
                Op::Star => 0,
                Op::Plus => 1,
                Op::Curly(fields) | Op::CurlyN { fields, .. } => fields.min_iters,
                _ => rs_unreachable!(),
            };
            let body = single_byte_set(&cr.insns.iat(ip + 1).op);
            if min > 0 {
                body
            } else {
                union(body, first_bytes(cr, cr.next(ip)?, depth))
            }
        }
        Op::CurlyM { fields, .. } | Op::CurlyX { fields, .. } => {
            let body = first_bytes(cr, ip + 1, depth);
            if fields.min_iters > 0 {
                body
            } else {
                union(body, first_bytes(cr, cr.next(ip)?, depth))
            }
        }
        _ => None,
    }
}

/// Analyze a program and record the results in it.
pub fn study(cr: &mut CompiledRegex) {
    let mut data = StudyData::default();
    let (min_len, max_len) = seq_bounds(cr, 0);
    data.min_len = min_len;
    data.max_len = max_len;
    data.branch_lengths = branch_lengths(cr);
    data.anchor = compute_anchoring(cr);

    let runs = collect_literal_runs(cr);
    data.anchored_substr = runs.longest(true);
    data.floating_substr = runs.longest(false);
    data.check = match (&data.anchored_substr, &data.floating_substr) {
        (Some(a), Some(f)) if f.searcher.len() > a.searcher.len() => Some(f.clone()),
        (Some(a), _) => Some(a.clone()),
        (None, f) => f.clone(),
    };

    let anchored_at_start = data
        .anchored_substr
        .as_ref()
        .map_or(false, |s| s.min_offset == 0);
    if data.anchor == Anchoring::None && !anchored_at_start {
        data.start_class = first_bytes(cr, 0, 0).and_then(StartClass::from_bitmap);
    }
    trace!("study: {:?}", data);
    cr.study = data;
}
