//! Classical backtracking execution engine

use crate::api::Match;
use crate::charclass::PosixClass;
use crate::error::MatchError;
use crate::exec;
use crate::folds::FoldTable;
use crate::insn::{CompiledRegex, IfCondition, LoopFields, Op};
use crate::matchers;
use crate::scm;
use crate::scm::SingleByteMatcher;
use crate::types::{CaptureGroupID, GroupData, LoopData, LoopID, IP};
use crate::util::DebugCheckIndex;
use core::ops::Range;

/// The group a CURLYN loop sets, and where the loop began.
#[derive(Copy, Clone, Debug)]
struct Capture1Char {
    group: CaptureGroupID,
    start: usize,
    // The group's value before the loop, restored at zero iterations.
    saved: GroupData,
}

#[derive(Clone, Debug)]
enum BacktrackInsn {
    /// Nothing more to backtrack.
    /// This "backstops" our stack.
    Exhausted,

    /// Restore the IP and position.
    SetPosition { ip: IP, pos: usize },

    SetLoopData {
        id: LoopID,
        data: LoopData,
    },

    SetCaptureGroup {
        id: CaptureGroupID,
        data: GroupData,
    },

    EnterNonGreedyLoop {
        // The IP of the loop.
        // This is guaranteed to point to a CurlyX.
        ip: IP,
        data: LoopData,
    },

    GreedyLoop1Char {
        continuation: IP,
        min: usize,
        max: usize,
        capture: Option<Capture1Char>,
    },

    NonGreedyLoop1Char {
        continuation: IP,
        min: usize,
        max: usize,
        capture: Option<Capture1Char>,
    },

    /// A greedy CURLYM that matched `count` iterations from `start`.
    GreedyFixedLoop {
        continuation: IP,
        start: usize,
        width: usize,
        min: usize,
        count: usize,
    },

    /// A non-greedy CURLYM that stopped after `count` iterations, at `pos`.
    NonGreedyFixedLoop {
        continuation: IP,
        body: IP,
        count: usize,
        max: usize,
        pos: usize,
    },
}

#[derive(Debug, Default)]
struct State {
    loops: Vec<LoopData>,
    groups: Vec<GroupData>,
}

#[derive(Debug)]
pub(crate) struct MatchAttempter<'a> {
    re: &'a CompiledRegex,
    input: &'a [u8],
    bts: Vec<BacktrackInsn>,
    s: State,

    // Where the search began, for \G.
    search_start: usize,

    // End fails before this position.
    min_end: usize,

    steps: u64,
    budget: Option<u64>,
    exhausted: bool,
}

impl<'a> MatchAttempter<'a> {
    pub(crate) fn new(re: &'a CompiledRegex, input: &'a [u8], budget: Option<u64>) -> Self {
        Self {
            re,
            input,
            bts: vec![BacktrackInsn::Exhausted],
            s: State {
                loops: vec![LoopData::new(0); re.loops as usize],
                groups: vec![GroupData::new(); re.groups as usize],
            },
            search_start: 0,
            min_end: 0,
            steps: 0,
            budget,
            exhausted: false,
        }
    }

    /// Prepare for a new search.
    fn reset(&mut self, search_start: usize, min_end: usize) {
        self.search_start = search_start;
        self.min_end = min_end;
        self.steps = 0;
        self.exhausted = false;
    }

    /// Count one step against the budget.
    /// \return false if the budget is used up.
    #[inline(always)]
    fn take_step(&mut self) -> bool {
        if let Some(budget) = self.budget {
            self.steps += 1;
            if self.steps > budget {
                self.exhausted = true;
                return false;
            }
        }
        true
    }

    fn prepare_to_enter_loop(
        bts: &mut Vec<BacktrackInsn>,
        pos: usize,
        id: LoopID,
        loop_data: &mut LoopData,
    ) {
        bts.push(BacktrackInsn::SetLoopData {
            id,
            data: *loop_data,
        });
        loop_data.iters += 1;
        loop_data.entry = pos;
    }

    /// Decide whether to run another iteration of the CurlyX at \p ip.
    /// \return the next IP, or None if neither arm is viable.
    fn run_loop(&mut self, fields: &LoopFields, id: LoopID, pos: usize, ip: IP) -> Option<IP> {
        let loop_taken_ip = ip + 1;
        let loop_not_taken_ip = self.re.follow(ip);

        let loop_data = self.s.loops.mat(id as usize);
        let iteration = loop_data.iters;
        let do_taken = iteration < fields.max_iters;
        let do_not_taken = iteration >= fields.min_iters;

        match (do_taken, do_not_taken) {
            (false, false) => {
                // No arms viable.
                None
            }
            (false, true) => {
                // Only skipping is viable.
                Some(loop_not_taken_ip)
            }
            (true, false) => {
                // Only entering is viable.
                Self::prepare_to_enter_loop(&mut self.bts, pos, id, loop_data);
                Some(loop_taken_ip)
            }
            (true, true) if !fields.greedy => {
                // Both arms are viable; backtrack into the loop.
                loop_data.entry = pos;
                self.bts.push(BacktrackInsn::EnterNonGreedyLoop {
                    ip,
                    data: *loop_data,
                });
                Some(loop_not_taken_ip)
            }
            (true, true) => {
                debug_assert!(fields.greedy, "Should be greedy");
                // Both arms are viable; backtrack out of the loop.
                self.bts.push(BacktrackInsn::SetPosition {
                    ip: loop_not_taken_ip,
                    pos,
                });
                Self::prepare_to_enter_loop(&mut self.bts, pos, id, loop_data);
                Some(loop_taken_ip)
            }
        }
    }

    // Drive the loop up to \p max times.
    // \return the position (min, max), or None on failure.
    #[inline(always)]
    fn run_scm_loop_impl<Scm: SingleByteMatcher>(
        input: &[u8],
        mut pos: usize,
        min: usize,
        max: usize,
        matcher: Scm,
    ) -> Option<(usize, usize)> {
        debug_assert!(min <= max, "min should be <= max");
        // Drive the iteration min times.
        // That tells us the min position.
        for _ in 0..min {
            if !matcher.matches(input, &mut pos) {
                return None;
            }
        }
        let min_pos = pos;

        // Drive it up to the max.
        let mut remaining = max - min;
        while remaining > 0 && matcher.matches(input, &mut pos) {
            remaining -= 1;
        }
        Some((min_pos, pos))
    }

    fn set_captured_1char(&mut self, capture: Capture1Char, pos: usize) {
        *self.s.groups.mat(capture.group as usize) = if pos > capture.start {
            GroupData {
                open: Some(pos - 1),
                start: Some(pos - 1),
                end: Some(pos),
            }
        } else {
            capture.saved
        };
    }

    // Given that ip points at a loop whose body matches exactly one byte, run
    // a "single byte loop". The big idea here is that we don't need to save
    // our position every iteration: each iteration is one byte, so
    // backtracking is just moving the position.
    // If \p group is set, the loop also records its last byte in that group.
    // \return the next IP, or None if the loop failed.
    fn run_scm_loop(
        &mut self,
        pos: &mut usize,
        fields: LoopFields,
        ip: IP,
        group: Option<CaptureGroupID>,
    ) -> Option<IP> {
        let re = self.re;
        let input = self.input;
        let (min, max) = (fields.min_iters, fields.max_iters);
        let escape = |class, invert, locale| scm::Escape::new(class, invert, locale);
        // Iterate as far as we can go.
        let loop_res = match &re.insns.iat(ip + 1).op {
            Op::Exact(bytes) => {
                Self::run_scm_loop_impl(input, *pos, min, max, scm::Byte { b: bytes[0] })
            }
            Op::ExactFold(bytes) => Self::run_scm_loop_impl(
                input,
                *pos,
                min,
                max,
                scm::ByteFold {
                    b: bytes[0],
                    table: FoldTable::Ascii,
                },
            ),
            Op::ExactFoldLocale(bytes) => Self::run_scm_loop_impl(
                input,
                *pos,
                min,
                max,
                scm::ByteFold {
                    b: bytes[0],
                    table: FoldTable::Locale,
                },
            ),
            Op::AnyOf(cc) => Self::run_scm_loop_impl(input, *pos, min, max, scm::Class { cc }),
            Op::ReAny => Self::run_scm_loop_impl(input, *pos, min, max, scm::AnyExceptNewline),
            Op::SAny => Self::run_scm_loop_impl(input, *pos, min, max, scm::AnyByte),
            &Op::Alnum { invert, locale } => Self::run_scm_loop_impl(
                input,
                *pos,
                min,
                max,
                escape(PosixClass::Word, invert, locale),
            ),
            &Op::Space { invert, locale } => Self::run_scm_loop_impl(
                input,
                *pos,
                min,
                max,
                escape(PosixClass::PerlSpace, invert, locale),
            ),
            &Op::Digit { invert } => Self::run_scm_loop_impl(
                input,
                *pos,
                min,
                max,
                escape(PosixClass::Digit, invert, false),
            ),
            other => {
                // There should be no other single byte matchers.
                rs_unreachable!(format!("Missing single byte matcher: {:?}", other));
            }
        };

        // If loop_res is none, we failed to match at least the minimum.
        let (min_pos, max_pos) = loop_res?;
        debug_assert!(min_pos <= max_pos, "min should be <= max");

        let continuation = re.follow(ip);
        let capture = group.map(|group| {
            let saved = *self.s.groups.iat(group as usize);
            self.bts.push(BacktrackInsn::SetCaptureGroup { id: group, data: saved });
            Capture1Char {
                group,
                start: *pos,
                saved,
            }
        });
        if min_pos != max_pos {
            // Backtracking is possible.
            let bti = if fields.greedy {
                BacktrackInsn::GreedyLoop1Char {
                    continuation,
                    min: min_pos,
                    max: max_pos,
                    capture,
                }
            } else {
                BacktrackInsn::NonGreedyLoop1Char {
                    continuation,
                    min: min_pos,
                    max: max_pos,
                    capture,
                }
            };
            self.bts.push(bti);
        }

        // Start at the max (min) if greedy (nongreedy).
        *pos = if fields.greedy { max_pos } else { min_pos };
        if let Some(capture) = capture {
            self.set_captured_1char(capture, *pos);
        }
        Some(continuation)
    }

    /// Run one iteration of a CURLYM body at \p pos.
    /// \return the position after the iteration, or None if it failed.
    fn run_fixed_body(&mut self, body: IP, pos: usize) -> Option<usize> {
        // The body has no captures, so there is no state to keep.
        let (result, _) = self.run_submatch(body, pos);
        result
    }

    // Run a CURLYM: a counted loop whose body has a fixed width and no
    // captures. Each iteration is matched on its own and never revisited, so
    // backtracking only changes the iteration count.
    fn run_fixed_loop(
        &mut self,
        pos: &mut usize,
        fields: LoopFields,
        width: usize,
        ip: IP,
    ) -> Option<IP> {
        let body = ip + 1;
        let continuation = self.re.follow(ip);
        let start = *pos;
        let limit = if fields.greedy {
            fields.max_iters
        } else {
            fields.min_iters
        };
        let mut count = 0;
        let mut cur = start;
        while count < limit {
            match self.run_fixed_body(body, cur) {
                Some(end) => {
                    debug_assert!(end == cur + width, "Fixed width body changed width");
                    cur = end;
                    count += 1;
                }
                None => break,
            }
        }
        if count < fields.min_iters {
            return None;
        }
        if fields.greedy {
            if count > fields.min_iters {
                self.bts.push(BacktrackInsn::GreedyFixedLoop {
                    continuation,
                    start,
                    width,
                    min: fields.min_iters,
                    count,
                });
            }
        } else if count < fields.max_iters {
            self.bts.push(BacktrackInsn::NonGreedyFixedLoop {
                continuation,
                body,
                count,
                max: fields.max_iters,
                pos: cur,
            });
        }
        *pos = cur;
        Some(continuation)
    }

    /// Run the sub-program at \p ip from \p pos on a fresh backtrack stack.
    /// \return the end position on success, and the sub-program's stack, whose
    /// undo records describe how to restore the state it changed.
    fn run_submatch(&mut self, ip: IP, pos: usize) -> (Option<usize>, Vec<BacktrackInsn>) {
        // Start with an "empty" backtrack stack.
        let mut saved_bts = vec![BacktrackInsn::Exhausted];
        core::mem::swap(&mut self.bts, &mut saved_bts);
        let result = self.try_at_pos(ip, pos);
        core::mem::swap(&mut self.bts, &mut saved_bts);
        (result, saved_bts)
    }

    /// Keep the effects of a successful sub-program, moving its undo records
    /// onto our stack so that backtracking past it restores the state.
    fn commit_submatch(&mut self, sub_bts: Vec<BacktrackInsn>) {
        for bt in sub_bts {
            if matches!(
                bt,
                BacktrackInsn::SetCaptureGroup { .. } | BacktrackInsn::SetLoopData { .. }
            ) {
                self.bts.push(bt);
            }
        }
    }

    /// Discard the effects of a successful sub-program.
    fn undo_submatch(&mut self, sub_bts: Vec<BacktrackInsn>) {
        for bt in sub_bts.into_iter().rev() {
            match bt {
                BacktrackInsn::SetCaptureGroup { id, data } => {
                    *self.s.groups.mat(id as usize) = data;
                }
                BacktrackInsn::SetLoopData { id, data } => {
                    *self.s.loops.mat(id as usize) = data;
                }
                _ => {}
            }
        }
    }

    // Run a lookaround whose body begins at \p ip. Lookbehinds have a fixed
    // width and start that far before \p pos.
    // \return whether we matched and negate was false, or did not match but negate
    // is true.
    fn run_lookaround(&mut self, ip: IP, pos: usize, negate: bool, behind: Option<usize>) -> bool {
        let start = match behind {
            None => pos,
            Some(width) => match pos.checked_sub(width) {
                Some(start) => start,
                // Not enough text behind us.
                None => return negate,
            },
        };
        let (result, sub_bts) = self.run_submatch(ip, start);
        if self.exhausted {
            return false;
        }
        let matched = result.is_some();
        debug_assert!(
            behind.is_none() || !matched || result == Some(pos),
            "Lookbehind should end where it was tested"
        );

        // If we are a positive lookaround that successfully matched, retain the
        // capture groups (but we need to set up backtracking). Otherwise restore
        // them.
        if matched {
            if negate {
                self.undo_submatch(sub_bts);
            } else {
                self.commit_submatch(sub_bts);
            }
        }
        matched != negate
    }

    /// Attempt to backtrack.
    /// \return true if we backtracked, false if we exhaust the backtrack stack.
    fn try_backtrack(&mut self, ip: &mut IP, pos: &mut usize) -> bool {
        loop {
            // We always have a single Exhausted instruction backstopping our stack,
            // so we do not need to check for empty bts.
            debug_assert!(!self.bts.is_empty(), "Backtrack stack should not be empty");
            let bt = match self.bts.last_mut() {
                Some(bt) => bt,
                None => rs_unreachable!("BT stack should never be empty"),
            };
            match bt {
                BacktrackInsn::Exhausted => return false,

                BacktrackInsn::SetPosition {
                    ip: saved_ip,
                    pos: saved_pos,
                } => {
                    *ip = *saved_ip;
                    *pos = *saved_pos;
                    self.bts.pop();
                    return true;
                }
                BacktrackInsn::SetLoopData { id, data } => {
                    *self.s.loops.mat(*id as usize) = *data;
                    self.bts.pop();
                }
                BacktrackInsn::SetCaptureGroup { id, data } => {
                    *self.s.groups.mat(*id as usize) = *data;
                    self.bts.pop();
                }

                &mut BacktrackInsn::EnterNonGreedyLoop { ip: loop_ip, data } => {
                    // Must pop before we enter the loop.
                    self.bts.pop();
                    *ip = loop_ip + 1;
                    *pos = data.entry;
                    let loop_id = match &self.re.insns.iat(loop_ip).op {
                        Op::CurlyX { loop_id, .. } => *loop_id,
                        _ => rs_unreachable!("EnterNonGreedyLoop must point at a CurlyX"),
                    };
                    let loop_data = self.s.loops.mat(loop_id as usize);
                    *loop_data = data;
                    Self::prepare_to_enter_loop(&mut self.bts, *pos, loop_id, loop_data);
                    return true;
                }

                BacktrackInsn::GreedyLoop1Char {
                    continuation,
                    min,
                    max,
                    capture,
                } => {
                    // The match failed at the max location.
                    debug_assert!(*max >= *min, "max should be >= min");
                    if *max == *min {
                        // We have backtracked this loop as far as possible.
                        self.bts.pop();
                        continue;
                    }
                    *max -= 1;
                    *pos = *max;
                    *ip = *continuation;
                    if let Some(capture) = *capture {
                        self.set_captured_1char(capture, *pos);
                    }
                    return true;
                }

                BacktrackInsn::NonGreedyLoop1Char {
                    continuation,
                    min,
                    max,
                    capture,
                } => {
                    // The match failed at the min location.
                    debug_assert!(*max >= *min, "max should be >= min");
                    if *max == *min {
                        // We have backtracked this loop as far as possible.
                        self.bts.pop();
                        continue;
                    }
                    *min += 1;
                    *pos = *min;
                    *ip = *continuation;
                    if let Some(capture) = *capture {
                        self.set_captured_1char(capture, *pos);
                    }
                    return true;
                }

                BacktrackInsn::GreedyFixedLoop {
                    continuation,
                    start,
                    width,
                    min,
                    count,
                } => {
                    if *count == *min {
                        self.bts.pop();
                        continue;
                    }
                    *count -= 1;
                    *pos = *start + *count * *width;
                    *ip = *continuation;
                    return true;
                }

                BacktrackInsn::NonGreedyFixedLoop {
                    continuation,
                    body,
                    count,
                    max,
                    pos: loop_pos,
                } => {
                    if *count >= *max {
                        self.bts.pop();
                        continue;
                    }
                    let (continuation, body, loop_pos) = (*continuation, *body, *loop_pos);
                    // Try one more iteration.
                    match self.run_fixed_body(body, loop_pos) {
                        Some(end) => {
                            if let Some(BacktrackInsn::NonGreedyFixedLoop { count, pos, .. }) =
                                self.bts.last_mut()
                            {
                                *count += 1;
                                *pos = end;
                            }
                            *pos = end;
                            *ip = continuation;
                            return true;
                        }
                        None => {
                            self.bts.pop();
                            continue;
                        }
                    }
                }
            }
        }
    }

    /// Attempt to match at a given IP and position.
    fn try_at_pos(&mut self, mut ip: IP, mut pos: usize) -> Option<usize> {
        debug_assert!(
            self.bts.len() == 1,
            "Should be only initial exhausted backtrack insn"
        );
        let re = self.re;
        let input = self.input;
        // These are not really loops, they are just labels that we effectively 'goto'
        // to.
        #[allow(clippy::never_loop)]
        'nextinsn: loop {
            'backtrack: loop {
                // Helper macro to either follow to the next node, or backtrack.
                macro_rules! next_or_bt {
                    ($e:expr) => {
                        if $e {
                            ip = re.follow(ip);
                            continue 'nextinsn;
                        } else {
                            break 'backtrack;
                        }
                    };
                }

                if !self.take_step() {
                    return None;
                }

                match &re.insns.iat(ip).op {
                    Op::End => {
                        if pos < self.min_end {
                            break 'backtrack;
                        }
                        // Keep all but the initial give-up bts.
                        self.bts.truncate(1);
                        return Some(pos);
                    }
                    Op::Succeed => return Some(pos),
                    Op::Nothing | Op::Tail | Op::LongJump => next_or_bt!(true),
                    Op::Fail => break 'backtrack,
                    Op::SBol => next_or_bt!(pos == 0),
                    Op::MBol => next_or_bt!(matchers::is_line_start(input, pos)),
                    Op::SEol => next_or_bt!(matchers::is_end_or_final_newline(input, pos)),
                    Op::MEol => next_or_bt!(matchers::is_line_end(input, pos)),
                    Op::Eos => next_or_bt!(pos == input.len()),
                    Op::GPos => next_or_bt!(pos == self.search_start),
                    &Op::Bound { invert, locale } => {
                        let table = matchers::table_for(locale);
                        next_or_bt!(matchers::is_word_boundary(input, pos, table) != invert)
                    }
                    Op::Exact(bytes) => next_or_bt!(matchers::literal(input, bytes, None, &mut pos)),
                    Op::ExactFold(bytes) => next_or_bt!(matchers::literal(
                        input,
                        bytes,
                        Some(FoldTable::Ascii),
                        &mut pos
                    )),
                    Op::ExactFoldLocale(bytes) => next_or_bt!(matchers::literal(
                        input,
                        bytes,
                        Some(FoldTable::Locale),
                        &mut pos
                    )),
                    Op::AnyOf(cc) => next_or_bt!(scm::Class { cc }.matches(input, &mut pos)),
                    Op::ReAny => next_or_bt!(scm::AnyExceptNewline.matches(input, &mut pos)),
                    Op::SAny => next_or_bt!(scm::AnyByte.matches(input, &mut pos)),
                    &Op::Alnum { invert, locale } => next_or_bt!(
                        scm::Escape::new(PosixClass::Word, invert, locale).matches(input, &mut pos)
                    ),
                    &Op::Space { invert, locale } => next_or_bt!(scm::Escape::new(
                        PosixClass::PerlSpace,
                        invert,
                        locale
                    )
                    .matches(input, &mut pos)),
                    &Op::Digit { invert } => next_or_bt!(
                        scm::Escape::new(PosixClass::Digit, invert, false).matches(input, &mut pos)
                    ),
                    Op::Branch => {
                        // The body follows; the next Branch, if any, is the alternative.
                        let next = re.follow(ip);
                        if matches!(re.insns.iat(next).op, Op::Branch) {
                            self.bts.push(BacktrackInsn::SetPosition { ip: next, pos });
                        }
                        ip += 1;
                        continue 'nextinsn;
                    }
                    &Op::Open(id) => {
                        let cg = self.s.groups.mat(id as usize);
                        self.bts
                            .push(BacktrackInsn::SetCaptureGroup { id, data: *cg });
                        cg.open = Some(pos);
                        next_or_bt!(true)
                    }
                    &Op::Close(id) => {
                        let cg = self.s.groups.mat(id as usize);
                        debug_assert!(cg.open.is_some(), "Capture group should have been entered");
                        self.bts
                            .push(BacktrackInsn::SetCaptureGroup { id, data: *cg });
                        cg.start = cg.open;
                        cg.end = Some(pos);
                        next_or_bt!(true)
                    }
                    Op::Star | Op::Plus | Op::Curly(..) | Op::CurlyN { .. } => {
                        let (fields, group) = match re.insns.iat(ip).op {
                            Op::Star => (
                                LoopFields {
                                    min_iters: 0,
                                    max_iters: usize::MAX,
                                    greedy: true,
                                },
                                None,
                            ),
                            Op::Plus => (
                                LoopFields {
                                    min_iters: 1,
                                    max_iters: usize::MAX,
                                    greedy: true,
                                },
                                None,
                            ),
                            Op::Curly(fields) => (fields, None),
                            Op::CurlyN { fields, group } => (fields, Some(group)),
                            _ => rs_unreachable!(),
                        };
                        match self.run_scm_loop(&mut pos, fields, ip, group) {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => break 'backtrack,
                        }
                    }
                    &Op::CurlyM { fields, width } => {
                        match self.run_fixed_loop(&mut pos, fields, width, ip) {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => break 'backtrack,
                        }
                    }
                    Op::CurlyX { fields, loop_id } => {
                        // Entering a loop, not re-entering it.
                        let loop_data = self.s.loops.mat(*loop_id as usize);
                        self.bts.push(BacktrackInsn::SetLoopData {
                            id: *loop_id,
                            data: *loop_data,
                        });
                        *loop_data = LoopData::new(pos);
                        match self.run_loop(fields, *loop_id, pos, ip) {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => break 'backtrack,
                        }
                    }
                    &Op::WhileM { begin } => {
                        let (fields, loop_id) = match &re.insns.iat(begin).op {
                            Op::CurlyX { fields, loop_id } => (fields, *loop_id),
                            _ => rs_unreachable!("WhileM should always refer to a CurlyX"),
                        };
                        let loop_data = self.s.loops.iat(loop_id as usize);
                        if loop_data.entry == pos && loop_data.iters >= fields.min_iters {
                            // An iteration that matched nothing ends the loop.
                            ip = re.follow(begin);
                            continue 'nextinsn;
                        }
                        match self.run_loop(fields, loop_id, pos, begin) {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => break 'backtrack,
                        }
                    }
                    &Op::Ref(id) | &Op::RefFold(id) | &Op::RefFoldLocale(id) => {
                        // Backreferences to a group that has not matched fail.
                        let matched = match self.s.groups.iat(id as usize).as_range() {
                            None => false,
                            Some(orig_range) => match re.insns.iat(ip).op {
                                Op::Ref(..) => matchers::backref(input, orig_range, &mut pos),
                                Op::RefFold(..) => matchers::backref_icase(
                                    input,
                                    orig_range,
                                    &mut pos,
                                    FoldTable::Ascii,
                                ),
                                _ => matchers::backref_icase(
                                    input,
                                    orig_range,
                                    &mut pos,
                                    FoldTable::Locale,
                                ),
                            },
                        };
                        next_or_bt!(matched)
                    }
                    &Op::IfMatch { behind } => {
                        next_or_bt!(self.run_lookaround(ip + 1, pos, false, behind))
                    }
                    &Op::UnlessM { behind } => {
                        next_or_bt!(self.run_lookaround(ip + 1, pos, true, behind))
                    }
                    Op::Suspend => {
                        // Match the body once and never backtrack into it.
                        let (result, sub_bts) = self.run_submatch(ip + 1, pos);
                        match result {
                            Some(end) => {
                                self.commit_submatch(sub_bts);
                                pos = end;
                                next_or_bt!(true)
                            }
                            None => break 'backtrack,
                        }
                    }
                    &Op::IfThen { cond, yes, no } => {
                        let taken = match cond {
                            IfCondition::Group(id) => self.s.groups.iat(id as usize).matched(),
                            IfCondition::Assertion { negate, behind } => {
                                self.run_lookaround(ip + 1, pos, negate, behind)
                            }
                        };
                        ip = if taken { yes } else { no };
                        continue 'nextinsn;
                    }
                }
            }
            // This after the backtrack loop.
            // A break 'backtrack will jump here.
            if self.try_backtrack(&mut ip, &mut pos) {
                continue 'nextinsn;
            } else {
                // We have exhausted the backtracking stack.
                debug_assert!(
                    self.exhausted || self.bts.len() == 1,
                    "Should have exhausted backtrack stack"
                );
                return None;
            }
        }
    }
}

#[derive(Debug)]
pub struct BacktrackExecutor<'r> {
    input: &'r [u8],
    matcher: MatchAttempter<'r>,
}

impl<'r> BacktrackExecutor<'r> {
    pub(crate) fn new(re: &'r CompiledRegex, input: &'r [u8], budget: Option<u64>) -> Self {
        Self {
            input,
            matcher: MatchAttempter::new(re, input, budget),
        }
    }

    fn successful_match(&mut self, start: usize, end: usize) -> Match {
        // We want to simultaneously map our groups to offsets, and clear the groups.
        let mut captures: Vec<Option<Range<usize>>> =
            Vec::with_capacity(self.matcher.s.groups.len());
        for gd in self.matcher.s.groups.iter_mut() {
            captures.push(gd.as_range());
            gd.reset();
        }
        Match {
            range: start..end,
            captures,
        }
    }

    /// Find the leftmost match starting at or after \p start, whose end is at
    /// least \p end_min bytes past \p start.
    pub(crate) fn search(&mut self, start: usize, end_min: usize) -> Result<Option<Match>, MatchError> {
        let input = self.input;
        let re = self.matcher.re;
        self.matcher.reset(start, start.saturating_add(end_min));
        let mut candidates = exec::Candidates::new(&re.study, input, start);
        let mut pos = start;
        while let Some(cand) = candidates.next_from(pos) {
            if let Some(end) = self.matcher.try_at_pos(0, cand) {
                return Ok(Some(self.successful_match(cand, end)));
            }
            if self.matcher.exhausted {
                return Err(MatchError::BudgetExhausted(self.matcher.budget.unwrap_or(0)));
            }
            pos = cand + 1;
        }
        Ok(None)
    }
}

impl exec::MatchProducer for BacktrackExecutor<'_> {
    fn next_match(
        &mut self,
        pos: usize,
        next_start: &mut Option<usize>,
    ) -> Result<Option<Match>, MatchError> {
        let result = self.search(pos, 0);
        *next_start = match &result {
            // If we matched the empty string, we have to increment.
            Ok(Some(m)) if m.end() > m.start() => Some(m.end()),
            Ok(Some(m)) if m.end() < self.input.len() => Some(m.end() + 1),
            _ => None,
        };
        result
    }
}
