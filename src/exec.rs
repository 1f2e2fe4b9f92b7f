//! Execution engine bits: the search driver and match iteration.

use crate::api::Match;
use crate::bytesearch::ByteSearcher;
use crate::error::MatchError;
use crate::study::{Anchoring, StudyData};
use log::{trace, warn};

/// A trait for finding the next match in a regex.
/// This is broken out from the executor to avoid needing to thread lifetimes
/// around.
pub trait MatchProducer: std::fmt::Debug {
    /// Attempt to match at or after the given location.
    /// \return either the Match and the position to start looking for the next
    /// match, or None on failure.
    fn next_match(
        &mut self,
        pos: usize,
        next_start: &mut Option<usize>,
    ) -> Result<Option<Match>, MatchError>;
}

/// Enumerates the start positions worth trying for one search, in increasing
/// order, using what study learned about the program.
#[derive(Debug)]
pub struct Candidates<'r, 't> {
    study: &'r StudyData,
    input: &'t [u8],

    // Where the search began. \G and implicit .* anchoring match only here.
    search_start: usize,

    // Earliest known position of the check string at or after the last
    // position we searched from.
    check_hit: Option<usize>,
}

impl<'r, 't> Candidates<'r, 't> {
    pub fn new(study: &'r StudyData, input: &'t [u8], search_start: usize) -> Self {
        Candidates {
            study,
            input,
            search_start,
            check_hit: None,
        }
    }

    /// \return whether a line-anchored match may begin at \p pos.
    fn is_line_candidate(&self, pos: usize) -> bool {
        pos == 0 || pos == self.search_start || self.input[pos - 1] == b'\n'
    }

    /// \return the first candidate at or after \p pos, or None if no start
    /// position at or after \p pos can produce a match.
    pub fn next_from(&mut self, mut pos: usize) -> Option<usize> {
        let input = self.input;
        let study = self.study;
        loop {
            if pos > input.len() || input.len() - pos < study.min_len {
                return None;
            }

            match study.anchor {
                Anchoring::None => {}
                Anchoring::StartOfText => {
                    if pos != 0 {
                        return None;
                    }
                }
                Anchoring::SearchStart => {
                    if pos != self.search_start {
                        return None;
                    }
                }
                Anchoring::StartOfLine { .. } => {
                    if !self.is_line_candidate(pos) {
                        // Skip to just past the next newline.
                        let nl = memchr::memchr(b'\n', &input[pos..])?;
                        pos += nl + 1;
                        continue;
                    }
                }
            }

            if let Some(check) = &study.check {
                let from = pos + check.min_offset;
                if from > input.len() {
                    return None;
                }
                let hit = match self.check_hit {
                    Some(hit) if hit >= from => hit,
                    _ => {
                        let hit = match check.searcher.find_in(&input[from..]) {
                            Some(offset) => from + offset,
                            None => {
                                trace!("check string {:?} not found", check.searcher);
                                return None;
                            }
                        };
                        self.check_hit = Some(hit);
                        hit
                    }
                };
                if let Some(max_offset) = check.max_offset {
                    if hit > pos + max_offset {
                        // No match beginning before this can reach the check string.
                        trace!("check string at {} skips to {}", hit, hit - max_offset);
                        pos = hit - max_offset;
                        continue;
                    }
                }
            }

            if let Some(start_class) = &study.start_class {
                let skip = start_class.find_in(&input[pos..])?;
                if skip > 0 {
                    pos += skip;
                    continue;
                }
            }

            return Some(pos);
        }
    }
}

/// A struct which enables iteration over matches.
/// Budget exhaustion ends the iteration.
#[derive(Debug)]
pub struct Matches<Producer: MatchProducer> {
    mp: Producer,
    offset: Option<usize>,
}

impl<Producer: MatchProducer> Matches<Producer> {
    pub fn new(mp: Producer, start: usize) -> Self {
        Matches {
            mp,
            offset: Some(start),
        }
    }
}

impl<Producer: MatchProducer> Iterator for Matches<Producer> {
    type Item = Match;
    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset?;
        match self.mp.next_match(start, &mut self.offset) {
            Ok(m) => m,
            Err(err) => {
                warn!("{}; ending iteration at offset {}", err, start);
                self.offset = None;
                None
            }
        }
    }
}
