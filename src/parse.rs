//! Parser from regex patterns to IR

use crate::api;
use crate::charclass::{CharClassBuilder, PosixClass};
use crate::error::{CompileError, ErrorKind};
use crate::folds::FoldTable;
use crate::ir::{self, AnchorType, Condition, Node};
use crate::types::{CaptureGroupID, MAX_CAPTURE_GROUPS, MAX_LOOPS, MAX_NESTING_DEPTH, REG_INFTY};
use core::ops::Range;

fn error<T>(kind: ErrorKind, span: Range<usize>) -> Result<T, CompileError> {
    Err(CompileError::new(kind, span))
}

fn make_cat(mut nodes: ir::NodeList) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.pop().unwrap_or(Node::Empty),
        _ => Node::Cat(nodes),
    }
}

fn make_alt(mut nodes: ir::NodeList) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.pop().unwrap_or(Node::Empty),
        _ => Node::Alt(nodes),
    }
}

/// A member of a bracket expression.
enum ClassAtom {
    Byte(u8),
    Class { class: PosixClass, negated: bool },
}

/// The value of a character escape like \n or \x{263A}.
enum EscapedChar {
    Byte(u8),
    /// A character above 0xFF, matched as its UTF-8 encoding.
    Wide(char),
}

/// Represents the state used to parse a regex.
struct Parser<'a> {
    /// The pattern.
    input: &'a [u8],

    /// Offset of the next byte.
    pos: usize,

    /// Flags in effect at the current position.
    flags: api::Flags,

    /// Number of loops.
    loop_count: u32,

    /// Number of capturing groups opened so far.
    group_count: CaptureGroupID,

    /// Largest group referenced by a backreference or condition, and where.
    max_backref: Option<(u32, Range<usize>)>,

    /// Accumulated cost score.
    cost: u32,

    /// Current group nesting.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Peek at the next byte.
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at the byte \p offset past the next one.
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Consume a byte, which must be next.
    fn consume(&mut self, c: u8) {
        debug_assert!(self.peek() == Some(c), "byte was not next");
        self.pos += 1;
    }

    /// \return the next byte, consuming it.
    fn next(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// If our contents begin with the byte c, consume it from our contents
    /// and return true. Otherwise return false.
    fn try_consume(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// If our contents begin with \p s, consume it and return true.
    fn try_consume_str(&mut self, s: &[u8]) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Decode the (possibly multibyte) character at the current position.
    /// The pattern came from a str, so it is valid UTF-8.
    fn peek_char(&self) -> Option<char> {
        let rest = &self.input[self.pos..];
        let len = match rest.first()? {
            b if *b < 0x80 => 1,
            b if *b >= 0xF0 => 4,
            b if *b >= 0xE0 => 3,
            _ => 2,
        };
        core::str::from_utf8(rest.get(..len)?)
            .ok()
            .and_then(|s| s.chars().next())
    }

    fn try_parse(mut self) -> Result<ir::Regex, CompileError> {
        // Parse a disjunction. If we consume everything, it's success. If there's
        // something left, it must be an excess closing paren.
        let body = self.consume_disjunction()?;
        if self.peek().is_some() {
            return error(ErrorKind::UnmatchedClose, self.pos..self.pos + 1);
        }
        if let Some((group, span)) = self.max_backref.take() {
            if group > u32::from(self.group_count) {
                return error(ErrorKind::NonexistentGroup, span);
            }
        }
        Ok(ir::Regex {
            node: body,
            flags: self.flags,
            group_count: self.group_count,
            cost: self.cost,
        })
    }

    /// Skip inline comments, and whitespace and # comments in extended mode.
    fn skip_trivia(&mut self) -> Result<(), CompileError> {
        loop {
            let start = self.pos;
            if self.try_consume_str(b"(?#") {
                match self.input[self.pos..].iter().position(|&b| b == b')') {
                    Some(idx) => self.pos += idx + 1,
                    None => return error(ErrorKind::UnterminatedComment, start..self.input.len()),
                }
                continue;
            }
            if !self.flags.extended {
                return Ok(());
            }
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(0x0B) | Some(0x0C) => {
                    self.pos += 1
                }
                Some(b'#') => match self.input[self.pos..].iter().position(|&b| b == b'\n') {
                    Some(idx) => self.pos += idx + 1,
                    None => self.pos = self.input.len(),
                },
                _ => return Ok(()),
            }
        }
    }

    fn consume_alternatives(&mut self) -> Result<ir::NodeList, CompileError> {
        let mut terms = vec![self.consume_term()?];
        while self.try_consume(b'|') {
            self.add_cost(1);
            terms.push(self.consume_term()?)
        }
        Ok(terms)
    }

    fn consume_disjunction(&mut self) -> Result<Node, CompileError> {
        Ok(make_alt(self.consume_alternatives()?))
    }

    /// Parse a disjunction, restoring flags changed by inline (?i) afterwards.
    fn consume_scoped_disjunction(&mut self) -> Result<Node, CompileError> {
        let saved = self.flags;
        let result = self.consume_disjunction();
        self.flags = saved;
        result
    }

    fn consume_term(&mut self) -> Result<Node, CompileError> {
        let mut result: ir::NodeList = Vec::new();
        loop {
            self.skip_trivia()?;
            let start_group = self.group_count;
            let start_cost = self.cost;
            let atom = match self.peek() {
                // A concatenation is terminated by closing parens or vertical bar.
                None | Some(b')') | Some(b'|') => break,
                Some(_) => self.consume_atom()?,
            };
            // Inline flags and comments produce no node.
            let atom = match atom {
                Some(atom) => atom,
                None => continue,
            };

            self.skip_trivia()?;
            let quant_start = self.pos;
            let quant = match self.try_consume_quantifier()? {
                Some(quant) => quant,
                None => {
                    result.push(atom);
                    continue;
                }
            };
            if self.loop_count as usize >= MAX_LOOPS {
                return error(ErrorKind::TooManyLoops, quant_start..self.pos);
            }
            self.loop_count += 1;
            let body_cost = self.cost - start_cost;
            self.add_cost(body_cost.saturating_add(4));
            result.push(Node::Loop {
                loopee: Box::new(atom),
                quant,
                enclosed_groups: start_group..self.group_count,
                cost: body_cost,
            });

            self.skip_trivia()?;
            if self.at_quantifier() {
                return error(ErrorKind::NestedQuantifiers, self.pos..self.pos + 1);
            }
        }
        Ok(make_cat(result))
    }

    /// Parse a single atom. Returns None for constructs that match nothing,
    /// like (?i).
    fn consume_atom(&mut self) -> Result<Option<Node>, CompileError> {
        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };
        let node = match c {
            b'^' => {
                self.consume(c);
                Node::Anchor(if self.flags.multiline {
                    AnchorType::StartOfLine
                } else {
                    AnchorType::StartOfText
                })
            }
            b'$' => {
                self.consume(c);
                Node::Anchor(if self.flags.multiline {
                    AnchorType::EndOfLine
                } else {
                    AnchorType::EndOfTextOrNewline
                })
            }
            b'.' => {
                self.consume(c);
                self.add_cost(1);
                if self.flags.dot_all {
                    Node::AnyByte
                } else {
                    Node::AnyExceptNewline
                }
            }
            b'[' => self.consume_bracket()?,
            b'(' => return self.consume_group(),
            b'\\' => self.consume_atom_escape()?,
            b'*' | b'+' | b'?' => {
                return error(ErrorKind::QuantifierFollowsNothing, start..start + 1);
            }
            b'{' if self.at_curly() => {
                return error(ErrorKind::QuantifierFollowsNothing, start..start + 1);
            }
            _ => {
                // A literal character. Multibyte characters are one atom.
                let ch = self.peek_char().unwrap_or(c as char);
                self.pos += ch.len_utf8();
                let mut buf = [0; 4];
                self.make_literal(ch.encode_utf8(&mut buf).as_bytes())
            }
        };
        Ok(Some(node))
    }

    /// Costs saturate; deeply nested loops double the score at each level.
    fn add_cost(&mut self, amount: u32) {
        self.cost = self.cost.saturating_add(amount);
    }

    fn make_literal(&mut self, bytes: &[u8]) -> Node {
        self.add_cost(1);
        if self.flags.icase {
            let table = self.fold_table();
            Node::Literal {
                bytes: table.fold_bytes(bytes),
                fold: Some(table),
            }
        } else {
            Node::Literal {
                bytes: bytes.to_vec(),
                fold: None,
            }
        }
    }

    fn fold_table(&self) -> FoldTable {
        if self.flags.locale {
            FoldTable::Locale
        } else {
            FoldTable::Ascii
        }
    }

    /// Parse a group starting at '('.
    fn consume_group(&mut self) -> Result<Option<Node>, CompileError> {
        let open = self.pos;
        self.consume(b'(');
        if self.depth >= MAX_NESTING_DEPTH {
            return error(ErrorKind::NestingTooDeep, open..open + 1);
        }
        self.depth += 1;
        let result = self.consume_group_contents(open);
        self.depth -= 1;
        result
    }

    fn expect_close(&mut self, open: usize) -> Result<(), CompileError> {
        if self.try_consume(b')') {
            Ok(())
        } else {
            error(ErrorKind::UnmatchedOpen, open..open + 1)
        }
    }

    fn consume_group_contents(&mut self, open: usize) -> Result<Option<Node>, CompileError> {
        if !self.try_consume(b'?') {
            // Capturing group.
            if self.group_count as usize >= MAX_CAPTURE_GROUPS {
                return error(ErrorKind::TooManyGroups, open..open + 1);
            }
            let group = self.group_count;
            self.group_count += 1;
            self.add_cost(1);
            let contents = self.consume_scoped_disjunction()?;
            self.expect_close(open)?;
            return Ok(Some(Node::CaptureGroup(Box::new(contents), group)));
        }

        let c = match self.peek() {
            Some(c) => c,
            None => return error(ErrorKind::UnmatchedOpen, open..open + 1),
        };
        match c {
            b'#' => {
                // Normally removed by skip_trivia.
                self.pos = open;
                self.skip_trivia()?;
                Ok(None)
            }
            b':' => {
                self.consume(c);
                let contents = self.consume_scoped_disjunction()?;
                self.expect_close(open)?;
                Ok(Some(contents))
            }
            b'=' | b'!' => {
                self.consume(c);
                let (negate, behind, contents) = self.consume_lookaround(open, c == b'!', false)?;
                self.expect_close(open)?;
                Ok(Some(Node::LookaroundAssertion {
                    negate,
                    behind,
                    contents,
                }))
            }
            b'<' if matches!(self.peek_at(1), Some(b'=') | Some(b'!')) => {
                self.consume(c);
                let negate = self.next() == Some(b'!');
                let (negate, behind, contents) = self.consume_lookaround(open, negate, true)?;
                self.expect_close(open)?;
                Ok(Some(Node::LookaroundAssertion {
                    negate,
                    behind,
                    contents,
                }))
            }
            b'>' => {
                self.consume(c);
                self.add_cost(2);
                let contents = self.consume_scoped_disjunction()?;
                self.expect_close(open)?;
                Ok(Some(Node::Independent(Box::new(contents))))
            }
            b'{' => error(ErrorKind::EmbeddedCode, open..self.pos + 1),
            b'?' | b'p' if self.peek_at(1) == Some(b'{') => {
                error(ErrorKind::EmbeddedCode, open..self.pos + 2)
            }
            b'(' => self.consume_conditional(open).map(Some),
            b'i' | b'm' | b's' | b'x' | b'-' => self.consume_flag_group(open),
            _ => {
                let ch = self.peek_char().unwrap_or(c as char);
                error(
                    ErrorKind::UnknownGroupSyntax(ch),
                    open..self.pos + ch.len_utf8(),
                )
            }
        }
    }

    /// Parse the contents of a lookaround after its introducer, without the
    /// closing paren. Lookbehinds must have a fixed width.
    fn consume_lookaround(
        &mut self,
        open: usize,
        negate: bool,
        backwards: bool,
    ) -> Result<(bool, Option<usize>, Box<Node>), CompileError> {
        self.add_cost(2);
        let contents = self.consume_scoped_disjunction()?;
        let behind = if backwards {
            match contents.fixed_width() {
                Some(width) => Some(width),
                None => return error(ErrorKind::VariableLookbehind, open..self.pos),
            }
        } else {
            None
        };
        Ok((negate, behind, Box::new(contents)))
    }

    /// Parse (?imsx-imsx) or (?imsx-imsx:...).
    fn consume_flag_group(&mut self, open: usize) -> Result<Option<Node>, CompileError> {
        let mut flags = self.flags;
        let mut on = true;
        loop {
            let c = match self.next() {
                Some(c) => c,
                None => return error(ErrorKind::UnmatchedOpen, open..open + 1),
            };
            match c {
                b'i' => flags.icase = on,
                b'm' => flags.multiline = on,
                b's' => flags.dot_all = on,
                b'x' => flags.extended = on,
                b'-' if on => on = false,
                b')' => {
                    // Lasts until the enclosing group closes.
                    self.flags = flags;
                    return Ok(None);
                }
                b':' => {
                    let saved = self.flags;
                    self.flags = flags;
                    let contents = self.consume_disjunction();
                    self.flags = saved;
                    let contents = contents?;
                    self.expect_close(open)?;
                    return Ok(Some(contents));
                }
                _ => {
                    self.pos -= 1;
                    let ch = self.peek_char().unwrap_or(c as char);
                    return error(
                        ErrorKind::UnknownGroupSyntax(ch),
                        self.pos..self.pos + ch.len_utf8(),
                    );
                }
            }
        }
    }

    /// Parse (?(cond)yes|no), starting at the second '('.
    fn consume_conditional(&mut self, open: usize) -> Result<Node, CompileError> {
        let cond_start = self.pos;
        self.consume(b'(');
        self.add_cost(2);
        let condition = if matches!(self.peek(), Some(b'1'..=b'9')) {
            let group = self.consume_decimal().unwrap_or(0);
            let span = cond_start..self.pos + 1;
            if !self.try_consume(b')') {
                return error(ErrorKind::BadCondition, span);
            }
            self.note_backref(group, span);
            Condition::Group(group as u32)
        } else if self.try_consume(b'?') {
            let (negate, backwards) = match (self.peek(), self.peek_at(1)) {
                (Some(b'='), _) => (false, false),
                (Some(b'!'), _) => (true, false),
                (Some(b'<'), Some(b'=')) => (false, true),
                (Some(b'<'), Some(b'!')) => (true, true),
                _ => return error(ErrorKind::BadCondition, cond_start..self.pos + 1),
            };
            self.pos += if backwards { 2 } else { 1 };
            let (negate, behind, contents) =
                self.consume_lookaround(cond_start, negate, backwards)?;
            self.expect_close(cond_start)?;
            Condition::Lookaround {
                negate,
                behind,
                contents,
            }
        } else {
            return error(ErrorKind::BadCondition, cond_start..self.pos + 1);
        };

        let saved = self.flags;
        let alternatives = self.consume_alternatives();
        self.flags = saved;
        let mut alternatives = alternatives?;
        if alternatives.len() > 2 {
            return error(ErrorKind::TooManyBranches, open..self.pos);
        }
        self.expect_close(open)?;
        let no = if alternatives.len() == 2 {
            alternatives.pop().unwrap_or(Node::Empty)
        } else {
            Node::Empty
        };
        let yes = alternatives.pop().unwrap_or(Node::Empty);
        Ok(Node::Conditional {
            condition,
            yes: Box::new(yes),
            no: Box::new(no),
        })
    }

    fn note_backref(&mut self, group: usize, span: Range<usize>) {
        let group = group.min(u32::MAX as usize) as u32;
        match &self.max_backref {
            Some((max, _)) if *max >= group => {}
            _ => self.max_backref = Some((group, span)),
        }
    }

    /// Parse an escape outside of brackets, starting at the backslash.
    fn consume_atom_escape(&mut self) -> Result<Node, CompileError> {
        let start = self.pos;
        self.consume(b'\\');
        let c = match self.peek() {
            Some(c) => c,
            None => return error(ErrorKind::TrailingBackslash, start..start + 1),
        };
        let locale = self.flags.locale;
        let class_escape = |class, negate| Node::ClassEscape {
            class,
            negate,
            locale,
        };
        let node = match c {
            b'A' => Node::Anchor(AnchorType::StartOfText),
            b'z' => Node::Anchor(AnchorType::EndOfText),
            b'Z' => Node::Anchor(AnchorType::EndOfTextOrNewline),
            b'G' => Node::Anchor(AnchorType::SearchStart),
            b'b' | b'B' => Node::WordBoundary {
                invert: c == b'B',
                locale,
            },
            b'w' | b'W' => class_escape(PosixClass::Word, c == b'W'),
            b's' | b'S' => class_escape(PosixClass::PerlSpace, c == b'S'),
            b'd' | b'D' => class_escape(PosixClass::Digit, c == b'D'),
            b'C' => Node::AnyByte,
            b'p' | b'P' | b'X' => {
                return error(ErrorKind::UnsupportedEscape(c as char), start..start + 2);
            }
            b'1'..=b'9' => {
                let digits_start = self.pos;
                let val = self.consume_decimal().unwrap_or(0);
                // \10 and up are octal unless that many groups are open.
                if val <= 9 || val <= self.group_count as usize {
                    self.note_backref(val, start..self.pos);
                    self.add_cost(2);
                    let fold = if self.flags.icase {
                        Some(self.fold_table())
                    } else {
                        None
                    };
                    return Ok(Node::BackRef {
                        group: val.min(u32::MAX as usize) as u32,
                        fold,
                    });
                }
                self.pos = digits_start;
                return self.escaped_literal(start);
            }
            _ => return self.escaped_literal(start),
        };
        self.consume(c);
        if matches!(node, Node::ClassEscape { .. } | Node::AnyByte) {
            self.add_cost(1);
        }
        Ok(node)
    }

    fn escaped_literal(&mut self, start: usize) -> Result<Node, CompileError> {
        Ok(match self.consume_character_escape(start)? {
            EscapedChar::Byte(b) => self.make_literal(&[b]),
            EscapedChar::Wide(ch) => {
                let mut buf = [0; 4];
                self.make_literal(ch.encode_utf8(&mut buf).as_bytes())
            }
        })
    }

    /// Parse a character escape. The backslash at \p start has been consumed.
    fn consume_character_escape(&mut self, start: usize) -> Result<EscapedChar, CompileError> {
        let c = match self.peek() {
            Some(c) => c,
            None => return error(ErrorKind::TrailingBackslash, start..start + 1),
        };
        let byte = match c {
            b'n' => 0x0A,
            b'r' => 0x0D,
            b't' => 0x09,
            b'f' => 0x0C,
            b'e' => 0x1B,
            b'a' => 0x07,
            b'c' => {
                self.consume(c);
                return match self.next() {
                    Some(nc) if nc.is_ascii() => Ok(EscapedChar::Byte(nc.to_ascii_uppercase() ^ 64)),
                    _ => error(ErrorKind::MissingControlChar, start..self.pos),
                };
            }
            b'x' => {
                self.consume(c);
                return self.consume_hex_escape(start);
            }
            b'0'..=b'7' => {
                let mut val: u32 = 0;
                let mut count = 0;
                while let Some(d @ b'0'..=b'7') = self.peek() {
                    if count == 3 {
                        break;
                    }
                    self.consume(d);
                    val = val * 8 + u32::from(d - b'0');
                    count += 1;
                }
                return Ok(EscapedChar::Byte((val & 0xFF) as u8));
            }
            _ => {
                // Any other escaped character is itself.
                let ch = self.peek_char().unwrap_or(c as char);
                self.pos += ch.len_utf8();
                return Ok(if ch.is_ascii() {
                    EscapedChar::Byte(ch as u8)
                } else {
                    EscapedChar::Wide(ch)
                });
            }
        };
        self.consume(c);
        Ok(EscapedChar::Byte(byte))
    }

    /// Parse \xHH or \x{HHHH}, after the x.
    fn consume_hex_escape(&mut self, start: usize) -> Result<EscapedChar, CompileError> {
        let hex_value = |digits: &[u8]| {
            digits
                .iter()
                .map_while(|&d| (d as char).to_digit(16))
                .fold(0u32, |acc, d| acc.saturating_mul(16).saturating_add(d))
        };
        let val = if self.try_consume(b'{') {
            let close = match self.input[self.pos..].iter().position(|&b| b == b'}') {
                Some(idx) => self.pos + idx,
                None => return error(ErrorKind::MissingBrace, start..self.input.len()),
            };
            let val = hex_value(&self.input[self.pos..close]);
            self.pos = close + 1;
            val
        } else {
            let mut digits = 0;
            while digits < 2 && self.peek_at(digits).map_or(false, |d| d.is_ascii_hexdigit()) {
                digits += 1;
            }
            let val = hex_value(&self.input[self.pos..self.pos + digits]);
            self.pos += digits;
            val
        };
        if val <= 0xFF {
            Ok(EscapedChar::Byte(val as u8))
        } else {
            Ok(EscapedChar::Wide(
                char::from_u32(val).unwrap_or(char::REPLACEMENT_CHARACTER),
            ))
        }
    }

    /// Parse a bracket expression, starting at '['.
    fn consume_bracket(&mut self) -> Result<Node, CompileError> {
        let open = self.pos;
        self.consume(b'[');
        let invert = self.try_consume(b'^');
        let mut builder = CharClassBuilder::new(invert, self.flags.icase, self.flags.locale);
        let mut first = true;
        loop {
            match self.peek() {
                None => return error(ErrorKind::UnmatchedBracket, open..open + 1),
                // A leading ] is literal.
                Some(b']') if !first => {
                    self.consume(b']');
                    break;
                }
                _ => {}
            }
            first = false;

            let item_start = self.pos;
            let lo = match self.consume_class_atom(open)? {
                ClassAtom::Byte(b) => b,
                ClassAtom::Class { class, negated } => {
                    builder.add_class(class, negated);
                    // A class can't start a range, so \w-x has a literal dash.
                    if self.at_class_range_dash() {
                        self.consume(b'-');
                        builder.add_byte(b'-');
                    }
                    continue;
                }
            };

            if !self.at_class_range_dash() {
                builder.add_byte(lo);
                continue;
            }
            self.consume(b'-');
            match self.consume_class_atom(open)? {
                ClassAtom::Byte(hi) => {
                    if hi < lo {
                        return error(ErrorKind::InvalidRange, item_start..self.pos);
                    }
                    builder.add_range(lo, hi)
                }
                ClassAtom::Class { class, negated } => {
                    // Like [a-\d]: the dash is literal.
                    builder.add_byte(lo);
                    builder.add_byte(b'-');
                    builder.add_class(class, negated);
                }
            }
        }
        self.add_cost(1);
        Ok(Node::Class(Box::new(builder.build())))
    }

    /// \return whether the next bytes are a dash that forms a range.
    fn at_class_range_dash(&self) -> bool {
        self.peek() == Some(b'-') && matches!(self.peek_at(1), Some(c) if c != b']')
    }

    fn consume_class_atom(&mut self, open: usize) -> Result<ClassAtom, CompileError> {
        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return error(ErrorKind::UnmatchedBracket, open..open + 1),
        };
        match c {
            b'[' if matches!(self.peek_at(1), Some(b':') | Some(b'=') | Some(b'.')) => {
                if let Some(atom) = self.try_consume_posix_class()? {
                    return Ok(atom);
                }
                self.consume(c);
                Ok(ClassAtom::Byte(c))
            }
            b'\\' => {
                self.consume(c);
                let ec = match self.peek() {
                    Some(ec) => ec,
                    None => return error(ErrorKind::UnmatchedBracket, open..open + 1),
                };
                let class = match ec {
                    b'w' | b'W' => Some(PosixClass::Word),
                    b's' | b'S' => Some(PosixClass::PerlSpace),
                    b'd' | b'D' => Some(PosixClass::Digit),
                    _ => None,
                };
                if let Some(class) = class {
                    self.consume(ec);
                    return Ok(ClassAtom::Class {
                        class,
                        negated: ec.is_ascii_uppercase(),
                    });
                }
                if ec == b'b' {
                    // Backspace inside brackets.
                    self.consume(ec);
                    return Ok(ClassAtom::Byte(0x08));
                }
                match self.consume_character_escape(start)? {
                    EscapedChar::Byte(b) => Ok(ClassAtom::Byte(b)),
                    EscapedChar::Wide(_) => error(ErrorKind::WideCharInClass, start..self.pos),
                }
            }
            c if c >= 0x80 => {
                let len = self.peek_char().map_or(1, char::len_utf8);
                error(ErrorKind::WideCharInClass, start..start + len)
            }
            c => {
                self.consume(c);
                Ok(ClassAtom::Byte(c))
            }
        }
    }

    /// Try parsing [:name:], [=x=] or [.x.] at the current '['.
    /// \return None if this is not a complete POSIX class, in which case the
    /// '[' is literal.
    fn try_consume_posix_class(&mut self) -> Result<Option<ClassAtom>, CompileError> {
        let start = self.pos;
        let delim = self.input[start + 1];
        let body_start = start + 2;
        let close = match self.input[body_start..].iter().position(|&b| b == delim) {
            Some(idx) => body_start + idx,
            None => return Ok(None),
        };
        if self.input.get(close + 1) != Some(&b']') {
            return Ok(None);
        }
        let span = start..close + 2;
        if delim != b':' {
            return error(ErrorKind::ReservedPosixSyntax(delim as char), span);
        }
        let name = &self.input[body_start..close];
        let (negated, name) = match name.split_first() {
            Some((b'^', rest)) => (true, rest),
            _ => (false, name),
        };
        match PosixClass::from_name(name) {
            Some(class) => {
                self.pos = span.end;
                Ok(Some(ClassAtom::Class { class, negated }))
            }
            None => error(
                ErrorKind::UnknownPosixClass(String::from_utf8_lossy(name).into_owned()),
                span,
            ),
        }
    }

    /// \return whether the input is at a {n}, {n,} or {n,m} quantifier.
    /// Any other '{' is a literal.
    fn at_curly(&self) -> bool {
        let rest = &self.input[self.pos..];
        if rest.first() != Some(&b'{') {
            return false;
        }
        let mut idx = 1;
        let digits = |idx: &mut usize| {
            let begin = *idx;
            while rest.get(*idx).map_or(false, u8::is_ascii_digit) {
                *idx += 1;
            }
            *idx - begin
        };
        if digits(&mut idx) == 0 {
            return false;
        }
        if rest.get(idx) == Some(&b',') {
            idx += 1;
            digits(&mut idx);
        }
        rest.get(idx) == Some(&b'}')
    }

    fn at_quantifier(&self) -> bool {
        match self.peek() {
            Some(b'*') | Some(b'+') | Some(b'?') => true,
            Some(b'{') => self.at_curly(),
            _ => false,
        }
    }

    fn try_consume_quantifier(&mut self) -> Result<Option<ir::Quantifier>, CompileError> {
        let start = self.pos;
        let (min, max) = match self.peek() {
            Some(b'*') => {
                self.consume(b'*');
                (0, None)
            }
            Some(b'+') => {
                self.consume(b'+');
                (1, None)
            }
            Some(b'?') => {
                self.consume(b'?');
                (0, Some(1))
            }
            Some(b'{') if self.at_curly() => {
                self.consume(b'{');
                let min = self.consume_decimal().unwrap_or(0);
                let max = if self.try_consume(b',') {
                    // Like {3,} or {3,4}.
                    self.consume_decimal()
                } else {
                    // Like {3}.
                    Some(min)
                };
                self.consume(b'}');
                let span = start..self.pos;
                if min >= REG_INFTY || max.map_or(false, |max| max >= REG_INFTY) {
                    return error(ErrorKind::QuantifierTooBig(REG_INFTY - 1), span);
                }
                if max.map_or(false, |max| max < min) {
                    return error(ErrorKind::MinGreaterThanMax, span);
                }
                (min, max)
            }
            _ => return Ok(None),
        };
        let greedy = !self.try_consume(b'?');
        Ok(Some(ir::Quantifier { min, max, greedy }))
    }

    /// Consume a run of decimal digits.
    /// If the value would overflow, usize::MAX is returned.
    fn consume_decimal(&mut self) -> Option<usize> {
        let mut result: usize = 0;
        let mut char_count = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.consume(c);
            char_count += 1;
            result = result.saturating_mul(10);
            result = result.saturating_add((c - b'0') as usize);
        }
        if char_count > 0 {
            Some(result)
        } else {
            None
        }
    }
}

/// Try parsing a given pattern.
/// Return the resulting IR regex, or an error.
pub fn try_parse(pattern: &str, flags: api::Flags) -> Result<ir::Regex, CompileError> {
    let p = Parser {
        input: pattern.as_bytes(),
        pos: 0,
        flags,
        loop_count: 0,
        group_count: 0,
        max_backref: None,
        cost: 0,
        depth: 0,
    };
    p.try_parse()
}
