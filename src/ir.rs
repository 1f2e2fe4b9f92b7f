//! Intermediate representation for a regex

use crate::api;
use crate::charclass::{CharClass, PosixClass};
use crate::folds::FoldTable;
use crate::types::CaptureGroupID;
use crate::util::{add_max, mul_max};
use core::fmt;
use core::ops::Range;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnchorType {
    StartOfText,        // \A, or ^ without m
    StartOfLine,        // ^ with m
    EndOfText,          // \z
    EndOfTextOrNewline, // \Z, or $ without m
    EndOfLine,          // $ with m
    SearchStart,        // \G
}

/// A Quantifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quantifier {
    /// Minimum number of iterations of the loop, inclusive.
    pub min: usize,

    /// Maximum number of iterations of the loop, inclusive.
    /// None means unbounded.
    pub max: Option<usize>,

    /// Whether the loop is greedy.
    pub greedy: bool,
}

/// The condition of a conditional group.
#[derive(Debug)]
pub enum Condition {
    /// True if the group (1-based, as written) has matched.
    Group(u32),

    /// True if the lookaround succeeds. `behind` is the width for lookbehinds.
    Lookaround {
        negate: bool,
        behind: Option<usize>,
        contents: Box<Node>,
    },
}

/// The node types of our IR.
#[derive(Debug)]
pub enum Node {
    /// Matches the empty string.
    Empty,

    /// Match a literal byte sequence.
    /// If fold is set, then the bytes MUST be already folded with that table.
    Literal {
        bytes: Vec<u8>,
        fold: Option<FoldTable>,
    },

    /// Match one byte from a bracket expression.
    Class(Box<CharClass>),

    /// Match any byte including newlines.
    AnyByte,

    /// Match any byte except a newline.
    AnyExceptNewline,

    /// One of \w \W \s \S \d \D.
    ClassEscape {
        class: PosixClass,
        negate: bool,
        locale: bool,
    },

    /// Match an anchor like ^ or $
    Anchor(AnchorType),

    /// Word boundary (\b or \B).
    WordBoundary { invert: bool, locale: bool },

    /// Match the catenation of multiple nodes.
    Cat(Vec<Node>),

    /// Match an alternation like a|b|c. Alternatives are tried in order.
    Alt(Vec<Node>),

    /// A capturing group.
    CaptureGroup(Box<Node>, CaptureGroupID),

    /// A backreference, 1-based as written.
    BackRef { group: u32, fold: Option<FoldTable> },

    /// A lookaround assertion like (?=) or (?<!).
    /// `behind` is the fixed width of a lookbehind, and None for lookaheads.
    LookaroundAssertion {
        negate: bool,
        behind: Option<usize>,
        contents: Box<Node>,
    },

    /// An independent subexpression (?>...).
    Independent(Box<Node>),

    /// A conditional group (?(cond)yes|no).
    Conditional {
        condition: Condition,
        yes: Box<Node>,
        no: Box<Node>,
    },

    /// A loop like /(?:ab)*/ or /(x|y){3,5}?/.
    /// `cost` is the parser's cost score of the loop body.
    Loop {
        loopee: Box<Node>,
        quant: Quantifier,
        enclosed_groups: Range<u16>,
        cost: u32,
    },

    /// A loop whose body matches exactly one byte.
    /// Enclosed capture groups are forbidden here.
    Loop1CharBody { loopee: Box<Node>, quant: Quantifier },

    /// A loop whose body is a single capture group around a one byte matcher,
    /// like /(a)*/.
    LoopCaptured1Char {
        loopee: Box<Node>,
        quant: Quantifier,
        group: CaptureGroupID,
    },

    /// A loop whose body has a fixed nonzero width and no captures.
    LoopFixedWidth {
        loopee: Box<Node>,
        quant: Quantifier,
        width: usize,
    },
}

pub type NodeList = Vec<Node>;

impl Node {
    /// Helper to return an "always fails" node.
    pub fn make_always_fails() -> Node {
        Node::Alt(Vec::new())
    }

    /// \return whether this is an Empty node.
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// \return whether this is a Cat node.
    pub fn is_cat(&self) -> bool {
        matches!(self, Node::Cat(..))
    }

    /// \return whether this node is known to match exactly one byte.
    /// This is best-effort: a false return is always safe.
    pub fn matches_exactly_one_byte(&self) -> bool {
        match self {
            Node::Literal { bytes, .. } => bytes.len() == 1,
            Node::Class(..) => true,
            Node::AnyByte => true,
            Node::AnyExceptNewline => true,
            Node::ClassEscape { .. } => true,
            _ => false,
        }
    }

    /// \return true if this node will always fail to match.
    /// Note this is different than matching the empty string.
    pub fn match_always_fails(&self) -> bool {
        match self {
            Node::Alt(alts) => alts.is_empty(),
            Node::Class(cc) => cc.is_empty(),
            _ => false,
        }
    }

    /// \return the minimum and maximum number of bytes this node can match.
    /// A max of None means unbounded.
    pub fn width_bounds(&self) -> (usize, Option<usize>) {
        match self {
            Node::Empty
            | Node::Anchor(..)
            | Node::WordBoundary { .. }
            | Node::LookaroundAssertion { .. } => (0, Some(0)),
            Node::Literal { bytes, .. } => (bytes.len(), Some(bytes.len())),
            Node::Class(..) | Node::AnyByte | Node::AnyExceptNewline | Node::ClassEscape { .. } => {
                (1, Some(1))
            }
            Node::Cat(nodes) => nodes.iter().fold((0, Some(0)), |(min, max), n| {
                let (nmin, nmax) = n.width_bounds();
                (min.saturating_add(nmin), add_max(max, nmax))
            }),
            Node::Alt(alts) => {
                if alts.is_empty() {
                    return (0, Some(0));
                }
                let mut min = usize::MAX;
                let mut max = Some(0);
                for alt in alts {
                    let (amin, amax) = alt.width_bounds();
                    min = min.min(amin);
                    max = match (max, amax) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        _ => None,
                    };
                }
                (min, max)
            }
            Node::CaptureGroup(contents, ..) | Node::Independent(contents) => {
                contents.width_bounds()
            }
            Node::BackRef { .. } => (0, None),
            Node::Conditional { yes, no, .. } => {
                let (ymin, ymax) = yes.width_bounds();
                let (nmin, nmax) = no.width_bounds();
                let max = match (ymax, nmax) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
                (ymin.min(nmin), max)
            }
            Node::Loop { loopee, quant, .. }
            | Node::Loop1CharBody { loopee, quant }
            | Node::LoopCaptured1Char { loopee, quant, .. }
            | Node::LoopFixedWidth { loopee, quant, .. } => {
                let (bmin, bmax) = loopee.width_bounds();
                (bmin.saturating_mul(quant.min), mul_max(bmax, quant.max))
            }
        }
    }

    /// \return the width of this node if every match has the same width.
    pub fn fixed_width(&self) -> Option<usize> {
        match self.width_bounds() {
            (min, Some(max)) if min == max => Some(min),
            _ => None,
        }
    }

    /// Duplicate a node. Note we must never copy a capture group.
    ///
    /// Returns None if the depth is too high.
    pub fn try_duplicate(&self, mut depth: usize) -> Option<Node> {
        if depth > 100 {
            return None;
        }
        depth += 1;
        let dup = |n: &Node| n.try_duplicate(depth).map(Box::new);
        Some(match self {
            Node::Empty => Node::Empty,
            Node::Literal { bytes, fold } => Node::Literal {
                bytes: bytes.clone(),
                fold: *fold,
            },
            Node::Class(cc) => Node::Class(cc.clone()),
            Node::AnyByte => Node::AnyByte,
            Node::AnyExceptNewline => Node::AnyExceptNewline,
            &Node::ClassEscape {
                class,
                negate,
                locale,
            } => Node::ClassEscape {
                class,
                negate,
                locale,
            },
            &Node::Anchor(anchor_type) => Node::Anchor(anchor_type),
            &Node::WordBoundary { invert, locale } => Node::WordBoundary { invert, locale },
            Node::Cat(nodes) => {
                let mut new_nodes = Vec::with_capacity(nodes.len());
                for n in nodes {
                    new_nodes.push(n.try_duplicate(depth)?);
                }
                Node::Cat(new_nodes)
            }
            Node::Alt(alts) => {
                let mut new_alts = Vec::with_capacity(alts.len());
                for n in alts {
                    new_alts.push(n.try_duplicate(depth)?);
                }
                Node::Alt(new_alts)
            }
            &Node::BackRef { group, fold } => Node::BackRef { group, fold },
            Node::LookaroundAssertion {
                negate,
                behind,
                contents,
            } => Node::LookaroundAssertion {
                negate: *negate,
                behind: *behind,
                contents: dup(contents)?,
            },
            Node::Independent(contents) => Node::Independent(dup(contents)?),
            Node::Conditional { condition, yes, no } => Node::Conditional {
                condition: match condition {
                    &Condition::Group(g) => Condition::Group(g),
                    Condition::Lookaround {
                        negate,
                        behind,
                        contents,
                    } => Condition::Lookaround {
                        negate: *negate,
                        behind: *behind,
                        contents: dup(contents)?,
                    },
                },
                yes: dup(yes)?,
                no: dup(no)?,
            },
            Node::Loop {
                loopee,
                quant,
                enclosed_groups,
                cost,
            } => {
                assert!(
                    enclosed_groups.start >= enclosed_groups.end,
                    "Cannot duplicate a loop with enclosed groups"
                );
                Node::Loop {
                    loopee: dup(loopee)?,
                    quant: *quant,
                    enclosed_groups: enclosed_groups.clone(),
                    cost: *cost,
                }
            }
            Node::Loop1CharBody { loopee, quant } => Node::Loop1CharBody {
                loopee: dup(loopee)?,
                quant: *quant,
            },
            Node::LoopFixedWidth {
                loopee,
                quant,
                width,
            } => Node::LoopFixedWidth {
                loopee: dup(loopee)?,
                quant: *quant,
                width: *width,
            },
            Node::CaptureGroup(..) | Node::LoopCaptured1Char { .. } => {
                panic!("Refusing to duplicate a capture group");
            }
        })
    }
}

/// A helper type for walking.
#[derive(Debug, Clone)]
pub struct Walk {
    // It set to true, skip the children of this node.
    pub skip_children: bool,

    // The current depth of the walk.
    pub depth: usize,

    // If true, we are in a lookbehind.
    pub in_lookbehind: bool,
}

impl Walk {
    fn new() -> Self {
        Self {
            skip_children: false,
            depth: 0,
            in_lookbehind: false,
        }
    }
}

#[derive(Debug)]
struct Walker<'a, F>
where
    F: FnMut(&Node, &mut Walk),
{
    func: &'a mut F,
    postorder: bool,
    walk: Walk,
}

impl<F> Walker<'_, F>
where
    F: FnMut(&Node, &mut Walk),
{
    fn process_lookaround(&mut self, behind: bool, contents: &Node) {
        let saved = self.walk.in_lookbehind;
        self.walk.in_lookbehind = behind;
        self.process(contents);
        self.walk.in_lookbehind = saved;
    }

    fn process_children(&mut self, n: &Node) {
        match n {
            Node::Empty
            | Node::Literal { .. }
            | Node::Class(..)
            | Node::AnyByte
            | Node::AnyExceptNewline
            | Node::ClassEscape { .. }
            | Node::Anchor(..)
            | Node::WordBoundary { .. }
            | Node::BackRef { .. } => {}
            Node::Cat(nodes) | Node::Alt(nodes) => {
                for node in nodes {
                    self.process(node);
                }
            }
            Node::Loop { loopee, .. }
            | Node::Loop1CharBody { loopee, .. }
            | Node::LoopCaptured1Char { loopee, .. }
            | Node::LoopFixedWidth { loopee, .. } => self.process(loopee),
            Node::CaptureGroup(contents, ..) | Node::Independent(contents) => {
                self.process(contents.as_ref())
            }
            Node::LookaroundAssertion {
                behind, contents, ..
            } => self.process_lookaround(behind.is_some(), contents),
            Node::Conditional { condition, yes, no } => {
                if let Condition::Lookaround {
                    behind, contents, ..
                } = condition
                {
                    self.process_lookaround(behind.is_some(), contents);
                }
                self.process(yes);
                self.process(no);
            }
        }
    }

    fn process(&mut self, n: &Node) {
        self.walk.skip_children = false;
        if !self.postorder {
            (self.func)(n, &mut self.walk);
        }
        if !self.walk.skip_children {
            self.walk.depth += 1;
            self.process_children(n);
            self.walk.depth -= 1;
        }
        if self.postorder {
            (self.func)(n, &mut self.walk)
        }
    }
}

#[derive(Debug)]
struct MutWalker<'a, F>
where
    F: FnMut(&mut Node, &mut Walk),
{
    func: &'a mut F,
    postorder: bool,
    walk: Walk,
}

impl<F> MutWalker<'_, F>
where
    F: FnMut(&mut Node, &mut Walk),
{
    fn process_lookaround(&mut self, behind: bool, contents: &mut Node) {
        let saved = self.walk.in_lookbehind;
        self.walk.in_lookbehind = behind;
        self.process(contents);
        self.walk.in_lookbehind = saved;
    }

    fn process_children(&mut self, n: &mut Node) {
        match n {
            Node::Empty
            | Node::Literal { .. }
            | Node::Class(..)
            | Node::AnyByte
            | Node::AnyExceptNewline
            | Node::ClassEscape { .. }
            | Node::Anchor(..)
            | Node::WordBoundary { .. }
            | Node::BackRef { .. } => {}
            Node::Cat(nodes) | Node::Alt(nodes) => {
                nodes.iter_mut().for_each(|node| self.process(node));
            }
            Node::Loop { loopee, .. }
            | Node::Loop1CharBody { loopee, .. }
            | Node::LoopCaptured1Char { loopee, .. }
            | Node::LoopFixedWidth { loopee, .. } => {
                self.process(loopee);
            }
            Node::CaptureGroup(contents, ..) | Node::Independent(contents) => {
                self.process(contents.as_mut())
            }
            Node::LookaroundAssertion {
                behind, contents, ..
            } => {
                let behind = behind.is_some();
                self.process_lookaround(behind, contents)
            }
            Node::Conditional { condition, yes, no } => {
                if let Condition::Lookaround {
                    behind, contents, ..
                } = condition
                {
                    let behind = behind.is_some();
                    self.process_lookaround(behind, contents);
                }
                self.process(yes);
                self.process(no);
            }
        }
    }

    fn process(&mut self, n: &mut Node) {
        self.walk.skip_children = false;
        if !self.postorder {
            (self.func)(n, &mut self.walk);
        }
        if !self.walk.skip_children {
            self.walk.depth += 1;
            self.process_children(n);
            self.walk.depth -= 1;
        }
        if self.postorder {
            (self.func)(n, &mut self.walk);
        }
    }
}

/// Call a function on every Node.
/// If \p postorder is true, then process children before the node;
/// otherwise process children after the node.
pub fn walk<F>(postorder: bool, n: &Node, func: &mut F)
where
    F: FnMut(&Node, &mut Walk),
{
    let mut walker = Walker {
        func,
        postorder,
        walk: Walk::new(),
    };
    walker.process(n);
}

/// Call a function on every Node, which may mutate the node.
/// If \p postorder is true, then process children before the node;
/// otherwise process children after the node.
/// A preorder function may set `skip_children` to avoid descending.
pub fn walk_mut<F>(postorder: bool, n: &mut Node, func: &mut F)
where
    F: FnMut(&mut Node, &mut Walk),
{
    let mut walker = MutWalker {
        func,
        postorder,
        walk: Walk::new(),
    };
    walker.process(n);
}

/// A regex in IR form.
pub struct Regex {
    pub node: Node,
    pub flags: api::Flags,

    /// Number of capture groups, not counting the whole match.
    pub group_count: u16,

    /// The parser's cost score for the whole pattern.
    pub cost: u32,
}

fn display_bytes(bytes: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    for &b in bytes {
        write!(f, "{}", core::ascii::escape_default(b))?;
    }
    Ok(())
}

fn display_node(node: &Node, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "..")?;
    }
    match node {
        Node::Empty => writeln!(f, "Empty"),
        Node::Literal { bytes, fold } => {
            write!(f, "Literal '")?;
            display_bytes(bytes, f)?;
            match fold {
                Some(table) => writeln!(f, "' fold {:?}", table),
                None => writeln!(f, "'"),
            }
        }
        Node::Class(cc) => writeln!(f, "Class {:?}", cc),
        Node::AnyByte => writeln!(f, "AnyByte"),
        Node::AnyExceptNewline => writeln!(f, "AnyExceptNewline"),
        Node::ClassEscape {
            class,
            negate,
            locale,
        } => writeln!(
            f,
            "ClassEscape {:?}{}{}",
            class,
            if *negate { " negated" } else { "" },
            if *locale { " locale" } else { "" }
        ),
        Node::Anchor(anchor_type) => writeln!(f, "Anchor {:?}", anchor_type),
        &Node::WordBoundary { invert, .. } => {
            let kind = if invert { "\\B" } else { "\\b" };
            writeln!(f, "WordBoundary {:?} ", kind)
        }
        Node::Cat(..) => writeln!(f, "Cat"),
        Node::Alt(alts) => writeln!(f, "Alt {}", alts.len()),
        Node::CaptureGroup(_node, idx) => writeln!(f, "CaptureGroup {:?}", idx),
        Node::BackRef { group, .. } => writeln!(f, "BackRef {:?} ", group),
        &Node::LookaroundAssertion { negate, behind, .. } => {
            let sense = if negate { "negative" } else { "positive" };
            match behind {
                Some(width) => writeln!(f, "LookaroundAssertion {} backwards {}", sense, width),
                None => writeln!(f, "LookaroundAssertion {} forwards", sense),
            }
        }
        Node::Independent(..) => writeln!(f, "Independent"),
        Node::Conditional { condition, .. } => match condition {
            Condition::Group(g) => writeln!(f, "Conditional group {}", g),
            Condition::Lookaround { negate, .. } => {
                writeln!(f, "Conditional lookaround negate={}", negate)
            }
        },
        Node::Loop {
            quant,
            enclosed_groups,
            cost,
            ..
        } => writeln!(
            f,
            "Loop (groups {:?}, cost {}) {:?}",
            enclosed_groups, cost, quant
        ),
        Node::Loop1CharBody { quant, .. } => writeln!(f, "Loop1Char {:?}", quant),
        Node::LoopCaptured1Char { quant, group, .. } => {
            writeln!(f, "LoopCaptured1Char group {} {:?}", group, quant)
        }
        Node::LoopFixedWidth { quant, width, .. } => {
            writeln!(f, "LoopFixedWidth width {} {:?}", width, quant)
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = Ok(());
        walk(false, &self.node, &mut |node: &Node, walk: &mut Walk| {
            if result.is_ok() {
                result = display_node(node, walk.depth, f)
            }
        });
        result
    }
}
