//! Regex compiler back-end: transforms IR into a CompiledRegex

use crate::charclass::{escape_class, PosixClass};
use crate::folds::FoldTable;
use crate::insn::{CompiledRegex, IfCondition, Insn, LoopFields, Op};
use crate::ir;
use crate::ir::{Condition, Node};
use crate::study::StudyData;
use crate::types::{CaptureGroupID, LoopID, IP, MAX_LOOPS};
use crate::util::DebugCheckIndex;

/// \return an anchor instruction for a given IR anchor.
fn make_anchor(anchor_type: ir::AnchorType) -> Op {
    match anchor_type {
        ir::AnchorType::StartOfText => Op::SBol,
        ir::AnchorType::StartOfLine => Op::MBol,
        ir::AnchorType::EndOfText => Op::Eos,
        ir::AnchorType::EndOfTextOrNewline => Op::SEol,
        ir::AnchorType::EndOfLine => Op::MEol,
        ir::AnchorType::SearchStart => Op::GPos,
    }
}

fn make_loop_fields(quant: &ir::Quantifier) -> LoopFields {
    LoopFields {
        min_iters: quant.min,
        max_iters: quant.max.unwrap_or(usize::MAX),
        greedy: quant.greedy,
    }
}

/// Group numbers are written 1-based; group ids are 0-based.
fn group_id(group: u32) -> CaptureGroupID {
    debug_assert!(group > 0, "Group 0 is not referenceable");
    (group - 1) as CaptureGroupID
}

/// The first and last node of an emitted fragment.
/// `last` is the node whose `next` continues past the fragment.
#[derive(Debug, Copy, Clone)]
struct Chain {
    head: IP,
    last: IP,
}

impl Chain {
    fn single(ip: IP) -> Chain {
        Chain { head: ip, last: ip }
    }
}

/// Type which wraps up the context needed to emit a program.
/// The same walk runs twice: once only counting nodes, then for real into a
/// buffer of exactly that size.
struct Emitter {
    insns: Vec<Insn>,

    // If set, count nodes but store nothing.
    size_only: bool,

    // Number of nodes emitted so far.
    count: usize,

    // Number of loops seen so far.
    next_loop_id: usize,
}

impl Emitter {
    fn new(size_only: bool, capacity: usize) -> Emitter {
        Emitter {
            insns: Vec::with_capacity(capacity),
            size_only,
            count: 0,
            next_loop_id: 0,
        }
    }

    /// Emit an instruction.
    /// Return the instruction's index.
    fn emit_insn(&mut self, op: Op) -> IP {
        let ip = self.count;
        self.count += 1;
        if !self.size_only {
            self.insns.push(Insn::new(op));
        }
        ip
    }

    /// Link \p from to \p to in sequence.
    fn set_next(&mut self, from: IP, to: IP) {
        if self.size_only {
            return;
        }
        debug_assert!(to > from, "Sequence links must point forwards");
        debug_assert!(to - from <= u32::MAX as usize, "Program too large");
        self.insns.mat(from).next = (to - from) as u32;
    }

    /// Replace the op at \p ip, once jump targets are known.
    fn patch(&mut self, ip: IP, op: Op) {
        if !self.size_only {
            self.insns.mat(ip).op = op;
        }
    }

    /// Emit a node whose body follows it and ends in Succeed.
    fn emit_subprogram(&mut self, op: Op, contents: &Node) -> Chain {
        let ip = self.emit_insn(op);
        let body = self.emit_node(contents);
        let succeed = self.emit_insn(Op::Succeed);
        self.set_next(body.last, succeed);
        Chain::single(ip)
    }

    /// Emit a loop whose body is a single node matching one byte.
    fn emit_single_byte_loop(&mut self, op: Op, loopee: &Node) -> Chain {
        let ip = self.emit_insn(op);
        let body = self.emit_node(loopee);
        debug_assert!(
            body.head == ip + 1 && body.last == body.head,
            "Single byte loop body should be one node"
        );
        debug_assert!(
            self.size_only || self.insns.iat(body.head).op.is_single_byte(),
            "Single byte loop body should match one byte"
        );
        Chain::single(ip)
    }

    fn emit_alternation(&mut self, alts: &[Node]) -> Chain {
        let mut branches = Vec::with_capacity(alts.len());
        let mut lasts = Vec::with_capacity(alts.len());
        for alt in alts {
            branches.push(self.emit_insn(Op::Branch));
            lasts.push(self.emit_node(alt).last);
        }
        let join = self.emit_insn(Op::Tail);
        for (idx, &branch) in branches.iter().enumerate() {
            let next_branch = branches.get(idx + 1).copied().unwrap_or(join);
            self.set_next(branch, next_branch);
            self.set_next(lasts[idx], join);
        }
        Chain {
            head: branches[0],
            last: join,
        }
    }

    fn emit_conditional(&mut self, condition: &Condition, yes: &Node, no: &Node) -> Chain {
        let placeholder = Op::IfThen {
            cond: IfCondition::Group(0),
            yes: 0,
            no: 0,
        };
        let ip = self.emit_insn(placeholder);
        let cond = match condition {
            &Condition::Group(group) => IfCondition::Group(group_id(group)),
            Condition::Lookaround {
                negate,
                behind,
                contents,
            } => {
                let body = self.emit_node(contents);
                let succeed = self.emit_insn(Op::Succeed);
                self.set_next(body.last, succeed);
                IfCondition::Assertion {
                    negate: *negate,
                    behind: *behind,
                }
            }
        };
        let yes_chain = self.emit_node(yes);
        let long_jump = self.emit_insn(Op::LongJump);
        self.set_next(yes_chain.last, long_jump);
        let no_chain = self.emit_node(no);
        let join = self.emit_insn(Op::Tail);
        self.set_next(long_jump, join);
        self.set_next(no_chain.last, join);
        self.set_next(ip, join);
        self.patch(
            ip,
            Op::IfThen {
                cond,
                yes: yes_chain.head,
                no: no_chain.head,
            },
        );
        Chain {
            head: ip,
            last: join,
        }
    }

    /// Emit instructions corresponding to a given node.
    fn emit_node(&mut self, node: &Node) -> Chain {
        match node {
            Node::Empty => Chain::single(self.emit_insn(Op::Nothing)),
            Node::Literal { bytes, fold } => {
                let bytes: Box<[u8]> = bytes.as_slice().into();
                let op = match fold {
                    None => Op::Exact(bytes),
                    Some(FoldTable::Ascii) => Op::ExactFold(bytes),
                    Some(FoldTable::Locale) => Op::ExactFoldLocale(bytes),
                };
                Chain::single(self.emit_insn(op))
            }
            Node::Class(cc) => Chain::single(self.emit_insn(Op::AnyOf(cc.clone()))),
            Node::AnyByte => Chain::single(self.emit_insn(Op::SAny)),
            Node::AnyExceptNewline => Chain::single(self.emit_insn(Op::ReAny)),
            &Node::ClassEscape {
                class,
                negate,
                locale,
            } => {
                let op = match class {
                    PosixClass::Word => Op::Alnum {
                        invert: negate,
                        locale,
                    },
                    PosixClass::PerlSpace => Op::Space {
                        invert: negate,
                        locale,
                    },
                    PosixClass::Digit => Op::Digit { invert: negate },
                    _ => Op::AnyOf(Box::new(escape_class(class, negate, locale))),
                };
                Chain::single(self.emit_insn(op))
            }
            &Node::Anchor(anchor_type) => Chain::single(self.emit_insn(make_anchor(anchor_type))),
            &Node::WordBoundary { invert, locale } => {
                Chain::single(self.emit_insn(Op::Bound { invert, locale }))
            }
            Node::Cat(children) => {
                let mut chain: Option<Chain> = None;
                for nn in children {
                    let c = self.emit_node(nn);
                    chain = Some(match chain {
                        None => c,
                        Some(prev) => {
                            self.set_next(prev.last, c.head);
                            Chain {
                                head: prev.head,
                                last: c.last,
                            }
                        }
                    });
                }
                match chain {
                    Some(chain) => chain,
                    None => Chain::single(self.emit_insn(Op::Nothing)),
                }
            }
            Node::Alt(alts) => match alts.len() {
                0 => Chain::single(self.emit_insn(Op::Fail)),
                1 => self.emit_node(&alts[0]),
                _ => self.emit_alternation(alts),
            },
            Node::CaptureGroup(contents, group) => {
                let open = self.emit_insn(Op::Open(*group));
                let body = self.emit_node(contents);
                let close = self.emit_insn(Op::Close(*group));
                self.set_next(open, body.head);
                self.set_next(body.last, close);
                Chain {
                    head: open,
                    last: close,
                }
            }
            &Node::BackRef { group, fold } => {
                let id = group_id(group);
                let op = match fold {
                    None => Op::Ref(id),
                    Some(FoldTable::Ascii) => Op::RefFold(id),
                    Some(FoldTable::Locale) => Op::RefFoldLocale(id),
                };
                Chain::single(self.emit_insn(op))
            }
            Node::LookaroundAssertion {
                negate,
                behind,
                contents,
            } => {
                let behind = *behind;
                let op = if *negate {
                    Op::UnlessM { behind }
                } else {
                    Op::IfMatch { behind }
                };
                self.emit_subprogram(op, contents)
            }
            Node::Independent(contents) => self.emit_subprogram(Op::Suspend, contents),
            Node::Conditional { condition, yes, no } => self.emit_conditional(condition, yes, no),
            Node::Loop { loopee, quant, .. } => {
                debug_assert!(self.next_loop_id < MAX_LOOPS, "Too many loops");
                let loop_id = self.next_loop_id as LoopID;
                self.next_loop_id += 1;
                let ip = self.emit_insn(Op::CurlyX {
                    fields: make_loop_fields(quant),
                    loop_id,
                });
                let body = self.emit_node(loopee);
                let whilem = self.emit_insn(Op::WhileM { begin: ip });
                self.set_next(body.last, whilem);
                Chain::single(ip)
            }
            Node::Loop1CharBody { loopee, quant } => {
                let op = match (quant.min, quant.max, quant.greedy) {
                    (0, None, true) => Op::Star,
                    (1, None, true) => Op::Plus,
                    _ => Op::Curly(make_loop_fields(quant)),
                };
                self.emit_single_byte_loop(op, loopee)
            }
            Node::LoopCaptured1Char {
                loopee,
                quant,
                group,
            } => self.emit_single_byte_loop(
                Op::CurlyN {
                    fields: make_loop_fields(quant),
                    group: *group,
                },
                loopee,
            ),
            Node::LoopFixedWidth {
                loopee,
                quant,
                width,
            } => self.emit_subprogram(
                Op::CurlyM {
                    fields: make_loop_fields(quant),
                    width: *width,
                },
                loopee,
            ),
        }
    }

    fn emit_program(&mut self, node: &Node) {
        let body = self.emit_node(node);
        let end = self.emit_insn(Op::End);
        self.set_next(body.last, end);
    }
}

/// Compile the given IR to a program.
/// The study data is left empty; see `study::study`.
pub fn emit(n: &ir::Regex) -> CompiledRegex {
    let mut sizer = Emitter::new(true, 0);
    sizer.emit_program(&n.node);
    let size = sizer.count;

    let mut emitter = Emitter::new(false, size);
    emitter.emit_program(&n.node);
    assert_eq!(
        emitter.insns.len(),
        size,
        "Emit pass disagrees with sizing pass"
    );
    CompiledRegex {
        insns: emitter.insns,
        groups: n.group_count,
        loops: emitter.next_loop_id as u16,
        flags: n.flags,
        cost: n.cost,
        study: StudyData::default(),
    }
}
