//! Optimizations on regex IR

use crate::folds::{other_case, FoldTable};
use crate::ir::*;
use crate::types::{MAX_LOOPS, REG_INFTY};

/// When unrolling a loop, the largest minimum count we will unroll.
const LOOP_UNROLL_THRESHOLD: usize = 5;

/// The largest IR size that unrolling may produce from a single loop.
const LOOP_UNROLL_MAX_SIZE: usize = 1024;

/// The largest body cost for which a counted loop gets the fixed-width form.
/// Costlier bodies go through the general loop, which can backtrack into them.
const FIXED_WIDTH_LOOP_MAX_COST: u32 = 16;

/// Things that a Pass may do.
pub enum PassAction {
    // Do nothing to the given node.
    Keep,

    // Notes that we modified the node in-place.
    Modified,

    // Remove the given node outright, effectively replacing it with empty.
    Remove,

    /// Replace the given node with a new Node.
    Replace(Node),
}

#[derive(Debug)]
struct Pass<'a, F>
where
    F: FnMut(&mut Node, &Walk) -> PassAction,
{
    // The function.
    func: &'a mut F,

    // Whether this pass has changed anything.
    changed: bool,
}

impl<'a, F> Pass<'a, F>
where
    F: FnMut(&mut Node, &Walk) -> PassAction,
{
    fn new(func: &'a mut F) -> Self {
        Pass {
            func,
            changed: false,
        }
    }

    fn run_postorder(&mut self, start: &mut Node) {
        walk_mut(true, start, &mut |n: &mut Node, walk: &mut Walk| {
            match (self.func)(n, walk) {
                PassAction::Keep => {}
                PassAction::Modified => {
                    self.changed = true;
                }
                PassAction::Remove => {
                    *n = Node::Empty;
                    self.changed = true;
                }
                PassAction::Replace(newnode) => {
                    *n = newnode;
                    self.changed = true;
                }
            }
        })
    }

    fn run_to_fixpoint(&mut self, n: &mut Node) {
        debug_assert!(!self.changed, "Pass has already been run");
        loop {
            self.changed = false;
            self.run_postorder(n);
            if !self.changed {
                break;
            }
        }
    }
}

/// Run a "pass" on a regex, which is a function that takes a Node and maybe
/// returns a new node. \return true if something changed, false if nothing did.
fn run_pass<F>(r: &mut Regex, func: &mut F) -> bool
where
    F: FnMut(&mut Node, &Walk) -> PassAction,
{
    let mut p = Pass::new(func);
    p.run_to_fixpoint(&mut r.node);
    p.changed
}

/// Take a boxed node, leaving Empty in its place.
fn take(node: &mut Box<Node>) -> Box<Node> {
    core::mem::replace(node, Box::new(Node::Empty))
}

// Remove empty Nodes.
fn remove_empties(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Literal { bytes, .. } if bytes.is_empty() => PassAction::Remove,
        Node::Cat(nodes) => {
            let blen = nodes.len();
            nodes.retain(|nn| !nn.is_empty());
            if nodes.len() == blen {
                // Nothing was removed.
                PassAction::Keep
            } else {
                match nodes.len() {
                    0 => PassAction::Remove,
                    1 => PassAction::Replace(nodes.pop().unwrap_or(Node::Empty)),
                    _ => PassAction::Modified,
                }
            }
        }
        // Empty alternatives match the empty string and must stay.
        // A single alternative is just itself.
        Node::Alt(alts) if alts.len() == 1 => {
            PassAction::Replace(alts.pop().unwrap_or(Node::Empty))
        }
        Node::Loop {
            quant,
            loopee,
            enclosed_groups,
            ..
        } => {
            // A loop is empty if it has an empty body, or 0 max iters.
            // But do not remove contained capture groups.
            if loopee.is_empty()
                || (quant.max == Some(0) && enclosed_groups.start == enclosed_groups.end)
            {
                PassAction::Remove
            } else {
                PassAction::Keep
            }
        }
        Node::Independent(contents) if contents.is_empty() => PassAction::Remove,
        Node::LookaroundAssertion {
            negate, contents, ..
        } => {
            // Negative arounds that match empties could in principle be optimized to always
            // fail. Here we only optimize positive ones.
            if !*negate && contents.is_empty() {
                PassAction::Remove
            } else {
                PassAction::Keep
            }
        }
        _ => PassAction::Keep,
    }
}

/// Check if a node contains any capture groups (direct or nested)
fn contains_capture_groups(node: &Node) -> bool {
    let mut found = false;
    walk(false, node, &mut |n: &Node, w: &mut Walk| {
        if matches!(n, Node::CaptureGroup(..) | Node::LoopCaptured1Char { .. }) {
            found = true;
        }
        w.skip_children = found;
    });
    found
}

// If a node can never match, replace it with an always fails node.
fn propagate_early_fails(n: &mut Node, _w: &Walk) -> PassAction {
    // Don't optimize nodes containing capture groups to preserve user-visible group numbers
    if contains_capture_groups(n) {
        return PassAction::Keep;
    }

    match n {
        Node::Cat(nodes) => {
            // If any child is an early fail, we are an early fail.
            if nodes.iter().any(|nn| nn.match_always_fails()) {
                PassAction::Replace(Node::make_always_fails())
            } else {
                PassAction::Keep
            }
        }
        Node::Alt(alts) => {
            // Drop alternatives that always fail.
            if alts.len() > 1 && alts.iter().any(|a| a.match_always_fails()) {
                alts.retain(|a| !a.match_always_fails());
                PassAction::Modified
            } else {
                PassAction::Keep
            }
        }
        Node::Loop { loopee, quant, .. } => {
            // If the loop body always fails, we always fail.
            if quant.min > 0 && loopee.match_always_fails() {
                PassAction::Replace(Node::make_always_fails())
            } else {
                PassAction::Keep
            }
        }
        _ => PassAction::Keep,
    }
}

// Remove excess cats.
fn decat(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Cat(nodes) => {
            if nodes.is_empty() {
                PassAction::Remove
            } else if nodes.len() == 1 {
                PassAction::Replace(nodes.pop().unwrap_or(Node::Empty))
            } else if nodes.iter().any(|nn| nn.is_cat()) {
                // Flatmap child cats.
                // Avoid copying nodes by switching them into owned vec.
                let catted = core::mem::take(nodes);
                let mut decatted = Vec::new();
                for nn in catted {
                    match nn {
                        Node::Cat(mut nnodes) => {
                            decatted.append(&mut nnodes);
                        }
                        _ => decatted.push(nn),
                    }
                }
                PassAction::Replace(Node::Cat(decatted))
            } else {
                PassAction::Keep
            }
        }
        _ => PassAction::Keep,
    }
}

/// Caseless literals whose bytes have no other case don't need folding.
fn unfold_caseless_literals(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Literal {
            bytes,
            fold: fold @ Some(_),
        } => {
            let table = fold.unwrap_or(FoldTable::Ascii);
            if bytes.iter().all(|&b| other_case(b, table) == b) {
                *fold = None;
                PassAction::Modified
            } else {
                PassAction::Keep
            }
        }
        _ => PassAction::Keep,
    }
}

/// \return the number of general loops in \p node. Each one takes a loop id.
fn count_loops(node: &Node) -> usize {
    let mut count = 0;
    walk(false, node, &mut |n: &Node, _w: &mut Walk| {
        if matches!(n, Node::Loop { .. }) {
            count += 1;
        }
    });
    count
}

/// \return the size of \p node, counting nodes and literal bytes.
fn unroll_size(node: &Node) -> usize {
    let mut size = 0;
    walk(false, node, &mut |n: &Node, _w: &mut Walk| {
        size += match n {
            Node::Literal { bytes, .. } => 1 + bytes.len(),
            _ => 1,
        };
    });
    size
}

// Perform simple unrolling of loops that have a minimum.
// \p loops is the number of loops in the regex; unrolling never takes it
// past MAX_LOOPS.
fn unroll_loops(n: &mut Node, _w: &Walk, loops: &mut usize) -> PassAction {
    match n {
        Node::Loop {
            loopee,
            quant,
            enclosed_groups,
            ..
        } => {
            // Do not unroll loops with enclosed groups.
            if enclosed_groups.start < enclosed_groups.end {
                return PassAction::Keep;
            }
            // Do not unroll large loops, or loops which may execute zero times.
            if quant.min == 0 || quant.min > LOOP_UNROLL_THRESHOLD {
                return PassAction::Keep;
            }
            // One byte loops have their own fast forms.
            if loopee.matches_exactly_one_byte() {
                return PassAction::Keep;
            }
            // Nested unrolling multiplies; stop before it gets out of hand.
            if unroll_size(loopee).saturating_mul(quant.min) > LOOP_UNROLL_MAX_SIZE {
                return PassAction::Keep;
            }
            let added_loops = count_loops(loopee) * quant.min;
            if *loops + added_loops > MAX_LOOPS {
                return PassAction::Keep;
            }

            // We made it through. Replace us with a cat.
            let mut unrolled = Vec::new();
            for _ in 0..quant.min {
                match loopee.try_duplicate(0) {
                    Some(node) => unrolled.push(node),
                    None => return PassAction::Keep,
                }
            }
            *loops += added_loops;

            // We unrolled 'min' elements.
            // Maybe our loop is now empty.
            quant.max = quant.max.map(|v| v - quant.min);
            quant.min = 0;
            if quant.max != Some(0) {
                // Move the loop to the end of unrolled.
                let loop_node = core::mem::replace(n, Node::Empty);
                unrolled.push(loop_node);
            }
            *n = Node::Cat(unrolled);
            PassAction::Modified
        }
        _ => PassAction::Keep,
    }
}

/// Replace Cat(Literal, Literal) with one Literal.
fn form_literal_bytes(n: &mut Node, _walk: &Walk) -> PassAction {
    // Helper to return a mutable reference to the bytes of a literal.
    fn get_literal_bytes(n: &mut Node) -> Option<(&mut Vec<u8>, Option<FoldTable>)> {
        match n {
            Node::Literal { bytes, fold } => Some((bytes, *fold)),
            _ => None,
        }
    }
    match n {
        Node::Cat(nodes) => {
            let mut modified = false;
            for idx in 1..nodes.len() {
                let (prev_slice, curr_slice) = nodes.split_at_mut(idx);
                let prev = prev_slice.last_mut().and_then(get_literal_bytes);
                let curr = curr_slice.first_mut().and_then(get_literal_bytes);
                match (prev, curr) {
                    (Some((prev_bytes, prev_fold)), Some((curr_bytes, curr_fold)))
                        if prev_fold == curr_fold
                            && !prev_bytes.is_empty()
                            && !curr_bytes.is_empty() =>
                    {
                        // Accumulate into the later node, leaving the earlier one empty.
                        prev_bytes.append(curr_bytes);
                        core::mem::swap(prev_bytes, curr_bytes);
                        modified = true;
                    }
                    _ => (),
                }
            }
            if modified {
                PassAction::Modified
            } else {
                PassAction::Keep
            }
        }
        _ => PassAction::Keep,
    }
}

/// Optimize certain brackets like `[a]` to a single literal, and `[aA]` to a
/// caseless one.
/// Note we only run this once.
fn simplify_brackets(n: &mut Node, _walk: &Walk) -> PassAction {
    let cc = match n {
        Node::Class(cc) if !cc.is_locale() => cc,
        _ => return PassAction::Keep,
    };
    if let Some(b) = cc.single_byte() {
        return PassAction::Replace(Node::Literal {
            bytes: vec![b],
            fold: None,
        });
    }
    let bm = cc.to_bitmap();
    if let [lo, hi] = *bm.to_vec().as_slice() {
        if lo != hi && other_case(lo, FoldTable::Ascii) == hi {
            return PassAction::Replace(Node::Literal {
                bytes: vec![FoldTable::Ascii.fold(lo)],
                fold: Some(FoldTable::Ascii),
            });
        }
    }
    PassAction::Keep
}

/// Choose the specialized form for each loop.
/// Note we only run this once, after everything else.
fn select_loop_forms(n: &mut Node, _w: &Walk) -> PassAction {
    let (loopee, quant, enclosed_groups, cost) = match n {
        Node::Loop {
            loopee,
            quant,
            enclosed_groups,
            cost,
        } => (loopee, *quant, enclosed_groups.clone(), *cost),
        _ => return PassAction::Keep,
    };

    if loopee.matches_exactly_one_byte() {
        // The above check should be sufficient to ensure we have no enclosed groups.
        assert!(
            enclosed_groups.start >= enclosed_groups.end,
            "Should have no enclosed groups"
        );
        return PassAction::Replace(Node::Loop1CharBody {
            loopee: take(loopee),
            quant,
        });
    }

    if let Node::CaptureGroup(contents, group) = loopee.as_mut() {
        if contents.matches_exactly_one_byte() && enclosed_groups == (*group..*group + 1) {
            let group = *group;
            return PassAction::Replace(Node::LoopCaptured1Char {
                loopee: take(contents),
                quant,
                group,
            });
        }
    }

    let bounded = quant.max.map_or(false, |max| max <= REG_INFTY / 3);
    if enclosed_groups.start >= enclosed_groups.end
        && bounded
        && cost <= FIXED_WIDTH_LOOP_MAX_COST
    {
        if let Some(width) = loopee.fixed_width().filter(|&w| w > 0) {
            return PassAction::Replace(Node::LoopFixedWidth {
                loopee: take(loopee),
                quant,
                width,
            });
        }
    }
    PassAction::Keep
}

pub fn optimize(r: &mut Regex) {
    run_pass(r, &mut simplify_brackets);
    loop {
        let mut changed = false;
        changed |= run_pass(r, &mut decat);
        if r.flags.icase {
            changed |= run_pass(r, &mut unfold_caseless_literals);
        }
        let mut loops = count_loops(&r.node);
        changed |= run_pass(r, &mut |n: &mut Node, w: &Walk| unroll_loops(n, w, &mut loops));
        changed |= run_pass(r, &mut form_literal_bytes);
        changed |= run_pass(r, &mut remove_empties);
        changed |= run_pass(r, &mut propagate_early_fails);
        if !changed {
            break;
        }
    }
    run_pass(r, &mut select_loop_forms);
}
