//! Valmari's minimization algorithm for deterministic automata, see
//! A. Valmari, P. Lehtinen: "Efficient minimization of DFAs with partial transition functions".
//!
//! States are refined in one [`Partition`] (the blocks) and transitions in another one (the cords).
//! Cords start out grouped by label. Alternately, every unprocessed cord splits the blocks by marking
//! the tails of its transitions, and every new block splits the cords by marking the transitions
//! entering it. When no unprocessed set is left, the blocks are exactly the classes of
//! language-equivalent states.

use std::time::Instant;

use tracing::trace;

use super::partition_refinement::Partition;
use crate::{automaton::DeterministicTable, math::OrderedMap, prelude::*};

/// Counting sort of the transitions by `keys`, transitions with key `q` are
/// `adjacent[offsets[q]..offsets[q + 1]]`.
fn make_adjacent(keys: &[usize], states: usize) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = vec![0; states + 1];
    for &k in keys {
        offsets[k] += 1;
    }
    for q in 0..states {
        offsets[q + 1] += offsets[q];
    }
    let mut adjacent = vec![0; keys.len()];
    for t in (0..keys.len()).rev() {
        offsets[keys[t]] -= 1;
        adjacent[offsets[keys[t]]] = t;
    }
    (offsets, adjacent)
}

/// The transitions as three parallel arrays.
struct Transitions {
    tails: Vec<usize>,
    labels: Vec<Symbol>,
    heads: Vec<usize>,
}

impl Transitions {
    fn from_table(table: &DeterministicTable) -> Self {
        let mut out = Transitions {
            tails: vec![],
            labels: vec![],
            heads: vec![],
        };
        for (q, map) in table.iter().enumerate() {
            for (&a, &p) in map {
                out.tails.push(q);
                out.labels.push(a);
                out.heads.push(p);
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.tails.len()
    }

    /// Keeps the transitions for which `keep(tail, head)` holds.
    fn retain<F: Fn(usize, usize) -> bool>(&mut self, keep: F) {
        let mut j = 0;
        for t in 0..self.len() {
            if keep(self.tails[t], self.heads[t]) {
                self.tails[j] = self.tails[t];
                self.labels[j] = self.labels[t];
                self.heads[j] = self.heads[t];
                j += 1;
            }
        }
        self.tails.truncate(j);
        self.labels.truncate(j);
        self.heads.truncate(j);
    }
}

/// Starting from the states at positions `0..reached`, claims every state that can be reached by
/// following transitions from `from` to `to`. Returns the number of claimed states.
fn claim_reachable(blocks: &mut Partition, mut reached: usize, from: &[usize], to: &[usize], states: usize) -> usize {
    let (offsets, adjacent) = make_adjacent(from, states);
    let mut i = 0;
    while i < reached {
        let q = blocks.element_at(i);
        for &t in &adjacent[offsets[q]..offsets[q + 1]] {
            reached = blocks.claim(to[t], reached);
        }
        i += 1;
    }
    reached
}

/// Minimizes the deterministic automaton given by `table`, `initial` and `outputs`, where a state
/// is accepting iff its output is non-zero. States that are unreachable or from which no accepting
/// state is reachable are removed, so the result is in general not total. If the language is empty,
/// the result consists of a single rejecting state without transitions.
///
/// Returns the new initial state, the new outputs (`0` or `1`) and the new transition table.
pub(crate) fn minimize(
    initial: StateIndex,
    outputs: &[Output],
    table: &DeterministicTable,
) -> (StateIndex, Vec<Output>, DeterministicTable) {
    let start = Instant::now();
    let states = table.len();
    let mut transitions = Transitions::from_table(table);
    let mut blocks = Partition::new(states);

    // forward reachability
    let reached = blocks.claim(initial, 0);
    let reached = claim_reachable(&mut blocks, reached, &transitions.tails, &transitions.heads, states);
    transitions.retain(|tail, _| blocks.location(tail) < reached);
    blocks.truncate_first(reached);

    // backward reachability from the reachable accepting states
    let mut finals = 0;
    for q in (0..states).filter(|&q| outputs[q] != 0) {
        if blocks.location(q) < reached {
            finals = blocks.claim(q, finals);
        }
    }
    let reached = claim_reachable(&mut blocks, finals, &transitions.heads, &transitions.tails, states);
    transitions.retain(|_, head| blocks.location(head) < reached);
    blocks.truncate_first(reached);
    trace!(
        "{} of {states} states are useful, {finals} of them accepting, {} transitions remain",
        reached,
        transitions.len()
    );

    // initial partition of the states: accepting and rejecting
    for i in 0..finals {
        blocks.mark(blocks.element_at(i));
    }
    blocks.split();

    // initial partition of the transitions: by label
    let mut cords = Partition::new(transitions.len());
    cords.reorder_by_key(|&t| transitions.labels[t]);
    cords.split_runs(|t| transitions.labels[t]);

    let (offsets, adjacent) = make_adjacent(&transitions.heads, states);
    let mut b = 1;
    let mut c = 0;
    while c < cords.count() {
        for &t in cords.members(c) {
            blocks.mark(transitions.tails[t]);
        }
        blocks.split();
        c += 1;
        while b < blocks.count() {
            for &q in blocks.members(b) {
                for &t in &adjacent[offsets[q]..offsets[q + 1]] {
                    cords.mark(t);
                }
            }
            cords.split();
            b += 1;
        }
    }

    let count = blocks.count();
    let outputs = (0..count)
        .map(|s| Output::from(blocks.first(s) < finals))
        .collect();
    let mut minimized: DeterministicTable = vec![OrderedMap::new(); count];
    for t in 0..transitions.len() {
        let tail = transitions.tails[t];
        let s = blocks.set_of(tail);
        // only the representative of a block contributes its transitions
        if blocks.location(tail) == blocks.first(s) {
            minimized[s].insert(transitions.labels[t], blocks.set_of(transitions.heads[t]));
        }
    }
    trace!(
        "valmari minimization from {states} to {count} states - {}ms",
        start.elapsed().as_millis()
    );
    (blocks.set_of(initial), outputs, minimized)
}

#[cfg(test)]
mod tests {
    use super::make_adjacent;

    #[test]
    fn adjacency() {
        let keys = [2, 0, 2, 1];
        let (offsets, adjacent) = make_adjacent(&keys, 3);
        assert_eq!(offsets, vec![0, 1, 2, 4]);
        assert_eq!(&adjacent[offsets[2]..offsets[3]], &[0, 2]);
        assert_eq!(&adjacent[offsets[0]..offsets[1]], &[1]);
    }
}
