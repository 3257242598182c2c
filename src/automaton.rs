use std::{collections::VecDeque, fmt::Debug, time::Instant};

use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, trace};

use crate::{math::OrderedMap, prelude::*};

mod parse;
mod write;

/// The outgoing transitions of a single state, mapping an encoded symbol to the (sorted, duplicate
/// free and non-empty) list of successor states.
pub type TransitionMap = OrderedMap<Symbol, Vec<StateIndex>>;

/// A deterministic transition table, every state has at most one successor per symbol.
pub type DeterministicTable = Vec<OrderedMap<Symbol, StateIndex>>;

/// A finite automaton over tuples of integers, possibly non-deterministic, where every state
/// carries an integer output.
///
/// States are plain indices into flat vectors that are owned by the automaton. An automaton is an
/// immutable value, each operation produces a new one. Outputs are interpreted in two ways: for plain
/// automata `0` means rejecting and everything else accepting, for automata with output (DFAO) the
/// output value of the state reached after reading a word is the value that is assigned to the word.
///
/// The special *trivial* automata represent `true` (every input is accepted) and `false` (nothing is
/// accepted). They do not have coordinates, and every operation handles them before looking at
/// the transitions.
#[derive(Clone)]
pub struct Automaton {
    trivial: Option<bool>,
    coordinates: Coordinates,
    initial: StateIndex,
    outputs: Vec<Output>,
    transitions: Vec<TransitionMap>,
    labels: Option<Vec<String>>,
    canonical: bool,
    labels_sorted: bool,
}

impl PartialEq for Automaton {
    fn eq(&self, other: &Self) -> bool {
        self.trivial == other.trivial
            && self.coordinates == other.coordinates
            && self.initial == other.initial
            && self.outputs == other.outputs
            && self.transitions == other.transitions
            && self.labels == other.labels
    }
}

impl Eq for Automaton {}

pub(crate) fn report_progress(operation: &str, processed: usize, discovered: usize, start: Instant) {
    if processed == 100 || processed == 1000 || processed % 10_000 == 0 {
        trace!(
            "{operation}: processed {processed} states, {} left in queue, {discovered} discovered - {}ms",
            discovered - processed,
            start.elapsed().as_millis()
        );
    }
}

impl Automaton {
    /// Creates the trivial automaton that accepts everything (if `value` is true) or nothing.
    pub fn trivial(value: bool) -> Self {
        Self {
            trivial: Some(value),
            coordinates: Coordinates::empty(),
            initial: 0,
            outputs: vec![],
            transitions: vec![],
            labels: Some(vec![]),
            canonical: true,
            labels_sorted: true,
        }
    }

    /// Creates a new automaton from its parts. The transitions of state `q` are given by
    /// `transitions[q]` and its output by `outputs[q]`. Successor lists are normalized (sorted and
    /// deduplicated) and empty lists are dropped.
    ///
    /// Fails if the number of outputs and transition maps differ, if some state is referenced
    /// without being present or if a symbol does not encode a tuple of the coordinates.
    ///
    /// ```
    /// use autoseq::prelude::*;
    /// use autoseq::math::OrderedMap;
    ///
    /// let coordinates = Coordinates::plain(vec![Alphabet::new([0, 1]).unwrap()]);
    /// let aut = Automaton::new(
    ///     coordinates,
    ///     0,
    ///     vec![0, 1],
    ///     vec![OrderedMap::from([(1, vec![1])]), OrderedMap::new()],
    /// )
    /// .unwrap();
    /// assert!(aut.accepts(&[vec![1]]).unwrap());
    /// assert!(!aut.accepts(&[vec![0]]).unwrap());
    /// ```
    pub fn new(
        coordinates: Coordinates,
        initial: StateIndex,
        outputs: Vec<Output>,
        transitions: Vec<TransitionMap>,
    ) -> Result<Self> {
        if outputs.len() != transitions.len() {
            return Err(AutomatonError::ArityMismatch {
                expected: outputs.len(),
                found: transitions.len(),
            });
        }
        let states = outputs.len();
        if initial >= states {
            return Err(AutomatonError::UndeclaredState(initial));
        }
        let mut normalized = Vec::with_capacity(states);
        for map in transitions {
            let mut out = TransitionMap::new();
            for (symbol, mut successors) in map {
                if symbol >= coordinates.alphabet_size() {
                    return Err(AutomatonError::SymbolOutOfRange {
                        symbol,
                        size: coordinates.alphabet_size(),
                    });
                }
                if let Some(&q) = successors.iter().find(|&&q| q >= states) {
                    return Err(AutomatonError::UndeclaredState(q));
                }
                successors.sort_unstable();
                successors.dedup();
                if !successors.is_empty() {
                    out.insert(symbol, successors);
                }
            }
            normalized.push(out);
        }
        Ok(Self::from_parts(coordinates, initial, outputs, normalized))
    }

    /// Assembles an automaton from parts that are already known to be consistent.
    pub(crate) fn from_parts(
        coordinates: Coordinates,
        initial: StateIndex,
        outputs: Vec<Output>,
        transitions: Vec<TransitionMap>,
    ) -> Self {
        debug_assert_eq!(outputs.len(), transitions.len());
        Self {
            trivial: None,
            coordinates,
            initial,
            outputs,
            transitions,
            labels: None,
            canonical: false,
            labels_sorted: false,
        }
    }

    /// Assembles an automaton from a deterministic table.
    pub(crate) fn from_table(
        coordinates: Coordinates,
        initial: StateIndex,
        outputs: Vec<Output>,
        table: DeterministicTable,
    ) -> Self {
        let transitions = table
            .into_iter()
            .map(|map| map.into_iter().map(|(a, q)| (a, vec![q])).collect())
            .collect();
        Self::from_parts(coordinates, initial, outputs, transitions)
    }

    /// Returns an automaton over the given coordinates which accepts nothing. It has a single
    /// rejecting state without transitions.
    pub fn empty(coordinates: Coordinates) -> Self {
        Self::from_parts(coordinates, 0, vec![0], vec![TransitionMap::new()])
    }

    /// Returns an automaton over the given coordinates which accepts every word.
    pub fn universal(coordinates: Coordinates) -> Self {
        let loops = coordinates.symbols().map(|a| (a, vec![0])).collect();
        Self::from_parts(coordinates, 0, vec![1], vec![loops])
    }

    /// Copies the labels of `other` if they fit.
    pub(crate) fn with_labels_of(mut self, labels: Option<&[String]>) -> Self {
        self.labels = labels
            .filter(|l| l.len() == self.coordinates.len())
            .map(|l| l.to_vec());
        self.labels_sorted = false;
        self
    }

    /// Replaces the outputs, one per state.
    pub(crate) fn with_outputs(&self, outputs: Vec<Output>) -> Self {
        debug_assert_eq!(outputs.len(), self.state_count());
        Self {
            outputs,
            canonical: false,
            ..self.clone()
        }
    }

    /// Returns `Some(value)` if this is a trivial automaton.
    pub fn is_trivial(&self) -> Option<bool> {
        self.trivial
    }

    /// Returns the coordinates of the automaton.
    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    /// Returns the number of coordinates, i.e. the length of each input tuple.
    pub fn arity(&self) -> usize {
        self.coordinates.len()
    }

    /// The number of distinct encoded symbols.
    pub fn alphabet_size(&self) -> usize {
        self.coordinates.alphabet_size()
    }

    /// Returns the number of states.
    pub fn state_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns the initial state.
    pub fn initial_state(&self) -> StateIndex {
        self.initial
    }

    /// Returns all state outputs, indexed by state.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Returns the output of state `q`.
    pub fn output(&self, q: StateIndex) -> Output {
        self.outputs[q]
    }

    /// Returns true if `q` is accepting, i.e. has a non-zero output.
    pub fn is_accepting(&self, q: StateIndex) -> bool {
        self.outputs[q] != 0
    }

    /// Returns the transition table, indexed by state.
    pub fn transitions(&self) -> &[TransitionMap] {
        &self.transitions
    }

    /// Returns the successors of `q` on `symbol`, which is empty if the transition is undefined.
    pub fn successors(&self, q: StateIndex, symbol: Symbol) -> &[StateIndex] {
        self.transitions[q]
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the coordinate labels, if there are any.
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Returns the labels or fails with [`AutomatonError::NotLabeled`].
    pub fn require_labels(&self) -> Result<&[String]> {
        self.labels
            .as_deref()
            .filter(|l| l.len() == self.arity())
            .ok_or(AutomatonError::NotLabeled)
    }

    /// Returns the index of the coordinate that carries `label`.
    pub fn label_index(&self, label: &str) -> Result<usize> {
        self.require_labels()?
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| AutomatonError::UnknownLabel(label.to_string()))
    }

    /// Returns true if the canonical form has already been computed.
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }

    /// Returns true if some output is neither 0 nor 1, i.e. this is an automaton with output.
    pub fn has_output(&self) -> bool {
        self.outputs.iter().any(|&o| o != 0 && o != 1)
    }

    /// Returns true if every state has at most one successor on each symbol.
    pub fn is_deterministic(&self) -> bool {
        self.transitions
            .iter()
            .all(|map| map.values().all(|succ| succ.len() == 1))
    }

    /// Returns true if every state has a transition on every symbol.
    pub fn is_total(&self) -> bool {
        self.transitions
            .iter()
            .all(|map| map.len() == self.alphabet_size())
    }

    /// Returns the deterministic table of this automaton, or `None` if it is not deterministic.
    pub(crate) fn deterministic_table(&self) -> Option<DeterministicTable> {
        self.transitions
            .iter()
            .map(|map| {
                map.iter()
                    .map(|(&a, succ)| match succ.as_slice() {
                        [q] => Some((a, *q)),
                        _ => None,
                    })
                    .collect::<Option<OrderedMap<_, _>>>()
            })
            .collect()
    }

    /// Like [`Self::deterministic_table`], but additionally requires every transition to be defined.
    pub(crate) fn total_table(&self) -> Result<DeterministicTable> {
        self.deterministic_table()
            .filter(|table| table.iter().all(|m| m.len() == self.alphabet_size()))
            .ok_or(AutomatonError::NotDeterministic)
    }

    /// Returns the list of states that are reachable from the initial state, in breadth-first order.
    pub fn reachable_states(&self) -> Vec<StateIndex> {
        if self.trivial.is_some() {
            return vec![];
        }
        let mut seen = vec![false; self.state_count()];
        let mut order = vec![self.initial];
        seen[self.initial] = true;
        let mut i = 0;
        while i < order.len() {
            let q = order[i];
            for &p in self.transitions[q].values().flatten() {
                if !seen[p] {
                    seen[p] = true;
                    order.push(p);
                }
            }
            i += 1;
        }
        order
    }

    /// Fills in every missing transition by redirecting it to a fresh dead state with the given
    /// output. Returns `None` if the automaton is already total.
    fn complete_with(&self, dead_output: Output) -> Option<Self> {
        if self.trivial.is_some() || self.is_total() {
            return None;
        }
        let dead = self.state_count();
        let size = self.alphabet_size();
        let mut transitions = self.transitions.clone();
        for map in transitions.iter_mut() {
            for a in 0..size {
                map.entry(a).or_insert_with(|| vec![dead]);
            }
        }
        transitions.push((0..size).map(|a| (a, vec![dead])).collect());
        let mut outputs = self.outputs.clone();
        outputs.push(dead_output);
        trace!("added dead state {dead} with output {dead_output}");
        Some(Self {
            outputs,
            transitions,
            canonical: false,
            ..self.clone()
        })
    }

    /// Makes the automaton total by adding a single rejecting dead state, if any transition is
    /// missing. The accepted language does not change.
    pub fn totalize(&self) -> Self {
        self.complete_with(0).unwrap_or_else(|| self.clone())
    }

    /// Makes the automaton total by adding a dead state whose output is one less than the minimum
    /// of 0 and all existing outputs. This keeps the dead state distinguishable from every other
    /// state. Returns whether a dead state was added.
    pub fn add_distinguished_dead_state(&self) -> (Self, bool) {
        let min = self.outputs.iter().copied().min().unwrap_or(0).min(0);
        match self.complete_with(min - 1) {
            Some(completed) => (completed, true),
            None => (self.clone(), false),
        }
    }

    /// Removes all states whose output is `dead_output` together with all transitions leading
    /// into them and canonizes the result. The initial state is always kept.
    pub(crate) fn strip_states_with_output(&self, dead_output: Output) -> Self {
        let transitions = self
            .transitions
            .iter()
            .map(|map| {
                map.iter()
                    .filter_map(|(&a, succ)| {
                        let kept: Vec<_> = succ
                            .iter()
                            .copied()
                            .filter(|&q| self.outputs[q] != dead_output)
                            .collect();
                        (!kept.is_empty()).then_some((a, kept))
                    })
                    .collect()
            })
            .collect();
        Self {
            transitions,
            canonical: false,
            ..self.clone()
        }
        .canonize()
    }

    /// Assigns the given labels to the coordinates. If some label occurs more than once, the
    /// coordinates carrying it are merged into one: only transitions on which all of them read
    /// the same value survive. Merged coordinates must have the same alphabet.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let aut: Automaton = "{0,1} {0,1}\n0 1\n0 0 -> 0\n1 0 -> 0\n".parse().unwrap();
    /// let diagonal = aut.bind(&["x", "x"]).unwrap();
    /// assert_eq!(diagonal.arity(), 1);
    /// assert!(diagonal.accepts(&[vec![0], vec![0]]).unwrap());
    /// assert!(!diagonal.accepts(&[vec![1]]).unwrap());
    /// ```
    pub fn bind<S: AsRef<str>>(&self, labels: &[S]) -> Result<Self> {
        if let Some(value) = self.trivial {
            return if labels.is_empty() {
                Ok(Self::trivial(value))
            } else {
                Err(AutomatonError::ArityMismatch {
                    expected: 0,
                    found: labels.len(),
                })
            };
        }
        if labels.len() != self.arity() {
            return Err(AutomatonError::ArityMismatch {
                expected: self.arity(),
                found: labels.len(),
            });
        }
        let labels: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        // for each coordinate the first coordinate with the same label
        let representative: Vec<usize> = labels
            .iter()
            .map(|l| labels.iter().position(|m| m == l).unwrap_or_default())
            .collect();
        let merged: Vec<usize> = (0..labels.len())
            .filter(|&i| representative[i] != i)
            .collect();

        if merged.is_empty() {
            return Ok(Self {
                labels: Some(labels),
                labels_sorted: false,
                ..self.clone()
            });
        }
        for &i in &merged {
            if !self
                .coordinates
                .alphabet(i)
                .same_values(self.coordinates.alphabet(representative[i]))
            {
                return Err(AutomatonError::IncompatibleAlphabet(labels[i].clone()));
            }
        }

        let coordinates = self.coordinates.without(&merged);
        let mapping: Vec<Option<Symbol>> = self
            .coordinates
            .symbols()
            .map(|a| {
                let tuple = self.coordinates.decode(a);
                if merged.iter().any(|&i| tuple[i] != tuple[representative[i]]) {
                    return None;
                }
                let reduced: Vec<Value> = tuple
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| !merged.contains(i))
                    .map(|(_, v)| v)
                    .collect();
                coordinates.encode(&reduced).ok()
            })
            .collect();
        debug!(
            "binding {} merged {} coordinates",
            labels.iter().join(","),
            merged.len()
        );
        let reduced_labels = labels
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !merged.contains(i))
            .map(|(_, l)| l)
            .collect();
        let mut out = self.relabel_symbols(coordinates, &mapping);
        out.labels = Some(reduced_labels);
        Ok(out)
    }

    /// Replaces every symbol `a` by `mapping[a]`, dropping transitions mapped to `None`. Transitions
    /// that end up on the same symbol are merged, which may introduce non-determinism.
    pub(crate) fn relabel_symbols(&self, coordinates: Coordinates, mapping: &[Option<Symbol>]) -> Self {
        let transitions = self
            .transitions
            .iter()
            .map(|map| {
                let mut out = TransitionMap::new();
                for (&a, succ) in map {
                    if let Some(b) = mapping[a] {
                        let entry: &mut Vec<StateIndex> = out.entry(b).or_default();
                        entry.extend(succ);
                    }
                }
                for succ in out.values_mut() {
                    succ.sort_unstable();
                    succ.dedup();
                }
                out
            })
            .collect();
        Self {
            trivial: None,
            coordinates,
            initial: self.initial,
            outputs: self.outputs.clone(),
            transitions,
            labels: None,
            canonical: false,
            labels_sorted: false,
        }
    }

    /// Labels the coordinates with their positions, i.e. `"0"`, `"1"` and so on.
    pub fn with_positional_labels(&self) -> Self {
        Self {
            labels: Some((0..self.arity()).map(|i| i.to_string()).collect()),
            labels_sorted: false,
            ..self.clone()
        }
    }

    /// Removes all labels.
    pub fn without_labels(&self) -> Self {
        Self {
            labels: None,
            labels_sorted: false,
            ..self.clone()
        }
    }

    /// Permutes the coordinates such that the labels are sorted lexicographically. Every
    /// transition is re-encoded accordingly. Unlabeled automata are returned unchanged.
    pub fn sort_labels(&self) -> Self {
        let Some(labels) = self.labels.as_ref() else {
            return self.clone();
        };
        if self.labels_sorted || self.trivial.is_some() || labels.len() != self.arity() {
            return self.clone();
        }
        if labels.iter().tuple_windows().all(|(a, b)| a <= b) {
            return Self {
                labels_sorted: true,
                ..self.clone()
            };
        }
        let order: Vec<usize> = (0..labels.len()).sorted_by_key(|&i| &labels[i]).collect();
        // permutation[i] is the new position of coordinate i
        let mut permutation = vec![0; order.len()];
        for (target, &source) in order.iter().enumerate() {
            permutation[source] = target;
        }
        let coordinates = self.coordinates.permuted(&permutation);
        let mapping: Vec<Option<Symbol>> = self
            .coordinates
            .symbols()
            .map(|a| {
                let tuple = self.coordinates.decode(a);
                let mut permuted = tuple.clone();
                for (i, value) in tuple.into_iter().enumerate() {
                    permuted[permutation[i]] = value;
                }
                coordinates.encode(&permuted).ok()
            })
            .collect();
        let mut out = self.relabel_symbols(coordinates, &mapping);
        out.labels = Some(order.into_iter().map(|i| labels[i].clone()).collect());
        out.labels_sorted = true;
        out
    }

    /// Computes the canonical form: labels are sorted and states are renumbered in the order in
    /// which a breadth-first search from the initial state discovers them (visiting symbols in
    /// increasing order). Unreachable states are dropped.
    pub fn canonize(&self) -> Self {
        if self.canonical || self.trivial.is_some() {
            return self.clone();
        }
        let sorted = self.sort_labels();
        let order = sorted.reachable_states();
        let mut renaming = vec![usize::MAX; sorted.state_count()];
        for (new, &old) in order.iter().enumerate() {
            renaming[old] = new;
        }
        let transitions = order
            .iter()
            .map(|&q| {
                sorted.transitions[q]
                    .iter()
                    .map(|(&a, succ)| (a, succ.iter().map(|&p| renaming[p]).sorted().collect()))
                    .collect()
            })
            .collect();
        let outputs = order.iter().map(|&q| sorted.outputs[q]).collect();
        Self {
            initial: 0,
            outputs,
            transitions,
            canonical: true,
            ..sorted
        }
    }

    /// Returns true if the automaton accepts no word at all.
    pub fn is_empty(&self) -> bool {
        match self.trivial {
            Some(value) => !value,
            None => !self.reachable_states().iter().any(|&q| self.is_accepting(q)),
        }
    }

    fn encode_word(&self, word: &[Vec<Value>]) -> Result<Vec<Symbol>> {
        word.iter().map(|t| self.coordinates.encode(t)).collect()
    }

    /// Decides whether the given word of input tuples is accepted.
    pub fn accepts(&self, word: &[Vec<Value>]) -> Result<bool> {
        if let Some(value) = self.trivial {
            return Ok(value);
        }
        let mut current = vec![self.initial];
        for a in self.encode_word(word)? {
            current = current
                .iter()
                .flat_map(|&q| self.successors(q, a))
                .copied()
                .sorted()
                .dedup()
                .collect();
            if current.is_empty() {
                return Ok(false);
            }
        }
        Ok(current.into_iter().any(|q| self.is_accepting(q)))
    }

    /// Returns the output of the state reached on `word`, or `0` if the run leaves the defined
    /// transitions. Requires a deterministic automaton.
    pub fn output_on(&self, word: &[Vec<Value>]) -> Result<Output> {
        if let Some(value) = self.trivial {
            return Ok(value as Output);
        }
        if !self.is_deterministic() {
            return Err(AutomatonError::NotDeterministic);
        }
        let mut q = self.initial;
        for a in self.encode_word(word)? {
            match self.successors(q, a) {
                [p] => q = *p,
                _ => return Ok(0),
            }
        }
        Ok(self.outputs[q])
    }

    /// Decides whether two automata define the same function from words to outputs, which for
    /// plain automata means that they accept the same language. Labels are ignored, but the
    /// coordinates have to agree.
    ///
    /// A trivial automaton is only ever equal to a trivial automaton with the same value.
    pub fn equals(&self, other: &Automaton) -> Result<bool> {
        let start = Instant::now();
        match (self.trivial, other.trivial) {
            (Some(a), Some(b)) => return Ok(a == b),
            (Some(_), None) | (None, Some(_)) => return Ok(false),
            _ => {}
        }
        if self.coordinates != other.coordinates {
            return Ok(false);
        }
        let left = self.without_labels();
        let right = other.without_labels();
        let values: Vec<Output> = left
            .outputs
            .iter()
            .chain(&right.outputs)
            .copied()
            .filter(|&o| o != 0)
            .unique()
            .collect();
        let left_pieces = left.uncombine(&values);
        let right_pieces = right.uncombine(&values);
        let equal = left_pieces
            .iter()
            .zip(&right_pieces)
            .all(|(l, r)| l.minimize().canonize() == r.minimize().canonize());
        debug!(
            "compared automata with {} and {} states: {equal} - {}ms",
            self.state_count(),
            other.state_count(),
            start.elapsed().as_millis()
        );
        Ok(equal)
    }

    /// Gives all accepted words of length `length`, in lexicographic order of the encoded symbols.
    pub fn accepted_words(&self, length: usize) -> Vec<Vec<Vec<Value>>> {
        if self.trivial.is_some() {
            return vec![];
        }
        let mut words = vec![];
        let mut queue: VecDeque<(Vec<Symbol>, Vec<StateIndex>)> =
            VecDeque::from([(vec![], vec![self.initial])]);
        while let Some((word, states)) = queue.pop_front() {
            if word.len() == length {
                if states.iter().any(|&q| self.is_accepting(q)) {
                    words.push(word.iter().map(|&a| self.coordinates.decode(a)).collect());
                }
                continue;
            }
            for a in self.coordinates.symbols() {
                let next: Vec<_> = states
                    .iter()
                    .flat_map(|&q| self.successors(q, a))
                    .copied()
                    .sorted()
                    .dedup()
                    .collect();
                if !next.is_empty() {
                    let mut extended = word.clone();
                    extended.push(a);
                    queue.push_back((extended, next));
                }
            }
        }
        words
    }

    /// Returns a string representation of the transition table.
    pub fn build_transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(
                self.coordinates
                    .symbols()
                    .map(|a| format!("{:?}", self.coordinates.decode(a))),
            ),
        );
        for q in 0..self.state_count() {
            let name = if q == self.initial {
                format!("-> {q}")
            } else {
                q.to_string()
            };
            let state = if self.is_accepting(q) {
                format!("{}|{}", name.bold(), self.outputs[q].blue())
            } else {
                format!("{}|{}", name, self.outputs[q].dimmed())
            };
            let mut row = vec![state];
            for a in self.coordinates.symbols() {
                let successors = self.successors(q, a);
                if successors.is_empty() {
                    row.push("-".to_string());
                } else {
                    row.push(successors.iter().join(","));
                }
            }
            builder.push_record(row);
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl Debug for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(value) = self.trivial {
            return write!(f, "{value}");
        }
        writeln!(
            f,
            "automaton over {} with labels {:?}",
            self.coordinates
                .alphabets()
                .iter()
                .zip(self.coordinates.number_systems())
                .map(|(a, ns)| match ns {
                    Some(ns) => ns.to_string(),
                    None => a.to_string(),
                })
                .join(" "),
            self.labels
        )?;
        write!(f, "{}", self.build_transition_table())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn two_coordinates() -> Automaton {
        "{0,1} {0,1}\n\n0 0\n0 1 -> 1\n1 0 -> 0\n\n1 1\n* * -> 1\n"
            .parse()
            .unwrap()
    }

    #[test_log::test]
    fn totalization() {
        let aut = two_coordinates();
        assert!(!aut.is_total());
        let total = aut.totalize();
        assert!(total.is_total());
        assert_eq!(total.state_count(), 3);
        assert!(total.equals(&aut).unwrap());
        assert_eq!(total.totalize().state_count(), 3);

        let (with_dead, added) = aut.add_distinguished_dead_state();
        assert!(added);
        assert_eq!(with_dead.outputs(), &[0, 1, -1]);
        assert!(!total.add_distinguished_dead_state().1);
    }

    #[test_log::test]
    fn construction_is_validated() {
        use crate::math::OrderedMap;

        let coordinates = Coordinates::plain(vec![Alphabet::new([0, 1]).unwrap()]);
        assert!(matches!(
            Automaton::new(
                coordinates.clone(),
                0,
                vec![1],
                vec![OrderedMap::from([(2, vec![0])])]
            ),
            Err(AutomatonError::SymbolOutOfRange { symbol: 2, size: 2 })
        ));
        assert!(matches!(
            Automaton::new(
                coordinates.clone(),
                0,
                vec![1],
                vec![OrderedMap::from([(1, vec![3])])]
            ),
            Err(AutomatonError::UndeclaredState(3))
        ));
        let aut = Automaton::new(
            coordinates,
            0,
            vec![1],
            vec![OrderedMap::from([(1, vec![0, 0])])],
        )
        .unwrap();
        assert_eq!(aut.successors(0, 1), &[0]);
    }

    #[test_log::test]
    fn running_words() {
        let aut = two_coordinates();
        assert!(aut.accepts(&[vec![0, 1]]).unwrap());
        assert!(aut.accepts(&[vec![1, 0], vec![0, 1], vec![1, 1]]).unwrap());
        assert!(!aut.accepts(&[]).unwrap());
        assert!(!aut.accepts(&[vec![1, 1]]).unwrap());
        assert!(matches!(
            aut.accepts(&[vec![2, 1]]),
            Err(AutomatonError::InvalidSymbol { .. })
        ));
        assert_eq!(aut.output_on(&[vec![0, 1], vec![0, 0]]).unwrap(), 1);
        assert_eq!(aut.output_on(&[vec![1, 1]]).unwrap(), 0);
        assert_eq!(aut.accepted_words(1), vec![vec![vec![0, 1]]]);
    }

    #[test_log::test]
    fn canonical_form() {
        let aut: Automaton = "{0,1}\n2 0\n0 -> 2\n1 -> 0\n0 1\n0 -> 0\n1 0\n1 -> 0\n"
            .parse()
            .unwrap();
        assert_eq!(aut.initial_state(), 2);
        let canonical = aut.canonize();
        assert!(canonical.is_canonical());
        assert_eq!(canonical.initial_state(), 0);
        // state 1 is unreachable
        assert_eq!(canonical.state_count(), 2);
        assert_eq!(canonical.outputs(), &[0, 1]);
        assert_eq!(canonical.successors(0, 1), &[1]);
        assert!(canonical.equals(&aut).unwrap());
    }

    #[test_log::test]
    fn sorting_labels_permutes_coordinates() {
        let aut: Automaton = "{0,1} {5,6,7}\n0 0\n1 7 -> 1\n1 1\n"
            .parse::<Automaton>()
            .unwrap()
            .bind(&["y", "x"])
            .unwrap();
        let sorted = aut.sort_labels();
        assert_eq!(sorted.labels().unwrap(), &["x", "y"]);
        assert!(sorted.accepts(&[vec![7, 1]]).unwrap());
        assert!(!sorted.accepts(&[vec![1, 7]]).unwrap_or(false));
        assert_eq!(sorted.coordinates().alphabet(0).size(), 3);
    }

    #[test_log::test]
    fn binding_labels() {
        let aut = two_coordinates();
        assert!(matches!(
            aut.bind(&["a"]),
            Err(AutomatonError::ArityMismatch { .. })
        ));
        let labeled = aut.bind(&["a", "b"]).unwrap();
        assert_eq!(labeled.label_index("b").unwrap(), 1);
        assert!(matches!(
            labeled.label_index("c"),
            Err(AutomatonError::UnknownLabel(_))
        ));
        // merging requires equal reads, so (0,1) is no longer possible
        let merged = aut.bind(&["a", "a"]).unwrap();
        assert!(merged.is_empty());

        let mixed: Automaton = "{0,1} {0,2}\n0 1\n".parse().unwrap();
        assert!(matches!(
            mixed.bind(&["z", "z"]),
            Err(AutomatonError::IncompatibleAlphabet(_))
        ));
    }

    #[test_log::test]
    fn emptiness_and_equality() {
        assert!(Automaton::trivial(false).is_empty());
        assert!(!Automaton::trivial(true).is_empty());
        let coordinates = Coordinates::plain(vec![Alphabet::new([0, 1]).unwrap()]);
        assert!(Automaton::empty(coordinates.clone()).is_empty());
        assert!(!Automaton::universal(coordinates.clone()).is_empty());
        assert!(!Automaton::trivial(true)
            .equals(&Automaton::universal(coordinates))
            .unwrap());
        assert!(Automaton::trivial(true)
            .equals(&Automaton::trivial(true))
            .unwrap());
    }
}
