//! A refinable partition of the integers `0..n`.
//!
//! Implementation:
//! - `elements` is a permutation of `0..n` in which every set occupies a contiguous segment
//! - set `s` is the segment `elements[first[s]..past[s]]`
//! - `location[e]` is the position of `e` in `elements` and `set_of[e]` the set containing it
//! - marked elements of a set are moved to the front of its segment, `marked[s]` counts them
//!
//! Every set has a stable index, new sets are appended at the end. Marking and splitting cost
//! time proportional to the number of marked elements.

use std::fmt::Display;

use itertools::Itertools;

#[derive(Debug, Clone)]
pub(crate) struct Partition {
    /// number of sets
    count: usize,
    elements: Vec<usize>,
    location: Vec<usize>,
    set_of: Vec<usize>,
    first: Vec<usize>,
    past: Vec<usize>,
    marked: Vec<usize>,
    /// sets that currently have a marked element
    touched: Vec<usize>,
}

impl Partition {
    /// Creates the partition of `0..n` consisting of a single set (or no set at all if `n == 0`).
    pub fn new(n: usize) -> Self {
        let slots = n.max(1);
        let mut first = vec![0; slots];
        let mut past = vec![0; slots];
        if n > 0 {
            first[0] = 0;
            past[0] = n;
        }
        Self {
            count: usize::from(n > 0),
            elements: (0..n).collect(),
            location: (0..n).collect(),
            set_of: vec![0; n],
            first,
            past,
            marked: vec![0; slots],
            touched: Vec::with_capacity(slots),
        }
    }

    /// Returns the number of sets.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the index of the set containing `e`.
    pub fn set_of(&self, e: usize) -> usize {
        self.set_of[e]
    }

    /// Returns the position of `e` in the element ordering.
    pub fn location(&self, e: usize) -> usize {
        self.location[e]
    }

    /// Returns the position of the first element of set `s`.
    pub fn first(&self, s: usize) -> usize {
        self.first[s]
    }

    /// Returns the elements of set `s`.
    pub fn members(&self, s: usize) -> &[usize] {
        &self.elements[self.first[s]..self.past[s]]
    }

    /// Returns the element at position `i`.
    pub fn element_at(&self, i: usize) -> usize {
        self.elements[i]
    }

    /// Restricts the first set to positions `0..past`, the elements beyond are no longer part
    /// of any set.
    pub fn truncate_first(&mut self, past: usize) {
        debug_assert_eq!(self.count, 1);
        self.past[0] = past;
    }

    /// Moves `e` to position `claimed` unless it already sits in one of the positions `0..claimed`.
    /// Returns the new number of claimed positions.
    pub fn claim(&mut self, e: usize, claimed: usize) -> usize {
        let i = self.location[e];
        if i < claimed {
            return claimed;
        }
        self.swap_positions(i, claimed);
        claimed + 1
    }

    /// Replaces the ordering of the elements, sets are not changed.
    pub fn reorder_by_key<K: Ord, F: FnMut(&usize) -> K>(&mut self, key: F) {
        let past = self.past[0];
        self.elements[..past].sort_by_key(key);
        for (i, &e) in self.elements.iter().enumerate() {
            self.location[e] = i;
        }
    }

    /// Splits the first set into segments of equal key, the elements have to be ordered by
    /// the key already.
    pub fn split_runs<K: PartialEq, F: Fn(usize) -> K>(&mut self, key: F) {
        debug_assert!(self.count <= 1);
        let past = self.past[0];
        if past == 0 {
            self.count = 0;
            return;
        }
        let mut current = key(self.elements[0]);
        for i in 0..past {
            let e = self.elements[i];
            let k = key(e);
            if k != current {
                current = k;
                self.past[self.count - 1] = i;
                self.first[self.count] = i;
                self.marked[self.count] = 0;
                self.count += 1;
            }
            self.set_of[e] = self.count - 1;
        }
        self.past[self.count - 1] = past;
    }

    fn swap_positions(&mut self, i: usize, j: usize) {
        self.elements.swap(i, j);
        self.location[self.elements[i]] = i;
        self.location[self.elements[j]] = j;
    }

    /// Marks `e` for the next [`Partition::split`]. An element must not be marked twice.
    pub fn mark(&mut self, e: usize) {
        let s = self.set_of[e];
        let i = self.location[e];
        let j = self.first[s] + self.marked[s];
        self.swap_positions(i, j);
        if self.marked[s] == 0 {
            self.touched.push(s);
        }
        self.marked[s] += 1;
    }

    /// Splits every touched set into its marked and unmarked part. The smaller part receives a
    /// new index while the larger one keeps the old index. Sets whose elements are all marked
    /// are left as they are.
    pub fn split(&mut self) {
        while let Some(s) = self.touched.pop() {
            let j = self.first[s] + self.marked[s];
            if j == self.past[s] {
                self.marked[s] = 0;
                continue;
            }
            let z = self.count;
            if self.marked[s] <= self.past[s] - j {
                self.first[z] = self.first[s];
                self.past[z] = j;
                self.first[s] = j;
            } else {
                self.past[z] = self.past[s];
                self.first[z] = j;
                self.past[s] = j;
            }
            for i in self.first[z]..self.past[z] {
                self.set_of[self.elements[i]] = z;
            }
            self.marked[s] = 0;
            self.marked[z] = 0;
            self.count += 1;
        }
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            (0..self.count)
                .map(|s| format!("{{{}}}", self.members(s).iter().join(", ")))
                .join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Partition;

    #[test_log::test]
    fn marking_and_splitting() {
        let mut p = Partition::new(6);
        assert_eq!(p.count(), 1);
        p.mark(4);
        p.mark(1);
        p.split();
        assert_eq!(p.count(), 2);
        assert_eq!(p.set_of(1), p.set_of(4));
        assert_ne!(p.set_of(0), p.set_of(4));
        // the smaller part gets the new index
        assert_eq!(p.set_of(4), 1);
        assert_eq!(p.members(1).len(), 2);

        for e in [0, 2, 3] {
            p.mark(e);
        }
        p.mark(1);
        p.split();
        // set 0 = {0, 2, 3, 5} is split into {0, 2, 3} and {5}, set 1 = {1, 4} into {1} and {4}
        assert_eq!(p.count(), 4);
        assert_eq!(p.members(p.set_of(5)), &[5]);
        assert_ne!(p.set_of(1), p.set_of(4));
        assert_eq!(p.set_of(0), p.set_of(2));

        // marking a whole set does nothing
        for e in [0, 2, 3] {
            p.mark(e);
        }
        p.split();
        assert_eq!(p.count(), 4);
        assert_eq!(p.to_string().matches('{').count(), 4);
    }

    #[test_log::test]
    fn runs() {
        let mut p = Partition::new(5);
        let labels = [2, 0, 1, 0, 2];
        p.reorder_by_key(|&e| labels[e]);
        p.split_runs(|e| labels[e]);
        assert_eq!(p.count(), 3);
        assert_eq!(p.set_of(1), p.set_of(3));
        assert_eq!(p.set_of(0), p.set_of(4));
        assert_eq!(p.set_of(1), 0);
        assert_eq!(p.set_of(2), 1);

        let mut empty = Partition::new(0);
        empty.split_runs(|e| e);
        assert_eq!(empty.count(), 0);
    }
}
