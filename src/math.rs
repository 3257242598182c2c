use std::collections::{BTreeMap, BTreeSet};

pub use std::collections::btree_map as ordered_map;

/// Type alias for sets that are ordered.
pub type OrderedSet<S> = BTreeSet<S>;
/// Type alias for maps that are ordered, this is used wherever the iteration order
/// has to be deterministic, e.g. for the outgoing transitions of a state.
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiHashMap<L, R>;

/// Computes the integer `r` such that `a = r^i` and `b = r^j` for some positive integers `i` and `j`,
/// choosing the largest such `r`. Returns `None` if no such `r > 1` exists.
///
/// ```
/// use autoseq::math::common_root;
/// assert_eq!(common_root(4, 8), Some(2));
/// assert_eq!(common_root(9, 27), Some(3));
/// assert_eq!(common_root(16, 4), Some(4));
/// assert_eq!(common_root(2, 3), None);
/// ```
pub fn common_root(a: u64, b: u64) -> Option<u64> {
    if a < 2 || b < 2 {
        return None;
    }
    let (small, large) = if a <= b { (a, b) } else { (b, a) };
    // any common root is at most the smaller number, and we prefer the largest one
    (2..=small)
        .rev()
        .find(|&r| integer_log(small, r).is_some() && integer_log(large, r).is_some())
}

/// Returns `Some(i)` if `n = base^i` for some `i >= 1`.
///
/// ```
/// use autoseq::math::integer_log;
/// assert_eq!(integer_log(8, 2), Some(3));
/// assert_eq!(integer_log(2, 2), Some(1));
/// assert_eq!(integer_log(12, 2), None);
/// ```
pub fn integer_log(n: u64, base: u64) -> Option<u32> {
    if base < 2 || n < base {
        return None;
    }
    let mut exponent = 0;
    let mut current = n;
    while current % base == 0 {
        current /= base;
        exponent += 1;
    }
    (current == 1).then_some(exponent)
}

/// Integer division rounding towards negative infinity. The divisor must not be zero.
///
/// ```
/// use autoseq::math::floor_div;
/// assert_eq!(floor_div(7, 2), 3);
/// assert_eq!(floor_div(-7, 2), -4);
/// assert_eq!(floor_div(7, -2), -4);
/// assert_eq!(floor_div(-8, -2), 4);
/// ```
pub fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots() {
        assert_eq!(common_root(2, 2), Some(2));
        assert_eq!(common_root(4, 2), Some(2));
        assert_eq!(common_root(64, 16), Some(4));
        assert_eq!(common_root(6, 36), Some(6));
        assert_eq!(common_root(10, 4), None);
        assert_eq!(common_root(1, 4), None);
    }

    #[test]
    fn logs() {
        assert_eq!(integer_log(1, 2), None);
        assert_eq!(integer_log(81, 3), Some(4));
        assert_eq!(integer_log(81, 9), Some(2));
        assert_eq!(integer_log(0, 2), None);
    }
}
