//! Half-open index intervals over the visible-row index space.
//!
//! `subtract` and `union` may produce up to two parts; the window manager
//! relies on that to detect reconciliations that would tear the rendered
//! block apart (only edge extension/shrinking is supported).

/// An immutable half-open interval `[from, to)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(from <= to, "inverted range [{from}, {to})");
        Self { from, to }
    }

    pub fn empty() -> Self {
        Self { from: 0, to: 0 }
    }

    pub fn size(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.from && index < self.to
    }

    /// True when the ranges overlap or share an endpoint.
    pub fn touches(&self, other: &Range) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    pub fn intersect(&self, other: &Range) -> Range {
        let from = self.from.max(other.from);
        let to = self.to.min(other.to);
        if from >= to {
            Range::empty()
        } else {
            Range { from, to }
        }
    }

    /// Removes `other` from `self`. Yields no part when `other` covers
    /// `self`, two parts when `other` splits `self` in the middle, and one
    /// part otherwise.
    pub fn subtract(&self, other: &Range) -> Vec<Range> {
        if self.is_empty() {
            return Vec::new();
        }
        let cut = self.intersect(other);
        if cut.is_empty() {
            return vec![*self];
        }
        let mut parts = Vec::with_capacity(2);
        if cut.from > self.from {
            parts.push(Range::new(self.from, cut.from));
        }
        if cut.to < self.to {
            parts.push(Range::new(cut.to, self.to));
        }
        parts
    }

    /// Merges `self` with `other`. Yields one part when the ranges touch,
    /// two disjoint parts otherwise. Empty inputs contribute nothing.
    pub fn union(&self, other: &Range) -> Vec<Range> {
        if self.is_empty() {
            if other.is_empty() {
                return Vec::new();
            }
            return vec![*other];
        }
        if other.is_empty() {
            return vec![*self];
        }
        if self.touches(other) {
            return vec![Range::new(self.from.min(other.from), self.to.max(other.to))];
        }
        if self.from < other.from {
            vec![*self, *other]
        } else {
            vec![*other, *self]
        }
    }

    /// Shifts both endpoints by a signed delta, saturating at zero.
    pub(crate) fn shifted(&self, delta: isize) -> Range {
        let shift = |v: usize| -> usize {
            if delta >= 0 {
                v.saturating_add(delta as usize)
            } else {
                v.saturating_sub(delta.unsigned_abs())
            }
        };
        Range::new(shift(self.from), shift(self.to))
    }
}

impl core::fmt::Display for Range {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_clamps_to_overlap() {
        let a = Range::new(2, 8);
        assert_eq!(a.intersect(&Range::new(4, 6)), Range::new(4, 6));
        assert_eq!(a.intersect(&Range::new(0, 4)), Range::new(2, 4));
        assert_eq!(a.intersect(&Range::new(8, 10)), Range::empty());
    }

    #[test]
    fn subtract_produces_edge_and_split_parts() {
        let a = Range::new(2, 8);
        assert_eq!(a.subtract(&Range::new(0, 2)), vec![a]);
        assert_eq!(a.subtract(&Range::new(0, 4)), vec![Range::new(4, 8)]);
        assert_eq!(a.subtract(&Range::new(6, 10)), vec![Range::new(2, 6)]);
        assert_eq!(
            a.subtract(&Range::new(4, 6)),
            vec![Range::new(2, 4), Range::new(6, 8)]
        );
        assert!(a.subtract(&Range::new(0, 10)).is_empty());
    }

    #[test]
    fn union_merges_touching_ranges() {
        let a = Range::new(2, 5);
        assert_eq!(a.union(&Range::new(5, 8)), vec![Range::new(2, 8)]);
        assert_eq!(a.union(&Range::new(3, 4)), vec![Range::new(2, 5)]);
        assert_eq!(
            a.union(&Range::new(7, 9)),
            vec![Range::new(2, 5), Range::new(7, 9)]
        );
        assert_eq!(a.union(&Range::empty()), vec![a]);
    }

    #[test]
    fn subtract_then_union_round_trips() {
        // A \ B re-unioned with A ∩ B reconstructs A.
        for a_from in 0..6 {
            for a_to in a_from..8 {
                for b_from in 0..6 {
                    for b_to in b_from..8 {
                        let a = Range::new(a_from, a_to);
                        let b = Range::new(b_from, b_to);
                        let mut parts = a.subtract(&b);
                        let cut = a.intersect(&b);
                        if !cut.is_empty() {
                            parts.push(cut);
                        }
                        parts.sort_by_key(|r| r.from);
                        let rebuilt = parts.into_iter().fold(Range::empty(), |acc, part| {
                            match acc.union(&part).as_slice() {
                                [] => Range::empty(),
                                [one] => *one,
                                split => panic!("gap while rebuilding {a}: {split:?}"),
                            }
                        });
                        if a.is_empty() {
                            assert!(rebuilt.is_empty());
                        } else {
                            assert_eq!(rebuilt, a, "a={a} b={b}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn shifted_saturates_at_zero() {
        assert_eq!(Range::new(2, 5).shifted(3), Range::new(5, 8));
        assert_eq!(Range::new(2, 5).shifted(-2), Range::new(0, 3));
        assert_eq!(Range::new(0, 3).shifted(-1), Range::new(0, 2));
    }
}
