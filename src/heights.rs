//! Prefix-sum index over per-row heights.
//!
//! Maps a scroll offset to a visible-row index and sums filler extents in
//! `O(log n)`. One slot per visible row; the slot value is the row height
//! plus the height of an aggregate row attached directly after it, so the
//! summed extent matches what the renderer lays out. Rebuilt whenever the
//! visible sequence or the group structure changes, patched in place when a
//! single measurement arrives.

#[derive(Clone, Debug, Default)]
pub(crate) struct HeightIndex {
    // 1-indexed Fenwick layout: tree[i] covers the lsb(i) slots ending at i.
    tree: Vec<u64>,
    heights: Vec<u64>,
    total: u64,
    max_bit: usize,
}

impl HeightIndex {
    pub(crate) fn from_heights(heights: impl IntoIterator<Item = u64>) -> Self {
        let heights: Vec<u64> = heights.into_iter().collect();
        let n = heights.len();
        let mut tree = vec![0u64; n + 1];
        let mut total = 0u64;
        for i in 1..=n {
            let h = heights[i - 1];
            total += h;
            tree[i] += h;
            let j = i + lsb(i);
            if j <= n {
                tree[j] += tree[i];
            }
        }
        Self {
            tree,
            heights,
            total,
            max_bit: top_bit(n),
        }
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Replaces one slot, typically after the renderer measured a row.
    pub(crate) fn set(&mut self, index: usize, height: u64) {
        let old = self.heights[index];
        if old == height {
            return;
        }
        self.heights[index] = height;
        self.total = self.total - old + height;
        let delta = height as i128 - old as i128;
        let mut i = index + 1;
        while i <= self.heights.len() {
            let next = self.tree[i] as i128 + delta;
            debug_assert!(next >= 0, "height index underflow at slot {i}");
            self.tree[i] = next.max(0) as u64;
            i += lsb(i);
        }
    }

    /// Summed height of the first `count` slots.
    pub(crate) fn prefix_sum(&self, count: usize) -> u64 {
        let mut i = count.min(self.heights.len());
        let mut sum = 0u64;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    /// Index of the row occupying the given offset, clamped to the last row.
    /// The row at index `i` spans `[prefix_sum(i), prefix_sum(i + 1))`.
    pub(crate) fn index_at_offset(&self, mut offset: u64) -> usize {
        let n = self.heights.len();
        if n == 0 {
            return 0;
        }
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= offset {
                offset -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx.min(n - 1)
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn top_bit(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
