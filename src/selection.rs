//! Selection state and the rules guarding it.
//!
//! Only visible rows can be selected. Every visibility-reducing change runs
//! the selection through `retain_visible`, so the invariant holds without
//! the callers having to think about it.

use std::collections::HashSet;

use crate::types::RowId;

#[derive(Debug)]
pub(crate) struct SelectionGuard {
    selected: Vec<RowId>,
    multi_select: bool,
}

impl SelectionGuard {
    pub(crate) fn new(multi_select: bool) -> Self {
        Self {
            selected: Vec::new(),
            multi_select,
        }
    }

    pub(crate) fn selected(&self) -> &[RowId] {
        &self.selected
    }

    pub(crate) fn multi_select(&self) -> bool {
        self.multi_select
    }

    /// Applies a selection request. Invisible rows are dropped silently;
    /// without multi-select at most the first requested row survives. When
    /// the surviving set equals the current selection (in any order) nothing
    /// changes and no notification is due.
    pub(crate) fn select(&mut self, requested: &[RowId], visible: &HashSet<RowId>) -> bool {
        let mut next: Vec<RowId> = Vec::with_capacity(requested.len());
        let mut seen = HashSet::with_capacity(requested.len());
        for &id in requested {
            if visible.contains(&id) && seen.insert(id) {
                next.push(id);
            }
        }
        if !self.multi_select && next.len() > 1 {
            wdebug!(requested = next.len(), "multi-row request clamped to first");
            next.truncate(1);
        }

        if same_set(&next, &self.selected) {
            return false;
        }
        self.selected = next;
        true
    }

    /// Removes the given rows from the selection. Deselecting a row that is
    /// not selected is a no-op.
    pub(crate) fn deselect(&mut self, rows: &[RowId]) -> bool {
        let drop: HashSet<RowId> = rows.iter().copied().collect();
        let before = self.selected.len();
        self.selected.retain(|id| !drop.contains(id));
        self.selected.len() < before
    }

    /// Drops selected rows that are no longer visible. Returns true when the
    /// selection changed.
    pub(crate) fn retain_visible(&mut self, visible: &HashSet<RowId>) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| visible.contains(id));
        self.selected.len() < before
    }
}

fn same_set(a: &[RowId], b: &[RowId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let set: HashSet<RowId> = a.iter().copied().collect();
    b.iter().all(|id| set.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(ids: &[u64]) -> HashSet<RowId> {
        ids.iter().map(|&i| RowId(i)).collect()
    }

    #[test]
    fn invisible_rows_are_dropped_silently() {
        let mut guard = SelectionGuard::new(true);
        assert!(guard.select(&[RowId(1), RowId(9), RowId(2)], &visible(&[1, 2, 3])));
        assert_eq!(guard.selected(), &[RowId(1), RowId(2)]);
    }

    #[test]
    fn single_select_keeps_the_first_row() {
        let mut guard = SelectionGuard::new(false);
        assert!(guard.select(&[RowId(2), RowId(1)], &visible(&[1, 2])));
        assert_eq!(guard.selected(), &[RowId(2)]);
    }

    #[test]
    fn reselecting_the_same_set_is_silent() {
        let mut guard = SelectionGuard::new(true);
        let vis = visible(&[1, 2, 3]);
        assert!(guard.select(&[RowId(1), RowId(2)], &vis));
        // Same rows, different order: still a no-op.
        assert!(!guard.select(&[RowId(2), RowId(1)], &vis));
        assert_eq!(guard.selected(), &[RowId(1), RowId(2)]);
    }

    #[test]
    fn deselect_of_unselected_row_is_a_noop() {
        let mut guard = SelectionGuard::new(true);
        guard.select(&[RowId(1)], &visible(&[1, 2]));
        assert!(!guard.deselect(&[RowId(2)]));
        assert!(guard.deselect(&[RowId(1)]));
        assert!(guard.selected().is_empty());
    }

    #[test]
    fn hidden_rows_fall_out_of_the_selection() {
        let mut guard = SelectionGuard::new(true);
        guard.select(&[RowId(1), RowId(2)], &visible(&[1, 2]));
        assert!(guard.retain_visible(&visible(&[2])));
        assert_eq!(guard.selected(), &[RowId(2)]);
        assert!(!guard.retain_visible(&visible(&[2])));
    }
}
