//! Canonical row storage and hierarchy maintenance.
//!
//! The store owns every [`Row`]; all links between rows are ids. `order` is
//! the single canonical sequence, and for hierarchical data it is always in
//! pre-order. The parent/child structure is derived state that is rebuilt
//! from scratch on every structural change, so a stale tree cannot survive
//! an edit.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, TableError};
use crate::row::{Row, RowDraft, RowUpdate};
use crate::types::{RowId, RowStatus};

#[derive(Debug, Default)]
pub(crate) struct RowStore {
    rows: HashMap<RowId, Row>,
    /// Canonical order. Pre-order whenever the data is hierarchical.
    order: Vec<RowId>,
    root_rows: Vec<RowId>,
    hierarchical: bool,
    next_id: u64,
}

impl RowStore {
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn order(&self) -> &[RowId] {
        &self.order
    }

    pub(crate) fn hierarchical(&self) -> bool {
        self.hierarchical
    }

    /// Panics when `id` is not stored. Callers hold ids that came out of this
    /// store; a miss is a bug, not a recoverable condition.
    pub(crate) fn row(&self, id: RowId) -> &Row {
        &self.rows[&id]
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> &mut Row {
        self.rows.get_mut(&id).unwrap_or_else(|| panic!("{id} not in store"))
    }

    pub(crate) fn try_row(&self, id: RowId) -> Result<&Row> {
        self.rows.get(&id).ok_or(TableError::RowNotFound(id))
    }

    /// Inserts a batch of drafts at the end of the canonical order.
    ///
    /// The batch is atomic: every declared parent must already be resolvable,
    /// otherwise nothing is inserted. Ids are assigned here, so a draft can
    /// only name a parent from an earlier call.
    pub(crate) fn insert(&mut self, drafts: Vec<RowDraft>) -> Result<Vec<RowId>> {
        for draft in &drafts {
            if let Some(parent) = draft.parent {
                if !self.rows.contains_key(&parent) {
                    return Err(TableError::UnresolvableParent(parent));
                }
            }
        }

        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = RowId(self.next_id);
            self.next_id += 1;
            let mut row = Row::new(id, draft.cells, draft.parent);
            row.expanded = draft.expanded;
            self.rows.insert(id, row);
            self.order.push(id);
            ids.push(id);
        }
        self.rebuild_hierarchy()?;
        wtrace!(count = ids.len(), total = self.rows.len(), "rows inserted");
        Ok(ids)
    }

    /// Deletes a batch of rows. Atomic: every id must exist, and a row may
    /// only go if all of its children go with it. Cascading is the caller's
    /// job.
    pub(crate) fn delete(&mut self, ids: &[RowId]) -> Result<()> {
        let doomed: HashSet<RowId> = ids.iter().copied().collect();
        for &id in ids {
            let row = self.try_row(id)?;
            if let Some(&child) = row.child_rows.iter().find(|c| !doomed.contains(c)) {
                debug_assert!(self.rows.contains_key(&child));
                return Err(TableError::RowHasChildren(id));
            }
        }

        self.order.retain(|id| !doomed.contains(id));
        for id in &doomed {
            self.rows.remove(id);
        }
        self.rebuild_hierarchy()?;
        wtrace!(count = ids.len(), total = self.rows.len(), "rows deleted");
        Ok(())
    }

    pub(crate) fn delete_all(&mut self) {
        self.rows.clear();
        self.order.clear();
        self.root_rows.clear();
        self.hierarchical = false;
    }

    /// Applies a batch of updates. Atomic: ids and parents are validated
    /// before any row changes, including a walk up the new parent chain so an
    /// update cannot fold a row under its own subtree.
    pub(crate) fn update(&mut self, updates: Vec<RowUpdate>) -> Result<Vec<RowId>> {
        for update in &updates {
            self.try_row(update.id)?;
            if let Some(parent) = update.parent {
                if !self.rows.contains_key(&parent) {
                    return Err(TableError::UnresolvableParent(parent));
                }
                let mut ancestor = Some(parent);
                while let Some(a) = ancestor {
                    if a == update.id {
                        return Err(TableError::UnresolvableParent(parent));
                    }
                    ancestor = self.rows[&a].parent;
                }
            }
        }

        let mut ids = Vec::with_capacity(updates.len());
        for update in updates {
            let row = self.rows.get_mut(&update.id).expect("validated above");
            row.cells = update.cells;
            row.parent = update.parent;
            row.status = RowStatus::Updated;
            ids.push(update.id);
        }
        self.rebuild_hierarchy()?;
        Ok(ids)
    }

    /// Replaces the canonical order. `new_order` must be a permutation of the
    /// current identities; for hierarchical data the hierarchy rebuild then
    /// re-imposes pre-order while keeping the requested sibling order.
    pub(crate) fn reorder(&mut self, new_order: Vec<RowId>) -> Result<()> {
        if new_order.len() != self.order.len() {
            return Err(TableError::OrderMismatch);
        }
        let mut seen = HashSet::with_capacity(new_order.len());
        for &id in &new_order {
            if !self.rows.contains_key(&id) || !seen.insert(id) {
                return Err(TableError::OrderMismatch);
            }
        }
        self.order = new_order;
        self.rebuild_hierarchy()?;
        Ok(())
    }

    /// Relinks children to parents, recomputes root rows, levels and the
    /// hierarchical flag, and rewrites the canonical order to pre-order.
    ///
    /// Because the tree is rebuilt from the flat order every time, a cyclic
    /// parent chain can never be accepted: its rows would be unreachable from
    /// the roots, which trips the completeness assertion below.
    pub(crate) fn rebuild_hierarchy(&mut self) -> Result<()> {
        let mut children: HashMap<RowId, Vec<RowId>> = HashMap::new();
        let mut roots = Vec::new();
        let mut hierarchical = false;
        for &id in &self.order {
            match self.rows[&id].parent {
                Some(parent) => {
                    if !self.rows.contains_key(&parent) {
                        return Err(TableError::UnresolvableParent(parent));
                    }
                    children.entry(parent).or_default().push(id);
                    hierarchical = true;
                }
                None => roots.push(id),
            }
        }

        let mut order = Vec::with_capacity(self.order.len());
        let mut stack: Vec<(RowId, usize)> =
            roots.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, level)) = stack.pop() {
            order.push(id);
            let row = self.rows.get_mut(&id).expect("linked above");
            row.hierarchy_level = level;
            row.child_rows = children.remove(&id).unwrap_or_default();
            for &child in row.child_rows.clone().iter().rev() {
                stack.push((child, level + 1));
            }
        }
        debug_assert_eq!(
            order.len(),
            self.rows.len(),
            "hierarchy rebuild left unreachable rows"
        );

        self.order = order;
        self.root_rows = roots;
        self.hierarchical = hierarchical;
        Ok(())
    }

    /// Pre-order visitor over all rows.
    pub(crate) fn visit_rows(&self, mut f: impl FnMut(&Row)) {
        for id in &self.order {
            f(&self.rows[id]);
        }
    }

    /// Derives the visible row sequence from filter results, expansion state
    /// and the hierarchy, and refreshes each row's `expandable` flag.
    ///
    /// A row survives filtering when it is accepted itself or any descendant
    /// is (rejected ancestors of an accepted row stay reachable). It is then
    /// visible iff every ancestor on its path is visible and expanded.
    pub(crate) fn compute_visible_rows(&mut self) -> Vec<RowId> {
        // Children follow their parent in pre-order, so a reverse scan sees
        // every subtree before its root.
        let mut subtree_visible: HashMap<RowId, bool> =
            HashMap::with_capacity(self.rows.len());
        for &id in self.order.iter().rev() {
            let row = &self.rows[&id];
            let from_children = row
                .child_rows
                .iter()
                .any(|c| subtree_visible.get(c).copied().unwrap_or(false));
            subtree_visible.insert(id, row.filter_accepted || from_children);
        }

        for id in self.order.clone() {
            let expandable = self.rows[&id]
                .child_rows
                .iter()
                .any(|c| subtree_visible[c]);
            self.row_mut(id).expandable = expandable;
        }

        let mut visible = Vec::new();
        let mut emitted: HashSet<RowId> = HashSet::new();
        for &id in &self.order {
            if !subtree_visible[&id] {
                continue;
            }
            let under_open_parent = match self.rows[&id].parent {
                None => true,
                Some(parent) => emitted.contains(&parent) && self.rows[&parent].expanded,
            };
            if under_open_parent {
                visible.push(id);
                emitted.insert(id);
            }
        }
        visible
    }

    /// Resets every row's status to `Unchanged`, after change events went out.
    pub(crate) fn settle_statuses(&mut self) {
        for row in self.rows.values_mut() {
            row.status = RowStatus::Unchanged;
        }
    }

    #[cfg(test)]
    pub(crate) fn root_rows(&self) -> &[RowId] {
        &self.root_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn draft(n: i64) -> RowDraft {
        RowDraft::new(vec![CellValue::Int(n)])
    }

    fn store_with(n: i64) -> (RowStore, Vec<RowId>) {
        let mut store = RowStore::default();
        let ids = store.insert((0..n).map(draft).collect()).unwrap();
        (store, ids)
    }

    #[test]
    fn insert_assigns_identity_in_order() {
        let (store, ids) = store_with(3);
        assert_eq!(store.order(), ids.as_slice());
        assert!(!store.hierarchical());
        assert_eq!(store.row(ids[1]).status, RowStatus::Inserted);
    }

    #[test]
    fn insert_with_unknown_parent_is_atomic() {
        let (mut store, _) = store_with(2);
        let bogus = RowId(999);
        let err = store
            .insert(vec![draft(10), draft(11).with_parent(bogus)])
            .unwrap_err();
        assert!(matches!(err, TableError::UnresolvableParent(id) if id == bogus));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn hierarchy_rebuild_produces_preorder_and_levels() {
        let (mut store, ids) = store_with(2);
        let children = store
            .insert(vec![
                draft(10).with_parent(ids[0]),
                draft(11).with_parent(ids[1]),
                draft(12).with_parent(ids[0]),
            ])
            .unwrap();
        assert!(store.hierarchical());
        assert_eq!(
            store.order(),
            &[ids[0], children[0], children[2], ids[1], children[1]]
        );
        assert_eq!(store.row(children[0]).hierarchy_level, 1);
        assert_eq!(store.row(ids[0]).child_rows, vec![children[0], children[2]]);
        assert_eq!(store.root_rows(), &[ids[0], ids[1]]);
    }

    #[test]
    fn delete_refuses_row_with_surviving_children() {
        let (mut store, ids) = store_with(1);
        let child = store.insert(vec![draft(10).with_parent(ids[0])]).unwrap()[0];
        let err = store.delete(&[ids[0]]).unwrap_err();
        assert!(matches!(err, TableError::RowHasChildren(id) if id == ids[0]));
        assert_eq!(store.len(), 2);

        // Taking the whole subtree down in one batch is fine.
        store.delete(&[ids[0], child]).unwrap();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn delete_unknown_row_errors() {
        let (mut store, _) = store_with(1);
        let err = store.delete(&[RowId(7)]).unwrap_err();
        assert!(matches!(err, TableError::RowNotFound(RowId(7))));
    }

    #[test]
    fn update_rejects_reparenting_into_own_subtree() {
        let (mut store, ids) = store_with(1);
        let child = store.insert(vec![draft(10).with_parent(ids[0])]).unwrap()[0];
        let err = store
            .update(vec![RowUpdate {
                id: ids[0],
                cells: vec![CellValue::Int(0)],
                parent: Some(child),
            }])
            .unwrap_err();
        assert!(matches!(err, TableError::UnresolvableParent(_)));
        assert_eq!(store.row(ids[0]).parent, None);
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let (mut store, ids) = store_with(3);
        assert!(matches!(
            store.reorder(vec![ids[0], ids[1]]),
            Err(TableError::OrderMismatch)
        ));
        assert!(matches!(
            store.reorder(vec![ids[0], ids[0], ids[1]]),
            Err(TableError::OrderMismatch)
        ));
        store.reorder(vec![ids[2], ids[0], ids[1]]).unwrap();
        assert_eq!(store.order(), &[ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn visible_rows_honour_filter_and_expansion() {
        let (mut store, ids) = store_with(1);
        let child = store.insert(vec![draft(10).with_parent(ids[0])]).unwrap()[0];
        let grandchild = store.insert(vec![draft(20).with_parent(child)]).unwrap()[0];

        // Collapsed parent hides the whole subtree.
        assert_eq!(store.compute_visible_rows(), vec![ids[0]]);

        store.row_mut(ids[0]).expanded = true;
        store.row_mut(child).expanded = true;
        assert_eq!(
            store.compute_visible_rows(),
            vec![ids[0], child, grandchild]
        );

        // A rejected ancestor of an accepted row stays visible.
        store.row_mut(ids[0]).filter_accepted = false;
        store.row_mut(child).filter_accepted = false;
        assert_eq!(
            store.compute_visible_rows(),
            vec![ids[0], child, grandchild]
        );
        assert!(store.row(ids[0]).expandable);

        // Rejecting the leaf kills the chain.
        store.row_mut(grandchild).filter_accepted = false;
        assert!(store.compute_visible_rows().is_empty());
        assert!(!store.row(ids[0]).expandable);
    }
}
