//! Multi-column sorting, sort-key bookkeeping and grouping rules.
//!
//! The comparator walks the active sort columns in `sort_index` order and
//! negates per-column results for descending keys. When every active key
//! compares equal it falls back to a pass over all columns, so the produced
//! order is deterministic even for rows the sort keys cannot tell apart.
//!
//! Hierarchical data is sorted per parent: each child list is ordered
//! independently and the canonical order is then rewritten in pre-order, so
//! siblings never interleave across parents.

use core::cmp::Ordering;

use crate::aggregate::is_new_group;
use crate::column::Column;
use crate::error::Result;
use crate::store::RowStore;
use crate::types::{RowId, SortDirection};

/// Active sort columns, ascending by `sort_index`.
fn sort_keys(columns: &[Column]) -> Vec<usize> {
    let mut keys: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.sort_active)
        .map(|(i, _)| i)
        .collect();
    keys.sort_by_key(|&i| columns[i].sort_index);
    keys
}

fn compare_rows(store: &RowStore, columns: &[Column], keys: &[usize], a: RowId, b: RowId) -> Ordering {
    let row_a = store.row(a);
    let row_b = store.row(b);
    for &c in keys {
        let column = &columns[c];
        let mut ord = column.compare(row_a.cell(c), row_b.cell(c));
        if !column.sort_ascending {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    // Deterministic tie-break over the remaining columns.
    for (c, column) in columns.iter().enumerate() {
        if keys.contains(&c) {
            continue;
        }
        let ord = column.compare(row_a.cell(c), row_b.cell(c));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Re-sorts the canonical order by the active sort columns. Stable, so
/// re-sorting already sorted input is a no-op. Returns true when the order
/// actually changed.
pub(crate) fn sort_rows(store: &mut RowStore, columns: &[Column]) -> Result<bool> {
    let keys = sort_keys(columns);
    if keys.is_empty() {
        return Ok(false);
    }

    let old_order = store.order().to_vec();
    let new_order = if store.hierarchical() {
        // Sort each child list in place, then flatten pre-order.
        let mut roots: Vec<RowId> = old_order
            .iter()
            .copied()
            .filter(|&id| store.row(id).parent.is_none())
            .collect();
        roots.sort_by(|&a, &b| compare_rows(store, columns, &keys, a, b));

        let mut order = Vec::with_capacity(old_order.len());
        let mut stack: Vec<RowId> = roots.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            let mut children = store.row(id).child_rows.clone();
            children.sort_by(|&a, &b| compare_rows(store, columns, &keys, a, b));
            stack.extend(children.into_iter().rev());
        }
        order
    } else {
        let mut order = old_order.clone();
        order.sort_by(|&a, &b| compare_rows(store, columns, &keys, a, b));
        order
    };

    if new_order == old_order {
        return Ok(false);
    }
    store.reorder(new_order)?;
    wdebug!(keys = keys.len(), "rows sorted");
    Ok(true)
}

/// Updates the sort state of `target` the way a header click would.
///
/// `multi` appends (or re-directions) the column as an additional sort key;
/// otherwise all non-permanent sibling keys are cleared first. `remove` drops
/// the column from the key sequence; permanent columns ignore removal.
/// An exclusive sort keeps the target's grouping only when it was the lone
/// sort-and-group key; pinned columns keep their group state.
pub(crate) fn update_sort_state(
    columns: &mut [Column],
    target: usize,
    direction: SortDirection,
    multi: bool,
    remove: bool,
) {
    if remove {
        if columns[target].pinned_head || columns[target].pinned_tail {
            return;
        }
        columns[target].clear_sort();
        renumber(columns);
        return;
    }

    if !multi {
        let lone_group = columns[target].grouped
            && columns.iter().filter(|c| c.sort_active).count() == 1
            && columns.iter().filter(|c| c.grouped).count() == 1;
        for (i, column) in columns.iter_mut().enumerate() {
            if i == target || column.pinned_head || column.pinned_tail {
                continue;
            }
            column.clear_sort();
        }
        if !lone_group && !columns[target].pinned_head && !columns[target].pinned_tail {
            columns[target].grouped = false;
        }
    }
    let column = &mut columns[target];
    column.sort_active = true;
    column.sort_ascending = direction.is_ascending();
    if column.sort_index < 0 {
        // Provisional; renumbering assigns the real position.
        column.sort_index = i32::MAX;
    }
    renumber(columns);
}

/// Groups by `target`, which also makes it a sort key. Returns false without
/// touching anything when grouping is not possible for that column.
pub(crate) fn update_group_state(
    columns: &mut [Column],
    target: usize,
    direction: SortDirection,
    multi: bool,
    remove: bool,
    hierarchical: bool,
) -> bool {
    if remove {
        if !columns[target].grouped {
            return false;
        }
        // A grouped pinned head anchors the grouped prefix; it can only be
        // ungrouped after the columns behind it.
        if columns[target].pinned_head
            && columns.iter().enumerate().any(|(i, c)| i != target && c.grouped)
        {
            wdebug!(column = %columns[target].id, "pinned group anchors later groups");
            return false;
        }
        columns[target].grouped = false;
        renumber(columns);
        return true;
    }
    if !is_grouping_possible(columns, target, hierarchical) {
        wdebug!(column = %columns[target].id, "grouping not possible");
        return false;
    }

    if !multi {
        for (i, column) in columns.iter_mut().enumerate() {
            if i == target || column.pinned_head {
                continue;
            }
            column.grouped = false;
            if !column.pinned_tail {
                column.clear_sort();
            }
        }
    }
    let column = &mut columns[target];
    column.grouped = true;
    column.sort_active = true;
    column.sort_ascending = direction.is_ascending();
    if column.sort_index < 0 {
        column.sort_index = i32::MAX;
    }
    renumber(columns);
    true
}

/// Grouping is impossible for hierarchical data, for tail-pinned columns,
/// and whenever it would leave a hole in the grouped prefix of the sort-key
/// sequence. Every head-pinned column must itself be grouped first, even
/// while it is not sort-active: it can become a sort key at any time and
/// would then renumber ahead of the grouped columns.
pub(crate) fn is_grouping_possible(columns: &[Column], target: usize, hierarchical: bool) -> bool {
    if hierarchical || columns[target].pinned_tail {
        return false;
    }
    if columns[target].grouped {
        return true;
    }
    columns
        .iter()
        .enumerate()
        .all(|(i, c)| i == target || !c.pinned_head || c.grouped)
}

/// Reassigns contiguous `sort_index` values: head-pinned keys first, then
/// grouped keys, then the free keys, tail-pinned keys last; ties keep their
/// previous relative order.
fn renumber(columns: &mut [Column]) {
    let mut active: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.sort_active)
        .map(|(i, _)| i)
        .collect();
    active.sort_by_key(|&i| {
        let c = &columns[i];
        let band = if c.pinned_head {
            0
        } else if c.pinned_tail {
            3
        } else if c.grouped {
            1
        } else {
            2
        };
        (band, c.sort_index as i64, i)
    });
    for (new_index, &i) in active.iter().enumerate() {
        columns[i].sort_index = new_index as i32;
    }
    debug_assert!(grouped_is_prefix(columns), "grouped keys must form a prefix");
}

fn grouped_is_prefix(columns: &[Column]) -> bool {
    let keys = sort_keys(columns);
    let grouped = keys.iter().take_while(|&&i| columns[i].grouped).count();
    keys.iter().skip(grouped).all(|&i| !columns[i].grouped)
}

/// Indexes (into the visible sequence) after which a group ends. The last
/// visible row always closes a group.
pub(crate) fn group_boundaries(
    store: &RowStore,
    visible: &[RowId],
    columns: &[Column],
) -> Vec<usize> {
    let grouped: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.grouped)
        .map(|(i, _)| i)
        .collect();
    if grouped.is_empty() {
        return Vec::new();
    }
    visible
        .iter()
        .enumerate()
        .filter(|&(i, &id)| {
            is_new_group(store, columns, &grouped, id, visible.get(i + 1).copied())
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowDraft;
    use crate::types::CellValue;

    fn store_of(values: &[(&str, i64)]) -> RowStore {
        let mut store = RowStore::default();
        store
            .insert(
                values
                    .iter()
                    .map(|&(s, n)| {
                        RowDraft::new(vec![CellValue::Text(s.into()), CellValue::Int(n)])
                    })
                    .collect(),
            )
            .unwrap();
        store
    }

    fn cells(store: &RowStore, column: usize) -> Vec<CellValue> {
        store
            .order()
            .iter()
            .map(|&id| store.row(id).cell(column).clone())
            .collect()
    }

    #[test]
    fn multi_key_sort_respects_index_and_direction() {
        let mut store = store_of(&[("b", 1), ("a", 2), ("b", 3), ("a", 1)]);
        let mut columns = vec![Column::new("name"), Column::new("val")];
        update_sort_state(&mut columns, 0, SortDirection::Ascending, false, false);
        update_sort_state(&mut columns, 1, SortDirection::Descending, true, false);

        assert!(sort_rows(&mut store, &columns).unwrap());
        assert_eq!(
            cells(&store, 1),
            vec![
                CellValue::Int(2),
                CellValue::Int(1),
                CellValue::Int(3),
                CellValue::Int(1)
            ]
        );
    }

    #[test]
    fn sorting_sorted_input_changes_nothing() {
        let mut store = store_of(&[("c", 0), ("a", 0), ("b", 0)]);
        let mut columns = vec![Column::new("name"), Column::new("val")];
        update_sort_state(&mut columns, 0, SortDirection::Ascending, false, false);

        assert!(sort_rows(&mut store, &columns).unwrap());
        let settled = store.order().to_vec();
        assert!(!sort_rows(&mut store, &columns).unwrap());
        assert_eq!(store.order(), settled.as_slice());
    }

    #[test]
    fn hierarchical_sort_keeps_siblings_under_their_parent() {
        let mut store = store_of(&[("b", 0), ("a", 0)]);
        let parents = store.order().to_vec();
        store
            .insert(vec![
                RowDraft::new(vec![CellValue::Text("z".into()), CellValue::Int(0)])
                    .with_parent(parents[0]),
                RowDraft::new(vec![CellValue::Text("y".into()), CellValue::Int(0)])
                    .with_parent(parents[0]),
            ])
            .unwrap();

        let mut columns = vec![Column::new("name"), Column::new("val")];
        update_sort_state(&mut columns, 0, SortDirection::Ascending, false, false);
        sort_rows(&mut store, &columns).unwrap();

        let names: Vec<CellValue> = cells(&store, 0);
        assert_eq!(
            names,
            vec![
                CellValue::Text("a".into()),
                CellValue::Text("b".into()),
                CellValue::Text("y".into()),
                CellValue::Text("z".into()),
            ]
        );
        // Children stayed attached to "b" even though "a" sorts first.
        let b = store.order()[1];
        assert_eq!(store.row(b).child_rows.len(), 2);
    }

    #[test]
    fn exclusive_sort_clears_other_keys_but_not_pinned_ones() {
        let mut columns = vec![
            Column::new("head").with_pinned_head(),
            Column::new("a"),
            Column::new("b"),
        ];
        update_sort_state(&mut columns, 0, SortDirection::Ascending, false, false);
        update_sort_state(&mut columns, 1, SortDirection::Ascending, true, false);
        update_sort_state(&mut columns, 2, SortDirection::Descending, false, false);

        assert!(columns[0].sort_active);
        assert_eq!(columns[0].sort_index, 0);
        assert!(!columns[1].sort_active);
        assert_eq!(columns[1].sort_index, -1);
        assert!(columns[2].sort_active);
        assert_eq!(columns[2].sort_index, 1);
    }

    #[test]
    fn removing_a_key_renumbers_the_rest() {
        let mut columns = vec![Column::new("a"), Column::new("b"), Column::new("c")];
        for i in 0..3 {
            update_sort_state(&mut columns, i, SortDirection::Ascending, true, false);
        }
        update_sort_state(&mut columns, 1, SortDirection::Ascending, true, true);

        assert_eq!(columns[0].sort_index, 0);
        assert_eq!(columns[1].sort_index, -1);
        assert_eq!(columns[2].sort_index, 1);
    }

    #[test]
    fn grouping_rules() {
        let columns = vec![
            Column::new("head").with_pinned_head().with_sort(0, SortDirection::Ascending),
            Column::new("a"),
            Column::new("tail").with_pinned_tail(),
        ];
        // Head sort column is not grouped, so grouping "a" would leave a hole.
        assert!(!is_grouping_possible(&columns, 1, false));
        // The head column itself can group.
        assert!(is_grouping_possible(&columns, 0, false));
        // Tail columns and hierarchical tables never group.
        assert!(!is_grouping_possible(&columns, 2, false));
        assert!(!is_grouping_possible(&columns, 1, true));
    }

    #[test]
    fn inactive_pinned_head_still_blocks_grouping_behind_it() {
        let mut columns = vec![Column::new("head").with_pinned_head(), Column::new("a")];
        assert!(!is_grouping_possible(&columns, 1, false));
        assert!(!update_group_state(
            &mut columns,
            1,
            SortDirection::Ascending,
            false,
            false,
            false
        ));
        assert!(!columns[1].grouped);

        // Grouping the pinned column first unlocks the one behind it, and a
        // later sort of the pinned column keeps the grouped keys in front.
        assert!(update_group_state(
            &mut columns,
            0,
            SortDirection::Ascending,
            false,
            false,
            false
        ));
        assert!(update_group_state(
            &mut columns,
            1,
            SortDirection::Ascending,
            true,
            false,
            false
        ));
        update_sort_state(&mut columns, 0, SortDirection::Descending, true, false);
        assert!(columns[0].grouped);
        assert_eq!(columns[0].sort_index, 0);
        assert_eq!(columns[1].sort_index, 1);

        // The pinned anchor ungroups last.
        assert!(!update_group_state(
            &mut columns,
            0,
            SortDirection::Ascending,
            false,
            true,
            false
        ));
        assert!(update_group_state(
            &mut columns,
            1,
            SortDirection::Ascending,
            false,
            true,
            false
        ));
        assert!(update_group_state(
            &mut columns,
            0,
            SortDirection::Ascending,
            false,
            true,
            false
        ));
        assert!(!columns[0].grouped);
    }

    #[test]
    fn exclusive_sort_drops_grouping_unless_it_is_the_lone_key() {
        let mut columns = vec![Column::new("a"), Column::new("b")];
        update_group_state(&mut columns, 0, SortDirection::Ascending, false, false, false);

        // Lone sort-and-group key: a direction flip keeps the grouping.
        update_sort_state(&mut columns, 0, SortDirection::Descending, false, false);
        assert!(columns[0].grouped);

        // With a second sort key in play the exclusive re-sort ungroups.
        update_sort_state(&mut columns, 1, SortDirection::Ascending, true, false);
        update_sort_state(&mut columns, 0, SortDirection::Ascending, false, false);
        assert!(!columns[0].grouped);
        assert!(columns[0].sort_active);
        assert!(!columns[1].sort_active);
    }

    #[test]
    fn grouped_columns_prefix_the_sort_keys() {
        let mut columns = vec![Column::new("a"), Column::new("b"), Column::new("c")];
        update_sort_state(&mut columns, 0, SortDirection::Ascending, false, false);
        update_sort_state(&mut columns, 1, SortDirection::Ascending, true, false);
        assert!(update_group_state(
            &mut columns,
            2,
            SortDirection::Ascending,
            true,
            false,
            false
        ));

        // The freshly grouped column jumped ahead of the plain sort keys.
        assert_eq!(columns[2].sort_index, 0);
        assert_eq!(columns[0].sort_index, 1);
        assert_eq!(columns[1].sort_index, 2);
    }

    #[test]
    fn boundaries_follow_display_text_not_raw_values() {
        // 1 and 1.0 render identically, so they share a group.
        let mut store = RowStore::default();
        store
            .insert(vec![
                RowDraft::new(vec![CellValue::Int(1)]),
                RowDraft::new(vec![CellValue::Number(1.0)]),
                RowDraft::new(vec![CellValue::Int(2)]),
            ])
            .unwrap();
        let mut columns = vec![Column::new("val")];
        columns[0].grouped = true;
        columns[0].sort_active = true;
        columns[0].sort_index = 0;

        let visible = store.order().to_vec();
        assert_eq!(group_boundaries(&store, &visible, &columns), vec![1, 2]);
    }
}
