//! Row filtering.
//!
//! Filters are an ordered set keyed by [`RowFilter::key`]; adding a filter
//! with an existing key replaces it in place, so repeated adds of the same
//! logical filter are idempotent. A row is accepted only when every filter
//! accepts it. Whether a rejected row still shows up (because a descendant is
//! accepted) is decided by the visibility derivation in the store, not here.

use std::sync::Arc;

use crate::row::Row;
use crate::store::RowStore;
use crate::types::RowId;

pub trait RowFilter {
    fn accept(&self, row: &Row) -> bool;

    /// Identity of the filter within the set.
    fn key(&self) -> String;

    /// Human-readable name, surfaced to the host UI.
    fn label(&self) -> String {
        self.key()
    }
}

/// Closure-backed filter, cheap to clone.
#[derive(Clone)]
pub struct FnRowFilter {
    key: String,
    accept: Arc<dyn Fn(&Row) -> bool + Send + Sync>,
}

impl FnRowFilter {
    pub fn new(key: impl Into<String>, accept: impl Fn(&Row) -> bool + Send + Sync + 'static) -> Self {
        Self {
            key: key.into(),
            accept: Arc::new(accept),
        }
    }
}

impl RowFilter for FnRowFilter {
    fn accept(&self, row: &Row) -> bool {
        (self.accept)(row)
    }

    fn key(&self) -> String {
        self.key.clone()
    }
}

#[derive(Default)]
pub(crate) struct FilterSet {
    filters: Vec<Box<dyn RowFilter>>,
}

impl FilterSet {
    /// Adds a filter, replacing any existing filter with the same key while
    /// keeping that filter's position.
    pub(crate) fn add(&mut self, filter: Box<dyn RowFilter>) {
        let key = filter.key();
        match self.filters.iter_mut().find(|f| f.key() == key) {
            Some(slot) => *slot = filter,
            None => self.filters.push(filter),
        }
        wtrace!(key = %key, count = self.filters.len(), "filter added");
    }

    /// Removes the filter with the given key. Returns false when no such
    /// filter was registered.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.key() != key);
        self.filters.len() < before
    }

    pub(crate) fn clear(&mut self) -> bool {
        let had_any = !self.filters.is_empty();
        self.filters.clear();
        had_any
    }

    /// Re-evaluates every row and writes `filter_accepted`. Returns the ids
    /// of rows whose acceptance flipped, in canonical order.
    pub(crate) fn apply(&self, store: &mut RowStore) -> Vec<RowId> {
        let mut changed = Vec::new();
        for id in store.order().to_vec() {
            let accepted = {
                let row = store.row(id);
                self.filters.iter().all(|f| f.accept(row))
            };
            let row = store.row_mut(id);
            if row.filter_accepted != accepted {
                row.filter_accepted = accepted;
                changed.push(id);
            }
        }
        if !changed.is_empty() {
            wdebug!(changed = changed.len(), "filter results changed");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowDraft;
    use crate::types::CellValue;

    fn store_with(values: &[i64]) -> RowStore {
        let mut store = RowStore::default();
        store
            .insert(
                values
                    .iter()
                    .map(|&v| RowDraft::new(vec![CellValue::Int(v)]))
                    .collect(),
            )
            .unwrap();
        store
    }

    fn min_filter(key: &str, min: i64) -> Box<FnRowFilter> {
        Box::new(FnRowFilter::new(key, move |row: &Row| {
            matches!(row.cell(0), CellValue::Int(v) if *v >= min)
        }))
    }

    #[test]
    fn rows_must_pass_every_filter() {
        let mut store = store_with(&[1, 5, 9]);
        let mut filters = FilterSet::default();
        filters.add(min_filter("min", 2));
        filters.add(Box::new(FnRowFilter::new("odd", |row: &Row| {
            matches!(row.cell(0), CellValue::Int(v) if v % 2 != 0)
        })));

        let changed = filters.apply(&mut store);
        assert_eq!(changed.len(), 1);
        let order = store.order().to_vec();
        assert!(!store.row(order[0]).filter_accepted);
        assert!(store.row(order[1]).filter_accepted);
    }

    #[test]
    fn same_key_replaces_in_place() {
        let mut store = store_with(&[1, 5, 9]);
        let mut filters = FilterSet::default();
        filters.add(min_filter("min", 2));
        filters.apply(&mut store);

        filters.add(min_filter("min", 6));
        let changed = filters.apply(&mut store);
        assert_eq!(changed.len(), 1);

        // Re-adding the identical filter flips nothing.
        filters.add(min_filter("min", 6));
        assert!(filters.apply(&mut store).is_empty());
    }

    #[test]
    fn removing_the_last_filter_restores_all_rows() {
        let mut store = store_with(&[1, 5]);
        let mut filters = FilterSet::default();
        filters.add(min_filter("min", 3));
        filters.apply(&mut store);

        assert!(filters.remove("min"));
        assert!(!filters.remove("min"));
        let changed = filters.apply(&mut store);
        assert_eq!(changed.len(), 1);
        assert!(store.order().iter().all(|&id| store.row(id).filter_accepted));
    }
}
