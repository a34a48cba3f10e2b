use crate::types::{CellValue, RowId, RowStatus};

/// A materialized table row. Rows are owned by the row store; parent/child
/// links are ids, never owning references, and `child_rows` is derived state
/// that is rebuilt from scratch on every structural change.
#[derive(Clone, Debug)]
pub struct Row {
    pub id: RowId,
    pub cells: Vec<CellValue>,
    /// Weak back-reference to the parent row, by id.
    pub parent: Option<RowId>,
    /// Derived. Rebuilt by `RowStore::rebuild_hierarchy`.
    pub child_rows: Vec<RowId>,
    /// Derived. 0 for root rows.
    pub hierarchy_level: usize,
    pub expanded: bool,
    /// Written by the filter pipeline.
    pub filter_accepted: bool,
    /// Derived: true iff the row has at least one visible child.
    pub expandable: bool,
    /// Measured extent, reported by the renderer after materialization.
    pub height: Option<u32>,
    pub status: RowStatus,
}

impl Row {
    pub(crate) fn new(id: RowId, cells: Vec<CellValue>, parent: Option<RowId>) -> Self {
        Self {
            id,
            cells,
            parent,
            child_rows: Vec::new(),
            hierarchy_level: 0,
            expanded: false,
            filter_accepted: true,
            expandable: false,
            height: None,
            status: RowStatus::Inserted,
        }
    }

    pub fn cell(&self, column_index: usize) -> &CellValue {
        self.cells.get(column_index).unwrap_or(&CellValue::Null)
    }
}

/// Input for `Table::insert_rows`. Identity is assigned by the store.
#[derive(Clone, Debug, Default)]
pub struct RowDraft {
    pub cells: Vec<CellValue>,
    pub parent: Option<RowId>,
    pub expanded: bool,
}

impl RowDraft {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self {
            cells,
            parent: None,
            expanded: false,
        }
    }

    pub fn with_parent(mut self, parent: RowId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

/// Input for `Table::update_rows`. Replaces cells and parent of the row with
/// the given id; `parent: None` makes the row a root row.
#[derive(Clone, Debug)]
pub struct RowUpdate {
    pub id: RowId,
    pub cells: Vec<CellValue>,
    pub parent: Option<RowId>,
}

/// A synthetic summary row sitting at a group boundary. Not owned by the row
/// store; the set is discarded and rebuilt on every structural, sort, or
/// filter change.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRow {
    /// The real row rendered directly before this aggregate row, if any.
    pub prev_row: Option<RowId>,
    /// The real row rendered directly after this aggregate row, if any.
    pub next_row: Option<RowId>,
    /// One finished aggregate per visible column; `None` for columns without
    /// an aggregation.
    pub contents: Vec<Option<CellValue>>,
    /// Measured extent, reported by the renderer after materialization.
    pub height: Option<u32>,
}
