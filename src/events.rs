//! Observer notifications emitted after the model has settled.

use std::sync::Arc;

use crate::types::RowId;

/// Model change notifications. Emitted once per operation, after store,
/// filter, sort and window state are consistent again.
#[derive(Clone, Debug, PartialEq)]
pub enum TableEvent {
    RowsInserted { rows: Vec<RowId> },
    RowsDeleted { rows: Vec<RowId> },
    AllRowsDeleted,
    RowsUpdated { rows: Vec<RowId> },
    /// Filter results changed for at least one row.
    Filter,
    FilterReset,
    RowOrderChanged,
    RowsSelected { rows: Vec<RowId> },
    RowsExpanded { rows: Vec<RowId>, expanded: bool },
}

pub type TableListener = Arc<dyn Fn(&TableEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct EventEmitter {
    listeners: Vec<TableListener>,
}

impl EventEmitter {
    pub(crate) fn add(&mut self, listener: TableListener) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&self, event: &TableEvent) {
        wtrace!(?event, "emit");
        for listener in &self.listeners {
            listener(event);
        }
    }
}
