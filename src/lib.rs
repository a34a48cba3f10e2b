//! Headless windowed table engine.
//!
//! `windrow` is the model side of a virtualized table widget: it owns the
//! rows (flat or hierarchical), runs the filter pipeline, the multi-column
//! sort/group engine with aggregate rows, and decides which slice of the
//! visible rows should be materialized for the current scroll position. The
//! actual representation lives behind the [`RowRenderer`] trait; the engine
//! itself never touches a screen.
//!
//! ```
//! use windrow::{CellValue, Column, RowDraft, Table, TableOptions};
//!
//! let mut table = Table::new(
//!     vec![Column::new("name"), Column::new("amount")],
//!     TableOptions::new().with_view_range_size(8),
//! );
//! table.insert_rows(vec![
//!     RowDraft::new(vec![CellValue::Text("a".into()), CellValue::Int(3)]),
//!     RowDraft::new(vec![CellValue::Text("b".into()), CellValue::Int(7)]),
//! ]).unwrap();
//! assert_eq!(table.visible_row_count(), 2);
//! ```
//!
//! Everything is single-threaded and run-to-completion: one operation fully
//! settles the model (store, filters, order, groups, viewport) before its
//! events are emitted.

#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod aggregate;
mod column;
mod error;
mod events;
mod filter;
mod heights;
mod options;
mod range;
mod renderer;
mod row;
mod selection;
mod sort;
mod store;
mod table;
mod types;
mod window;


pub use aggregate::{AggregateState, Aggregation};
pub use column::{CellComparator, CellTextFn, Column};
pub use error::{Result, TableError};
pub use events::{TableEvent, TableListener};
pub use filter::{FnRowFilter, RowFilter};
pub use options::TableOptions;
pub use range::Range;
pub use renderer::{RenderContent, RowRenderer};
pub use row::{AggregateRow, Row, RowDraft, RowUpdate};
pub use table::Table;
pub use types::{
    CellValue, GroupingStyle, PositionHint, RowHandle, RowId, RowStatus, SortDirection,
};
