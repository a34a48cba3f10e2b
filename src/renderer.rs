//! The narrow boundary towards the host rendering layer.
//!
//! The engine decides *which* rows exist on screen; the renderer owns the
//! actual representation. Materialization is fire-and-forget: the engine
//! never waits for the renderer, it only caches reported measurements.

use crate::row::{AggregateRow, Row};
use crate::types::{PositionHint, RowHandle};

/// What the renderer is asked to materialize: a data row or a synthetic
/// aggregate row, together with its position in the visible sequence.
#[derive(Debug)]
pub enum RenderContent<'a> {
    Row {
        row: &'a Row,
        visible_index: usize,
    },
    Aggregate {
        aggregate: &'a AggregateRow,
        visible_index: usize,
    },
}

pub trait RowRenderer {
    /// Creates the external representation and returns a handle for it. The
    /// hint says on which side of the already materialized block the content
    /// belongs.
    fn materialize(&mut self, content: RenderContent<'_>, hint: PositionHint) -> RowHandle;

    /// Destroys the representation behind the handle. May be called for
    /// content the renderer is still animating; the newest structural intent
    /// per row wins.
    fn unmaterialize(&mut self, handle: RowHandle);

    /// Reports the measured height, or `None` while no measurement is
    /// available yet. Results are cached onto the row by the engine.
    fn measure_height(&mut self, handle: RowHandle) -> Option<u32>;
}
