//! Viewport windowing: decides which slice of the visible rows is
//! materialized and how to get from the current slice to the desired one.
//!
//! The window tracks the rendered range, the scroll offset and the desired
//! window size. Reconciliation is expressed as a [`RenderPlan`]: ranges to
//! unmaterialize first, then ranges to materialize with a position hint.
//! The composition root executes the plan against the renderer and commits.
//!
//! Ranges index the visible data rows only; aggregate rows ride along with
//! the row they are attached to and share its height slot.

use core::cell::Cell;

use crate::range::Range;
use crate::types::PositionHint;

#[derive(Debug)]
pub(crate) struct Window {
    rendered: Range,
    view_range_size: usize,
    scroll_top: u64,
    /// Rendered content is stale even though the range may be unchanged.
    dirty: bool,
    render_depth: Cell<usize>,
    render_pending: Cell<bool>,
}

/// Instructions to reconcile the rendered range. `remove` is processed
/// before `render`; a jump to a disjoint range only works because removal
/// empties the rendered block first.
#[derive(Debug)]
pub(crate) struct RenderPlan {
    pub remove: Vec<Range>,
    pub render: Vec<(Range, PositionHint)>,
    pub target: Range,
    /// Stale-content rebuild: drop every materialized handle, not just the
    /// listed ranges.
    pub full: bool,
}

impl Window {
    pub(crate) fn new(view_range_size: usize) -> Self {
        Self {
            rendered: Range::empty(),
            view_range_size,
            scroll_top: 0,
            dirty: false,
            render_depth: Cell::new(0),
            render_pending: Cell::new(false),
        }
    }

    pub(crate) fn rendered(&self) -> Range {
        self.rendered
    }

    pub(crate) fn set_view_range_size(&mut self, size: usize) {
        if self.view_range_size != size {
            self.view_range_size = size;
            self.dirty = true;
        }
    }

    pub(crate) fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    pub(crate) fn set_scroll_top(&mut self, scroll_top: u64) {
        self.scroll_top = scroll_top;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Ideal window around a row index: a quarter of the window sits above
    /// the row, and when the end clamps at `visible_count` the window grows
    /// back upward to keep its full size.
    pub(crate) fn ideal_range_for_row(&self, row_index: usize, visible_count: usize) -> Range {
        let quarter = self.view_range_size / 4;
        let from = row_index.saturating_sub(quarter);
        let to = (from + self.view_range_size).min(visible_count);
        let shortfall = self.view_range_size - (to - from);
        Range::new(from.saturating_sub(shortfall), to)
    }

    /// Computes the reconciliation towards `ideal`, or `None` when the
    /// rendered range already matches and nothing is stale. Does not commit.
    pub(crate) fn plan(&self, ideal: Range) -> Option<RenderPlan> {
        if ideal == self.rendered && !self.dirty {
            return None;
        }
        if self.dirty {
            // Stale content: throw the whole block away and rebuild.
            let mut remove = Vec::new();
            if !self.rendered.is_empty() {
                remove.push(self.rendered);
            }
            let mut render = Vec::new();
            if !ideal.is_empty() {
                render.push((ideal, PositionHint::Append));
            }
            return Some(RenderPlan {
                remove,
                render,
                target: ideal,
                full: true,
            });
        }

        let remove = self.rendered.subtract(&ideal);
        let keep = self.rendered.intersect(&ideal);
        let render: Vec<(Range, PositionHint)> = ideal
            .subtract(&self.rendered)
            .into_iter()
            .map(|part| {
                let hint = if !keep.is_empty() && part.to <= keep.from {
                    PositionHint::Prepend
                } else {
                    PositionHint::Append
                };
                (part, hint)
            })
            .collect();
        debug_assert!(
            keep.is_empty() || render.iter().all(|(p, _)| p.touches(&keep)),
            "render part detached from the kept range"
        );
        Some(RenderPlan {
            remove,
            render,
            target: ideal,
            full: false,
        })
    }

    pub(crate) fn commit(&mut self, target: Range) {
        self.rendered = target;
        self.dirty = false;
    }

    /// Keeps the rendered range pointing at the same rows after `count` rows
    /// appeared at `visible_index`. An insert inside the window invalidates
    /// the block instead.
    pub(crate) fn adjust_for_insert(&mut self, visible_index: usize, count: usize) {
        if self.rendered.is_empty() {
            return;
        }
        if visible_index < self.rendered.from {
            self.rendered = self.rendered.shifted(count as isize);
        } else if visible_index < self.rendered.to {
            self.dirty = true;
        }
    }

    /// Counterpart of `adjust_for_insert`: a delete above the window shifts
    /// it up, a delete inside shrinks it at the end.
    pub(crate) fn adjust_for_delete(&mut self, visible_index: usize) {
        if self.rendered.is_empty() {
            return;
        }
        if visible_index < self.rendered.from {
            self.rendered = self.rendered.shifted(-1);
        } else if visible_index < self.rendered.to {
            self.rendered = Range::new(self.rendered.from, self.rendered.to - 1);
        }
    }

    /// Re-entrancy gate around plan execution. Returns false when a pass is
    /// already running; the request is remembered and collapsed into one
    /// follow-up pass.
    pub(crate) fn begin_render_pass(&self) -> bool {
        if self.render_depth.get() > 0 {
            self.render_pending.set(true);
            return false;
        }
        self.render_depth.set(1);
        true
    }

    /// Ends a pass and reports whether a deferred request arrived meanwhile.
    pub(crate) fn end_render_pass(&self) -> bool {
        self.render_depth.set(0);
        self.render_pending.replace(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_of_the_window_sits_above_the_target_row() {
        let window = Window::new(4);
        assert_eq!(window.ideal_range_for_row(5, 10), Range::new(4, 8));
        assert_eq!(window.ideal_range_for_row(0, 10), Range::new(0, 4));
    }

    #[test]
    fn clamped_window_grows_back_upward() {
        let window = Window::new(4);
        assert_eq!(window.ideal_range_for_row(9, 10), Range::new(6, 10));
        // Fewer rows than the window size: everything is in range.
        assert_eq!(window.ideal_range_for_row(1, 3), Range::new(0, 3));
    }

    #[test]
    fn matching_range_produces_no_plan() {
        let mut window = Window::new(4);
        window.commit(Range::new(4, 8));
        assert!(window.plan(Range::new(4, 8)).is_none());
    }

    #[test]
    fn overlapping_move_removes_then_extends() {
        let mut window = Window::new(4);
        window.commit(Range::new(4, 8));
        let plan = window.plan(Range::new(6, 10)).unwrap();
        assert_eq!(plan.remove, vec![Range::new(4, 6)]);
        assert_eq!(plan.render, vec![(Range::new(8, 10), PositionHint::Append)]);

        let plan = window.plan(Range::new(2, 6)).unwrap();
        assert_eq!(plan.remove, vec![Range::new(6, 8)]);
        assert_eq!(plan.render, vec![(Range::new(2, 4), PositionHint::Prepend)]);
    }

    #[test]
    fn disjoint_jump_empties_before_rendering() {
        let mut window = Window::new(4);
        window.commit(Range::new(0, 4));
        let plan = window.plan(Range::new(20, 24)).unwrap();
        assert_eq!(plan.remove, vec![Range::new(0, 4)]);
        assert_eq!(plan.render, vec![(Range::new(20, 24), PositionHint::Append)]);
    }

    #[test]
    fn dirty_window_rebuilds_in_place() {
        let mut window = Window::new(4);
        window.commit(Range::new(4, 8));
        window.mark_dirty();
        assert!(window.is_dirty());
        let plan = window.plan(Range::new(4, 8)).unwrap();
        assert!(plan.full);
        assert_eq!(plan.remove, vec![Range::new(4, 8)]);
        assert_eq!(plan.render, vec![(Range::new(4, 8), PositionHint::Append)]);
    }

    #[test]
    fn structural_adjustments_track_rows() {
        let mut window = Window::new(5);
        window.commit(Range::new(4, 9));
        window.adjust_for_insert(0, 2);
        assert_eq!(window.rendered(), Range::new(6, 11));
        window.adjust_for_delete(2);
        assert_eq!(window.rendered(), Range::new(5, 10));
        window.adjust_for_delete(7);
        assert_eq!(window.rendered(), Range::new(5, 9));
        // Deletes past the window leave it alone.
        window.adjust_for_delete(30);
        assert_eq!(window.rendered(), Range::new(5, 9));
    }

    #[test]
    fn nested_render_requests_collapse_into_one() {
        let window = Window::new(4);
        assert!(window.begin_render_pass());
        assert!(!window.begin_render_pass());
        assert!(!window.begin_render_pass());
        assert!(window.end_render_pass());
        assert!(!window.end_render_pass());
    }
}
