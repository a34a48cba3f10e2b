//! The table engine itself: composes the row store, filter pipeline,
//! sort/group engine, aggregation, viewport window and selection guard.
//!
//! Every mutating operation runs the same pipeline: mutate the store, apply
//! filters, sort, rebuild groups and heights, reconcile the viewport, then
//! notify observers. The model is fully settled before the first event goes
//! out. Everything is single-threaded and run-to-completion; the renderer is
//! called synchronously and never waited on.

use std::collections::{HashMap, HashSet};

use crate::aggregate::{Aggregation, build_aggregate_rows};
use crate::column::Column;
use crate::error::{Result, TableError};
use crate::events::{EventEmitter, TableEvent, TableListener};
use crate::filter::{FilterSet, RowFilter};
use crate::heights::HeightIndex;
use crate::options::TableOptions;
use crate::range::Range;
use crate::renderer::{RenderContent, RowRenderer};
use crate::row::{AggregateRow, Row, RowDraft, RowUpdate};
use crate::selection::SelectionGuard;
use crate::sort;
use crate::store::RowStore;
use crate::types::{GroupingStyle, PositionHint, RowHandle, RowId, SortDirection};
use crate::window::{RenderPlan, Window};

/// Identity of a materialized piece of content. Data rows are keyed by their
/// stable id; aggregate rows by their position in the current aggregate set,
/// which only changes together with a full viewport rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum RenderKey {
    Row(RowId),
    Aggregate(usize),
}

/// What a refresh of the derived state found out.
struct RefreshOutcome {
    visible_changed: bool,
    aggregates_changed: bool,
    selection_changed: bool,
}

pub struct Table {
    columns: Vec<Column>,
    store: RowStore,
    filters: FilterSet,
    selection: SelectionGuard,
    window: Window,
    emitter: EventEmitter,
    renderer: Option<Box<dyn RowRenderer>>,

    // Derived state, rebuilt by `refresh`.
    visible_rows: Vec<RowId>,
    visible_index: HashMap<RowId, usize>,
    aggregate_rows: Vec<AggregateRow>,
    /// Visible index of the data row whose height slot an aggregate row
    /// shares: `prev_row` for bottom grouping, `next_row` for top grouping.
    agg_anchor: HashMap<usize, usize>,
    heights: HeightIndex,
    handles: HashMap<RenderKey, RowHandle>,

    row_height: u32,
    aggregate_row_height: u32,
    grouping_style: GroupingStyle,
}

impl Table {
    pub fn new(columns: Vec<Column>, options: TableOptions) -> Self {
        Self {
            columns,
            store: RowStore::default(),
            filters: FilterSet::default(),
            selection: SelectionGuard::new(options.multi_select),
            window: Window::new(options.view_range_size),
            emitter: EventEmitter::default(),
            renderer: None,
            visible_rows: Vec::new(),
            visible_index: HashMap::new(),
            aggregate_rows: Vec::new(),
            agg_anchor: HashMap::new(),
            heights: HeightIndex::default(),
            handles: HashMap::new(),
            row_height: options.row_height,
            aggregate_row_height: options.aggregate_row_height,
            grouping_style: options.grouping_style,
        }
    }

    pub fn add_listener(&mut self, listener: TableListener) {
        self.emitter.add(listener);
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn RowRenderer>) {
        self.renderer = Some(renderer);
        self.rerender_viewport();
    }

    // --- row mutations -----------------------------------------------------

    /// Inserts a batch of rows. Atomic: an unresolvable parent fails the
    /// whole batch and leaves the table untouched. When sort keys are active
    /// the new rows are sorted straight into place.
    pub fn insert_rows(&mut self, drafts: Vec<RowDraft>) -> Result<Vec<RowId>> {
        let ids = self.store.insert(drafts)?;
        self.filters.apply(&mut self.store);
        sort::sort_rows(&mut self.store, &self.columns)?;
        let outcome = self.refresh();

        let mut inserted: Vec<usize> = ids
            .iter()
            .filter_map(|id| self.visible_index.get(id).copied())
            .collect();
        inserted.sort_unstable();
        for &i in &inserted {
            self.window.adjust_for_insert(i, 1);
        }
        if outcome.aggregates_changed {
            self.window.mark_dirty();
        }
        self.render_viewport();

        self.emitter.emit(&TableEvent::RowsInserted { rows: ids.clone() });
        self.emit_selection_if(outcome.selection_changed);
        Ok(ids)
    }

    /// Deletes a batch of rows. Children must be part of the same batch;
    /// cascading is the caller's job. The rendered window is adjusted to
    /// keep pointing at the same rows but is not re-extended; the next
    /// scroll-driven reconciliation grows it back.
    pub fn delete_rows(&mut self, ids: &[RowId]) -> Result<()> {
        self.store.delete(ids)?;

        let mut doomed: Vec<usize> = ids
            .iter()
            .filter_map(|id| self.visible_index.get(id).copied())
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for &i in &doomed {
            self.window.adjust_for_delete(i);
        }
        if let Some(renderer) = self.renderer.as_deref_mut() {
            for id in ids {
                if let Some(handle) = self.handles.remove(&RenderKey::Row(*id)) {
                    renderer.unmaterialize(handle);
                }
            }
        }

        let outcome = self.refresh();
        if outcome.aggregates_changed {
            self.window.mark_dirty();
        }
        if self.window.is_dirty() {
            self.render_viewport();
        }

        self.emitter.emit(&TableEvent::RowsDeleted { rows: ids.to_vec() });
        self.emit_selection_if(outcome.selection_changed);
        Ok(())
    }

    pub fn delete_all_rows(&mut self) {
        self.store.delete_all();
        if let Some(renderer) = self.renderer.as_deref_mut() {
            for (_, handle) in self.handles.drain() {
                renderer.unmaterialize(handle);
            }
        }
        let outcome = self.refresh();
        self.window.commit(Range::empty());
        self.emitter.emit(&TableEvent::AllRowsDeleted);
        self.emit_selection_if(outcome.selection_changed);
    }

    /// Replaces cells and parentage of existing rows. Atomic like insert.
    pub fn update_rows(&mut self, updates: Vec<RowUpdate>) -> Result<()> {
        let ids = self.store.update(updates)?;
        self.filters.apply(&mut self.store);
        let order_changed = sort::sort_rows(&mut self.store, &self.columns)?;
        let outcome = self.refresh();

        let rendered = self.window.rendered();
        let touches_window = ids
            .iter()
            .any(|id| self.visible_index.get(id).is_some_and(|&i| rendered.contains(i)));
        if order_changed || outcome.visible_changed || outcome.aggregates_changed || touches_window
        {
            self.window.mark_dirty();
            self.render_viewport();
        }

        self.emitter.emit(&TableEvent::RowsUpdated { rows: ids });
        if order_changed {
            self.emitter.emit(&TableEvent::RowOrderChanged);
        }
        self.emit_selection_if(outcome.selection_changed);
        Ok(())
    }

    /// Imposes an explicit row order; must be a permutation of the current
    /// rows. Hierarchical tables keep children under their parent.
    pub fn reorder_rows(&mut self, order: Vec<RowId>) -> Result<()> {
        self.store.reorder(order)?;
        let outcome = self.refresh();
        if outcome.visible_changed || outcome.aggregates_changed {
            self.window.mark_dirty();
            self.render_viewport();
        }
        self.emitter.emit(&TableEvent::RowOrderChanged);
        self.emit_selection_if(outcome.selection_changed);
        Ok(())
    }

    /// Marks all row statuses as settled, typically after the host synced
    /// the changes away.
    pub fn settle_row_statuses(&mut self) {
        self.store.settle_statuses();
    }

    // --- filters -----------------------------------------------------------

    pub fn add_filter(&mut self, filter: Box<dyn RowFilter>) {
        self.filters.add(filter);
        self.apply_filters(TableEvent::Filter, true);
    }

    pub fn remove_filter(&mut self, key: &str) -> bool {
        if !self.filters.remove(key) {
            return false;
        }
        self.apply_filters(TableEvent::Filter, true);
        true
    }

    /// Drops every filter. Emits `FilterReset` when there was anything to
    /// drop, even if no row visibility changed.
    pub fn reset_filters(&mut self) {
        if !self.filters.clear() {
            return;
        }
        self.apply_filters(TableEvent::FilterReset, false);
    }

    fn apply_filters(&mut self, event: TableEvent, only_if_changed: bool) {
        let changed = self.filters.apply(&mut self.store);
        if changed.is_empty() && only_if_changed {
            return;
        }
        let outcome = self.refresh();
        if outcome.visible_changed || outcome.aggregates_changed {
            self.window.mark_dirty();
            self.render_viewport();
        }
        self.emitter.emit(&event);
        self.emit_selection_if(outcome.selection_changed);
    }

    // --- sorting and grouping ----------------------------------------------

    /// Sorts by a column the way a header interaction would: `multi_sort`
    /// appends the column as an additional key, `remove` drops it.
    pub fn sort(
        &mut self,
        column_id: &str,
        direction: SortDirection,
        multi_sort: bool,
        remove: bool,
    ) -> Result<()> {
        let target = self.column_index(column_id)?;
        sort::update_sort_state(&mut self.columns, target, direction, multi_sort, remove);
        self.after_order_change()
    }

    /// Groups by a column, which also makes it a sort key. Returns
    /// `Ok(false)` without changing anything when grouping is not possible
    /// (hierarchical table, tail-pinned column, or a hole in the grouped
    /// prefix).
    pub fn group(
        &mut self,
        column_id: &str,
        direction: SortDirection,
        multi_group: bool,
        remove: bool,
    ) -> Result<bool> {
        let target = self.column_index(column_id)?;
        let applied = sort::update_group_state(
            &mut self.columns,
            target,
            direction,
            multi_group,
            remove,
            self.store.hierarchical(),
        );
        if !applied {
            return Ok(false);
        }
        self.after_order_change()?;
        Ok(true)
    }

    pub fn is_grouping_possible(&self, column_id: &str) -> Result<bool> {
        let target = self.column_index(column_id)?;
        Ok(sort::is_grouping_possible(
            &self.columns,
            target,
            self.store.hierarchical(),
        ))
    }

    pub fn set_aggregation(
        &mut self,
        column_id: &str,
        aggregation: Option<Aggregation>,
    ) -> Result<()> {
        let target = self.column_index(column_id)?;
        self.columns[target].aggregation = aggregation;
        let outcome = self.refresh();
        if outcome.aggregates_changed {
            self.window.mark_dirty();
            self.render_viewport();
        }
        Ok(())
    }

    pub fn set_grouping_style(&mut self, style: GroupingStyle) {
        if self.grouping_style == style {
            return;
        }
        self.grouping_style = style;
        let outcome = self.refresh();
        if outcome.aggregates_changed {
            self.window.mark_dirty();
            self.render_viewport();
        }
    }

    fn after_order_change(&mut self) -> Result<()> {
        let order_changed = sort::sort_rows(&mut self.store, &self.columns)?;
        let outcome = self.refresh();
        if order_changed || outcome.visible_changed || outcome.aggregates_changed {
            self.window.mark_dirty();
            self.render_viewport();
        }
        if order_changed {
            self.emitter.emit(&TableEvent::RowOrderChanged);
        }
        self.emit_selection_if(outcome.selection_changed);
        Ok(())
    }

    // --- expansion ---------------------------------------------------------

    pub fn expand_rows(&mut self, ids: &[RowId]) -> Result<()> {
        self.set_expanded(ids, true)
    }

    pub fn collapse_rows(&mut self, ids: &[RowId]) -> Result<()> {
        self.set_expanded(ids, false)
    }

    pub fn expand_all(&mut self) {
        self.set_all_expanded(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all_expanded(false);
    }

    fn set_expanded(&mut self, ids: &[RowId], expanded: bool) -> Result<()> {
        for id in ids {
            self.store.try_row(*id)?;
        }
        let mut changed = Vec::new();
        for &id in ids {
            let row = self.store.row_mut(id);
            if row.expanded != expanded {
                row.expanded = expanded;
                changed.push(id);
            }
        }
        self.finish_expansion(changed, expanded);
        Ok(())
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        let mut changed = Vec::new();
        for id in self.store.order().to_vec() {
            let row = self.store.row_mut(id);
            if !row.child_rows.is_empty() && row.expanded != expanded {
                row.expanded = expanded;
                changed.push(id);
            }
        }
        self.finish_expansion(changed, expanded);
    }

    fn finish_expansion(&mut self, changed: Vec<RowId>, expanded: bool) {
        if changed.is_empty() {
            return;
        }
        let outcome = self.refresh();
        if outcome.visible_changed || outcome.aggregates_changed {
            self.window.mark_dirty();
            self.render_viewport();
        }
        self.emitter.emit(&TableEvent::RowsExpanded {
            rows: changed,
            expanded,
        });
        self.emit_selection_if(outcome.selection_changed);
    }

    // --- selection ---------------------------------------------------------

    /// Selects the given rows. Invisible rows are dropped silently; without
    /// multi-select only the first row survives. Selecting the already
    /// selected set (in any order) emits nothing.
    pub fn select_rows(&mut self, ids: &[RowId]) {
        let visible: HashSet<RowId> = self.visible_rows.iter().copied().collect();
        if self.selection.select(ids, &visible) {
            self.emit_selection_if(true);
        }
    }

    pub fn deselect_rows(&mut self, ids: &[RowId]) {
        if self.selection.deselect(ids) {
            self.emit_selection_if(true);
        }
    }

    pub fn select_all(&mut self) {
        if !self.selection.multi_select() {
            wwarn!("select_all ignored without multi-select");
            return;
        }
        let rows = self.visible_rows.clone();
        let visible: HashSet<RowId> = rows.iter().copied().collect();
        if self.selection.select(&rows, &visible) {
            self.emit_selection_if(true);
        }
    }

    pub fn selected_rows(&self) -> &[RowId] {
        self.selection.selected()
    }

    // --- viewport ----------------------------------------------------------

    pub fn set_scroll_top(&mut self, scroll_top: u64) {
        self.window.set_scroll_top(scroll_top);
        self.render_viewport();
    }

    pub fn scroll_top(&self) -> u64 {
        self.window.scroll_top()
    }

    pub fn set_view_range_size(&mut self, size: usize) {
        self.window.set_view_range_size(size);
        if self.window.is_dirty() {
            self.render_viewport();
        }
    }

    /// Scrolls so the row sits at the top of the viewport, then reconciles.
    pub fn scroll_to_row(&mut self, id: RowId) -> Result<()> {
        self.store.try_row(id)?;
        let Some(&index) = self.visible_index.get(&id) else {
            wwarn!(row = %id, "scroll target is not visible");
            return Ok(());
        };
        self.window.set_scroll_top(self.heights.prefix_sum(index));
        self.render_viewport();
        Ok(())
    }

    /// Materializes the row if it is visible but outside the rendered
    /// window, without touching the scroll position.
    pub fn ensure_row_rendered(&mut self, id: RowId) -> Result<()> {
        self.store.try_row(id)?;
        let Some(&index) = self.visible_index.get(&id) else {
            wwarn!(row = %id, "row to render is not visible");
            return Ok(());
        };
        if self.window.rendered().contains(index) && !self.window.is_dirty() {
            return Ok(());
        }
        let ideal = self.window.ideal_range_for_row(index, self.visible_rows.len());
        self.reconcile(ideal);
        Ok(())
    }

    /// Throws the materialized content away and rebuilds the ideal window,
    /// e.g. after the host invalidated its whole representation.
    pub fn rerender_viewport(&mut self) {
        self.window.mark_dirty();
        self.render_viewport();
    }

    pub fn rendered_range(&self) -> Range {
        self.window.rendered()
    }

    /// Summed height of the visible rows above the rendered window.
    pub fn filler_before(&self) -> u64 {
        self.heights.prefix_sum(self.window.rendered().from)
    }

    /// Summed height of the visible rows below the rendered window.
    pub fn filler_after(&self) -> u64 {
        self.heights.total() - self.heights.prefix_sum(self.window.rendered().to)
    }

    /// Total scrollable extent over all visible rows and aggregate rows.
    pub fn total_height(&self) -> u64 {
        self.heights.total()
    }

    // --- accessors ---------------------------------------------------------

    pub fn row_count(&self) -> usize {
        self.store.len()
    }

    pub fn visible_row_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn visible_rows(&self) -> &[RowId] {
        &self.visible_rows
    }

    pub fn row(&self, id: RowId) -> Result<&Row> {
        self.store.try_row(id)
    }

    /// Pre-order visitor over every row, visible or not.
    pub fn visit_rows(&self, f: impl FnMut(&Row)) {
        self.store.visit_rows(f);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn aggregate_rows(&self) -> &[AggregateRow] {
        &self.aggregate_rows
    }

    /// Visible indexes after which a group ends; empty without grouping.
    pub fn group_boundaries(&self) -> Vec<usize> {
        sort::group_boundaries(&self.store, &self.visible_rows, &self.columns)
    }

    // --- internals ---------------------------------------------------------

    fn column_index(&self, id: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| TableError::ColumnNotFound(id.to_string()))
    }

    fn emit_selection_if(&self, changed: bool) {
        if changed {
            self.emitter.emit(&TableEvent::RowsSelected {
                rows: self.selection.selected().to_vec(),
            });
        }
    }

    /// Rebuilds all derived state from the store: visible sequence,
    /// aggregate rows, the height index and the selection invariant.
    fn refresh(&mut self) -> RefreshOutcome {
        let old_visible = std::mem::take(&mut self.visible_rows);
        self.visible_rows = self.store.compute_visible_rows();
        self.visible_index = self
            .visible_rows
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        let old_aggregates = std::mem::take(&mut self.aggregate_rows);
        self.aggregate_rows = build_aggregate_rows(
            &self.store,
            &self.visible_rows,
            &self.columns,
            self.grouping_style,
        );
        let aggregates_changed = !same_aggregates(&old_aggregates, &self.aggregate_rows);
        if !aggregates_changed {
            // Measured heights are renderer state; they survive a rebuild
            // that produced the same boundaries and contents.
            for (fresh, old) in self.aggregate_rows.iter_mut().zip(&old_aggregates) {
                fresh.height = old.height;
            }
        }
        self.agg_anchor.clear();
        for (a, aggregate) in self.aggregate_rows.iter().enumerate() {
            let anchor = match self.grouping_style {
                GroupingStyle::Bottom => aggregate.prev_row,
                GroupingStyle::Top => aggregate.next_row,
            };
            if let Some(id) = anchor {
                self.agg_anchor.insert(self.visible_index[&id], a);
            }
        }
        self.rebuild_heights();

        let visible_set: HashSet<RowId> = self.visible_rows.iter().copied().collect();
        let selection_changed = self.selection.retain_visible(&visible_set);
        RefreshOutcome {
            visible_changed: old_visible != self.visible_rows,
            aggregates_changed,
            selection_changed,
        }
    }

    fn slot_height(&self, index: usize) -> u64 {
        let row = self.store.row(self.visible_rows[index]);
        let mut height = row.height.unwrap_or(self.row_height) as u64;
        if let Some(&a) = self.agg_anchor.get(&index) {
            height += self.aggregate_rows[a]
                .height
                .unwrap_or(self.aggregate_row_height) as u64;
        }
        height
    }

    fn rebuild_heights(&mut self) {
        let heights: Vec<u64> = (0..self.visible_rows.len())
            .map(|i| self.slot_height(i))
            .collect();
        self.heights = HeightIndex::from_heights(heights);
    }

    /// Ideal window for the current scroll position.
    fn scroll_ideal(&self) -> Range {
        if self.visible_rows.is_empty() {
            return Range::empty();
        }
        let first = self.heights.index_at_offset(self.window.scroll_top());
        self.window.ideal_range_for_row(first, self.visible_rows.len())
    }

    fn render_viewport(&mut self) {
        let ideal = self.scroll_ideal();
        self.reconcile(ideal);
    }

    /// Drives the window towards `ideal`. Nested requests (from anything a
    /// plan execution triggers) are deferred and collapsed into one
    /// follow-up pass against the then-current scroll position.
    fn reconcile(&mut self, ideal: Range) {
        if !self.window.begin_render_pass() {
            return;
        }
        let mut target = ideal;
        loop {
            if let Some(plan) = self.window.plan(target) {
                self.execute_plan(&plan);
                self.window.commit(plan.target);
                self.assert_edges_materialized();
            }
            if !self.window.end_render_pass() {
                break;
            }
            self.window.begin_render_pass();
            target = self.scroll_ideal();
        }
    }

    fn execute_plan(&mut self, plan: &RenderPlan) {
        let Some(renderer) = self.renderer.as_deref_mut() else {
            return;
        };

        if plan.full {
            for (_, handle) in self.handles.drain() {
                renderer.unmaterialize(handle);
            }
        } else {
            for range in &plan.remove {
                for i in range.from..range.to {
                    let id = self.visible_rows[i];
                    if let Some(handle) = self.handles.remove(&RenderKey::Row(id)) {
                        renderer.unmaterialize(handle);
                    }
                    if let Some(&a) = self.agg_anchor.get(&i) {
                        if let Some(handle) = self.handles.remove(&RenderKey::Aggregate(a)) {
                            renderer.unmaterialize(handle);
                        }
                    }
                }
            }
        }

        for &(range, hint) in &plan.render {
            let indexes: Vec<usize> = if hint == PositionHint::Prepend {
                (range.from..range.to).rev().collect()
            } else {
                (range.from..range.to).collect()
            };
            for i in indexes {
                let anchored = self.agg_anchor.get(&i).copied();
                // Within one slot the aggregate row sits before the data row
                // for top grouping and after it for bottom grouping; when
                // prepending, materialization order flips.
                let aggregate_first = matches!(
                    (self.grouping_style, hint),
                    (GroupingStyle::Top, PositionHint::Append)
                        | (GroupingStyle::Bottom, PositionHint::Prepend)
                );

                if aggregate_first {
                    if let Some(a) = anchored {
                        materialize_aggregate(
                            renderer,
                            &mut self.handles,
                            &mut self.aggregate_rows,
                            a,
                            i,
                            hint,
                        );
                    }
                }
                let id = self.visible_rows[i];
                if !self.handles.contains_key(&RenderKey::Row(id)) {
                    let content = RenderContent::Row {
                        row: self.store.row(id),
                        visible_index: i,
                    };
                    let handle = renderer.materialize(content, hint);
                    self.handles.insert(RenderKey::Row(id), handle);
                    if let Some(h) = renderer.measure_height(handle) {
                        self.store.row_mut(id).height = Some(h);
                    }
                }
                if !aggregate_first {
                    if let Some(a) = anchored {
                        materialize_aggregate(
                            renderer,
                            &mut self.handles,
                            &mut self.aggregate_rows,
                            a,
                            i,
                            hint,
                        );
                    }
                }

                let height = {
                    let row = self.store.row(self.visible_rows[i]);
                    let mut h = row.height.unwrap_or(self.row_height) as u64;
                    if let Some(a) = anchored {
                        h += self.aggregate_rows[a]
                            .height
                            .unwrap_or(self.aggregate_row_height) as u64;
                    }
                    h
                };
                self.heights.set(i, height);
            }
        }
    }

    fn assert_edges_materialized(&self) {
        if self.renderer.is_none() {
            return;
        }
        let rendered = self.window.rendered();
        if rendered.is_empty() {
            return;
        }
        debug_assert!(
            self.handles
                .contains_key(&RenderKey::Row(self.visible_rows[rendered.from])),
            "first row of {rendered} is not materialized"
        );
        debug_assert!(
            self.handles
                .contains_key(&RenderKey::Row(self.visible_rows[rendered.to - 1])),
            "last row of {rendered} is not materialized"
        );
    }
}

/// Aggregate identity for change detection: the anchors and the finished
/// contents. The cached measurement is not part of the identity.
fn same_aggregates(a: &[AggregateRow], b: &[AggregateRow]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.prev_row == y.prev_row && x.next_row == y.next_row && x.contents == y.contents
        })
}

fn materialize_aggregate(
    renderer: &mut dyn RowRenderer,
    handles: &mut HashMap<RenderKey, RowHandle>,
    aggregate_rows: &mut [AggregateRow],
    index: usize,
    visible_index: usize,
    hint: PositionHint,
) {
    let key = RenderKey::Aggregate(index);
    if handles.contains_key(&key) {
        return;
    }
    let content = RenderContent::Aggregate {
        aggregate: &aggregate_rows[index],
        visible_index,
    };
    let handle = renderer.materialize(content, hint);
    handles.insert(key, handle);
    if let Some(h) = renderer.measure_height(handle) {
        aggregate_rows[index].height = Some(h);
    }
}
