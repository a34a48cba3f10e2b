//! Per-column aggregation and aggregate-row derivation.
//!
//! An [`Aggregation`] is a start/step/finish reducer folded over one grouped
//! run of rows. Values without a numeric interpretation contribute nothing;
//! a malformed cell never aborts the scan.

use std::sync::Arc;

use crate::column::Column;
use crate::row::AggregateRow;
use crate::store::RowStore;
use crate::types::{CellValue, GroupingStyle, RowId};

/// Running accumulator state, threaded through `step` calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AggregateState {
    #[default]
    Empty,
    Number(f64),
    Fraction {
        sum: f64,
        count: u64,
    },
    Count(u64),
}

type StartFn = Arc<dyn Fn() -> AggregateState + Send + Sync>;
type StepFn = Arc<dyn Fn(AggregateState, &CellValue) -> AggregateState + Send + Sync>;
type FinishFn = Arc<dyn Fn(AggregateState) -> CellValue + Send + Sync>;

/// A pluggable start/step/finish reducer producing one summary value per
/// grouped run of rows.
#[derive(Clone)]
pub struct Aggregation {
    start: StartFn,
    step: StepFn,
    finish: FinishFn,
}

impl Aggregation {
    pub fn new(
        start: impl Fn() -> AggregateState + Send + Sync + 'static,
        step: impl Fn(AggregateState, &CellValue) -> AggregateState + Send + Sync + 'static,
        finish: impl Fn(AggregateState) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            start: Arc::new(start),
            step: Arc::new(step),
            finish: Arc::new(finish),
        }
    }

    pub fn start(&self) -> AggregateState {
        (self.start)()
    }

    pub fn step(&self, state: AggregateState, value: &CellValue) -> AggregateState {
        (self.step)(state, value)
    }

    pub fn finish(&self, state: AggregateState) -> CellValue {
        (self.finish)(state)
    }

    pub fn sum() -> Self {
        Self::new(
            || AggregateState::Empty,
            |state, value| match value.as_number() {
                None => state,
                Some(n) => match state {
                    AggregateState::Number(acc) => AggregateState::Number(acc + n),
                    _ => AggregateState::Number(n),
                },
            },
            |state| match state {
                AggregateState::Number(acc) => CellValue::Number(acc),
                _ => CellValue::Null,
            },
        )
    }

    pub fn avg() -> Self {
        Self::new(
            || AggregateState::Fraction { sum: 0.0, count: 0 },
            |state, value| match (state, value.as_number()) {
                (AggregateState::Fraction { sum, count }, Some(n)) => AggregateState::Fraction {
                    sum: sum + n,
                    count: count + 1,
                },
                (state, _) => state,
            },
            |state| match state {
                AggregateState::Fraction { sum, count } if count > 0 => {
                    CellValue::Number(sum / count as f64)
                }
                _ => CellValue::Null,
            },
        )
    }

    pub fn min() -> Self {
        Self::extremum(|candidate, acc| candidate < acc)
    }

    pub fn max() -> Self {
        Self::extremum(|candidate, acc| candidate > acc)
    }

    /// Counts rows with a numeric value in the column.
    pub fn count() -> Self {
        Self::new(
            || AggregateState::Count(0),
            |state, value| match (state, value.as_number()) {
                (AggregateState::Count(n), Some(_)) => AggregateState::Count(n + 1),
                (state, _) => state,
            },
            |state| match state {
                AggregateState::Count(n) => CellValue::Int(n as i64),
                _ => CellValue::Null,
            },
        )
    }

    fn extremum(better: impl Fn(f64, f64) -> bool + Send + Sync + 'static) -> Self {
        Self::new(
            || AggregateState::Empty,
            move |state, value| match value.as_number() {
                None => state,
                Some(n) => match state {
                    AggregateState::Number(acc) if !better(n, acc) => AggregateState::Number(acc),
                    _ => AggregateState::Number(n),
                },
            },
            |state| match state {
                AggregateState::Number(acc) => CellValue::Number(acc),
                _ => CellValue::Null,
            },
        )
    }
}

impl core::fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Aggregation(..)")
    }
}

/// True when a group boundary lies between `row` and `next_row`.
///
/// Grouped columns are compared by their group text, so distinct values that
/// render identically fall into the same group.
pub(crate) fn is_new_group(
    store: &RowStore,
    columns: &[Column],
    grouped: &[usize],
    row: RowId,
    next_row: Option<RowId>,
) -> bool {
    let Some(next_row) = next_row else {
        return true;
    };
    grouped.iter().any(|&c| {
        let column = &columns[c];
        let a = column.group_text(store.row(row).cell(c));
        let b = column.group_text(store.row(next_row).cell(c));
        a != b
    })
}

/// Scans the visible rows once and produces one aggregate row per group
/// boundary. With `GroupingStyle::Top` the aggregate row precedes its group;
/// with `Bottom` it follows it.
pub(crate) fn build_aggregate_rows(
    store: &RowStore,
    visible: &[RowId],
    columns: &[Column],
    style: GroupingStyle,
) -> Vec<AggregateRow> {
    let grouped: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.grouped)
        .map(|(i, _)| i)
        .collect();
    if grouped.is_empty() || visible.is_empty() {
        return Vec::new();
    }

    let on_top = style == GroupingStyle::Top;
    let mut aggregate_rows = Vec::new();
    let mut states: Vec<Option<AggregateState>> = columns
        .iter()
        .map(|c| c.aggregation().map(Aggregation::start))
        .collect();

    let mut first_row: Option<RowId> = None;
    let mut last_row: Option<RowId> = None;
    for (r, &id) in visible.iter().enumerate() {
        first_row.get_or_insert(id);
        let row = store.row(id);
        for (c, column) in columns.iter().enumerate() {
            if let (Some(state), Some(agg)) = (states[c].take(), column.aggregation()) {
                states[c] = Some(agg.step(state, row.cell(c)));
            }
        }

        let next_row = visible.get(r + 1).copied();
        if !is_new_group(store, columns, &grouped, id, next_row) {
            continue;
        }

        let contents = columns
            .iter()
            .enumerate()
            .map(|(c, column)| {
                let agg = column.aggregation()?;
                Some(agg.finish(states[c].take().unwrap_or_default()))
            })
            .collect();
        aggregate_rows.push(AggregateRow {
            prev_row: if on_top { last_row } else { Some(id) },
            next_row: if on_top { first_row } else { next_row },
            contents,
            height: None,
        });

        for (c, column) in columns.iter().enumerate() {
            states[c] = column.aggregation().map(Aggregation::start);
        }
        first_row = None;
        last_row = Some(id);
    }

    wdebug!(
        groups = aggregate_rows.len(),
        rows = visible.len(),
        "aggregate rows rebuilt"
    );
    aggregate_rows
}
