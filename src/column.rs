use std::sync::Arc;

use core::cmp::Ordering;

use crate::aggregate::Aggregation;
use crate::types::{CellValue, SortDirection};

/// Comparator over two cell values of the same column.
pub type CellComparator = Arc<dyn Fn(&CellValue, &CellValue) -> Ordering + Send + Sync>;

/// Renders a cell value as display text.
pub type CellTextFn = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

/// A column definition: identity, pluggable comparison/text strategies and
/// the sort/group state the engine maintains on it.
///
/// Strategy closures live in `Arc`s, so a column is cheap to clone.
#[derive(Clone)]
pub struct Column {
    pub id: String,
    pub(crate) comparator: CellComparator,
    pub(crate) text: CellTextFn,
    /// Optional dedicated grouping representation. When absent, grouping
    /// falls back to the display text.
    pub(crate) grouping_text: Option<CellTextFn>,
    pub(crate) aggregation: Option<Aggregation>,

    pub sort_active: bool,
    pub sort_ascending: bool,
    /// Position among the active sort columns; -1 when not sorted.
    pub sort_index: i32,
    pub grouped: bool,
    /// Permanently pinned at the head/tail of the sort-key sequence. Pinned
    /// columns keep their position regardless of user sorting.
    pub pinned_head: bool,
    pub pinned_tail: bool,
}

impl Column {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comparator: Arc::new(|a, b| a.natural_cmp(b)),
            text: Arc::new(CellValue::default_text),
            grouping_text: None,
            aggregation: None,
            sort_active: false,
            sort_ascending: true,
            sort_index: -1,
            grouped: false,
            pinned_head: false,
            pinned_tail: false,
        }
    }

    pub fn with_comparator(
        mut self,
        comparator: impl Fn(&CellValue, &CellValue) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Arc::new(comparator);
        self
    }

    pub fn with_text(mut self, text: impl Fn(&CellValue) -> String + Send + Sync + 'static) -> Self {
        self.text = Arc::new(text);
        self
    }

    /// Sets the representation used for group-boundary detection.
    ///
    /// Grouping compares rows by text, not by raw value: two values that
    /// render identically land in the same group even when they differ
    /// underneath.
    pub fn with_grouping_text(
        mut self,
        grouping_text: impl Fn(&CellValue) -> String + Send + Sync + 'static,
    ) -> Self {
        self.grouping_text = Some(Arc::new(grouping_text));
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Pre-sets this column as an initial sort column.
    pub fn with_sort(mut self, sort_index: i32, direction: SortDirection) -> Self {
        self.sort_active = true;
        self.sort_index = sort_index;
        self.sort_ascending = direction.is_ascending();
        self
    }

    pub fn with_pinned_head(mut self) -> Self {
        self.pinned_head = true;
        self
    }

    pub fn with_pinned_tail(mut self) -> Self {
        self.pinned_tail = true;
        self
    }

    pub fn compare(&self, a: &CellValue, b: &CellValue) -> Ordering {
        (self.comparator)(a, b)
    }

    pub fn cell_text(&self, value: &CellValue) -> String {
        (self.text)(value)
    }

    /// Text used for group-boundary comparison.
    pub fn group_text(&self, value: &CellValue) -> String {
        match &self.grouping_text {
            Some(f) => f(value),
            None => self.cell_text(value),
        }
    }

    pub fn aggregation(&self) -> Option<&Aggregation> {
        self.aggregation.as_ref()
    }

    pub(crate) fn clear_sort(&mut self) {
        self.sort_active = false;
        self.grouped = false;
        self.sort_index = -1;
    }
}

impl core::fmt::Debug for Column {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("sort_active", &self.sort_active)
            .field("sort_ascending", &self.sort_ascending)
            .field("sort_index", &self.sort_index)
            .field("grouped", &self.grouped)
            .field("pinned_head", &self.pinned_head)
            .field("pinned_tail", &self.pinned_tail)
            .finish_non_exhaustive()
    }
}
