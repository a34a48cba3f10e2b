//! Construction-time configuration for a [`Table`](crate::Table).

use crate::types::GroupingStyle;

/// Tuning knobs for a table. Cheap to clone; pass it to `Table::new`.
///
/// `view_range_size` should be roughly twice the number of rows that fit the
/// physical viewport, so a quarter of the window buffers above and below.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableOptions {
    pub(crate) view_range_size: usize,
    /// Height assumed for a row until the renderer reports a measurement.
    pub(crate) row_height: u32,
    pub(crate) aggregate_row_height: u32,
    pub(crate) multi_select: bool,
    pub(crate) grouping_style: GroupingStyle,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            view_range_size: 20,
            row_height: 30,
            aggregate_row_height: 30,
            multi_select: true,
            grouping_style: GroupingStyle::Bottom,
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view_range_size(mut self, size: usize) -> Self {
        self.view_range_size = size;
        self
    }

    pub fn with_row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    pub fn with_aggregate_row_height(mut self, height: u32) -> Self {
        self.aggregate_row_height = height;
        self
    }

    pub fn with_multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }

    pub fn with_grouping_style(mut self, style: GroupingStyle) -> Self {
        self.grouping_style = style;
        self
    }
}
