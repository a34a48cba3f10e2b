use crate::types::RowId;

/// Errors raised for caller misuse. Data-level problems (unparseable cell
/// values, aggregation over incompatible types) are never errors; they are
/// recovered locally by skipping the offending value.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A row declares a parent id that is not present in the store.
    #[error("parent row of {0} can not be resolved")]
    UnresolvableParent(RowId),

    /// `reorder` was called with something that is not a permutation of the
    /// current row identities.
    #[error("row order may not be updated because it is not a permutation of the current rows")]
    OrderMismatch,

    /// An operation referenced a row id that is not in the store.
    #[error("{0} not found")]
    RowNotFound(RowId),

    /// A row was deleted while other rows still reference it as their parent.
    /// Cascading deletion is the caller's responsibility.
    #[error("{0} still has child rows; delete the children first")]
    RowHasChildren(RowId),

    /// An operation referenced an unknown column id.
    #[error("column {0:?} not found")]
    ColumnNotFound(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, TableError>;
