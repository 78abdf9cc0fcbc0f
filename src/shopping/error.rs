use thiserror::Error;

/// Failures of a shopping-list regeneration run, by phase.
#[derive(Error, Debug)]
pub enum ShoppingError {
    /// Blank names are filtered when recipes are written; reaching here is a caller bug.
    #[error("ingredient #{index} has a blank name")]
    InvalidIngredientName { index: usize },

    #[error("failed to read {what}; shopping list left unchanged")]
    StorageRead {
        what: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to delete stale auto items; nothing was inserted")]
    StorageDelete(#[source] sqlx::Error),

    /// Stale auto items are already gone at this point. Re-running is safe.
    #[error("stale auto items were removed but inserting {count} new items failed; re-run generate")]
    StorageInsert {
        count: usize,
        #[source]
        source: sqlx::Error,
    },
}

impl ShoppingError {
    /// Whether the group may now be missing its auto items until a retry.
    pub fn left_partial_state(&self) -> bool {
        matches!(self, ShoppingError::StorageDelete(_) | ShoppingError::StorageInsert { .. })
    }
}
