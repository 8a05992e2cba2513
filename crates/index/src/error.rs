use thiserror::Error;

/// Errors from the fragment store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Refusing to rebuild index with zero fragments")]
    EmptyRebuild,
}
