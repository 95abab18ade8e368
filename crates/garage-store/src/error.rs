use garage_types::CarId;

/// Errors from car store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No live car with this identifier.
    #[error("car not found: {0}")]
    NotFound(CarId),

    /// The brand has never been indexed, or its group was evicted.
    #[error("brand not found: {0:?}")]
    BrandNotFound(String),

    /// A mean was requested over an empty population.
    #[error("nothing to aggregate: {0}")]
    EmptyAggregate(&'static str),

    /// The insert was rejected before any index was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration text could not be parsed.
    #[error("invalid store config: {0}")]
    InvalidConfig(String),

    /// A writer panicked while holding the shared store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
