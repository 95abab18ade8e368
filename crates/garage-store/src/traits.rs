use std::sync::Arc;

use garage_types::{Car, CarId, Owner, OwnerId};

use crate::error::StoreResult;

/// Write boundary for garage registries.
pub trait GarageWriter: Send + Sync {
    /// Index a car and its owner. `Ok(false)` means the id was already known.
    fn insert(&self, car: Car, owner: Owner) -> StoreResult<bool>;

    /// Remove a live car from every index.
    fn remove(&self, id: CarId) -> StoreResult<Arc<Car>>;
}

/// Read boundary for garage registry queries.
///
/// Lookups by unknown owner or brand return empty collections; only the
/// aggregates fail on an empty population.
pub trait GarageReader: Send + Sync {
    fn all_unique_owners(&self) -> StoreResult<Vec<Arc<Owner>>>;

    fn top_k_by_max_velocity(&self, k: usize) -> StoreResult<Vec<Arc<Car>>>;

    fn top_three_by_max_velocity(&self) -> StoreResult<Vec<Arc<Car>>>;

    fn cars_with_power_at_least(&self, threshold: u32) -> StoreResult<Vec<Arc<Car>>>;

    fn cars_of_brand(&self, brand: &str) -> StoreResult<Vec<Arc<Car>>>;

    fn cars_of_owner(&self, owner: OwnerId) -> StoreResult<Vec<Arc<Car>>>;

    fn mean_owner_age_for_brand(&self, brand: &str) -> StoreResult<u32>;

    fn mean_cars_per_owner(&self) -> StoreResult<usize>;
}
