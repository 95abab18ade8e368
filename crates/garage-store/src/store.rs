//! The indexed in-memory car store.
//!
//! [`IndexedCarStore`] owns one primary table and four derived indexes:
//! cars grouped by owner, cars grouped by brand, and two ordered indexes by
//! max velocity and by power. `insert` and `remove` update all of them before
//! returning, and validate before the first mutation, so every query sees the
//! indexes agree.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use garage_types::{Car, CarId, Owner, OwnerId};
use tracing::{debug, warn};

use crate::config::{DeletePolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::index::{GroupIndex, RankIndex, RankKey};

/// Primary table entry.
#[derive(Debug)]
enum Slot {
    Live(Arc<Car>),
    /// Left behind by a soft delete. Blocks reinsertion of the id.
    Dead(Arc<Car>),
}

impl Slot {
    fn live(&self) -> Option<&Arc<Car>> {
        match self {
            Slot::Live(car) => Some(car),
            Slot::Dead(_) => None,
        }
    }
}

/// Point-in-time counts of the store contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub live_cars: usize,
    pub tombstones: usize,
    /// Owner keys in the owner index, including retained empty groups.
    pub owners: usize,
    /// Brand keys in the brand index, including retained empty groups.
    pub brands: usize,
}

/// In-memory car registry with owner/brand groups and ordered indexes.
///
/// Not synchronized: mutation takes `&mut self`. Wrap it in a
/// [`SharedCarStore`](crate::SharedCarStore) for access from several threads.
pub struct IndexedCarStore {
    config: StoreConfig,
    cars: HashMap<CarId, Slot>,
    owners: HashMap<OwnerId, Arc<Owner>>,
    by_owner: GroupIndex<OwnerId>,
    by_brand: GroupIndex<String>,
    by_velocity: RankIndex,
    by_power: RankIndex,
}

impl IndexedCarStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            cars: HashMap::new(),
            owners: HashMap::new(),
            by_owner: GroupIndex::new(),
            by_brand: GroupIndex::new(),
            by_velocity: RankIndex::new(),
            by_power: RankIndex::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Register `car`, driven by `owner`, in every index.
    ///
    /// Returns `Ok(false)` without touching anything when the id is already
    /// known (live, or tombstoned under [`DeletePolicy::Soft`]). The first
    /// `Owner` value seen for an id is the one kept.
    ///
    /// Fails with [`StoreError::InvalidArgument`] if the car names a
    /// different owner than the one supplied.
    pub fn insert(&mut self, car: Car, owner: Owner) -> StoreResult<bool> {
        if car.owner_id() != owner.id() {
            warn!(
                car = %car.id(),
                car_owner = %car.owner_id(),
                owner = %owner.id(),
                "rejected car with mismatched owner"
            );
            return Err(StoreError::InvalidArgument(format!(
                "{} belongs to {}, not {}",
                car.id(),
                car.owner_id(),
                owner.id()
            )));
        }

        if self.cars.contains_key(&car.id()) {
            debug!(car = %car.id(), "duplicate insert ignored");
            return Ok(false);
        }

        let car = Arc::new(car);
        let id = car.id();
        let owner_id = owner.id();

        self.owners
            .entry(owner_id)
            .or_insert_with(|| Arc::new(owner));
        self.by_owner.add(owner_id, Arc::clone(&car));
        if let Some(brand) = car.brand() {
            self.by_brand.add(brand.to_owned(), Arc::clone(&car));
        }
        self.by_velocity
            .insert(RankKey::new(car.max_velocity(), id), Arc::clone(&car));
        self.by_power
            .insert(RankKey::new(car.power(), id), Arc::clone(&car));

        debug!(car = %id, owner = %owner_id, brand = car.brand().unwrap_or("-"), "car indexed");
        self.cars.insert(id, Slot::Live(car));
        Ok(true)
    }

    /// Remove a live car from every index and return it.
    ///
    /// Unknown and already-removed ids yield [`StoreError::NotFound`] and
    /// leave the store untouched.
    pub fn remove(&mut self, id: CarId) -> StoreResult<Arc<Car>> {
        let car = self
            .cars
            .get(&id)
            .and_then(Slot::live)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;

        let policy = self.config.empty_groups;
        let owner_id = car.owner_id();
        self.by_owner.remove(&owner_id, id, policy);
        if !self.by_owner.contains_key(&owner_id) {
            self.owners.remove(&owner_id);
        }
        if let Some(brand) = car.brand() {
            self.by_brand.remove(brand, id, policy);
        }
        self.by_velocity
            .remove(&RankKey::new(car.max_velocity(), id));
        self.by_power.remove(&RankKey::new(car.power(), id));

        match self.config.delete_policy {
            DeletePolicy::Hard => {
                self.cars.remove(&id);
            }
            DeletePolicy::Soft => {
                self.cars.insert(id, Slot::Dead(Arc::clone(&car)));
            }
        }

        debug!(car = %id, owner = %owner_id, policy = ?self.config.delete_policy, "car removed");
        Ok(car)
    }

    /// Drop every tombstone from the primary table, making those ids
    /// insertable again. Returns how many were purged.
    pub fn purge_tombstones(&mut self) -> usize {
        let before = self.cars.len();
        self.cars.retain(|_, slot| matches!(slot, Slot::Live(_)));
        let purged = before - self.cars.len();
        if purged > 0 {
            debug!(purged, "tombstones purged");
        }
        purged
    }

    /// Remove everything, tombstones included.
    pub fn clear(&mut self) {
        self.cars.clear();
        self.owners.clear();
        self.by_owner.clear();
        self.by_brand.clear();
        self.by_velocity.clear();
        self.by_power.clear();
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Distinct owners in the owner index. Order is unspecified.
    pub fn all_unique_owners(&self) -> Vec<Arc<Owner>> {
        self.by_owner
            .keys()
            .filter_map(|id| self.owners.get(id))
            .cloned()
            .collect()
    }

    /// Up to `k` live cars with the highest max velocity, fastest first.
    /// Equal velocities are ordered by ascending car id.
    pub fn top_k_by_max_velocity(&self, k: usize) -> Vec<Arc<Car>> {
        self.by_velocity.top(k)
    }

    /// [`top_k_by_max_velocity`](Self::top_k_by_max_velocity) with the
    /// configured `top_k`.
    pub fn top_three_by_max_velocity(&self) -> Vec<Arc<Car>> {
        self.top_k_by_max_velocity(self.config.top_k)
    }

    /// Live cars with `power >= threshold`, ascending by power then id.
    pub fn cars_with_power_at_least(&self, threshold: u32) -> Vec<Arc<Car>> {
        self.by_power.at_least(threshold)
    }

    pub fn cars_of_brand(&self, brand: &str) -> Vec<Arc<Car>> {
        self.by_brand.cars(brand)
    }

    pub fn cars_of_owner(&self, owner: OwnerId) -> Vec<Arc<Car>> {
        self.by_owner.cars(&owner)
    }

    /// Truncating mean age of the distinct owners driving a live car of
    /// `brand`. An owner with several cars of the brand counts once.
    pub fn mean_owner_age_for_brand(&self, brand: &str) -> StoreResult<u32> {
        let group = self
            .by_brand
            .group(brand)
            .ok_or_else(|| StoreError::BrandNotFound(brand.to_owned()))?;

        let drivers: BTreeSet<OwnerId> = group.values().map(|car| car.owner_id()).collect();
        let ages: Vec<u64> = drivers
            .iter()
            .filter_map(|id| self.owners.get(id))
            .map(|owner| u64::from(owner.age()))
            .collect();
        if ages.is_empty() {
            return Err(StoreError::EmptyAggregate("brand has no live cars"));
        }

        // The mean of u32 values always fits in u32.
        Ok((ages.iter().sum::<u64>() / ages.len() as u64) as u32)
    }

    /// Truncating mean number of live cars per owner, over owners with at
    /// least one live car.
    pub fn mean_cars_per_owner(&self) -> StoreResult<usize> {
        let (owners, cars) = self
            .by_owner
            .non_empty()
            .fold((0usize, 0usize), |(owners, cars), (_, group)| {
                (owners + 1, cars + group.len())
            });
        if owners == 0 {
            return Err(StoreError::EmptyAggregate("no owners with live cars"));
        }
        Ok(cars / owners)
    }

    // ---------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------

    /// Number of live cars.
    pub fn len(&self) -> usize {
        self.by_velocity.len()
    }

    /// Returns `true` if there are no live cars.
    pub fn is_empty(&self) -> bool {
        self.by_velocity.is_empty()
    }

    /// Returns `true` if `id` names a live car.
    pub fn contains(&self, id: CarId) -> bool {
        self.get(id).is_some()
    }

    /// The live car with this id.
    pub fn get(&self, id: CarId) -> Option<Arc<Car>> {
        self.cars.get(&id).and_then(Slot::live).cloned()
    }

    /// The record left behind by a soft delete of `id`.
    pub fn tombstone(&self, id: CarId) -> Option<Arc<Car>> {
        match self.cars.get(&id) {
            Some(Slot::Dead(car)) => Some(Arc::clone(car)),
            _ => None,
        }
    }

    /// The registered owner with this id, if it is still indexed.
    pub fn owner(&self, id: OwnerId) -> Option<Arc<Owner>> {
        self.owners.get(&id).cloned()
    }

    pub fn stats(&self) -> StoreStats {
        let live_cars = self.len();
        StoreStats {
            live_cars,
            tombstones: self.cars.len() - live_cars,
            owners: self.by_owner.len(),
            brands: self.by_brand.len(),
        }
    }
}

impl Default for IndexedCarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IndexedCarStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("IndexedCarStore")
            .field("live_cars", &stats.live_cars)
            .field("tombstones", &stats.tombstones)
            .field("owners", &stats.owners)
            .field("brands", &stats.brands)
            .finish()
    }
}
