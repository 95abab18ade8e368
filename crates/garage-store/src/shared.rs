use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use garage_types::{Car, CarId, Owner, OwnerId};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{IndexedCarStore, StoreStats};
use crate::traits::{GarageReader, GarageWriter};

/// An [`IndexedCarStore`] behind one coarse `RwLock`.
///
/// Writes hold the lock for the whole insert or remove, so readers never see
/// one index updated and another not. There is no finer-grained locking.
pub struct SharedCarStore {
    inner: RwLock<IndexedCarStore>,
}

impl SharedCarStore {
    pub fn new() -> Self {
        Self::from_store(IndexedCarStore::new())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::from_store(IndexedCarStore::with_config(config))
    }

    pub fn from_store(store: IndexedCarStore) -> Self {
        Self {
            inner: RwLock::new(store),
        }
    }

    /// Unwrap the store, failing if the lock was poisoned.
    pub fn into_inner(self) -> StoreResult<IndexedCarStore> {
        self.inner.into_inner().map_err(|_| StoreError::LockPoisoned)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        Ok(self.read()?.stats())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, IndexedCarStore>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, IndexedCarStore>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for SharedCarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GarageWriter for SharedCarStore {
    fn insert(&self, car: Car, owner: Owner) -> StoreResult<bool> {
        self.write()?.insert(car, owner)
    }

    fn remove(&self, id: CarId) -> StoreResult<Arc<Car>> {
        self.write()?.remove(id)
    }
}

impl GarageReader for SharedCarStore {
    fn all_unique_owners(&self) -> StoreResult<Vec<Arc<Owner>>> {
        Ok(self.read()?.all_unique_owners())
    }

    fn top_k_by_max_velocity(&self, k: usize) -> StoreResult<Vec<Arc<Car>>> {
        Ok(self.read()?.top_k_by_max_velocity(k))
    }

    fn top_three_by_max_velocity(&self) -> StoreResult<Vec<Arc<Car>>> {
        Ok(self.read()?.top_three_by_max_velocity())
    }

    fn cars_with_power_at_least(&self, threshold: u32) -> StoreResult<Vec<Arc<Car>>> {
        Ok(self.read()?.cars_with_power_at_least(threshold))
    }

    fn cars_of_brand(&self, brand: &str) -> StoreResult<Vec<Arc<Car>>> {
        Ok(self.read()?.cars_of_brand(brand))
    }

    fn cars_of_owner(&self, owner: OwnerId) -> StoreResult<Vec<Arc<Car>>> {
        Ok(self.read()?.cars_of_owner(owner))
    }

    fn mean_owner_age_for_brand(&self, brand: &str) -> StoreResult<u32> {
        self.read()?.mean_owner_age_for_brand(brand)
    }

    fn mean_cars_per_owner(&self) -> StoreResult<usize> {
        self.read()?.mean_cars_per_owner()
    }
}

impl std::fmt::Debug for SharedCarStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.read() {
            Ok(store) => f.debug_tuple("SharedCarStore").field(&*store).finish(),
            Err(_) => f.write_str("SharedCarStore(<poisoned>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn owner(id: u64, age: u32) -> Owner {
        Owner::new(OwnerId::new(id), "First", "Last", age)
    }

    fn car(id: u64, owner: &Owner, velocity: u32) -> Car {
        Car::new(CarId::new(id), owner.id())
            .with_brand("Brand")
            .with_max_velocity(velocity)
            .with_power(velocity / 2)
    }

    #[test]
    fn writer_and_reader_through_traits() {
        let store = SharedCarStore::new();
        let writer: &dyn GarageWriter = &store;
        let o = owner(1, 30);
        assert!(writer.insert(car(1, &o, 100), o.clone()).unwrap());
        assert!(!writer.insert(car(1, &o, 100), o).unwrap());

        let reader: &dyn GarageReader = &store;
        assert_eq!(reader.all_unique_owners().unwrap().len(), 1);
        assert_eq!(reader.cars_of_brand("Brand").unwrap().len(), 1);
        assert_eq!(reader.mean_cars_per_owner().unwrap(), 1);
        assert_eq!(reader.mean_owner_age_for_brand("Brand").unwrap(), 30);

        assert_eq!(writer.remove(CarId::new(1)).unwrap().id(), CarId::new(1));
        assert!(matches!(
            writer.remove(CarId::new(1)),
            Err(StoreError::NotFound(_))
        ));
        assert!(reader.top_three_by_max_velocity().unwrap().is_empty());
    }

    #[test]
    fn concurrent_writers_keep_indexes_consistent() {
        let store = Arc::new(SharedCarStore::new());

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let o = owner(t, 20 + t as u32);
                    for i in 0..25u64 {
                        let id = t * 100 + i;
                        store.insert(car(id, &o, i as u32), o.clone()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.live_cars, 200);
        assert_eq!(stats.owners, 8);
        assert_eq!(store.cars_with_power_at_least(0).unwrap().len(), 200);
        assert_eq!(store.mean_cars_per_owner().unwrap(), 25);
    }

    #[test]
    fn concurrent_reads_see_whole_inserts() {
        let store = Arc::new(SharedCarStore::new());
        let o = owner(1, 40);
        store.insert(car(1, &o, 10), o.clone()).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let o = o.clone();
            thread::spawn(move || {
                for id in 2..100u64 {
                    store.insert(car(id, &o, id as u32), o.clone()).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let by_owner = store.cars_of_owner(OwnerId::new(1)).unwrap().len();
                        let by_brand = store.cars_of_brand("Brand").unwrap().len();
                        let by_power = store.cars_with_power_at_least(0).unwrap().len();
                        // Each read locks separately, so counts only grow.
                        assert!(by_owner <= by_brand);
                        assert!(by_brand <= by_power);
                    }
                })
            })
            .collect();

        writer.join().expect("writer should not panic");
        for r in readers {
            r.join().expect("reader should not panic");
        }
        assert_eq!(store.stats().unwrap().live_cars, 99);
    }

    #[test]
    fn poisoned_lock_is_an_error() {
        let store = Arc::new(SharedCarStore::new());
        let poisoner = Arc::clone(&store);
        let result = thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(store.all_unique_owners().unwrap_err(), StoreError::LockPoisoned);
        let o = owner(1, 30);
        assert_eq!(
            store.insert(car(1, &o, 1), o).unwrap_err(),
            StoreError::LockPoisoned
        );
        assert!(format!("{store:?}").contains("poisoned"));
    }

    #[test]
    fn into_inner_returns_store() {
        let store = SharedCarStore::with_config(StoreConfig::soft_delete());
        let o = owner(1, 30);
        store.insert(car(1, &o, 1), o).unwrap();
        store.remove(CarId::new(1)).unwrap();

        let inner = store.into_inner().unwrap();
        assert_eq!(inner.stats().tombstones, 1);
        assert!(inner.is_empty());
    }
}
