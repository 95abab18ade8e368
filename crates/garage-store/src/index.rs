//! Secondary index primitives shared by the car store.
//!
//! Both index kinds hold `Arc<Car>` handles to the record owned by the
//! primary table, never copies. Neither index knows about liveness; the
//! store only ever puts live cars in them.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::ops::RangeInclusive;
use std::sync::Arc;

use garage_types::{Car, CarId};

use crate::config::EmptyGroupPolicy;

/// Cars of one group, ordered by id.
pub type Group = BTreeMap<CarId, Arc<Car>>;

/// Hash index from a grouping key (owner, brand) to the cars sharing it.
#[derive(Debug)]
pub struct GroupIndex<K> {
    groups: HashMap<K, Group>,
}

impl<K: Eq + Hash> GroupIndex<K> {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }

    /// Add a car to the group for `key`, creating the group on first use.
    pub fn add(&mut self, key: K, car: Arc<Car>) {
        self.groups.entry(key).or_default().insert(car.id(), car);
    }

    /// Remove one car from the group for `key`.
    ///
    /// Under [`EmptyGroupPolicy::Evict`] a group left empty is dropped along
    /// with its key.
    pub fn remove<Q>(&mut self, key: &Q, id: CarId, policy: EmptyGroupPolicy) -> Option<Arc<Car>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let group = self.groups.get_mut(key)?;
        let removed = group.remove(&id);
        if group.is_empty() && policy == EmptyGroupPolicy::Evict {
            self.groups.remove(key);
        }
        removed
    }

    pub fn group<Q>(&self, key: &Q) -> Option<&Group>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.groups.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.groups.contains_key(key)
    }

    /// Cars in the group for `key`, ascending by id. Empty for unknown keys.
    pub fn cars<Q>(&self, key: &Q) -> Vec<Arc<Car>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.groups
            .get(key)
            .map(|group| group.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every key currently in the index, including retained empty groups.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.keys()
    }

    /// Groups holding at least one car.
    pub fn non_empty(&self) -> impl Iterator<Item = (&K, &Group)> {
        self.groups.iter().filter(|(_, group)| !group.is_empty())
    }

    /// Number of keys, including retained empty groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

impl<K: Eq + Hash> Default for GroupIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite key of an ordered index: `(rank, id)`.
///
/// The id breaks ties on the rank so the key is a strict total order over
/// distinct cars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RankKey {
    pub rank: u32,
    pub id: CarId,
}

impl RankKey {
    pub fn new(rank: u32, id: CarId) -> Self {
        Self { rank, id }
    }

    /// The smallest key with the given rank.
    pub fn lower_bound(rank: u32) -> Self {
        Self::new(rank, CarId::MIN)
    }

    /// The largest key with the given rank.
    pub fn upper_bound(rank: u32) -> Self {
        Self::new(rank, CarId::MAX)
    }

    fn tier(rank: u32) -> RangeInclusive<Self> {
        Self::lower_bound(rank)..=Self::upper_bound(rank)
    }
}

/// Ordered index over one numeric car attribute.
#[derive(Debug, Default)]
pub struct RankIndex {
    entries: BTreeMap<RankKey, Arc<Car>>,
}

impl RankIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the key was already present.
    pub fn insert(&mut self, key: RankKey, car: Arc<Car>) -> bool {
        self.entries.insert(key, car).is_none()
    }

    pub fn remove(&mut self, key: &RankKey) -> Option<Arc<Car>> {
        self.entries.remove(key)
    }

    /// Up to `k` cars with the highest rank, highest first. Cars sharing a
    /// rank come out in ascending id order.
    pub fn top(&self, k: usize) -> Vec<Arc<Car>> {
        let mut out = Vec::with_capacity(k.min(self.entries.len()));
        let mut next = self.entries.keys().next_back().copied();

        while let Some(key) = next {
            if out.len() >= k {
                break;
            }
            let remaining = k - out.len();
            out.extend(
                self.entries
                    .range(RankKey::tier(key.rank))
                    .take(remaining)
                    .map(|(_, car)| Arc::clone(car)),
            );
            next = self
                .entries
                .range(..RankKey::lower_bound(key.rank))
                .next_back()
                .map(|(key, _)| *key);
        }

        out
    }

    /// Every car with rank `>= rank`, ascending by `(rank, id)`.
    pub fn at_least(&self, rank: u32) -> Vec<Arc<Car>> {
        self.entries
            .range(RankKey::lower_bound(rank)..)
            .map(|(_, car)| Arc::clone(car))
            .collect()
    }

    pub fn contains(&self, key: &RankKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_types::OwnerId;

    fn car(id: u64, velocity: u32) -> Arc<Car> {
        Arc::new(Car::new(CarId::new(id), OwnerId::new(1)).with_max_velocity(velocity))
    }

    fn ids(cars: &[Arc<Car>]) -> Vec<u64> {
        cars.iter().map(|c| c.id().get()).collect()
    }

    fn rank_index(cars: &[Arc<Car>]) -> RankIndex {
        let mut index = RankIndex::new();
        for c in cars {
            index.insert(RankKey::new(c.max_velocity(), c.id()), Arc::clone(c));
        }
        index
    }

    // -----------------------------------------------------------------------
    // RankKey
    // -----------------------------------------------------------------------

    #[test]
    fn rank_key_orders_by_rank_then_id() {
        let a = RankKey::new(10, CarId::new(5));
        let b = RankKey::new(10, CarId::new(6));
        let c = RankKey::new(11, CarId::new(1));
        assert!(a < b);
        assert!(b < c);
        assert!(RankKey::lower_bound(10) <= a);
        assert!(RankKey::upper_bound(10) < c);
    }

    // -----------------------------------------------------------------------
    // RankIndex
    // -----------------------------------------------------------------------

    #[test]
    fn top_is_descending_by_rank() {
        let index = rank_index(&[car(1, 100), car(2, 120), car(3, 90), car(4, 200)]);
        assert_eq!(ids(&index.top(3)), vec![4, 2, 1]);
    }

    #[test]
    fn top_breaks_ties_by_ascending_id() {
        let index = rank_index(&[car(9, 50), car(3, 50), car(7, 50), car(1, 10)]);
        assert_eq!(ids(&index.top(2)), vec![3, 7]);
        assert_eq!(ids(&index.top(4)), vec![3, 7, 9, 1]);
    }

    #[test]
    fn top_with_fewer_entries_than_k() {
        let index = rank_index(&[car(1, 5), car(2, 6)]);
        assert_eq!(ids(&index.top(3)), vec![2, 1]);
        assert!(index.top(0).is_empty());
        assert!(RankIndex::new().top(3).is_empty());
    }

    #[test]
    fn at_least_includes_boundary() {
        let index = rank_index(&[car(1, 20), car(2, 50), car(3, 50), car(4, 60)]);
        assert_eq!(ids(&index.at_least(50)), vec![2, 3, 4]);
        assert_eq!(ids(&index.at_least(0)), vec![1, 2, 3, 4]);
        assert!(index.at_least(61).is_empty());
    }

    #[test]
    fn insert_and_remove_by_key() {
        let c = car(1, 30);
        let key = RankKey::new(30, c.id());
        let mut index = RankIndex::new();
        assert!(index.insert(key, Arc::clone(&c)));
        assert!(!index.insert(key, c));
        assert!(index.contains(&key));
        assert!(index.remove(&key).is_some());
        assert!(index.remove(&key).is_none());
        assert!(index.is_empty());
    }

    // -----------------------------------------------------------------------
    // GroupIndex
    // -----------------------------------------------------------------------

    #[test]
    fn group_add_and_lookup() {
        let mut index: GroupIndex<String> = GroupIndex::new();
        index.add("A".to_string(), car(2, 0));
        index.add("A".to_string(), car(1, 0));
        index.add("B".to_string(), car(3, 0));

        assert_eq!(ids(&index.cars("A")), vec![1, 2]);
        assert_eq!(ids(&index.cars("B")), vec![3]);
        assert!(index.cars("C").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn evict_drops_empty_group() {
        let mut index: GroupIndex<String> = GroupIndex::new();
        index.add("A".to_string(), car(1, 0));
        assert!(index.remove("A", CarId::new(1), EmptyGroupPolicy::Evict).is_some());
        assert!(!index.contains_key("A"));
        assert!(index.is_empty());
    }

    #[test]
    fn retain_keeps_empty_group() {
        let mut index: GroupIndex<String> = GroupIndex::new();
        index.add("A".to_string(), car(1, 0));
        index.remove("A", CarId::new(1), EmptyGroupPolicy::Retain);
        assert!(index.contains_key("A"));
        assert!(index.group("A").unwrap().is_empty());
        assert_eq!(index.non_empty().count(), 0);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut index: GroupIndex<OwnerId> = GroupIndex::new();
        assert!(index
            .remove(&OwnerId::new(1), CarId::new(1), EmptyGroupPolicy::Evict)
            .is_none());
        index.add(OwnerId::new(1), car(1, 0));
        assert!(index
            .remove(&OwnerId::new(1), CarId::new(2), EmptyGroupPolicy::Evict)
            .is_none());
        assert!(index.contains_key(&OwnerId::new(1)));
    }
}
