use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// How `remove` treats the primary table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// The record is dropped from the primary table; the id may be reused.
    #[default]
    Hard,
    /// The record stays in the primary table as a tombstone. Reinserting the
    /// same id is a no-op until [`purge_tombstones`] runs.
    ///
    /// [`purge_tombstones`]: crate::IndexedCarStore::purge_tombstones
    Soft,
}

/// What happens to an owner or brand group once its last car is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyGroupPolicy {
    /// The key is dropped. An owner without cars disappears from
    /// `all_unique_owners`, and a brand without cars reports `BrandNotFound`.
    #[default]
    Evict,
    /// The key stays with an empty group. The owner is still listed by
    /// `all_unique_owners`, and a brand without cars reports `EmptyAggregate`.
    Retain,
}

/// Configuration for an [`IndexedCarStore`](crate::IndexedCarStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of cars returned by `top_three_by_max_velocity`.
    pub top_k: usize,
    pub delete_policy: DeletePolicy,
    pub empty_groups: EmptyGroupPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            delete_policy: DeletePolicy::Hard,
            empty_groups: EmptyGroupPolicy::Evict,
        }
    }
}

impl StoreConfig {
    /// Default configuration with tombstoning removes.
    pub fn soft_delete() -> Self {
        Self {
            delete_policy: DeletePolicy::Soft,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::InvalidConfig(e.to_string()))
    }
}
