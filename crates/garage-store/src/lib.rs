//! Indexed in-memory car store for the garage registry.
//!
//! [`IndexedCarStore`] keeps one primary table of cars and four derived
//! indexes over it, and answers the registry's aggregate queries from them:
//!
//! - cars grouped by owner and by brand ([`GroupIndex`])
//! - cars ordered by max velocity and by power ([`RankIndex`]), for top-k
//!   and threshold range scans
//!
//! # Design Rules
//!
//! 1. Every live car is in every applicable index; nothing else is.
//! 2. Validate first, then mutate: a rejected insert touches no index.
//! 3. Ids are unique. A second insert of a known id is a no-op.
//! 4. Indexes share `Arc<Car>` handles with the primary table.
//! 5. Reads of unknown owners or brands are empty, not errors.
//!
//! # Access
//!
//! The store itself is single-threaded (`&mut self` to mutate).
//! [`SharedCarStore`] puts the whole store behind one `RwLock` and implements
//! the [`GarageReader`] / [`GarageWriter`] boundary.

pub mod config;
pub mod error;
pub mod index;
pub mod shared;
pub mod store;
pub mod traits;

pub use config::{DeletePolicy, EmptyGroupPolicy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use index::{Group, GroupIndex, RankIndex, RankKey};
pub use shared::SharedCarStore;
pub use store::{IndexedCarStore, StoreStats};
pub use traits::{GarageReader, GarageWriter};
