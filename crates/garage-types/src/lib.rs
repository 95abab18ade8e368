//! Domain types for the garage registry.
//!
//! Every other garage crate depends on `garage-types`. The records here are
//! plain values: the caller builds them and hands them to a store, which
//! never constructs entities of its own.
//!
//! # Key Types
//!
//! - [`CarId`] -- Unique, immutable car identifier
//! - [`OwnerId`] -- Unique, immutable owner identifier
//! - [`Car`] -- A registered car; equality is by [`CarId`] alone
//! - [`Owner`] -- A car owner; equality is by [`OwnerId`] alone

pub mod car;
pub mod error;
pub mod identity;
pub mod owner;

pub use car::Car;
pub use error::TypeError;
pub use identity::{CarId, OwnerId};
pub use owner::Owner;
