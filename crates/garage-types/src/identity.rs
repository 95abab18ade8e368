use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Unique, immutable identifier of a [`Car`](crate::Car).
///
/// Ordering is numeric. Ordered indexes use [`CarId::MIN`] as the lowest
/// possible tie-breaker when building range boundaries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarId(u64);

impl CarId {
    /// The smallest possible car identifier.
    pub const MIN: CarId = CarId(u64::MIN);

    /// The largest possible car identifier.
    pub const MAX: CarId = CarId(u64::MAX);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CarId({})", self.0)
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "car:{}", self.0)
    }
}

impl FromStr for CarId {
    type Err = TypeError;

    /// Parses either a bare decimal (`42`) or the display form (`car:42`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("car:").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidId(format!("{s:?}: {e}")))
    }
}

impl From<u64> for CarId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Unique, immutable identifier of an [`Owner`](crate::Owner).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner:{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("owner:").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidId(format!("{s:?}: {e}")))
    }
}

impl From<u64> for OwnerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
