use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::identity::{CarId, OwnerId};

/// A registered car.
///
/// Identity is the [`CarId`] alone: two `Car` values with the same id compare
/// equal and hash identically even if every other field differs. Fields are
/// read-only once constructed; build with [`Car::new`] and the `with_*`
/// methods.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Car {
    id: CarId,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    model: Option<String>,
    max_velocity: u32,
    power: u32,
    owner_id: OwnerId,
}

impl Car {
    /// Create a car with no brand or model and zero velocity/power.
    pub fn new(id: CarId, owner_id: OwnerId) -> Self {
        Self {
            id,
            brand: None,
            model: None,
            max_velocity: 0,
            power: 0,
            owner_id,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: u32) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn with_power(mut self, power: u32) -> Self {
        self.power = power;
        self
    }

    pub fn id(&self) -> CarId {
        self.id
    }

    /// The brand, if set. Cars without a brand are not brand-indexed.
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn max_velocity(&self) -> u32 {
        self.max_velocity
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

impl PartialEq for Car {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Car {}

impl Hash for Car {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
