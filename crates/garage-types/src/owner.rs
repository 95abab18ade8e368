use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::identity::OwnerId;

/// A car owner. Identity is the [`OwnerId`] alone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Owner {
    id: OwnerId,
    first_name: String,
    last_name: String,
    age: u32,
}

impl Owner {
    pub fn new(
        id: OwnerId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: u32,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
        }
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Owner {}

impl Hash for Owner {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
