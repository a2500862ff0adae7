use serde::{Deserialize, Serialize};

/// Customer identifier, assigned by the customer source
pub type CustomerId = u32;

/// Names the customer service is seeded with, assigned ids 1..=7 in this order
pub const SAMPLE_CUSTOMER_NAMES: [&str; 7] = [
    "Josh",
    "Yuxin",
    "Stéphane",
    "Oleg",
    "Violetta",
    "Madhura",
    "Dr. Syer",
];

/// A named customer as delivered by the customer source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The sample customer set with sequential ids starting at 1
    pub fn samples() -> Vec<Customer> {
        SAMPLE_CUSTOMER_NAMES
            .iter()
            .zip(1..)
            .map(|(name, id)| Customer::new(id, *name))
            .collect()
    }
}
