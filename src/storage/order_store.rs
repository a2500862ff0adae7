use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::error::StorageError;
use super::traits::OrderLookup;
use crate::domain::{CustomerId, Order, OrderId};

/// Default customer ids the store is populated for
pub const DEFAULT_CUSTOMER_IDS: RangeInclusive<CustomerId> = 1..=8;

/// Default exclusive upper bound on orders generated per customer
pub const DEFAULT_MAX_ORDERS_PER_CUSTOMER: u32 = 100;

/// In-memory order store keyed by customer id
///
/// Populated exactly once by [`KeyedOrderStore::initialize`] and immutable
/// afterwards. Share it behind an `Arc`; publishing the `Arc` orders the
/// initialization writes before every concurrent read.
#[derive(Debug)]
pub struct KeyedOrderStore {
    orders: HashMap<CustomerId, Arc<[Order]>>,
    empty: Arc<[Order]>,
}

impl KeyedOrderStore {
    /// Generate synthetic orders for every id in `customer_ids`
    ///
    /// Each customer receives a count drawn uniformly from
    /// `[0, max_orders_per_customer)`, with order ids assigned sequentially
    /// from 1.
    pub fn initialize<R>(
        customer_ids: RangeInclusive<CustomerId>,
        max_orders_per_customer: u32,
        rng: &mut R,
    ) -> Result<Self, StorageError>
    where
        R: Rng + ?Sized,
    {
        if customer_ids.is_empty() {
            return Err(StorageError::EmptyIdRange {
                start: *customer_ids.start(),
                end: *customer_ids.end(),
            });
        }
        if max_orders_per_customer == 0 {
            return Err(StorageError::InvalidOrderBound(max_orders_per_customer));
        }

        let orders: HashMap<CustomerId, Arc<[Order]>> = customer_ids
            .map(|customer_id| {
                let count: OrderId = rng.gen_range(0..max_orders_per_customer);
                let list: Vec<Order> = (1..=count)
                    .map(|order_id| Order::new(customer_id, order_id))
                    .collect();
                (customer_id, Arc::from(list))
            })
            .collect();

        Ok(Self {
            orders,
            empty: Arc::from(Vec::new()),
        })
    }

    /// Build a store directly from prepared order lists
    pub fn from_orders(orders: impl IntoIterator<Item = (CustomerId, Vec<Order>)>) -> Self {
        Self {
            orders: orders
                .into_iter()
                .map(|(customer_id, list)| (customer_id, Arc::from(list)))
                .collect(),
            empty: Arc::from(Vec::new()),
        }
    }

    /// Number of customers with an entry (possibly an empty list)
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_orders(&self) -> usize {
        self.orders.values().map(|list| list.len()).sum()
    }
}

impl OrderLookup for KeyedOrderStore {
    fn lookup(&self, customer_id: CustomerId) -> Arc<[Order]> {
        self.orders
            .get(&customer_id)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }
}

/// Parameters for populating a [`KeyedOrderStore`] at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStoreConfig {
    pub customer_ids: RangeInclusive<CustomerId>,
    pub max_orders_per_customer: u32,
    /// Fixed seed for reproducible data; entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for OrderStoreConfig {
    fn default() -> Self {
        Self {
            customer_ids: DEFAULT_CUSTOMER_IDS,
            max_orders_per_customer: DEFAULT_MAX_ORDERS_PER_CUSTOMER,
            seed: None,
        }
    }
}

impl OrderStoreConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<KeyedOrderStore, StorageError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = KeyedOrderStore::initialize(
            self.customer_ids.clone(),
            self.max_orders_per_customer,
            &mut rng,
        )?;

        info!(
            customers = store.len(),
            orders = store.total_orders(),
            seed = ?self.seed,
            "Order store initialized"
        );
        Ok(store)
    }
}
