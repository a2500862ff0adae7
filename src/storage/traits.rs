use std::sync::Arc;

use crate::domain::{CustomerId, Order};

/// Read access to per-customer order lists
///
/// Implementations are read-only once constructed, so lookups from many
/// request tasks need no locking.
pub trait OrderLookup: Send + Sync {
    /// Orders stored for a customer, in stored order (empty if the id is unknown)
    fn lookup(&self, customer_id: CustomerId) -> Arc<[Order]>;
}

impl<L: OrderLookup + ?Sized> OrderLookup for Arc<L> {
    fn lookup(&self, customer_id: CustomerId) -> Arc<[Order]> {
        (**self).lookup(customer_id)
    }
}
