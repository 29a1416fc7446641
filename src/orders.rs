use crate::api::Order;
use crate::basket::Basket;
use crate::errors::{Error, Result};

pub mod file;

/// The two order records each restaurant has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ledger {
    /// Orders sent by users and not handled yet
    Pending,
    /// Orders marked as done by the restaurant
    Completed,
}

/// Trait hiding where the orders are kept
///
/// Records are always read and written as a whole. Nothing prevents two requests from
/// interleaving their read and write of the same record, the last write wins.
pub trait OrderStore: Send + Sync {
    /// Read all the orders of a ledger, in the order they were added
    ///
    /// A record that doesn't exist yet is an empty list.
    fn load(&self, rest_link: &str, ledger: Ledger) -> Result<Vec<Order>>;

    /// Replace the content of a ledger
    fn store(&self, rest_link: &str, ledger: Ledger, orders: &[Order]) -> Result<()>;
}

/// Send the content of the basket to its restaurant, then empty it
///
/// The basket is left untouched if the order cannot be recorded.
pub fn submit_order(store: &dyn OrderStore, basket: &mut Basket) -> Result<Order> {
    let order = basket.to_order();

    let mut orders = store.load(&basket.rest_link, Ledger::Pending)?;
    orders.push(order.clone());
    store.store(&basket.rest_link, Ledger::Pending, &orders)?;

    log::info!(
        "{} sent an order of {} to {} ({} pending)",
        order.buyer,
        order.total_amount,
        basket.rest_link,
        orders.len()
    );

    basket.empty();
    Ok(order)
}

/// Move the pending order at `index` to the completed orders of the restaurant
///
/// An index outside of the pending orders is an error and nothing is written. Other
/// pending orders keep their relative order.
pub fn complete_order(store: &dyn OrderStore, rest_link: &str, index: i64) -> Result<Order> {
    let mut pending = store.load(rest_link, Ledger::Pending)?;
    let position = usize::try_from(index)
        .ok()
        .filter(|position| *position < pending.len())
        .ok_or(Error::IndexOutOfRange {
            index,
            len: pending.len(),
        })?;

    let mut order = pending.remove(position);
    order.completed = true;
    store.store(rest_link, Ledger::Pending, &pending)?;

    let mut completed = store.load(rest_link, Ledger::Completed)?;
    completed.push(order.clone());
    if let Err(err) = store.store(rest_link, Ledger::Completed, &completed) {
        // Already gone from the pending orders, this is the last trace of it
        log::error!(
            "Order removed from the pending orders of {} but not recorded as completed: {}",
            rest_link,
            serde_json::to_string(&order).unwrap_or_else(|_| format!("{:?}", order))
        );
        return Err(err);
    }

    log::info!(
        "Order {} of {} for {} completed ({} still pending)",
        index,
        order.buyer,
        rest_link,
        pending.len()
    );
    Ok(order)
}

pub mod mock {

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Order store kept in memory, for tests
    #[derive(Default)]
    pub struct MemoryOrderStore {
        records: Mutex<HashMap<(String, Ledger), Vec<Order>>>,
        /// When set, every write fails
        pub read_only: bool,
    }

    impl MemoryOrderStore {
        pub fn new() -> MemoryOrderStore {
            MemoryOrderStore::default()
        }

        /// A store refusing every write
        pub fn read_only() -> MemoryOrderStore {
            MemoryOrderStore {
                read_only: true,
                ..Default::default()
            }
        }
    }

    impl OrderStore for MemoryOrderStore {
        fn load(&self, rest_link: &str, ledger: Ledger) -> Result<Vec<Order>> {
            let records = self
                .records
                .lock()
                .map_err(|err| Error::Persistence(err.to_string()))?;
            Ok(records
                .get(&(rest_link.to_string(), ledger))
                .cloned()
                .unwrap_or_default())
        }

        fn store(&self, rest_link: &str, ledger: Ledger, orders: &[Order]) -> Result<()> {
            if self.read_only {
                return Err(Error::Persistence("read only store".to_string()).into());
            }
            let mut records = self
                .records
                .lock()
                .map_err(|err| Error::Persistence(err.to_string()))?;
            records.insert((rest_link.to_string(), ledger), orders.to_vec());
            Ok(())
        }
    }
}
