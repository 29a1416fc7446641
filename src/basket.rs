use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::api::{Item, Order};

/// Total of an empty basket
pub const ZERO_TOTAL: &str = "0.00";

/// Items picked by a user from a single restaurant, kept in the user's session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    /// Restaurant the items come from
    pub rest_link: String,
    /// Quantity of each item, always at least 1
    #[serde(with = "lines")]
    pub items: HashMap<Item, u32>,
    /// Derived from the items by `calculate_total`, never set directly
    pub total_amount: String,
    /// User owning the basket
    pub user_name: String,
}

impl Default for Basket {
    fn default() -> Self {
        Basket::new("", "")
    }
}

impl Basket {
    /// Create an empty basket for the given restaurant and user
    pub fn new(rest_link: &str, user_name: &str) -> Basket {
        Basket {
            rest_link: rest_link.to_string(),
            items: HashMap::new(),
            total_amount: ZERO_TOTAL.to_string(),
            user_name: user_name.to_string(),
        }
    }

    /// Add one unit of `item`, picked from the restaurant `rest_link`
    ///
    /// A basket only holds items of one restaurant: adding from another one drops everything
    /// that was in it before.
    pub fn add(&mut self, rest_link: &str, item: Item) {
        if self.rest_link != rest_link {
            log::debug!(
                "Basket of {} switches from {:?} to {:?}, dropping {} lines",
                self.user_name,
                self.rest_link,
                rest_link,
                self.items.len()
            );
            self.rest_link = rest_link.to_string();
            self.items.clear();
        }

        *self.items.entry(item).or_insert(0) += 1;
        self.calculate_total();
    }

    /// Remove one unit of `item`. Removing an item that is not in the basket does nothing.
    pub fn remove(&mut self, item: &Item) {
        match self.items.get_mut(item) {
            Some(quantity) if *quantity > 1 => *quantity -= 1,
            _ => {
                self.items.remove(item);
            }
        }
        self.calculate_total();
    }

    /// Drop every item, keeping the restaurant and the user
    pub fn empty(&mut self) {
        self.items.clear();
        self.total_amount = ZERO_TOTAL.to_string();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recompute the total from the items, formatted with two decimals
    pub fn calculate_total(&mut self) {
        // Not `sum()`: an empty f64 sum is -0.0, printed as "-0.00"
        let total = self
            .items
            .iter()
            .map(|(item, quantity)| f64::from(*quantity) * item.unit_price())
            .fold(0.0, |total, line| total + line);
        self.total_amount = format!("{:.2}", total);
    }

    /// Snapshot of the basket as an order, ready to be sent to the restaurant
    ///
    /// Lines with the same name but a different price or link are merged.
    pub fn to_order(&self) -> Order {
        let mut items_info = BTreeMap::new();
        for (item, quantity) in self.items.iter() {
            *items_info.entry(item.name.clone()).or_insert(0) += *quantity;
        }

        Order {
            completed: false,
            items_info,
            buyer: self.user_name.clone(),
            total_amount: self.total_amount.clone(),
        }
    }
}

/// JSON maps need string keys, so the items are stored as a list of lines
mod lines {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Line {
        item: Item,
        quantity: u32,
    }

    pub fn serialize<S>(items: &HashMap<Item, u32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut lines: Vec<Line> = items
            .iter()
            .map(|(item, quantity)| Line {
                item: item.clone(),
                quantity: *quantity,
            })
            .collect();
        lines.sort_by(|a, b| a.item.cmp(&b.item));
        lines.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<Item, u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let lines = Vec::<Line>::deserialize(deserializer)?;
        Ok(lines
            .into_iter()
            .filter(|line| line.quantity > 0)
            .map(|line| (line.item, line.quantity))
            .collect())
    }
}
