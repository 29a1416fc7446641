// This file contains the basic types used to communicate through the API
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::http::Form;
use crate::orders::file::COMPLETED_PREFIX;

/// Names of the form fields sent by the menu pages
pub mod fields {
    pub const REST_LINK: &str = "restLink";
    pub const ITEM_NAME: &str = "itemName";
    pub const ITEM_PRICE: &str = "itemPrice";
    pub const ITEM_LINK: &str = "itemLink";
    pub const INDEX: &str = "index";
    pub const USERNAME: &str = "username";
}

/// A menu item, as it is put in a basket
///
/// Used as the key of the basket lines, two items are the same line only if all three
/// fields are equal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    /// Name displayed on the menu
    #[serde(rename = "itemName")]
    pub name: String,
    /// Decimal price, kept as the string the menu gave us
    #[serde(rename = "itemPrice")]
    pub price: String,
    /// Link of the menu entry
    #[serde(rename = "itemLink")]
    pub link: String,
}

impl Item {
    pub fn new(name: &str, price: &str, link: &str) -> Item {
        Item {
            name: name.to_string(),
            price: price.to_string(),
            link: link.to_string(),
        }
    }

    /// Decode an item from the fields of a submitted form
    pub fn from_form(form: &Form) -> Result<Item> {
        Ok(Item::new(
            form.required(fields::ITEM_NAME)?,
            form.required(fields::ITEM_PRICE)?,
            form.required(fields::ITEM_LINK)?,
        ))
    }

    /// Price of a single unit
    ///
    /// A price that doesn't parse, surrounding spaces included, counts as 0 and a warning is
    /// logged.
    pub fn unit_price(&self) -> f64 {
        match self.price.parse::<f64>() {
            Ok(price) => price,
            Err(err) => {
                log::warn!(
                    "Price {:?} of item {:?} is not a number ({}), counting it as 0",
                    self.price,
                    self.name,
                    err
                );
                0.0
            }
        }
    }
}

/// An order, as stored in the order records and returned by the API
///
/// Only the names of the items are kept, the price and link are dropped on submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Set once, when the order is moved to the completed orders
    #[serde(default)]
    pub completed: bool,
    /// Quantity ordered for each item name
    pub items_info: BTreeMap<String, u32>,
    /// Name of the user who sent the order
    pub buyer: String,
    /// Total of the basket at submission, two decimals
    pub total_amount: String,
}

/// Restaurant links are slugs: ASCII letters, digits, `_`, `.` and `-`, starting with a
/// letter or digit
///
/// They never start with the prefix of the completed order files, the pending record of
/// `completed-x` would be the completed record of `x`.
pub fn is_valid_rest_link(rest_link: &str) -> bool {
    rest_link
        .chars()
        .next()
        .map_or(false, |first| first.is_ascii_alphanumeric())
        && rest_link
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        && !rest_link.starts_with(COMPLETED_PREFIX)
}

/// Parse a completion index from a form
pub fn index_from_form(form: &Form) -> Result<i64> {
    let index = form.required(fields::INDEX)?;
    index
        .trim()
        .parse::<i64>()
        .map_err(|err| Error::FormDecode(format!("index {:?}: {}", index, err)).into())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_order_field_names() {
        let order = Order {
            completed: false,
            items_info: BTreeMap::from([("Burger".to_string(), 2)]),
            buyer: "alice".to_string(),
            total_amount: "10.00".to_string(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["completed"], false);
        assert_eq!(json["itemsInfo"]["Burger"], 2);
        assert_eq!(json["buyer"], "alice");
        assert_eq!(json["totalAmount"], "10.00");
    }

    #[test]
    fn test_order_completed_defaults_to_false() {
        let order: Order =
            serde_json::from_str(r#"{"itemsInfo":{},"buyer":"bob","totalAmount":"0.00"}"#)
                .unwrap();
        assert!(!order.completed);
        assert_eq!(order.buyer, "bob");
    }

    #[test]
    fn test_unit_price() {
        assert_eq!(Item::new("Fries", "2.50", "fries").unit_price(), 2.5);
        assert_eq!(Item::new("Fries", "3", "fries").unit_price(), 3.0);
        assert_eq!(Item::new("Fries", " 3 ", "fries").unit_price(), 0.0);
        assert_eq!(Item::new("Fries", "N/A", "fries").unit_price(), 0.0);
        assert_eq!(Item::new("Fries", "", "fries").unit_price(), 0.0);
    }

    #[test]
    fn test_item_from_form() {
        let form = Form::parse("itemName=Pad+Thai&itemPrice=9.90&itemLink=pad-thai&restLink=siam");
        let item = Item::from_form(&form).unwrap();
        assert_eq!(item, Item::new("Pad Thai", "9.90", "pad-thai"));

        let form = Form::parse("itemName=Pad+Thai&itemLink=pad-thai");
        assert!(Item::from_form(&form).is_err());
    }

    #[test]
    fn test_rest_links() {
        assert!(is_valid_rest_link("burger-joint"));
        assert!(is_valid_rest_link("Noodle_Bar.2"));
        assert!(is_valid_rest_link("completed"));
        assert!(is_valid_rest_link("completed_meals"));
        assert!(!is_valid_rest_link("completed-burger-joint"));
        assert!(!is_valid_rest_link(""));
        assert!(!is_valid_rest_link("../orders"));
        assert!(!is_valid_rest_link("-burger"));
        assert!(!is_valid_rest_link("burger/joint"));
        assert!(!is_valid_rest_link("burger\r\nSet-Cookie: x"));
    }

    #[test]
    fn test_index_from_form() {
        assert_eq!(index_from_form(&Form::parse("index=2")).unwrap(), 2);
        assert_eq!(index_from_form(&Form::parse("index=-1")).unwrap(), -1);
        assert!(index_from_form(&Form::parse("index=two")).is_err());
        assert!(index_from_form(&Form::parse("")).is_err());
    }
}
