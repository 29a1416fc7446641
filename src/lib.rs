//! Session-backed baskets and per-restaurant order records for a food-ordering site.
//!
//! Users fill a basket with items of one restaurant, the basket lives in their session. Sending
//! it appends an order to the pending orders of the restaurant, and the staff of the restaurant
//! later moves it to the completed orders.

pub mod api;
pub mod auth;
pub mod basket;
pub mod cli;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod orders;
pub mod routes;
pub mod session;
pub mod threadpool;
