//! # Typed Module
//!
//! Handlers that receive their bound parameters as a `serde` type instead of a
//! [`BoundRequest`](crate::binder::BoundRequest), and return any serializable response.
//!
//! ## Usage
//!
//! ```rust
//! use brrtbind::typed::{TypedHandler, TypedRequest};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct ReadItemParams {
//!     item_id: i64,
//!     q: Option<String>,
//! }
//!
//! #[derive(Serialize)]
//! struct Item {
//!     item_id: i64,
//!     q: Option<String>,
//! }
//!
//! struct ReadItem;
//!
//! impl TypedHandler for ReadItem {
//!     type Params = ReadItemParams;
//!     type Response = Item;
//!
//!     fn handle(&self, req: TypedRequest<ReadItemParams>) -> Item {
//!         Item { item_id: req.data.item_id, q: req.data.q }
//!     }
//! }
//! ```
//!
//! Register it with [`Dispatcher::register_typed`](crate::dispatcher::Dispatcher::register_typed).
//! Dates and times arrive as ISO 8601 strings, durations as seconds (`f64`), UUIDs and
//! URLs as strings.

mod core;

pub use core::{TypedHandler, TypedRequest};
