//! Document numbering and form-schema registry for the shipping-document
//! service.
//!
//! The core is two synchronous services over a shared store:
//! - [`IdentifierGenerator`](services::identifiers::generator::IdentifierGenerator)
//!   issues `YYYYMMDD` + 3-digit BOL / Sales Order numbers.
//! - [`SchemaRegistry`](services::schemas::registry::SchemaRegistry) stores the
//!   form schemas used to extract fields from purchase orders.
//!
//! The `services` modules also expose both over a small JSON API (see `main.rs`).

pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod store;

pub use error::{Error, Result};
