//! Data model shared between the shipping-document core and its clients.

pub mod model;
pub mod requests;
