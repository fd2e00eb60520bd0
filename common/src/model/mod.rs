pub mod identifier;
pub mod schema;
