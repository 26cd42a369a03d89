//! Adapters between the checkout core and the outside world: CSV action
//! scripts in, JSON storefront fixtures in, JSON run reports out.

pub mod csv;
pub mod json;
