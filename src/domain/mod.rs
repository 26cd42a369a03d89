//! Domain layer: the cart, catalog reference data, orders, sessions, and the
//! ports through which the checkout talks to its collaborators.

pub mod cart;
pub mod catalog;
pub mod money;
pub mod order;
pub mod ports;
pub mod session;
