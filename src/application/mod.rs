//! Application layer containing the checkout orchestration.
//!
//! `CheckoutMachine` is the order-composition state machine. `SessionState`
//! is the process-wide login state it consults, and `runtime` runs a machine
//! as an actor behind `tokio` channels.

pub mod checkout;
pub mod runtime;
pub mod session;
