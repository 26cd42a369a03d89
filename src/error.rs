use crate::application::checkout::CheckoutState;
use crate::domain::catalog::{MenuItemId, StoreId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart holds items for store {current}; clear it before selecting store {requested}")]
    StoreConflict { current: StoreId, requested: StoreId },
    #[error("No store selected")]
    NoStoreSelected,
    #[error("Cart line {index} is out of range (cart has {len} lines)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Unknown store: {0}")]
    UnknownStore(StoreId),
    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(MenuItemId),
    #[error("Cannot check out an empty cart")]
    EmptyCart,
    #[error("Order total is too large")]
    TotalOverflow,
    #[error("Cannot {action} while {state:?}")]
    InvalidTransition {
        state: CheckoutState,
        action: &'static str,
    },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Order submission failed: {0}")]
    SubmissionError(String),
    #[error("Payment confirmation failed: {0}")]
    PaymentError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Checkout runtime stopped")]
    RuntimeStopped,
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CheckoutError {
    /// Local validation errors leave the machine untouched and are never
    /// recorded as the session's last failure.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::StoreConflict { .. }
                | Self::NoStoreSelected
                | Self::IndexOutOfRange { .. }
                | Self::UnknownStore(_)
                | Self::UnknownMenuItem(_)
                | Self::EmptyCart
                | Self::TotalOverflow
                | Self::InvalidTransition { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
