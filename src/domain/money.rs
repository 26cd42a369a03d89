use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative monetary value.
///
/// Wraps `rust_decimal::Decimal` so that cart totals are computed exactly;
/// totals gate payment amounts and must not accumulate floating-point error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value.is_sign_negative() && !value.is_zero() {
            Err(CheckoutError::ValidationError(
                "Price must not be negative".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `None` when the sum does not fit in a `Decimal`.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sums `prices`, failing with `TotalOverflow` instead of panicking.
    pub fn checked_sum<I: IntoIterator<Item = Price>>(prices: I) -> Result<Self, CheckoutError> {
        prices
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
            .ok_or(CheckoutError::TotalOverflow)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
