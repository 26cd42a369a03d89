use super::cart::CartLine;
use super::catalog::{FranchiseId, StoreId};
use super::money::Price;
use super::session::UserId;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type OrderId = u64;

/// Opaque token issued alongside a login or an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementToken(String);

impl SettlementToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An accepted order. Only the order service creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub franchise_id: FranchiseId,
    pub store_id: StoreId,
    pub items: Vec<CartLine>,
    pub date: DateTime<Utc>,
}

impl Order {
    /// Fails with `TotalOverflow` when the items do not sum to a `Decimal`.
    pub fn total(&self) -> Result<Price> {
        Price::checked_sum(self.items.iter().map(|item| item.price))
    }
}

/// What a successful submission hands back: the order plus its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order: Order,
    #[serde(rename = "jwt")]
    pub token: SettlementToken,
}

/// A diner's past orders, as served by the order service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    pub diner_id: UserId,
    pub orders: Vec<Order>,
}

impl OrderHistory {
    pub fn total_spent(&self) -> Result<Price> {
        let totals = self
            .orders
            .iter()
            .map(Order::total)
            .collect::<Result<Vec<_>>>()?;
        Price::checked_sum(totals)
    }
}
