use super::catalog::{MenuItem, MenuItemId, Store};
use super::money::Price;
use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};

/// A menu item as it was when it went into the cart.
///
/// The title and price are snapshotted at add time so later catalog
/// changes never reprice an in-progress order. The same shape is the line
/// item sent on submission and stored on an `Order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub menu_id: MenuItemId,
    pub description: String,
    pub price: Price,
}

impl From<&MenuItem> for CartLine {
    fn from(item: &MenuItem) -> Self {
        Self {
            menu_id: item.id,
            description: item.title.clone(),
            price: item.price,
        }
    }
}

/// The in-progress order: one store and the lines bound to it.
///
/// Invariants: every line belongs to `store`, a non-empty cart always
/// has a store, and `total` is the exact sum of the line prices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    store: Option<Store>,
    lines: Vec<CartLine>,
    total: Price,
}

impl Cart {
    /// Creates an empty cart with no store selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the cart to `store`.
    ///
    /// Fails with `StoreConflict` when lines are already bound to a
    /// different store; the caller must `clear` first.
    pub fn select_store(&mut self, store: Store) -> Result<()> {
        if let Some(current) = &self.store
            && !self.lines.is_empty()
            && current.id != store.id
        {
            return Err(CheckoutError::StoreConflict {
                current: current.id,
                requested: store.id,
            });
        }
        self.store = Some(store);
        Ok(())
    }

    /// Appends a snapshot of `item`. Requires a selected store.
    ///
    /// A line whose price would push the total past what a `Decimal` can
    /// hold is refused with `TotalOverflow`.
    pub fn add_item(&mut self, item: &MenuItem) -> Result<&CartLine> {
        if self.store.is_none() {
            return Err(CheckoutError::NoStoreSelected);
        }
        let line = CartLine::from(item);
        self.total = self
            .total
            .checked_add(line.price)
            .ok_or(CheckoutError::TotalOverflow)?;
        self.lines.push(line);
        Ok(&self.lines[self.lines.len() - 1])
    }

    pub fn remove_item(&mut self, index: usize) -> Result<CartLine> {
        if index >= self.lines.len() {
            return Err(CheckoutError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        // A subset of the lines, so the remaining sum cannot overflow.
        let total = Price::checked_sum(
            self.lines
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, line)| line.price),
        )?;
        self.total = total;
        Ok(self.lines.remove(index))
    }

    /// Exact sum of the snapshotted prices; zero when empty.
    pub fn total(&self) -> Price {
        self.total
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.store = None;
        self.total = Price::ZERO;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }
}
