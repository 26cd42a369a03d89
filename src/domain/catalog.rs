use super::money::Price;
use serde::{Deserialize, Serialize};

pub type MenuItemId = u32;
pub type StoreId = u32;
pub type FranchiseId = u32;

/// A purchasable pizza as published by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// A store that can fulfill an order. Reference data, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Filled in from the listing franchise when absent on the wire.
    #[serde(default)]
    pub franchise_id: FranchiseId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Franchise {
    pub id: FranchiseId,
    pub name: String,
    #[serde(default)]
    pub stores: Vec<Store>,
}

impl Franchise {
    /// Stamps this franchise's id onto every store it lists.
    pub fn bind_stores(mut self) -> Self {
        for store in &mut self.stores {
            store.franchise_id = self.id;
        }
        self
    }

    pub fn store(&self, store_id: StoreId) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == store_id)
    }

    /// Case-insensitive name match where `*` matches any run of characters.
    pub fn matches(&self, filter: &str) -> bool {
        let name = self.name.to_lowercase();
        let filter = filter.to_lowercase();
        let parts: Vec<&str> = filter.split('*').collect();

        let Some((first, rest)) = parts.split_first() else {
            return true;
        };
        let Some((last, middle)) = rest.split_last() else {
            return name == *first;
        };
        if name.len() < first.len() + last.len()
            || !name.starts_with(first)
            || !name.ends_with(last)
        {
            return false;
        }

        let mut remaining = &name[first.len()..name.len() - last.len()];
        for part in middle {
            match remaining.find(part) {
                Some(pos) => remaining = &remaining[pos + part.len()..],
                None => return false,
            }
        }
        true
    }
}
