use super::cart::CartLine;
use super::catalog::{Franchise, FranchiseId, MenuItem, StoreId};
use super::order::{OrderConfirmation, OrderHistory, SettlementToken};
use super::session::Session;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of menu items and of the franchises that can fulfill an order.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn menu(&self) -> Result<Vec<MenuItem>>;
    /// `None` or `"*"` lists every franchise.
    async fn franchises(&self, filter: Option<&str>) -> Result<Vec<Franchise>>;
}

#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>>;
    async fn login(&self, email: &str, password: &str) -> Result<Session>;
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session>;
    async fn logout(&self) -> Result<()>;
    /// Restores the session a persisted token belongs to, if it is still valid.
    async fn resume(&self, token: &SettlementToken) -> Result<Option<Session>>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn submit(
        &self,
        session: &Session,
        store_id: StoreId,
        franchise_id: FranchiseId,
        items: &[CartLine],
    ) -> Result<OrderConfirmation>;
    async fn history(&self, session: &Session) -> Result<OrderHistory>;
}

/// Receives confirmed orders for settlement.
#[async_trait]
pub trait PaymentConfirmation: Send + Sync {
    async fn confirm(&self, confirmation: &OrderConfirmation) -> Result<()>;
}

pub type CatalogProviderRef = Arc<dyn CatalogProvider>;
pub type AuthGateBox = Box<dyn AuthGate>;
pub type OrderServiceRef = Arc<dyn OrderService>;
pub type PaymentConfirmationRef = Arc<dyn PaymentConfirmation>;
