use crate::domain::cart::CartLine;
use crate::domain::catalog::{Franchise, FranchiseId, MenuItem, MenuItemId, StoreId};
use crate::domain::money::Price;
use crate::domain::order::{Order, OrderConfirmation, OrderHistory, SettlementToken};
use crate::domain::ports::{AuthGate, CatalogProvider, OrderService, PaymentConfirmation};
use crate::domain::session::{Role, RoleAssignment, Session, User, UserId};
use crate::error::{CheckoutError, Result};
use crate::interfaces::json::fixture::StorefrontFixture;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{RwLock, Semaphore};
use tracing::info;
use uuid::Uuid;

/// An in-memory menu and franchise list.
///
/// Prices can be changed after items have been carted, which is how tests
/// check that carts keep their snapshots.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    menu: Arc<RwLock<Vec<MenuItem>>>,
    franchises: Arc<RwLock<Vec<Franchise>>>,
}

impl InMemoryCatalog {
    /// Creates a catalog serving `menu` and `franchises`.
    pub fn new(menu: Vec<MenuItem>, franchises: Vec<Franchise>) -> Self {
        let franchises = franchises.into_iter().map(Franchise::bind_stores).collect();
        Self {
            menu: Arc::new(RwLock::new(menu)),
            franchises: Arc::new(RwLock::new(franchises)),
        }
    }

    /// Creates a catalog seeded from a storefront fixture.
    pub fn from_fixture(fixture: &StorefrontFixture) -> Self {
        Self::new(fixture.menu.clone(), fixture.franchises.clone())
    }

    pub async fn set_price(&self, menu_id: MenuItemId, price: Price) -> Result<()> {
        let mut menu = self.menu.write().await;
        let item = menu
            .iter_mut()
            .find(|item| item.id == menu_id)
            .ok_or(CheckoutError::UnknownMenuItem(menu_id))?;
        item.price = price;
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn menu(&self) -> Result<Vec<MenuItem>> {
        Ok(self.menu.read().await.clone())
    }

    async fn franchises(&self, filter: Option<&str>) -> Result<Vec<Franchise>> {
        let franchises = self.franchises.read().await;
        Ok(franchises
            .iter()
            .filter(|f| filter.is_none_or(|pattern| f.matches(pattern)))
            .cloned()
            .collect())
    }
}

#[derive(Clone)]
struct Account {
    user: User,
    password: String,
}

/// An in-memory credential store with one current session.
///
/// Issued tokens stay valid until logout, so a token saved by one
/// `SessionState` can be resumed by another over the same gate.
#[derive(Default, Clone)]
pub struct InMemoryAuthGate {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    tokens: Arc<RwLock<HashMap<SettlementToken, String>>>,
    current: Arc<RwLock<Option<Session>>>,
    next_user_id: Arc<AtomicU64>,
}

impl InMemoryAuthGate {
    /// Creates a gate with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gate holding the fixture's user accounts.
    pub fn from_fixture(fixture: &StorefrontFixture) -> Self {
        let accounts: HashMap<String, Account> = fixture
            .users
            .iter()
            .map(|record| {
                (
                    record.user.email.clone(),
                    Account {
                        user: record.user.clone(),
                        password: record.password.clone(),
                    },
                )
            })
            .collect();
        let highest_id = accounts
            .values()
            .filter_map(|a| a.user.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        Self {
            accounts: Arc::new(RwLock::new(accounts)),
            next_user_id: Arc::new(AtomicU64::new(highest_id)),
            ..Self::default()
        }
    }

    /// Drops the current session without revoking its token, as a process
    /// restart would.
    pub async fn forget_current(&self) {
        *self.current.write().await = None;
    }

    async fn open_session(&self, user: User) -> Session {
        let session = Session {
            user,
            token: SettlementToken::new(Uuid::new_v4().to_string()),
        };
        self.tokens
            .write()
            .await
            .insert(session.token.clone(), session.user.email.clone());
        *self.current.write().await = Some(session.clone());
        session
    }
}

#[async_trait]
impl AuthGate for InMemoryAuthGate {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.current.read().await.clone())
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let user = {
            let accounts = self.accounts.read().await;
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(CheckoutError::Unauthorized),
            }
        };
        Ok(self.open_session(user).await)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let user = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(email) {
                return Err(CheckoutError::ValidationError(format!(
                    "Email already registered: {email}"
                )));
            }
            let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
            let user = User {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                roles: vec![RoleAssignment::new(Role::Diner)],
            };
            accounts.insert(
                email.to_string(),
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };
        Ok(self.open_session(user).await)
    }

    async fn logout(&self) -> Result<()> {
        let session = self.current.write().await.take();
        if let Some(session) = session {
            self.tokens.write().await.remove(&session.token);
        }
        Ok(())
    }

    async fn resume(&self, token: &SettlementToken) -> Result<Option<Session>> {
        let Some(email) = self.tokens.read().await.get(token).cloned() else {
            return Ok(None);
        };
        let Some(account) = self.accounts.read().await.get(&email).cloned() else {
            return Ok(None);
        };
        let session = Session {
            user: account.user,
            token: token.clone(),
        };
        *self.current.write().await = Some(session.clone());
        Ok(Some(session))
    }
}

/// An in-memory order service.
///
/// Every call to `submit` is recorded before anything else happens, so tests
/// can count submissions. When built with a gate, each submission waits
/// for a permit, which keeps it in flight until the test releases it.
#[derive(Default, Clone)]
pub struct InMemoryOrderService {
    requests: Arc<RwLock<Vec<Vec<CartLine>>>>,
    orders: Arc<RwLock<Vec<(UserId, Order)>>>,
    next_order_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
}

impl InMemoryOrderService {
    /// Creates a new, empty in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an order service whose submissions each wait for a permit on `gate`.
    pub fn with_gate(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Makes subsequent submissions fail as if the service were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The line items of every submission received, in arrival order.
    pub async fn requests(&self) -> Vec<Vec<CartLine>> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn submit(
        &self,
        session: &Session,
        store_id: StoreId,
        franchise_id: FranchiseId,
        items: &[CartLine],
    ) -> Result<OrderConfirmation> {
        self.requests.write().await.push(items.to_vec());

        let _permit = match &self.gate {
            Some(gate) => Some(
                gate.acquire()
                    .await
                    .map_err(|e| CheckoutError::SubmissionError(e.to_string()))?,
            ),
            None => None,
        };

        if self.failing.load(Ordering::SeqCst) {
            return Err(CheckoutError::SubmissionError(
                "order service unavailable".to_string(),
            ));
        }
        if items.is_empty() {
            return Err(CheckoutError::ValidationError(
                "Order has no items".to_string(),
            ));
        }

        let order = Order {
            id: self.next_order_id.fetch_add(1, Ordering::SeqCst) + 1,
            franchise_id,
            store_id,
            items: items.to_vec(),
            date: Utc::now(),
        };
        self.orders
            .write()
            .await
            .push((session.user.id.clone(), order.clone()));

        Ok(OrderConfirmation {
            order,
            token: SettlementToken::new(Uuid::new_v4().to_string()),
        })
    }

    async fn history(&self, session: &Session) -> Result<OrderHistory> {
        let orders = self.orders.read().await;
        Ok(OrderHistory {
            diner_id: session.user.id.clone(),
            orders: orders
                .iter()
                .filter(|(diner, _)| *diner == session.user.id)
                .map(|(_, order)| order.clone())
                .collect(),
        })
    }
}

/// Records every confirmation handed over for settlement.
#[derive(Default, Clone)]
pub struct InMemoryPaymentLedger {
    confirmations: Arc<RwLock<Vec<OrderConfirmation>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryPaymentLedger {
    /// Creates a new, empty payment ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn confirmations(&self) -> Vec<OrderConfirmation> {
        self.confirmations.read().await.clone()
    }
}

#[async_trait]
impl PaymentConfirmation for InMemoryPaymentLedger {
    async fn confirm(&self, confirmation: &OrderConfirmation) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CheckoutError::PaymentError("payment declined".to_string()));
        }
        let amount = confirmation.order.total()?;
        info!(
            order_id = confirmation.order.id,
            %amount,
            "Payment confirmed"
        );
        self.confirmations.write().await.push(confirmation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture() -> StorefrontFixture {
        StorefrontFixture::builtin().unwrap()
    }

    fn line(menu_id: MenuItemId) -> CartLine {
        CartLine {
            menu_id,
            description: "Veggie".to_string(),
            price: Price::new(dec!(0.0038)).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_catalog() {
        let catalog = InMemoryCatalog::from_fixture(&fixture());
        assert_eq!(catalog.menu().await.unwrap().len(), 5);

        let all = catalog.franchises(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].stores[0].franchise_id, 2);

        let filtered = catalog.franchises(Some("pizza*")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "PizzaCorp");

        catalog
            .set_price(1, Price::new(dec!(0.01)).unwrap())
            .await
            .unwrap();
        assert_eq!(catalog.menu().await.unwrap()[0].price.value(), dec!(0.01));
        assert!(matches!(
            catalog.set_price(99, Price::ZERO).await,
            Err(CheckoutError::UnknownMenuItem(99))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_auth_gate_register() {
        let gate = InMemoryAuthGate::from_fixture(&fixture());
        let session = gate
            .register("Pizza Diner", "new@jwt.com", "pw")
            .await
            .unwrap();
        assert_eq!(session.user.id, "4");
        assert!(session.user.has_role(Role::Diner));
        assert_eq!(gate.current_session().await.unwrap(), Some(session));

        let duplicate = gate.register("Again", "new@jwt.com", "pw").await;
        assert!(matches!(duplicate, Err(CheckoutError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let gate = InMemoryAuthGate::from_fixture(&fixture());
        let session = gate.login("d@jwt.com", "a").await.unwrap();
        gate.logout().await.unwrap();

        assert!(gate.current_session().await.unwrap().is_none());
        assert!(gate.resume(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_order_service() {
        let gate = InMemoryAuthGate::from_fixture(&fixture());
        let diner = gate.login("d@jwt.com", "a").await.unwrap();
        let admin = gate.login("admin@jwt.com", "admin").await.unwrap();
        let service = InMemoryOrderService::new();

        let first = service.submit(&diner, 4, 2, &[line(1)]).await.unwrap();
        let second = service
            .submit(&admin, 7, 3, &[line(1), line(2)])
            .await
            .unwrap();
        assert_eq!(first.order.id, 1);
        assert_eq!(second.order.id, 2);
        assert_ne!(first.token, second.token);

        let history = service.history(&diner).await.unwrap();
        assert_eq!(history.diner_id, "3");
        assert_eq!(history.orders, vec![first.order]);
        assert_eq!(service.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_order_service_failure() {
        let gate = InMemoryAuthGate::from_fixture(&fixture());
        let diner = gate.login("d@jwt.com", "a").await.unwrap();
        let service = InMemoryOrderService::new();
        service.set_failing(true);

        let result = service.submit(&diner, 4, 2, &[line(1)]).await;
        assert!(matches!(result, Err(CheckoutError::SubmissionError(_))));
        assert!(service.history(&diner).await.unwrap().orders.is_empty());
    }
}
