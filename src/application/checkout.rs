use crate::application::session::SessionState;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::catalog::{Franchise, FranchiseId, MenuItemId, Store, StoreId};
use crate::domain::money::Price;
use crate::domain::order::OrderConfirmation;
use crate::domain::ports::{
    CatalogProviderRef, OrderService, OrderServiceRef, PaymentConfirmationRef,
};
use crate::domain::session::Session;
use crate::error::{CheckoutError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Browsing,
    StoreSelected,
    ItemsSelected,
    AwaitingAuth,
    Submitting,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Unauthorized,
    /// The auth gate itself failed while the checkout waited for a login.
    Session,
    Submission,
    Payment,
}

/// A failure the user should be told about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
}

/// Everything the view layer needs to render the current checkout step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSnapshot {
    pub state: CheckoutState,
    pub store: Option<Store>,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub last_failure: Option<FailureReport>,
    pub confirmation: Option<OrderConfirmation>,
}

/// A user-triggered event.
#[derive(Clone, PartialEq, Eq)]
pub enum UserAction {
    SelectStore(StoreId),
    AddItem(MenuItemId),
    RemoveItem(usize),
    Checkout,
    Login {
        email: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
    },
    Logout,
    /// A login or logout happened outside the machine.
    SessionChanged,
    Retry,
    Cancel,
}

impl fmt::Debug for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectStore(id) => f.debug_tuple("SelectStore").field(id).finish(),
            Self::AddItem(id) => f.debug_tuple("AddItem").field(id).finish(),
            Self::RemoveItem(index) => f.debug_tuple("RemoveItem").field(index).finish(),
            Self::Checkout => f.write_str("Checkout"),
            Self::Login { email, .. } => f
                .debug_struct("Login")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Register { name, email, .. } => f
                .debug_struct("Register")
                .field("name", name)
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Logout => f.write_str("Logout"),
            Self::SessionChanged => f.write_str("SessionChanged"),
            Self::Retry => f.write_str("Retry"),
            Self::Cancel => f.write_str("Cancel"),
        }
    }
}

/// A submission the machine has committed to but not yet sent.
///
/// Holding a ticket means the machine is in `Submitting`; the outcome of
/// `send` must be fed back through `CheckoutMachine::complete_submission`.
#[derive(Debug)]
pub struct SubmissionTicket {
    session: Session,
    store_id: StoreId,
    franchise_id: FranchiseId,
    items: Vec<CartLine>,
}

impl SubmissionTicket {
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    pub async fn send(self, orders: &dyn OrderService) -> Result<OrderConfirmation> {
        orders
            .submit(&self.session, self.store_id, self.franchise_id, &self.items)
            .await
    }
}

/// The order-composition and checkout state machine.
///
/// Owns the cart for one checkout session. Transitions take `&mut self`,
/// so they are serialized by construction. The low-level API (`step`,
/// `request_checkout`, `complete_submission`) separates committing to a
/// submission from performing it, which lets the runtime keep handling
/// events while an order is in flight. The high-level API (`apply`,
/// `checkout`, `login`) drives the submission inline.
pub struct CheckoutMachine {
    catalog: CatalogProviderRef,
    session: Arc<SessionState>,
    orders: OrderServiceRef,
    payments: PaymentConfirmationRef,
    state: CheckoutState,
    cart: Cart,
    last_failure: Option<FailureReport>,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutMachine {
    pub fn new(
        catalog: CatalogProviderRef,
        session: Arc<SessionState>,
        orders: OrderServiceRef,
        payments: PaymentConfirmationRef,
    ) -> Self {
        Self {
            catalog,
            session,
            orders,
            payments,
            state: CheckoutState::Browsing,
            cart: Cart::new(),
            last_failure: None,
            confirmation: None,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn last_failure(&self) -> Option<&FailureReport> {
        self.last_failure.as_ref()
    }

    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub(crate) fn order_service(&self) -> OrderServiceRef {
        Arc::clone(&self.orders)
    }

    pub fn snapshot(&self) -> CheckoutSnapshot {
        CheckoutSnapshot {
            state: self.state,
            store: self.cart.store().cloned(),
            lines: self.cart.lines().to_vec(),
            total: self.cart.total(),
            last_failure: self.last_failure.clone(),
            confirmation: self.confirmation.clone(),
        }
    }

    pub async fn select_store(&mut self, store_id: StoreId) -> Result<()> {
        self.ensure_cart_editable("select a store")?;
        let store = self.find_store(store_id).await?;
        self.cart.select_store(store)?;

        if self.state == CheckoutState::Confirmed {
            self.confirmation = None;
            self.last_failure = None;
        }
        let next = if self.cart.is_empty() {
            CheckoutState::StoreSelected
        } else {
            CheckoutState::ItemsSelected
        };
        self.transition(next);
        Ok(())
    }

    /// Adds the catalog's current version of `menu_id` to the cart.
    pub async fn add_item(&mut self, menu_id: MenuItemId) -> Result<()> {
        self.ensure_cart_editable("add an item")?;
        if self.cart.store().is_none() {
            return Err(CheckoutError::NoStoreSelected);
        }
        let item = self
            .catalog
            .menu()
            .await?
            .into_iter()
            .find(|item| item.id == menu_id)
            .ok_or(CheckoutError::UnknownMenuItem(menu_id))?;

        let line = self.cart.add_item(&item)?;
        debug!(menu_id, price = %line.price, "Added item");
        self.transition(CheckoutState::ItemsSelected);
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<CartLine> {
        self.ensure_cart_editable("remove an item")?;
        let line = self.cart.remove_item(index)?;
        if self.cart.is_empty() {
            self.transition(CheckoutState::StoreSelected);
        }
        Ok(line)
    }

    /// Handles a checkout click.
    ///
    /// Returns a ticket when the machine has moved into `Submitting`. A click
    /// while a submission is in flight is a no-op.
    pub async fn request_checkout(&mut self) -> Result<Option<SubmissionTicket>> {
        match self.state {
            CheckoutState::Submitting => {
                debug!("Submission already in flight, ignoring checkout");
                Ok(None)
            }
            CheckoutState::Failed => Err(CheckoutError::InvalidTransition {
                state: self.state,
                action: "check out",
            }),
            CheckoutState::AwaitingAuth => self.resume_if_authenticated().await,
            _ => {
                if self.cart.is_empty() {
                    return Err(CheckoutError::EmptyCart);
                }
                self.transition(CheckoutState::AwaitingAuth);
                self.resume_if_authenticated().await
            }
        }
    }

    pub async fn request_login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Option<SubmissionTicket>> {
        let login = self.session.login(email, password).await;
        self.after_authentication(login).await
    }

    pub async fn request_register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<SubmissionTicket>> {
        let registration = self.session.register(name, email, password).await;
        self.after_authentication(registration).await
    }

    /// Re-reads the current session after an external login.
    pub async fn reevaluate_session(&mut self) -> Result<Option<SubmissionTicket>> {
        if self.state != CheckoutState::AwaitingAuth {
            return Ok(None);
        }
        self.resume_if_authenticated().await
    }

    /// Resolves the in-flight submission.
    ///
    /// Success clears the cart and hands the confirmation to the payment
    /// collaborator. Failure keeps the cart and moves to `Failed`.
    pub async fn complete_submission(
        &mut self,
        outcome: Result<OrderConfirmation>,
    ) -> Result<CheckoutState> {
        if self.state != CheckoutState::Submitting {
            warn!(state = ?self.state, "Discarding submission result outside of Submitting");
            return Err(CheckoutError::InvalidTransition {
                state: self.state,
                action: "complete a submission",
            });
        }

        match outcome {
            Ok(confirmation) => {
                info!(
                    order_id = confirmation.order.id,
                    total = %self.cart.total(),
                    "Order confirmed"
                );
                self.cart.clear();
                self.transition(CheckoutState::Confirmed);
                if let Err(err) = self.payments.confirm(&confirmation).await {
                    self.record_failure(FailureKind::Payment, &err);
                }
                self.confirmation = Some(confirmation);
                Ok(self.state)
            }
            Err(err) => {
                self.record_failure(FailureKind::Submission, &err);
                self.transition(CheckoutState::Failed);
                Err(err)
            }
        }
    }

    /// Returns from `Failed` to `ItemsSelected` with the cart intact.
    pub fn retry(&mut self) -> Result<()> {
        if self.state != CheckoutState::Failed {
            return Err(CheckoutError::InvalidTransition {
                state: self.state,
                action: "retry",
            });
        }
        self.last_failure = None;
        self.transition(CheckoutState::ItemsSelected);
        Ok(())
    }

    /// Abandons the order and returns to `Browsing`.
    ///
    /// An in-flight submission cannot be cancelled.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state == CheckoutState::Submitting {
            return Err(CheckoutError::InvalidTransition {
                state: self.state,
                action: "cancel",
            });
        }
        self.cart.clear();
        self.last_failure = None;
        self.confirmation = None;
        self.transition(CheckoutState::Browsing);
        Ok(())
    }

    /// Performs the transition for `action` without sending any submission.
    pub async fn step(&mut self, action: UserAction) -> Result<Option<SubmissionTicket>> {
        match action {
            UserAction::SelectStore(store_id) => self.select_store(store_id).await.map(|()| None),
            UserAction::AddItem(menu_id) => self.add_item(menu_id).await.map(|()| None),
            UserAction::RemoveItem(index) => self.remove_item(index).map(|_| None),
            UserAction::Checkout => self.request_checkout().await,
            UserAction::Login { email, password } => self.request_login(&email, &password).await,
            UserAction::Register {
                name,
                email,
                password,
            } => self.request_register(&name, &email, &password).await,
            UserAction::Logout => self.session.logout().await.map(|()| None),
            UserAction::SessionChanged => self.reevaluate_session().await,
            UserAction::Retry => self.retry().map(|()| None),
            UserAction::Cancel => self.cancel().map(|()| None),
        }
    }

    /// Performs `action` and, if it starts a submission, sends it inline.
    pub async fn apply(&mut self, action: UserAction) -> Result<CheckoutState> {
        let ticket = self.step(action).await?;
        self.drive(ticket).await
    }

    pub async fn checkout(&mut self) -> Result<CheckoutState> {
        let ticket = self.request_checkout().await?;
        self.drive(ticket).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<CheckoutState> {
        let ticket = self.request_login(email, password).await?;
        self.drive(ticket).await
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<CheckoutState> {
        let ticket = self.request_register(name, email, password).await?;
        self.drive(ticket).await
    }

    pub async fn session_changed(&mut self) -> Result<CheckoutState> {
        let ticket = self.reevaluate_session().await?;
        self.drive(ticket).await
    }

    async fn drive(&mut self, ticket: Option<SubmissionTicket>) -> Result<CheckoutState> {
        let Some(ticket) = ticket else {
            return Ok(self.state);
        };
        let orders = Arc::clone(&self.orders);
        let outcome = ticket.send(orders.as_ref()).await;
        self.complete_submission(outcome).await
    }

    async fn after_authentication(
        &mut self,
        outcome: Result<Session>,
    ) -> Result<Option<SubmissionTicket>> {
        match outcome {
            Ok(_) => self.reevaluate_session().await,
            Err(err) => {
                self.authentication_failed(&err);
                Err(err)
            }
        }
    }

    /// Bad credentials keep the checkout waiting. Any other gate failure
    /// while waiting moves it to `Failed`, with the cart held for `retry`.
    fn authentication_failed(&mut self, err: &CheckoutError) {
        if self.state != CheckoutState::AwaitingAuth || err.is_local() {
            return;
        }
        if matches!(err, CheckoutError::Unauthorized) {
            self.record_failure(FailureKind::Unauthorized, err);
        } else {
            self.record_failure(FailureKind::Session, err);
            self.transition(CheckoutState::Failed);
        }
    }

    async fn resume_if_authenticated(&mut self) -> Result<Option<SubmissionTicket>> {
        let current = match self.session.current().await {
            Ok(current) => current,
            Err(err) => {
                self.authentication_failed(&err);
                return Err(err);
            }
        };
        let Some(session) = current else {
            info!("Waiting for login to continue checkout");
            return Ok(None);
        };
        if !session.user.can_order() {
            let err = CheckoutError::Unauthorized;
            self.record_failure(FailureKind::Unauthorized, &err);
            return Err(err);
        }
        self.begin_submission(session).map(Some)
    }

    fn begin_submission(&mut self, session: Session) -> Result<SubmissionTicket> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let store = self.cart.store().ok_or(CheckoutError::NoStoreSelected)?;
        let ticket = SubmissionTicket {
            session,
            store_id: store.id,
            franchise_id: store.franchise_id,
            items: self.cart.lines().to_vec(),
        };

        self.last_failure = None;
        self.transition(CheckoutState::Submitting);
        Ok(ticket)
    }

    async fn find_store(&self, store_id: StoreId) -> Result<Store> {
        self.catalog
            .franchises(None)
            .await?
            .into_iter()
            .map(Franchise::bind_stores)
            .find_map(|franchise| franchise.store(store_id).cloned())
            .ok_or(CheckoutError::UnknownStore(store_id))
    }

    fn ensure_cart_editable(&self, action: &'static str) -> Result<()> {
        match self.state {
            CheckoutState::AwaitingAuth | CheckoutState::Submitting | CheckoutState::Failed => {
                Err(CheckoutError::InvalidTransition {
                    state: self.state,
                    action,
                })
            }
            _ => Ok(()),
        }
    }

    fn record_failure(&mut self, kind: FailureKind, err: &CheckoutError) {
        warn!(?kind, error = %err, "Checkout failure");
        self.last_failure = Some(FailureReport {
            kind,
            message: err.to_string(),
        });
    }

    fn transition(&mut self, next: CheckoutState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "Checkout transition");
            self.state = next;
        }
    }
}
