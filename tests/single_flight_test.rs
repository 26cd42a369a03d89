mod common;

use pizza_checkout::application::checkout::{CheckoutState, UserAction};
use pizza_checkout::application::runtime;
use pizza_checkout::infrastructure::in_memory::InMemoryOrderService;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[tokio::test]
async fn test_double_checkout_submits_once() {
    let gate = Arc::new(Semaphore::new(0));
    let s = common::storefront_with(InMemoryOrderService::with_gate(gate.clone())).await;
    s.session.login("d@jwt.com", "a").await.unwrap();
    let orders = s.orders.clone();
    let (handle, _task) = runtime::spawn(s.machine);

    handle.apply(UserAction::SelectStore(4)).await.unwrap();
    handle.apply(UserAction::AddItem(1)).await.unwrap();

    let first = handle.apply(UserAction::Checkout).await.unwrap();
    let second = handle.apply(UserAction::Checkout).await.unwrap();
    assert_eq!(first, CheckoutState::Submitting);
    assert_eq!(second, CheckoutState::Submitting);

    // Let the submit task reach the service before counting
    tokio::task::yield_now().await;
    while orders.requests().await.is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(orders.requests().await.len(), 1);

    gate.add_permits(1);
    let settled = handle.wait_until_settled().await.unwrap();
    assert_eq!(settled.state, CheckoutState::Confirmed);
    assert!(settled.lines.is_empty());
    assert_eq!(orders.requests().await.len(), 1);
}

#[tokio::test]
async fn test_cart_is_frozen_while_submitting() {
    let gate = Arc::new(Semaphore::new(0));
    let s = common::storefront_with(InMemoryOrderService::with_gate(gate.clone())).await;
    s.session.login("d@jwt.com", "a").await.unwrap();
    let (handle, _task) = runtime::spawn(s.machine);

    handle.apply(UserAction::SelectStore(4)).await.unwrap();
    handle.apply(UserAction::AddItem(2)).await.unwrap();
    handle.apply(UserAction::Checkout).await.unwrap();

    assert!(handle.apply(UserAction::AddItem(3)).await.is_err());
    assert!(handle.apply(UserAction::RemoveItem(0)).await.is_err());
    assert!(handle.apply(UserAction::Cancel).await.is_err());
    assert_eq!(handle.snapshot().await.unwrap().lines.len(), 1);

    gate.add_permits(1);
    let settled = handle.wait_until_settled().await.unwrap();
    assert_eq!(settled.state, CheckoutState::Confirmed);
    let confirmation = settled.confirmation.unwrap();
    assert_eq!(confirmation.order.items.len(), 1);
    assert_eq!(confirmation.order.items[0].menu_id, 2);
}

#[tokio::test]
async fn test_login_while_awaiting_auth_goes_through_submitting() {
    let gate = Arc::new(Semaphore::new(0));
    let s = common::storefront_with(InMemoryOrderService::with_gate(gate.clone())).await;
    let (handle, _task) = runtime::spawn(s.machine);

    handle.apply(UserAction::SelectStore(4)).await.unwrap();
    handle.apply(UserAction::AddItem(1)).await.unwrap();
    assert_eq!(
        handle.apply(UserAction::Checkout).await.unwrap(),
        CheckoutState::AwaitingAuth
    );

    let state = handle
        .apply(UserAction::Login {
            email: "d@jwt.com".to_string(),
            password: "a".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(state, CheckoutState::Submitting);
    assert_eq!(
        handle.subscribe().borrow().state,
        CheckoutState::Submitting
    );

    gate.add_permits(1);
    assert_eq!(
        handle.wait_until_settled().await.unwrap().state,
        CheckoutState::Confirmed
    );
}

#[tokio::test]
async fn test_failed_submission_settles_as_failed() {
    let s = common::storefront().await;
    s.orders.set_failing(true);
    s.session.login("d@jwt.com", "a").await.unwrap();
    let (handle, _task) = runtime::spawn(s.machine);

    handle.apply(UserAction::SelectStore(4)).await.unwrap();
    handle.apply(UserAction::AddItem(1)).await.unwrap();
    handle.apply(UserAction::AddItem(2)).await.unwrap();
    handle.apply(UserAction::Checkout).await.unwrap();

    let settled = handle.wait_until_settled().await.unwrap();
    assert_eq!(settled.state, CheckoutState::Failed);
    assert_eq!(settled.lines.len(), 2);
    assert_eq!(settled.total.to_string(), "0.0080");

    assert_eq!(
        handle.apply(UserAction::Retry).await.unwrap(),
        CheckoutState::ItemsSelected
    );
}
