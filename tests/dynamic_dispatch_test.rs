use pizza_checkout::domain::cart::CartLine;
use pizza_checkout::domain::ports::{
    AuthGateBox, CatalogProviderRef, OrderServiceRef, PaymentConfirmationRef,
};
use pizza_checkout::infrastructure::in_memory::{
    InMemoryAuthGate, InMemoryCatalog, InMemoryOrderService, InMemoryPaymentLedger,
};
use pizza_checkout::interfaces::json::fixture::StorefrontFixture;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let fixture = StorefrontFixture::builtin().unwrap();
    let catalog: CatalogProviderRef = Arc::new(InMemoryCatalog::from_fixture(&fixture));
    let auth: AuthGateBox = Box::new(InMemoryAuthGate::from_fixture(&fixture));
    let orders: OrderServiceRef = Arc::new(InMemoryOrderService::new());
    let payments: PaymentConfirmationRef = Arc::new(InMemoryPaymentLedger::new());

    // Verify Send + Sync by spawning tasks
    let catalog_handle = tokio::spawn(async move {
        let menu = catalog.menu().await.unwrap();
        let franchises = catalog.franchises(Some("lota*")).await.unwrap();
        (menu, franchises)
    });
    let auth_handle = tokio::spawn(async move { auth.login("d@jwt.com", "a").await.unwrap() });

    let (menu, franchises) = catalog_handle.await.unwrap();
    assert_eq!(menu.len(), 5);
    assert_eq!(franchises.len(), 1);
    assert_eq!(franchises[0].name, "LotaPizza");

    let session = auth_handle.await.unwrap();
    let items: Vec<CartLine> = menu.iter().take(2).map(CartLine::from).collect();
    let submit_handle = tokio::spawn(async move {
        let confirmation = orders.submit(&session, 4, 2, &items).await.unwrap();
        payments.confirm(&confirmation).await.unwrap();
        confirmation
    });

    let confirmation = submit_handle.await.unwrap();
    assert_eq!(confirmation.order.id, 1);
    assert_eq!(confirmation.order.total().unwrap().value(), dec!(0.0080));
}
