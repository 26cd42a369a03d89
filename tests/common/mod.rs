#![allow(dead_code)]

use pizza_checkout::application::checkout::CheckoutMachine;
use pizza_checkout::application::session::SessionState;
use pizza_checkout::infrastructure::in_memory::{
    InMemoryAuthGate, InMemoryCatalog, InMemoryOrderService, InMemoryPaymentLedger,
};
use pizza_checkout::interfaces::json::fixture::StorefrontFixture;
use std::sync::Arc;

/// A checkout machine wired to in-memory collaborators seeded from the
/// built-in storefront, plus handles on those collaborators.
pub struct Storefront {
    pub machine: CheckoutMachine,
    pub auth: InMemoryAuthGate,
    pub catalog: InMemoryCatalog,
    pub orders: InMemoryOrderService,
    pub payments: InMemoryPaymentLedger,
    pub session: Arc<SessionState>,
}

pub async fn storefront() -> Storefront {
    storefront_with(InMemoryOrderService::new()).await
}

pub async fn storefront_with(orders: InMemoryOrderService) -> Storefront {
    let fixture = StorefrontFixture::builtin().unwrap();
    let auth = InMemoryAuthGate::from_fixture(&fixture);
    let catalog = InMemoryCatalog::from_fixture(&fixture);
    let payments = InMemoryPaymentLedger::new();
    let session = Arc::new(
        SessionState::init(Box::new(auth.clone()), None)
            .await
            .unwrap(),
    );
    let machine = CheckoutMachine::new(
        Arc::new(catalog.clone()),
        session.clone(),
        Arc::new(orders.clone()),
        Arc::new(payments.clone()),
    );
    Storefront {
        machine,
        auth,
        catalog,
        orders,
        payments,
        session,
    }
}

pub fn write_script(rows: &[&str]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut script = tempfile::NamedTempFile::new().unwrap();
    writeln!(script, "action, arg1, arg2, arg3").unwrap();
    for row in rows {
        writeln!(script, "{row}").unwrap();
    }
    script
}
