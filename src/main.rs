use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pizza_checkout::application::checkout::CheckoutMachine;
use pizza_checkout::application::runtime;
use pizza_checkout::application::session::SessionState;
use pizza_checkout::domain::ports::{
    CatalogProviderRef, OrderServiceRef, PaymentConfirmationRef,
};
use pizza_checkout::infrastructure::in_memory::{
    InMemoryAuthGate, InMemoryCatalog, InMemoryOrderService, InMemoryPaymentLedger,
};
use pizza_checkout::interfaces::csv::action_reader::ActionReader;
use pizza_checkout::interfaces::json::fixture::StorefrontFixture;
use pizza_checkout::interfaces::json::report::{ReportWriter, RunReport};
use pizza_checkout::telemetry;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Action script CSV file
    script: PathBuf,

    /// Storefront fixture JSON (menu, franchises, users). Defaults to the built-in one.
    #[arg(long, env = "PIZZA_STOREFRONT")]
    storefront: Option<PathBuf>,

    /// Include the signed-in diner's order history in the report
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let fixture = match cli.storefront {
        Some(path) => StorefrontFixture::from_path(path).into_diagnostic()?,
        None => StorefrontFixture::builtin().into_diagnostic()?,
    };

    let catalog: CatalogProviderRef = Arc::new(InMemoryCatalog::from_fixture(&fixture));
    let orders: OrderServiceRef = Arc::new(InMemoryOrderService::new());
    let payments: PaymentConfirmationRef = Arc::new(InMemoryPaymentLedger::new());
    let session = SessionState::init(Box::new(InMemoryAuthGate::from_fixture(&fixture)), None)
        .await
        .into_diagnostic()?;
    let session = Arc::new(session);

    let machine = CheckoutMachine::new(catalog, session.clone(), orders.clone(), payments);
    let (handle, task) = runtime::spawn(machine);

    // Replay the script one action at a time, letting each submission settle
    let file = File::open(cli.script).into_diagnostic()?;
    let reader = ActionReader::new(file);
    for action_result in reader.actions() {
        match action_result {
            Ok(action) => {
                if let Err(e) = handle.apply(action).await {
                    eprintln!("Error applying action: {}", e);
                }
                handle.wait_until_settled().await.into_diagnostic()?;
            }
            Err(e) => {
                eprintln!("Error reading action: {}", e);
            }
        }
    }

    let checkout = handle.snapshot().await.into_diagnostic()?;
    drop(handle);
    task.await.into_diagnostic()?;

    let history = match session.current().await.into_diagnostic()? {
        Some(current) if cli.history => Some(orders.history(&current).await.into_diagnostic()?),
        _ => None,
    };

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer
        .write_report(&RunReport { checkout, history })
        .into_diagnostic()?;

    Ok(())
}
