//! Eventline demo: runs one account through its lifecycle, then rebuilds it
//! from the command log.

use std::error::Error;
use std::sync::Arc;

use eventline_accounts::application::service::{AccountService, AccountStores};
use eventline_accounts::application::views::AccountSummary;
use eventline_accounts::domain::aggregates::Account;
use eventline_core::clock::SystemClock;
use eventline_runtime::{TelemetryConfig, init_tracing};
use eventline_store::{InMemoryCommandStore, InMemorySnapshotStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    let telemetry = TelemetryConfig::from_env()?;
    init_tracing(&telemetry)?;

    tracing::info!("Starting Eventline demo");

    // Read configuration from environment.
    let account_id: i64 = std::env::var("EVENTLINE_DEMO_ACCOUNT_ID")
        .unwrap_or_else(|_| "1".to_string())
        .parse()
        .map_err(|e| format!("EVENTLINE_DEMO_ACCOUNT_ID must be a valid i64: {e}"))?;

    let accounts = Arc::new(InMemorySnapshotStore::<Account>::new());
    let summaries = Arc::new(InMemorySnapshotStore::<AccountSummary>::new());
    let service = AccountService::new(
        AccountStores {
            commands: Arc::new(InMemoryCommandStore::new()),
            accounts: accounts.clone(),
            summaries: summaries.clone(),
        },
        Arc::new(SystemClock),
    );

    service.open_account(account_id, "Ann", 1000).await?;
    service.deposit(account_id, 500).await?;
    service.withdraw(account_id, 200).await?;

    match service.deposit(account_id, 0).await {
        Err(e) if e.is_rule_violation() => tracing::info!(error = %e, "deposit refused"),
        Err(e) => return Err(e.into()),
        Ok(_) => return Err("a zero deposit was accepted".into()),
    }

    let live = service.summary(account_id).await?;
    tracing::info!(
        account_id,
        holder = %live.holder,
        balance = live.balance,
        transactions = live.transaction_count,
        "live summary"
    );

    // Rebuild every snapshot from the command log.
    accounts.clear().await;
    summaries.clear().await;
    let replayed = service.replay(account_id).await?;
    let rebuilt = service.summary(account_id).await?;
    tracing::info!(
        account_id,
        replayed,
        balance = rebuilt.balance,
        transactions = rebuilt.transaction_count,
        "rebuilt summary"
    );

    if rebuilt != live {
        return Err("replayed summary differs from the live one".into());
    }

    service.close(account_id).await?;
    tracing::info!(account_id, "account closed");

    Ok(())
}
