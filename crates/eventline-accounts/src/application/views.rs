//! Read models for the Accounts context.

use std::sync::Arc;

use eventline_core::error::DomainError;
use eventline_core::store::{Snapshot, SnapshotStore};
use eventline_runtime::View;
use serde::Serialize;

use crate::domain::events::{
    AccountClosed, AccountCreated, AccountEvent, FundsDeposited, FundsWithdrawn,
};

/// Read-only summary of one account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AccountSummary {
    /// Account identifier (the entity id).
    pub id: Option<i64>,
    /// Sequence number of the last command reflected.
    pub version: i64,
    /// Name of the account holder.
    pub holder: String,
    /// Balance in cents.
    pub balance: i64,
    /// Deposits and withdrawals, counting a non-zero opening balance.
    pub transaction_count: u32,
    /// Whether the account has been closed.
    pub is_closed: bool,
}

impl Snapshot for AccountSummary {
    const KIND: &'static str = "account summary";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Builds the projection that maintains [`AccountSummary`] models.
#[must_use]
pub fn account_summary_view(
    summaries: Arc<dyn SnapshotStore<AccountSummary>>,
) -> View<AccountEvent, AccountSummary> {
    View::new("account-summary", summaries)
        .on_create::<AccountCreated, _>(|_event, created| {
            Ok(AccountSummary {
                holder: created.holder.clone(),
                balance: created.initial_balance,
                transaction_count: u32::from(created.initial_balance > 0),
                ..AccountSummary::default()
            })
        })
        .on_update::<FundsDeposited, _>(|mut summary, _event, deposited| {
            summary.balance = deposited.balance;
            summary.transaction_count += 1;
            Ok(summary)
        })
        .on_update::<FundsWithdrawn, _>(|mut summary, _event, withdrawn| {
            summary.balance = withdrawn.balance;
            summary.transaction_count += 1;
            Ok(summary)
        })
        .on_update::<AccountClosed, _>(|mut summary, _event, closed| {
            summary.balance = closed.final_balance;
            summary.is_closed = true;
            Ok(summary)
        })
}

/// Retrieves the summary of an account.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no summary exists for `account_id`.
pub async fn get_account_summary(
    account_id: i64,
    summaries: &dyn SnapshotStore<AccountSummary>,
) -> Result<AccountSummary, DomainError> {
    summaries.get(account_id).await
}
