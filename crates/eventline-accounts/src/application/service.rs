//! Composition and command entry points for the Accounts context.
//!
//! [`AccountService`] wires the account saga and summary view into one
//! runtime and exposes one method per business intent.

use std::sync::Arc;

use eventline_core::clock::Clock;
use eventline_core::entity::EntityReference;
use eventline_core::envelope::Command;
use eventline_core::error::DomainError;
use eventline_core::store::{CommandStore, SnapshotStore};
use eventline_runtime::{Aggregate, RuntimeBuilder};

use crate::application::views::{AccountSummary, account_summary_view, get_account_summary};
use crate::domain::aggregates::{Account, AccountSaga};
use crate::domain::commands::{AccountCommand, CloseAccount, CreateAccount, Deposit, Withdraw};
use crate::domain::events::AccountEvent;

/// Metadata property carrying the caller's correlation id.
pub const CORRELATION_ID: &str = "correlation_id";

/// Stores backing an [`AccountService`].
#[derive(Clone)]
pub struct AccountStores {
    /// Durable command log.
    pub commands: Arc<dyn CommandStore>,
    /// Snapshots owned by the account saga.
    pub accounts: Arc<dyn SnapshotStore<Account>>,
    /// Read models maintained by the summary view.
    pub summaries: Arc<dyn SnapshotStore<AccountSummary>>,
}

/// Application service for bank accounts.
#[derive(Clone)]
pub struct AccountService {
    aggregate: Aggregate<AccountCommand>,
    summaries: Arc<dyn SnapshotStore<AccountSummary>>,
}

impl AccountService {
    /// Wires the account saga and summary view over `stores`.
    #[must_use]
    pub fn new(stores: AccountStores, clock: Arc<dyn Clock>) -> Self {
        let AccountStores {
            commands,
            accounts,
            summaries,
        } = stores;

        let runtime = RuntimeBuilder::<AccountCommand, AccountEvent>::new(commands)
            .clock(clock)
            .register::<CreateAccount>()
            .register::<Deposit>()
            .register::<Withdraw>()
            .register::<CloseAccount>()
            .view(Arc::new(account_summary_view(Arc::clone(&summaries))))
            .saga(move |events| AccountSaga::saga(accounts, events))
            .build();
        let aggregate = runtime.aggregate();

        Self {
            aggregate,
            summaries,
        }
    }

    /// Opens account `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` if the account already exists,
    /// the holder is blank, or the initial balance is negative.
    pub async fn open_account(
        &self,
        account_id: i64,
        holder: impl Into<String>,
        initial_balance: i64,
    ) -> Result<Command<AccountCommand>, DomainError> {
        self.aggregate
            .create(
                account_id,
                CreateAccount {
                    holder: holder.into(),
                    initial_balance,
                },
            )
            .await
    }

    /// Deposits `amount` cents.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown account, or
    /// `DomainError::RuleViolation` for a non-positive amount or a closed
    /// account.
    pub async fn deposit(
        &self,
        account_id: i64,
        amount: i64,
    ) -> Result<Command<AccountCommand>, DomainError> {
        self.aggregate.execute(account_id, Deposit { amount }).await
    }

    /// Withdraws `amount` cents.
    ///
    /// # Errors
    ///
    /// As for [`AccountService::deposit`], plus `DomainError::RuleViolation`
    /// when the balance does not cover the amount.
    pub async fn withdraw(
        &self,
        account_id: i64,
        amount: i64,
    ) -> Result<Command<AccountCommand>, DomainError> {
        self.aggregate.execute(account_id, Withdraw { amount }).await
    }

    /// Closes an account.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown account, or
    /// `DomainError::RuleViolation` if it is already closed.
    pub async fn close(&self, account_id: i64) -> Result<Command<AccountCommand>, DomainError> {
        self.aggregate.execute(account_id, CloseAccount).await
    }

    /// Deposits `amount` cents, tagging the command and its events with a
    /// correlation id.
    ///
    /// # Errors
    ///
    /// See [`AccountService::deposit`].
    pub async fn deposit_correlated(
        &self,
        account_id: i64,
        amount: i64,
        correlation_id: &str,
    ) -> Result<Command<AccountCommand>, DomainError> {
        let command = self
            .aggregate
            .command(EntityReference::existing(account_id), Deposit { amount })
            .with_property(CORRELATION_ID, correlation_id);
        self.aggregate.publish(command).await
    }

    /// Rebuilds the account's state from its stored commands.
    ///
    /// # Errors
    ///
    /// See [`eventline_runtime::CommandBus::replay`].
    pub async fn replay(&self, account_id: i64) -> Result<usize, DomainError> {
        self.aggregate.replay(account_id).await
    }

    /// Reads the current summary of an account.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no summary exists.
    pub async fn summary(&self, account_id: i64) -> Result<AccountSummary, DomainError> {
        get_account_summary(account_id, self.summaries.as_ref()).await
    }
}
