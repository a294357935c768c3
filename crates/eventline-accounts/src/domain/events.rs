//! Domain events for the Accounts context.

use eventline_core::payload::EventKind;
use serde::{Deserialize, Serialize};

/// Emitted when an account is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreated {
    /// Name of the account holder.
    pub holder: String,
    /// Opening balance in cents.
    pub initial_balance: i64,
}

/// Emitted when funds are deposited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsDeposited {
    /// Deposited amount in cents.
    pub amount: i64,
    /// Balance after the deposit.
    pub balance: i64,
}

/// Emitted when funds are withdrawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    /// Withdrawn amount in cents.
    pub amount: i64,
    /// Balance after the withdrawal.
    pub balance: i64,
}

/// Emitted when an account is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountClosed {
    /// Balance at the time of closing.
    pub final_balance: i64,
}

/// Event payload variants for the Accounts context.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    Created(AccountCreated),
    Deposited(FundsDeposited),
    Withdrawn(FundsWithdrawn),
    Closed(AccountClosed),
}

impl EventKind for AccountEvent {}

eventline_core::payload_kind!(AccountEvent {
    Created(AccountCreated) => "account.created",
    Deposited(FundsDeposited) => "account.deposited",
    Withdrawn(FundsWithdrawn) => "account.withdrawn",
    Closed(AccountClosed) => "account.closed",
});
