//! Commands for the Accounts context.

use eventline_core::payload::CommandKind;
use serde::{Deserialize, Serialize};

/// Opens an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Name of the account holder.
    pub holder: String,
    /// Opening balance in cents.
    pub initial_balance: i64,
}

/// Adds funds to an open account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    /// Amount in cents; must be positive.
    pub amount: i64,
}

/// Takes funds out of an open account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdraw {
    /// Amount in cents; must be positive and covered by the balance.
    pub amount: i64,
}

/// Closes an account. A closed account accepts no further commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseAccount;

/// Command payload variants for the Accounts context.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountCommand {
    Create(CreateAccount),
    Deposit(Deposit),
    Withdraw(Withdraw),
    Close(CloseAccount),
}

impl CommandKind for AccountCommand {}

eventline_core::payload_kind!(AccountCommand {
    Create(CreateAccount) => "account.create",
    Deposit(Deposit) => "account.deposit",
    Withdraw(Withdraw) => "account.withdraw",
    Close(CloseAccount) => "account.close",
});
