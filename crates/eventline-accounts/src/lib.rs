//! Eventline Accounts: a bank-account domain running on the Eventline
//! runtime.
//!
//! Commands are validated by [`domain::aggregates::AccountSaga`] and
//! projected into [`application::views::AccountSummary`] read models.

pub mod application;
pub mod domain;
