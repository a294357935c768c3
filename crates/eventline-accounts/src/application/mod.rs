//! Application layer for the Accounts context.

pub mod service;
pub mod views;
