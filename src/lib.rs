//! Poolshare - time-weighted ownership of a pooled account
//!
//! This library replays a ledger of deposits and withdrawals against the
//! account's valuation history to derive each (investor, round) position's
//! share of the pool, its final asset value and its return on investment.

pub mod allocation;
pub mod config;
pub mod error;
pub mod importers;
pub mod models;
pub mod reports;
pub mod utils;
pub mod valuation;
